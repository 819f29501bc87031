use std::sync::Mutex;

use async_trait::async_trait;
use time::OffsetDateTime;

use super::repo::UserRepository;
use super::repo_types::{NewUser, User, UserUpdate};

/// In-process stand-in for the users table, with the same active-row rules.
#[derive(Default)]
pub struct InMemoryUserRepository {
    rows: Mutex<Vec<User>>,
}

impl InMemoryUserRepository {
    /// Every row, inactive ones included.
    pub fn all_rows(&self) -> Vec<User> {
        self.rows.lock().unwrap().clone()
    }

    fn find_active<P: Fn(&User) -> bool>(&self, pred: P) -> Option<User> {
        self.rows
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.is_active && pred(u))
            .cloned()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_id(&self, id: i32) -> anyhow::Result<Option<User>> {
        Ok(self.find_active(|u| u.id == id))
    }

    async fn find_by_username(&self, username: &str) -> anyhow::Result<Option<User>> {
        Ok(self.find_active(|u| u.username == username))
    }

    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        Ok(self.find_active(|u| u.email == email))
    }

    async fn create(&self, new_user: &NewUser) -> anyhow::Result<User> {
        let mut rows = self.rows.lock().unwrap();
        if rows
            .iter()
            .any(|u| u.username == new_user.username || u.email == new_user.email)
        {
            anyhow::bail!("duplicate key value violates unique constraint");
        }
        let now = OffsetDateTime::now_utc();
        let user = User {
            id: rows.len() as i32 + 1,
            username: new_user.username.clone(),
            email: new_user.email.clone(),
            password_hash: new_user.password_hash.clone(),
            first_name: new_user.first_name.clone(),
            last_name: new_user.last_name.clone(),
            is_active: true,
            is_verified: false,
            created_at: now,
            updated_at: now,
        };
        rows.push(user.clone());
        Ok(user)
    }

    async fn update(&self, id: i32, changes: &UserUpdate) -> anyhow::Result<Option<User>> {
        let mut rows = self.rows.lock().unwrap();
        let Some(user) = rows.iter_mut().find(|u| u.id == id && u.is_active) else {
            return Ok(None);
        };
        if let Some(email) = &changes.email {
            user.email = email.clone();
        }
        if let Some(first_name) = &changes.first_name {
            user.first_name = Some(first_name.clone());
        }
        if let Some(last_name) = &changes.last_name {
            user.last_name = Some(last_name.clone());
        }
        if let Some(is_verified) = changes.is_verified {
            user.is_verified = is_verified;
        }
        user.updated_at = OffsetDateTime::now_utc();
        Ok(Some(user.clone()))
    }

    async fn deactivate(&self, id: i32) -> anyhow::Result<bool> {
        let mut rows = self.rows.lock().unwrap();
        match rows.iter_mut().find(|u| u.id == id && u.is_active) {
            Some(user) => {
                user.is_active = false;
                user.updated_at = OffsetDateTime::now_utc();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn count_active(&self) -> anyhow::Result<i64> {
        Ok(self.rows.lock().unwrap().iter().filter(|u| u.is_active).count() as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(username: &str) -> NewUser {
        NewUser {
            username: username.to_string(),
            email: format!("{username}@example.com"),
            password_hash: "hash".into(),
            first_name: None,
            last_name: None,
        }
    }

    #[tokio::test]
    async fn deactivation_hides_user_but_keeps_row() {
        let repo = InMemoryUserRepository::default();
        let ada = repo.create(&new_user("ada")).await.unwrap();
        repo.create(&new_user("bob")).await.unwrap();
        assert_eq!(repo.count_active().await.unwrap(), 2);

        assert!(repo.deactivate(ada.id).await.unwrap());
        assert!(!repo.deactivate(ada.id).await.unwrap());

        assert_eq!(repo.count_active().await.unwrap(), 1);
        assert!(repo.find_by_id(ada.id).await.unwrap().is_none());
        assert!(repo.find_by_username("ada").await.unwrap().is_none());
        assert!(repo.find_by_email("ada@example.com").await.unwrap().is_none());
        assert!(repo.update(ada.id, &UserUpdate::default()).await.unwrap().is_none());

        let rows = repo.all_rows();
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().any(|u| u.username == "ada" && !u.is_active));
    }

    #[tokio::test]
    async fn usernames_stay_unique_after_deactivation() {
        let repo = InMemoryUserRepository::default();
        let ada = repo.create(&new_user("ada")).await.unwrap();
        repo.deactivate(ada.id).await.unwrap();
        assert!(repo.create(&new_user("ada")).await.is_err());
    }

    #[tokio::test]
    async fn update_changes_only_given_fields() {
        let repo = InMemoryUserRepository::default();
        let ada = repo.create(&new_user("ada")).await.unwrap();
        let updated = repo
            .update(
                ada.id,
                &UserUpdate {
                    first_name: Some("Ada".into()),
                    is_verified: Some(true),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.first_name.as_deref(), Some("Ada"));
        assert!(updated.is_verified);
        assert_eq!(updated.email, "ada@example.com");
        assert!(updated.last_name.is_none());
    }
}
