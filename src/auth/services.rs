use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, warn};

use crate::auth::password::verify_password;
use crate::users::{User, UserRepository};

#[derive(Debug, Error)]
pub enum AuthError {
    /// Unknown username and wrong password are deliberately the same error.
    #[error("invalid username or password")]
    InvalidCredentials,
    #[error("password comparison failed: {0}")]
    Hashing(String),
    #[error("user store error: {0}")]
    Store(#[from] anyhow::Error),
}

/// Checks username/password pairs against the user store.
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserRepository>,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self { users }
    }

    pub async fn validate_credentials(&self, username: &str, password: &str) -> Result<User, AuthError> {
        let Some(user) = self.users.find_by_username(username).await? else {
            warn!(%username, "login unknown username");
            return Err(AuthError::InvalidCredentials);
        };

        let matches = verify_password(password, &user.password_hash)
            .await
            .map_err(|e| AuthError::Hashing(e.to_string()))?;

        if !matches {
            warn!(%username, user_id = user.id, "login invalid password");
            return Err(AuthError::InvalidCredentials);
        }

        debug!(user_id = user.id, "credentials accepted");
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::password::hash_password_with_cost;
    use crate::users::memory::InMemoryUserRepository;
    use crate::users::NewUser;

    async fn service_with(username: &str, password: &str) -> (AuthService, Arc<InMemoryUserRepository>) {
        let repo = Arc::new(InMemoryUserRepository::default());
        repo.create(&NewUser {
            username: username.into(),
            email: format!("{username}@example.com"),
            password_hash: hash_password_with_cost(password, 4).await.unwrap(),
            first_name: None,
            last_name: None,
        })
        .await
        .unwrap();
        (AuthService::new(repo.clone()), repo)
    }

    #[tokio::test]
    async fn accepts_correct_password() {
        let (auth, _) = service_with("ada", "lovelace").await;
        let user = auth.validate_credentials("ada", "lovelace").await.unwrap();
        assert_eq!(user.username, "ada");
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_user_look_the_same() {
        let (auth, _) = service_with("ada", "lovelace").await;
        let wrong = auth.validate_credentials("ada", "babbage").await.unwrap_err();
        let unknown = auth.validate_credentials("charles", "lovelace").await.unwrap_err();
        assert!(matches!(wrong, AuthError::InvalidCredentials));
        assert!(matches!(unknown, AuthError::InvalidCredentials));
        assert_eq!(wrong.to_string(), unknown.to_string());
    }

    #[tokio::test]
    async fn deactivated_user_cannot_log_in() {
        let (auth, repo) = service_with("ada", "lovelace").await;
        let ada = repo.find_by_username("ada").await.unwrap().unwrap();
        repo.deactivate(ada.id).await.unwrap();
        let err = auth.validate_credentials("ada", "lovelace").await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
    }

    #[tokio::test]
    async fn corrupt_hash_is_not_reported_as_bad_credentials() {
        let repo = Arc::new(InMemoryUserRepository::default());
        repo.create(&NewUser {
            username: "ada".into(),
            email: "ada@example.com".into(),
            password_hash: "garbage".into(),
            first_name: None,
            last_name: None,
        })
        .await
        .unwrap();
        let err = AuthService::new(repo)
            .validate_credentials("ada", "lovelace")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Hashing(_)));
    }
}
