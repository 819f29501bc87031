use crate::config::AppConfig;
use crate::users::UserRepository;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub users: Arc<dyn UserRepository>,
}

impl AppState {
    pub fn from_parts(config: Arc<AppConfig>, users: Arc<dyn UserRepository>) -> Self {
        Self { config, users }
    }

    #[cfg(test)]
    pub fn fake() -> (Self, Arc<crate::users::memory::InMemoryUserRepository>) {
        use crate::users::memory::InMemoryUserRepository;

        let config = AppConfig::from_lookup(|key| match key {
            "POSTGRES_DB" => Some("test".into()),
            "POSTGRES_USER" => Some("test".into()),
            "SESSION_SECRET" => Some("test-secret".into()),
            _ => None,
        })
        .expect("test config ok");

        let users = Arc::new(InMemoryUserRepository::default());
        (
            Self::from_parts(Arc::new(config), users.clone()),
            users,
        )
    }
}
