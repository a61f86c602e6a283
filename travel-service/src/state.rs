//! Application state shared across handlers

use std::sync::Arc;

use sqlx::PgPool;

use crate::{
    config::Config,
    domain::{product::ProductService, user::UserService},
    error::{Error, Result},
    password::PasswordHasher,
};

#[derive(Debug, Clone)]
pub struct AppState {
    config: Arc<Config>,
    pool: PgPool,
    products: ProductService,
    users: UserService,
}

impl AppState {
    /// Wire the services onto an existing pool
    pub fn new(config: Config, pool: PgPool) -> Result<Self> {
        let hasher = PasswordHasher::new(&config.password)
            .map_err(|e| Error::Internal(format!("password hasher: {e}")))?;

        Ok(Self {
            products: ProductService::new(pool.clone()),
            users: UserService::new(pool.clone(), hasher),
            config: Arc::new(config),
            pool,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub fn products(&self) -> &ProductService {
        &self.products
    }

    pub fn users(&self) -> &UserService {
        &self.users
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::postgres::PgPoolOptions;

    #[tokio::test]
    async fn test_state_rejects_bad_password_params() {
        let mut config = Config::default();
        config.password.parallelism = 0;

        let pool = PgPoolOptions::new()
            .connect_lazy(&config.database.url)
            .unwrap();

        assert!(matches!(AppState::new(config, pool), Err(Error::Internal(_))));
    }
}
