//! Database connection pool and schema migrations

use sqlx::{migrate::Migrator, postgres::PgPoolOptions, PgPool};
use std::time::Duration;

use crate::{
    config::DatabaseConfig,
    error::{Error, Result},
};

/// Embedded SQL migrations
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Create a PostgreSQL connection pool with retry logic
///
/// Retries up to `max_retries` times, doubling the delay after each
/// failed attempt starting from `retry_delay_secs`.
pub async fn create_pool(config: &DatabaseConfig) -> Result<PgPool> {
    let mut attempt = 0;
    let base_delay = Duration::from_secs(config.retry_delay_secs);
    let url_safe = sanitize_connection_url(&config.url);

    loop {
        match try_create_pool(config).await {
            Ok(pool) => {
                tracing::info!(
                    url = %url_safe,
                    attempts = attempt + 1,
                    max = config.max_connections,
                    min = config.min_connections,
                    "database connection pool created"
                );
                return Ok(pool);
            }
            Err(e) => {
                attempt += 1;

                if attempt > config.max_retries {
                    tracing::error!(
                        url = %url_safe,
                        reason = categorize_db_error(&e),
                        "failed to connect to database after {} attempts: {}",
                        attempt,
                        e
                    );
                    return Err(Error::Database(e));
                }

                let delay = backoff_delay(base_delay, attempt);
                tracing::warn!(
                    url = %url_safe,
                    reason = categorize_db_error(&e),
                    "database connection attempt {} failed: {}. Retrying in {:?}...",
                    attempt,
                    e,
                    delay
                );

                tokio::time::sleep(delay).await;
            }
        }
    }
}

/// Apply pending embedded migrations
pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    MIGRATOR.run(pool).await?;
    tracing::info!(count = MIGRATOR.iter().count(), "database migrations applied");
    Ok(())
}

async fn try_create_pool(config: &DatabaseConfig) -> std::result::Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(config.connection_timeout())
        .max_lifetime(config.max_lifetime())
        .idle_timeout(config.idle_timeout())
        .connect(&config.url)
        .await
}

/// Delay before retry number `attempt` (1-based)
fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    let multiplier = 2_u32.saturating_pow(attempt.saturating_sub(1));
    base.saturating_mul(multiplier)
}

/// Mask the password of a connection URL for logging
fn sanitize_connection_url(url: &str) -> String {
    if let (Some(scheme_end), Some(at_pos)) = (url.find("://"), url.rfind('@')) {
        let credentials_start = scheme_end + 3;
        if credentials_start < at_pos {
            let credentials = &url[credentials_start..at_pos];
            if let Some(colon_pos) = credentials.find(':') {
                return format!(
                    "{}{}:***{}",
                    &url[..credentials_start],
                    &credentials[..colon_pos],
                    &url[at_pos..]
                );
            }
        }
    }
    url.to_string()
}

fn categorize_db_error(err: &sqlx::Error) -> &'static str {
    use sqlx::Error;
    match err {
        Error::Configuration(_) => "configuration error",
        Error::Database(_) => "database rejected the connection",
        Error::Io(_) => "network I/O error",
        Error::Tls(_) => "TLS error",
        Error::PoolTimedOut => "connection pool timeout",
        Error::PoolClosed => "connection pool closed",
        Error::WorkerCrashed => "database worker crashed",
        _ => "connection error",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_url_with_password() {
        assert_eq!(
            sanitize_connection_url("postgres://travel:s3cr3t@db:5432/travel"),
            "postgres://travel:***@db:5432/travel"
        );
    }

    #[test]
    fn test_sanitize_url_with_at_in_password() {
        assert_eq!(
            sanitize_connection_url("postgres://travel:p@ss@db/travel"),
            "postgres://travel:***@db/travel"
        );
    }

    #[test]
    fn test_sanitize_url_without_password() {
        let url = "postgres://localhost:5432/travel";
        assert_eq!(sanitize_connection_url(url), url);
        let url = "postgres://travel@localhost/travel";
        assert_eq!(sanitize_connection_url(url), url);
    }

    #[test]
    fn test_backoff_doubles() {
        let base = Duration::from_secs(5);
        assert_eq!(backoff_delay(base, 1), Duration::from_secs(5));
        assert_eq!(backoff_delay(base, 2), Duration::from_secs(10));
        assert_eq!(backoff_delay(base, 4), Duration::from_secs(40));
    }

    #[test]
    fn test_backoff_saturates() {
        let delay = backoff_delay(Duration::from_secs(5), 200);
        assert!(delay >= Duration::from_secs(5));
    }

    #[test]
    fn test_categorize() {
        assert_eq!(categorize_db_error(&sqlx::Error::PoolTimedOut), "connection pool timeout");
        assert_eq!(categorize_db_error(&sqlx::Error::RowNotFound), "connection error");
    }

    #[test]
    fn test_migrations_are_embedded() {
        let names: Vec<_> = MIGRATOR.iter().map(|m| m.description.to_string()).collect();
        assert!(!names.is_empty());
        assert!(names.iter().any(|d| d.contains("products")));
        assert!(names.iter().any(|d| d.contains("users")));
    }

    #[tokio::test]
    async fn test_create_pool_gives_up() {
        let config = DatabaseConfig {
            url: "not a url".to_string(),
            max_retries: 0,
            retry_delay_secs: 0,
            ..DatabaseConfig::default()
        };
        let err = create_pool(&config).await.unwrap_err();
        assert!(matches!(err, Error::Database(_)));
    }
}
