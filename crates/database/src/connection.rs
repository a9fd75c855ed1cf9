use crate::error::DbError;
use configuration::DatabaseSettings;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::PgPool;
use std::str::FromStr;
use std::time::Duration;

/// Builds connection options from the configured dsn and credentials.
///
/// The dsn is `host[:port]/dbname`; credentials are applied separately so a
/// password containing URL metacharacters needs no escaping.
pub fn connect_options(settings: &DatabaseSettings) -> Result<PgConnectOptions, DbError> {
    let options = PgConnectOptions::from_str(&format!("postgres://{}", settings.dsn.trim()))
        .map_err(|e| DbError::ConnectionConfigError(format!("dsn '{}' is invalid: {}", settings.dsn, e)))?
        .username(&settings.username)
        .password(&settings.password);
    Ok(options)
}

/// Establishes a connection pool to the PostgreSQL database.
///
/// This is the application's connection provider: it is called once at
/// start-up with the loaded settings and the pool is then shared.
pub async fn connect(settings: &DatabaseSettings) -> Result<PgPool, DbError> {
    let options = connect_options(settings)?;

    let pool = PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .acquire_timeout(Duration::from_secs(settings.acquire_timeout_secs))
        .connect_with(options)
        .await?;

    tracing::info!(dsn = %settings.dsn, user = %settings.username, "Connected to the database.");
    Ok(pool)
}

/// Runs `SELECT 1` and checks the answer.
pub async fn check_connection(pool: &PgPool) -> Result<(), DbError> {
    let one: i32 = sqlx::query_scalar("SELECT 1").fetch_one(pool).await?;
    if one != 1 {
        return Err(DbError::UnexpectedProbeResult(one));
    }
    Ok(())
}

/// Opens a pool and runs the probe; any failure along the way is returned.
pub async fn check_database(settings: &DatabaseSettings) -> Result<(), DbError> {
    let pool = connect(settings).await?;
    check_connection(&pool).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(dsn: &str) -> DatabaseSettings {
        DatabaseSettings {
            username: "masterdba".to_string(),
            password: "p@ss/word".to_string(),
            dsn: dsn.to_string(),
            max_connections: 5,
            acquire_timeout_secs: 5,
        }
    }

    #[test]
    fn dsn_supplies_host_port_and_database() {
        let options = connect_options(&settings("db.internal:6543/bank")).unwrap();

        assert_eq!(options.get_host(), "db.internal");
        assert_eq!(options.get_port(), 6543);
        assert_eq!(options.get_database(), Some("bank"));
        assert_eq!(options.get_username(), "masterdba");
    }

    #[test]
    fn port_defaults_when_omitted() {
        let options = connect_options(&settings("localhost/bank")).unwrap();
        assert_eq!(options.get_port(), 5432);
    }

    #[test]
    fn garbage_dsn_is_a_configuration_error() {
        let result = connect_options(&settings("localhost:notaport/bank"));
        assert!(matches!(result, Err(DbError::ConnectionConfigError(_))));
    }

    #[tokio::test]
    async fn database_check_reports_a_connection_that_cannot_be_made() {
        let result = check_database(&settings("localhost:notaport/bank")).await;
        assert!(matches!(result, Err(DbError::ConnectionConfigError(_))));
    }
}
