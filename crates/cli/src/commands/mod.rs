//! CLI subcommand implementations.

pub mod admin;
pub mod migrate;
pub mod seed;

use secrecy::SecretString;
use sqlx::PgPool;
use thiserror::Error;

/// Errors shared by the CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    /// Neither `SHOPLITE_DATABASE_URL` nor `DATABASE_URL` is set.
    #[error("missing environment variable: SHOPLITE_DATABASE_URL (or DATABASE_URL)")]
    MissingDatabaseUrl,

    /// Database error.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Migration error.
    #[error("migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    /// The referenced account does not exist.
    #[error("no account found for {0}")]
    NoSuchAccount(String),

    /// Invalid command input.
    #[error("{0}")]
    Invalid(String),
}

/// Connect to the database named by the environment.
pub(crate) async fn connect() -> Result<PgPool, CliError> {
    dotenvy::dotenv().ok();

    let database_url = std::env::var("SHOPLITE_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map_err(|_| CliError::MissingDatabaseUrl)?;

    let pool = shoplite_api::store::create_pool(&SecretString::from(database_url)).await?;
    Ok(pool)
}
