//! Admin account management.

use tracing::info;

use shoplite_core::Email;

use super::CliError;

/// Grant the admin flag to an existing account.
///
/// The first admin of a deployment is created this way; later promotions
/// can go through `PATCH /users/{id}/set-as-admin`.
///
/// # Errors
///
/// Returns `CliError::NoSuchAccount` if no account matches the email.
pub async fn grant(email: &str) -> Result<(), CliError> {
    let email =
        Email::parse(email).map_err(|e| CliError::Invalid(format!("invalid email: {e}")))?;

    let pool = super::connect().await?;

    let result = sqlx::query("UPDATE users SET is_admin = TRUE WHERE email = $1")
        .bind(email.as_str())
        .execute(&pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(CliError::NoSuchAccount(email.into_inner()));
    }

    info!("Granted admin to {email}");
    Ok(())
}
