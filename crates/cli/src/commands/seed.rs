//! Catalog seeding command.
//!
//! Inserts a handful of sample products for local development. Existing
//! products with the same name are left untouched.

use rust_decimal::Decimal;
use tracing::info;

use super::CliError;

const SAMPLE_PRODUCTS: &[(&str, &str, &str)] = &[
    ("Enamel Mug", "A 350ml enamel camping mug.", "12.50"),
    ("Canvas Tote", "A heavyweight cotton tote bag.", "18.00"),
    ("Field Notebook", "A5 dotted notebook, 96 pages.", "7.25"),
    ("Beeswax Candle", "Hand-poured beeswax candle.", "9.80"),
];

/// Insert the sample catalog.
///
/// # Errors
///
/// Returns an error if the database is unreachable or an insert fails.
pub async fn run() -> Result<(), CliError> {
    let pool = super::connect().await?;

    let mut inserted = 0_u64;
    for (name, description, price) in SAMPLE_PRODUCTS {
        let price: Decimal = price
            .parse()
            .map_err(|_| CliError::Invalid(format!("invalid sample price for {name}")))?;

        let result = sqlx::query(
            "INSERT INTO products (name, description, price)
             VALUES ($1, $2, $3)
             ON CONFLICT (name) DO NOTHING",
        )
        .bind(name)
        .bind(description)
        .bind(price)
        .execute(&pool)
        .await?;

        inserted += result.rows_affected();
    }

    info!("Seeded {inserted} products");
    Ok(())
}
