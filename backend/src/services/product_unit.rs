//! Product unit conversion lookup

use rust_decimal::Decimal;
use sqlx::PgConnection;

use crate::error::AppResult;

/// Resolves the factor that turns a transaction unit into the product's
/// base unit.
#[derive(Clone, Copy, Debug, Default)]
pub struct ProductUnitLookup;

impl ProductUnitLookup {
    /// Conversion factor for `(product, unit)`; `1` when no mapping exists
    pub async fn conversion_factor(
        conn: &mut PgConnection,
        product_id: i64,
        unit_id: i64,
    ) -> AppResult<Decimal> {
        let factor = sqlx::query_scalar::<_, Decimal>(
            "SELECT conversion_factor FROM product_units WHERE product_id = $1 AND unit_id = $2",
        )
        .bind(product_id)
        .bind(unit_id)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(match factor {
            Some(f) if f > Decimal::ZERO => f,
            _ => {
                tracing::debug!(product_id, unit_id, "no unit conversion, using factor 1");
                Decimal::ONE
            }
        })
    }

    /// Base quantity of `qty` units
    pub async fn to_base(
        conn: &mut PgConnection,
        product_id: i64,
        unit_id: i64,
        qty: Decimal,
    ) -> AppResult<Decimal> {
        let factor = Self::conversion_factor(conn, product_id, unit_id).await?;
        Ok(shared::to_base_qty(qty, factor)?)
    }
}
