pub mod coingecko;

use error_stack::Report;
use futures::future::BoxFuture;

use crate::error::SourceError;
use crate::model::PriceSeries;

/// Abstraction over a market data provider.
///
/// Uses `BoxFuture` (from `futures` crate) instead of `async fn` in trait
/// to keep the trait object-safe (`dyn PriceSource`).
pub trait PriceSource: Send + Sync {
    fn name(&self) -> &str;

    /// Fetch daily closing prices for `asset` covering the last `days` days,
    /// oldest first.
    fn fetch_history(
        &self,
        asset: &str,
        days: u32,
    ) -> BoxFuture<'_, Result<PriceSeries, Report<SourceError>>>;

    /// Fetch the current spot price for `asset`.
    fn fetch_current_price(&self, asset: &str) -> BoxFuture<'_, Result<f64, Report<SourceError>>>;
}

/// Check that a price is usable: finite and not negative.
pub fn validate_price(price: f64) -> Result<f64, Report<SourceError>> {
    if !price.is_finite() || price < 0.0 {
        return Err(Report::new(SourceError::InvalidData {
            reason: format!("price {price} is not a finite non-negative number"),
        }));
    }
    Ok(price)
}
