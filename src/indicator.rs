pub mod bollinger;
pub mod macd;
pub mod rsi;

use std::fmt;

use crate::model::PriceSeries;

/// Outcome of running an indicator over a price series.
///
/// `Unavailable` means the series is shorter than the indicator's window. It
/// is not an error: callers exclude it (or treat it as neutral), never as zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IndicatorResult<T> {
    Unavailable,
    Value(T),
}

impl<T> IndicatorResult<T> {
    pub fn value(&self) -> Option<&T> {
        match self {
            Self::Unavailable => None,
            Self::Value(v) => Some(v),
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Self::Value(_))
    }
}

/// Forwards the formatter (including precision) to the value, so
/// `format!("{:.2}", rsi)` renders `"55.20"` or `"Insufficient Data"`.
impl<T: fmt::Display> fmt::Display for IndicatorResult<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unavailable => f.write_str("Insufficient Data"),
            Self::Value(v) => fmt::Display::fmt(v, f),
        }
    }
}

/// A technical analysis indicator over closing prices.
///
/// Prices must be in ascending chronological order (oldest first).
pub trait Indicator {
    type Output;

    /// Unique name of this indicator (e.g., "rsi", "macd").
    fn name(&self) -> &str;

    /// Minimum series length (inclusive) required to produce a value.
    fn required_len(&self) -> usize;

    /// Compute the indicator. Only called with at least `required_len` prices.
    fn compute(&self, prices: &[f64]) -> Self::Output;

    /// Run the indicator on a series, reporting `Unavailable` below the window.
    fn calculate(&self, series: &PriceSeries) -> IndicatorResult<Self::Output> {
        if series.len() < self.required_len() {
            return IndicatorResult::Unavailable;
        }
        IndicatorResult::Value(self.compute(series.prices()))
    }
}

/// Arithmetic mean; an empty slice averages to zero.
pub(crate) fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// The `n` most recent prices.
pub(crate) fn tail(prices: &[f64], n: usize) -> &[f64] {
    &prices[prices.len().saturating_sub(n)..]
}
