use error_stack::{Report, bail};

use crate::error::IndicatorError;
use crate::indicator::{Indicator, mean};

/// RSI (Relative Strength Index), simple-average variant.
///
/// Every day-over-day delta in the series is used. Gains and losses are each
/// averaged over their own count (zero deltas belong to neither), which is not
/// Wilder's smoothing. With no losses the RSI is 100, with no gains it is 0,
/// and a flat series yields NaN.
pub struct Rsi {
    period: usize,
}

impl Rsi {
    #[allow(dead_code)]
    pub fn new(period: usize) -> Result<Self, Report<IndicatorError>> {
        if period == 0 {
            bail!(IndicatorError::InvalidParameter {
                name: "period must be > 0".into(),
            });
        }
        Ok(Self { period })
    }
}

impl Default for Rsi {
    fn default() -> Self {
        Self { period: 14 }
    }
}

impl Indicator for Rsi {
    type Output = f64;

    fn name(&self) -> &str {
        "rsi"
    }

    fn required_len(&self) -> usize {
        self.period + 1
    }

    fn compute(&self, prices: &[f64]) -> f64 {
        let mut gains = Vec::new();
        let mut losses = Vec::new();
        for w in prices.windows(2) {
            let delta = w[1] - w[0];
            if delta > 0.0 {
                gains.push(delta);
            } else if delta < 0.0 {
                losses.push(-delta);
            }
        }

        rsi_value(mean(&gains), mean(&losses))
    }
}

// Division by zero is left to IEEE-754: rs = inf gives 100, 0/0 gives NaN.
fn rsi_value(avg_gain: f64, avg_loss: f64) -> f64 {
    let rs = avg_gain / avg_loss;
    100.0 - 100.0 / (1.0 + rs)
}
