use error_stack::{Report, bail};

use crate::error::IndicatorError;
use crate::indicator::{Indicator, mean, tail};

/// MACD approximation: mean of the last `fast_period` prices minus the mean
/// of the last `slow_period` prices. Simple averages stand in for EMAs and no
/// signal line is produced.
pub struct Macd {
    fast_period: usize,
    slow_period: usize,
}

impl Macd {
    #[allow(dead_code)]
    pub fn new(fast_period: usize, slow_period: usize) -> Result<Self, Report<IndicatorError>> {
        if fast_period == 0 || slow_period == 0 {
            bail!(IndicatorError::InvalidParameter {
                name: "all periods must be > 0".into(),
            });
        }
        if fast_period >= slow_period {
            bail!(IndicatorError::InvalidParameter {
                name: "fast_period must be < slow_period".into(),
            });
        }
        Ok(Self {
            fast_period,
            slow_period,
        })
    }
}

impl Default for Macd {
    fn default() -> Self {
        Self {
            fast_period: 12,
            slow_period: 26,
        }
    }
}

impl Indicator for Macd {
    type Output = f64;

    fn name(&self) -> &str {
        "macd"
    }

    fn required_len(&self) -> usize {
        self.slow_period
    }

    fn compute(&self, prices: &[f64]) -> f64 {
        let short_avg = mean(tail(prices, self.fast_period));
        let long_avg = mean(tail(prices, self.slow_period));
        short_avg - long_avg
    }
}
