use std::fmt;

use error_stack::{Report, bail};

use crate::error::IndicatorError;
use crate::indicator::{Indicator, mean, tail};

/// Bollinger band values for the most recent window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bands {
    pub sma: f64,
    pub upper: f64,
    pub lower: f64,
}

impl fmt::Display for Bands {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Upper: ${:.2}, Lower: ${:.2}", self.upper, self.lower)
    }
}

/// Bollinger Bands over the last `period` prices using the population
/// standard deviation (divide by `period`, not `period - 1`).
pub struct BollingerBands {
    period: usize,
    std_dev_multiplier: f64,
}

impl BollingerBands {
    #[allow(dead_code)]
    pub fn new(period: usize, std_dev_multiplier: f64) -> Result<Self, Report<IndicatorError>> {
        if period == 0 {
            bail!(IndicatorError::InvalidParameter {
                name: "period must be > 0".into(),
            });
        }
        if std_dev_multiplier <= 0.0 {
            bail!(IndicatorError::InvalidParameter {
                name: "std_dev_multiplier must be > 0".into(),
            });
        }
        Ok(Self {
            period,
            std_dev_multiplier,
        })
    }
}

impl Default for BollingerBands {
    fn default() -> Self {
        Self {
            period: 20,
            std_dev_multiplier: 2.0,
        }
    }
}

impl Indicator for BollingerBands {
    type Output = Bands;

    fn name(&self) -> &str {
        "bollinger"
    }

    fn required_len(&self) -> usize {
        self.period
    }

    fn compute(&self, prices: &[f64]) -> Bands {
        let window = tail(prices, self.period);
        let sma = mean(window);
        let variance =
            window.iter().map(|&p| (p - sma).powi(2)).sum::<f64>() / window.len() as f64;
        let std_dev = variance.sqrt();
        Bands {
            sma,
            upper: sma + self.std_dev_multiplier * std_dev,
            lower: sma - self.std_dev_multiplier * std_dev,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicator::IndicatorResult;
    use crate::model::PriceSeries;

    #[test]
    fn bollinger_period_zero_invalid() {
        assert!(BollingerBands::new(0, 2.0).is_err());
    }

    #[test]
    fn bollinger_negative_multiplier_invalid() {
        assert!(BollingerBands::new(20, -1.0).is_err());
    }

    #[test]
    fn bollinger_unavailable_below_twenty_prices() {
        let bb = BollingerBands::default();
        let result = bb.calculate(&PriceSeries::from_prices(&[1.0; 19]));
        assert_eq!(result, IndicatorResult::Unavailable);
    }

    #[test]
    fn bollinger_flat_prices_zero_width() {
        let bb = BollingerBands::default();
        let bands = bb.compute(&[10.0; 25]);
        assert_eq!(bands.sma, 10.0);
        assert_eq!(bands.upper, 10.0);
        assert_eq!(bands.lower, 10.0);
    }

    #[test]
    fn bollinger_uses_population_std_dev() {
        let bb = BollingerBands::default();
        let closes: Vec<f64> = (1..=20).map(|i| i as f64).collect();
        let bands = bb.compute(&closes);
        // population variance of 1..=20 is (20^2 - 1) / 12
        let std_dev = (399.0_f64 / 12.0).sqrt();
        assert!((bands.sma - 10.5).abs() < 1e-9);
        assert!((bands.upper - (10.5 + 2.0 * std_dev)).abs() < 1e-9);
        assert!((bands.lower - (10.5 - 2.0 * std_dev)).abs() < 1e-9);
    }

    #[test]
    fn bollinger_only_uses_last_twenty() {
        let bb = BollingerBands::default();
        let mut closes = vec![1_000.0; 5];
        closes.extend([10.0; 20]);
        let bands = bb.compute(&closes);
        assert_eq!(bands.sma, 10.0);
    }

    #[test]
    fn bollinger_bands_symmetry() {
        let bb = BollingerBands::default();
        let closes: Vec<f64> = (0..22).map(|i| 50.0 + (i % 5) as f64).collect();
        let bands = bb.compute(&closes);
        assert!((bands.upper - bands.sma - (bands.sma - bands.lower)).abs() < 1e-9);
    }

    #[test]
    fn bands_display() {
        let bands = Bands {
            sma: 100.0,
            upper: 110.457,
            lower: 89.5,
        };
        assert_eq!(bands.to_string(), "Upper: $110.46, Lower: $89.50");
    }
}
