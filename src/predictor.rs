use error_stack::{Report, bail};

use crate::error::PredictorError;
use crate::indicator::{mean, tail};
use crate::model::PriceSeries;

/// Number of recent prices a prediction looks at.
pub const PREDICTION_WINDOW: usize = 5;
/// Minimum series length needed to train.
pub const TRAINING_WINDOW: usize = 10;

/// Best-effort next-price model.
pub trait Predictor: Send + Sync {
    fn name(&self) -> &str;

    /// Fit the model to the most recent prices of `series`.
    fn train(&mut self, series: &PriceSeries) -> Result<(), Report<PredictorError>>;

    /// Predict the next price. `None` until trained or when fewer than
    /// `PREDICTION_WINDOW` prices are given.
    fn predict(&self, prices: &[f64]) -> Option<f64>;

    fn is_trained(&self) -> bool;
}

/// Least-squares line through (p[t], p[t + 5]) pairs from the last ten
/// prices, applied to the latest price.
#[derive(Debug, Default)]
pub struct LinearPredictor {
    fit: Option<LinearFit>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct LinearFit {
    slope: f64,
    intercept: f64,
}

impl LinearPredictor {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Predictor for LinearPredictor {
    fn name(&self) -> &str {
        "linear"
    }

    fn train(&mut self, series: &PriceSeries) -> Result<(), Report<PredictorError>> {
        if series.len() < TRAINING_WINDOW {
            bail!(PredictorError::NotEnoughData {
                required: TRAINING_WINDOW,
                available: series.len(),
            });
        }

        let window = series.tail(TRAINING_WINDOW);
        let (xs, ys) = window.split_at(PREDICTION_WINDOW);
        let fit = least_squares(xs, ys);
        tracing::debug!(slope = fit.slope, intercept = fit.intercept, "predictor trained");
        self.fit = Some(fit);
        Ok(())
    }

    fn is_trained(&self) -> bool {
        self.fit.is_some()
    }

    fn predict(&self, prices: &[f64]) -> Option<f64> {
        let fit = self.fit?;
        if prices.len() < PREDICTION_WINDOW {
            return None;
        }
        let window = tail(prices, PREDICTION_WINDOW);
        let latest = *window.last()?;
        Some(fit.slope * latest + fit.intercept)
    }
}

fn least_squares(xs: &[f64], ys: &[f64]) -> LinearFit {
    let x_mean = mean(xs);
    let y_mean = mean(ys);
    let covariance: f64 = xs
        .iter()
        .zip(ys)
        .map(|(x, y)| (x - x_mean) * (y - y_mean))
        .sum();
    let variance: f64 = xs.iter().map(|x| (x - x_mean).powi(2)).sum();

    if variance == 0.0 {
        return LinearFit {
            slope: 0.0,
            intercept: y_mean,
        };
    }

    let slope = covariance / variance;
    LinearFit {
        slope,
        intercept: y_mean - slope * x_mean,
    }
}
