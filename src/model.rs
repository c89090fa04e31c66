use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single daily closing price.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricePoint {
    pub timestamp: DateTime<Utc>,
    pub price: f64,
}

/// Closing prices in ascending time order (oldest first).
///
/// A series is only ever replaced as a whole; nothing mutates one in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceSeries {
    points: Vec<PricePoint>,
    prices: Vec<f64>,
}

impl PriceSeries {
    pub fn new(points: Vec<PricePoint>) -> Self {
        let prices = points.iter().map(|p| p.price).collect();
        Self { points, prices }
    }

    /// Build a series from bare prices, stamping them one day apart ending today.
    #[allow(dead_code)]
    pub fn from_prices(prices: &[f64]) -> Self {
        let now = Utc::now();
        let len = prices.len() as i64;
        let points = prices
            .iter()
            .enumerate()
            .map(|(i, &price)| PricePoint {
                timestamp: now - chrono::Duration::days(len - 1 - i as i64),
                price,
            })
            .collect();
        Self::new(points)
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }

    pub fn prices(&self) -> &[f64] {
        &self.prices
    }

    #[allow(dead_code)]
    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    /// Most recent price, if any.
    pub fn last_price(&self) -> Option<f64> {
        self.prices.last().copied()
    }

    /// The `n` most recent prices (fewer when the series is shorter).
    pub fn tail(&self, n: usize) -> &[f64] {
        &self.prices[self.prices.len().saturating_sub(n)..]
    }
}

/// Trading style preset chosen by the user.
///
/// String representations match the config file format (`"day"`, `"swing"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TradingStyle {
    DayTrading,
    SwingTrading,
}

impl TradingStyle {
    /// Parse a config-format string into a `TradingStyle`.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "day" | "daytrading" | "day_trading" => Some(Self::DayTrading),
            "swing" | "swingtrading" | "swing_trading" => Some(Self::SwingTrading),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::DayTrading => "day",
            Self::SwingTrading => "swing",
        }
    }

    /// RSI level below which the RSI vote is `Buy`.
    pub fn rsi_oversold(self) -> f64 {
        match self {
            Self::DayTrading => 40.0,
            Self::SwingTrading => 30.0,
        }
    }

    /// RSI level above which the RSI vote is `Sell`.
    pub fn rsi_overbought(self) -> f64 {
        match self {
            Self::DayTrading => 60.0,
            Self::SwingTrading => 70.0,
        }
    }

    /// Proximity multiplier applied to the Bollinger bands.
    pub fn band_buffer(self) -> f64 {
        match self {
            Self::DayTrading => 1.015,
            Self::SwingTrading => 1.01,
        }
    }
}

impl fmt::Display for TradingStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Vote {
    Buy,
    Sell,
    Hold,
}

impl Vote {
    /// Style class handed to the renderer.
    pub fn class(self) -> &'static str {
        match self {
            Self::Buy => "buy",
            Self::Sell => "sell",
            Self::Hold => "hold",
        }
    }
}

impl fmt::Display for Vote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buy => write!(f, "BUY"),
            Self::Sell => write!(f, "SELL"),
            Self::Hold => write!(f, "HOLD"),
        }
    }
}
