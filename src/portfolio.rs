use std::fmt;

use chrono::{DateTime, Utc};
use error_stack::{Report, bail};
use uuid::Uuid;

use crate::error::TradeError;

pub const DEFAULT_STARTING_BALANCE: f64 = 10_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeSide {
    Buy,
    Sell,
}

impl fmt::Display for TradeSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buy => write!(f, "buy"),
            Self::Sell => write!(f, "sell"),
        }
    }
}

/// Record of an accepted simulated trade.
///
/// `amount` is cash, not units of the asset. `price` is the last known price
/// at the time of the trade and is informational only.
#[derive(Debug, Clone, PartialEq)]
pub struct TradeConfirmation {
    pub id: Uuid,
    pub side: TradeSide,
    pub asset: String,
    pub amount: f64,
    pub price: Option<f64>,
    pub balance: f64,
    pub executed_at: DateTime<Utc>,
}

impl TradeConfirmation {
    /// Human-readable status line, e.g. `Bought $250 worth of bitcoin`.
    pub fn message(&self) -> String {
        let verb = match self.side {
            TradeSide::Buy => "Bought",
            TradeSide::Sell => "Sold",
        };
        format!("{verb} ${} worth of {}", self.amount, self.asset)
    }
}

/// Simulated cash balance.
///
/// The balance never goes negative. Sells are not checked against holdings.
#[derive(Debug, Clone, PartialEq)]
pub struct Portfolio {
    balance: f64,
}

impl Portfolio {
    pub fn new(starting_balance: f64) -> Self {
        Self {
            balance: starting_balance,
        }
    }

    pub fn balance(&self) -> f64 {
        self.balance
    }

    pub fn buy(
        &mut self,
        amount: f64,
        asset: &str,
        last_price: Option<f64>,
    ) -> Result<TradeConfirmation, Report<TradeError>> {
        validate_amount(amount)?;
        if amount > self.balance {
            bail!(TradeError::InsufficientBalance {
                requested: amount,
                available: self.balance,
            });
        }

        self.balance -= amount;
        Ok(self.confirm(TradeSide::Buy, amount, asset, last_price))
    }

    pub fn sell(
        &mut self,
        amount: f64,
        asset: &str,
        last_price: Option<f64>,
    ) -> Result<TradeConfirmation, Report<TradeError>> {
        validate_amount(amount)?;

        self.balance += amount;
        Ok(self.confirm(TradeSide::Sell, amount, asset, last_price))
    }

    fn confirm(
        &self,
        side: TradeSide,
        amount: f64,
        asset: &str,
        last_price: Option<f64>,
    ) -> TradeConfirmation {
        let confirmation = TradeConfirmation {
            id: Uuid::new_v4(),
            side,
            asset: asset.to_owned(),
            amount,
            price: last_price,
            balance: self.balance,
            executed_at: Utc::now(),
        };
        tracing::info!(
            trade_id = %confirmation.id,
            side = %side,
            asset,
            amount,
            price = ?last_price,
            balance = self.balance,
            "simulated trade executed"
        );
        confirmation
    }
}

impl Default for Portfolio {
    fn default() -> Self {
        Self::new(DEFAULT_STARTING_BALANCE)
    }
}

/// Parse the free-text amount field of a trade request.
pub fn parse_amount(input: &str) -> Result<f64, Report<TradeError>> {
    let invalid = || TradeError::InvalidAmount {
        input: input.to_owned(),
    };
    let trimmed = input.trim();
    let amount: f64 = trimmed
        .strip_prefix('$')
        .unwrap_or(trimmed)
        .parse()
        .map_err(|_| Report::new(invalid()))?;
    if !amount.is_finite() || amount <= 0.0 {
        bail!(invalid());
    }
    Ok(amount)
}

fn validate_amount(amount: f64) -> Result<(), Report<TradeError>> {
    if !amount.is_finite() || amount <= 0.0 {
        bail!(TradeError::InvalidAmount {
            input: amount.to_string(),
        });
    }
    Ok(())
}

/// Status line shown to the user when a trade is rejected.
pub fn rejection_message(error: &TradeError) -> &'static str {
    match error {
        TradeError::InvalidAmount { .. } => "Enter a valid amount!",
        TradeError::InsufficientBalance { .. } => "Not enough balance!",
    }
}
