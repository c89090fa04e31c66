use std::path::Path;

use error_stack::{Report, ResultExt};
use serde::Deserialize;

use crate::error::ConfigError;
use crate::model::TradingStyle;
use crate::portfolio::DEFAULT_STARTING_BALANCE;
use crate::source::coingecko::COINGECKO_BASE_URL;

fn default_log_level() -> String {
    "info".into()
}

fn default_log_format() -> String {
    "text".into()
}

fn default_base_url() -> String {
    COINGECKO_BASE_URL.into()
}

fn default_vs_currency() -> String {
    "usd".into()
}

fn default_history_days() -> u32 {
    30
}

fn default_requests_per_minute() -> u32 {
    10
}

fn default_interval_secs() -> u64 {
    30
}

fn default_asset() -> String {
    "bitcoin".into()
}

fn default_assets() -> Vec<String> {
    ["bitcoin", "ethereum", "solana", "cardano", "dogecoin"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_style() -> String {
    "swing".into()
}

fn default_starting_balance() -> f64 {
    DEFAULT_STARTING_BALANCE
}

#[derive(Debug, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub refresh: RefreshConfig,
    #[serde(default)]
    pub trading: TradingConfig,
}

#[derive(Debug, Deserialize)]
pub struct GeneralConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Accepted values: `"text"` | `"json"`
    #[serde(default = "default_log_format")]
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: default_log_format(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SourceConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_vs_currency")]
    pub vs_currency: String,
    #[serde(default = "default_history_days")]
    pub history_days: u32,
    #[serde(default = "default_requests_per_minute")]
    pub requests_per_minute: u32,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            vs_currency: default_vs_currency(),
            history_days: default_history_days(),
            requests_per_minute: default_requests_per_minute(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RefreshConfig {
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct TradingConfig {
    /// Asset selected at start-up (CoinGecko coin id).
    #[serde(default = "default_asset")]
    pub asset: String,
    /// Assets the user may switch between. Empty allows any id.
    #[serde(default = "default_assets")]
    pub assets: Vec<String>,
    /// Accepted values: `"day"` | `"swing"`
    #[serde(default = "default_style")]
    pub style: String,
    #[serde(default = "default_starting_balance")]
    pub starting_balance: f64,
}

impl Default for TradingConfig {
    fn default() -> Self {
        Self {
            asset: default_asset(),
            assets: default_assets(),
            style: default_style(),
            starting_balance: default_starting_balance(),
        }
    }
}

impl TradingConfig {
    /// Parsed trading style. Only call on a validated config.
    pub fn trading_style(&self) -> TradingStyle {
        TradingStyle::from_str(&self.style).unwrap_or(TradingStyle::SwingTrading)
    }
}

/// Load and validate an `AppConfig` from a TOML file at `path`.
pub fn load(path: &Path) -> Result<AppConfig, Report<ConfigError>> {
    let content = std::fs::read_to_string(path)
        .change_context(ConfigError::ReadFile)
        .attach_with(|| format!("path: {}", path.display()))?;

    let config: AppConfig = toml::from_str(&content).change_context(ConfigError::Parse {
        reason: "invalid TOML syntax or schema mismatch".into(),
    })?;

    validate(&config)?;

    Ok(config)
}

pub fn validate(config: &AppConfig) -> Result<(), Report<ConfigError>> {
    validate_source(config)?;
    validate_refresh(config)?;
    validate_trading(config)?;
    validate_assets(config)?;
    Ok(())
}

fn invalid(field: String) -> Report<ConfigError> {
    Report::new(ConfigError::Validation { field })
}

fn validate_source(config: &AppConfig) -> Result<(), Report<ConfigError>> {
    let source = &config.source;
    if source.history_days == 0 {
        return Err(invalid("source.history_days must be > 0".into()));
    }
    if source.requests_per_minute == 0 {
        return Err(invalid("source.requests_per_minute must be > 0".into()));
    }
    if source.vs_currency.trim().is_empty() {
        return Err(invalid("source.vs_currency must not be empty".into()));
    }
    Ok(())
}

fn validate_refresh(config: &AppConfig) -> Result<(), Report<ConfigError>> {
    if config.refresh.interval_secs == 0 {
        return Err(invalid("refresh.interval_secs must be > 0".into()));
    }
    Ok(())
}

fn validate_trading(config: &AppConfig) -> Result<(), Report<ConfigError>> {
    let trading = &config.trading;
    if TradingStyle::from_str(&trading.style).is_none() {
        return Err(invalid(format!(
            "trading.style \"{}\" is not valid (expected \"day\" or \"swing\")",
            trading.style
        )));
    }
    if !trading.starting_balance.is_finite() || trading.starting_balance < 0.0 {
        return Err(invalid(format!(
            "trading.starting_balance {} must be a finite non-negative number",
            trading.starting_balance
        )));
    }
    Ok(())
}

fn validate_assets(config: &AppConfig) -> Result<(), Report<ConfigError>> {
    let trading = &config.trading;
    if trading.asset.trim().is_empty() {
        return Err(invalid("trading.asset must not be empty".into()));
    }

    let mut seen = std::collections::HashSet::new();
    for asset in &trading.assets {
        if !seen.insert(asset.as_str()) {
            return Err(invalid(format!("trading.assets: duplicate asset \"{asset}\"")));
        }
    }

    if !trading.assets.is_empty() && !trading.assets.contains(&trading.asset) {
        return Err(invalid(format!(
            "trading.asset \"{}\" is not listed in trading.assets",
            trading.asset
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(toml: &str) -> AppConfig {
        toml::from_str(toml).expect("parse failed")
    }

    #[test]
    fn valid_full_config_parses() {
        let toml = r#"
[general]
log_level = "debug"
log_format = "json"

[source]
base_url = "https://api.coingecko.com/api/v3"
vs_currency = "usd"
history_days = 60
requests_per_minute = 5

[refresh]
interval_secs = 15

[trading]
asset = "ethereum"
assets = ["bitcoin", "ethereum"]
style = "day"
starting_balance = 2500.0
"#;
        let config = parse(toml);
        assert!(validate(&config).is_ok());
        assert_eq!(config.general.log_level, "debug");
        assert_eq!(config.source.history_days, 60);
        assert_eq!(config.refresh.interval_secs, 15);
        assert_eq!(config.trading.asset, "ethereum");
        assert_eq!(config.trading.trading_style(), TradingStyle::DayTrading);
        assert_eq!(config.trading.starting_balance, 2500.0);
    }

    #[test]
    fn defaults_applied_when_fields_omitted() {
        let config = parse("");
        assert!(validate(&config).is_ok());
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.general.log_format, "text");
        assert_eq!(config.source.base_url, COINGECKO_BASE_URL);
        assert_eq!(config.source.vs_currency, "usd");
        assert_eq!(config.source.history_days, 30);
        assert_eq!(config.refresh.interval_secs, 30);
        assert_eq!(config.trading.asset, "bitcoin");
        assert_eq!(config.trading.trading_style(), TradingStyle::SwingTrading);
        assert_eq!(config.trading.starting_balance, 10_000.0);
    }

    #[test]
    fn zero_interval_rejected() {
        let config = parse("[refresh]\ninterval_secs = 0\n");
        assert!(validate(&config).is_err());
    }

    #[test]
    fn zero_history_days_rejected() {
        let config = parse("[source]\nhistory_days = 0\n");
        assert!(validate(&config).is_err());
    }

    #[test]
    fn unknown_style_rejected() {
        let config = parse("[trading]\nstyle = \"scalping\"\n");
        assert!(validate(&config).is_err());
    }

    #[test]
    fn negative_starting_balance_rejected() {
        let config = parse("[trading]\nstarting_balance = -1.0\n");
        assert!(validate(&config).is_err());
    }

    #[test]
    fn asset_must_be_listed() {
        let config = parse(
            r#"
[trading]
asset = "dogecoin"
assets = ["bitcoin", "ethereum"]
"#,
        );
        assert!(validate(&config).is_err());
    }

    #[test]
    fn any_asset_allowed_with_empty_list() {
        let config = parse(
            r#"
[trading]
asset = "dogecoin"
assets = []
"#,
        );
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn duplicate_assets_rejected() {
        let config = parse(
            r#"
[trading]
asset = "bitcoin"
assets = ["bitcoin", "bitcoin"]
"#,
        );
        assert!(validate(&config).is_err());
    }
}
