use derive_more::{Display, Error};

#[derive(Debug, Display, Error)]
pub enum ConfigError {
    #[display("failed to read config file")]
    ReadFile,
    #[display("failed to parse config: {reason}")]
    Parse { reason: String },
    #[display("invalid config: {field}")]
    Validation { field: String },
}

#[derive(Debug, Display, Error)]
pub enum SourceError {
    #[display("request to {provider} failed")]
    Request { provider: String },
    #[display("failed to parse response from {provider}")]
    ResponseParse { provider: String },
    #[display("invalid price data: {reason}")]
    InvalidData { reason: String },
}

#[derive(Debug, Display, Error)]
pub enum IndicatorError {
    #[display("invalid parameter: {name}")]
    InvalidParameter { name: String },
}

#[derive(Debug, Display, Error, PartialEq)]
pub enum TradeError {
    #[display("invalid amount: {input:?}")]
    InvalidAmount { input: String },
    #[display("insufficient balance: requested {requested}, available {available}")]
    InsufficientBalance { requested: f64, available: f64 },
}

#[derive(Debug, Display, Error)]
pub enum PredictorError {
    #[display("not enough data to train: need {required}, got {available}")]
    NotEnoughData { required: usize, available: usize },
}
