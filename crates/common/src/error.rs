use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// An indicator window has not filled yet at this index.
    #[error("{indicator} not yet available at index {index}")]
    DataUnavailable { indicator: &'static str, index: usize },

    /// A quotient the strategy depends on has no finite value.
    #[error("Division undefined: {0}")]
    DivisionUndefined(String),

    #[error("Invalid candle series: {0}")]
    InvalidCandles(String),

    #[error("Exchange API error: {0}")]
    Exchange(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// True for failures raised by the exchange collaborator: network errors,
    /// non-success HTTP statuses and malformed payloads.
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Exchange(_) | Error::Http(_) | Error::Json(_))
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
