use crate::models::Timeframe;

/// Contract violations by the caller. These are faults, not rejections:
/// the engine refuses to evaluate rather than guessing.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EngineError {
    #[error("no snapshot supplied for timeframe {0}")]
    MissingTimeframe(Timeframe),

    #[error("more than one snapshot supplied for timeframe {0}")]
    DuplicateTimeframe(Timeframe),

    #[error("{timeframe} snapshot has a non-finite value in {field}")]
    NonFiniteValue {
        timeframe: Timeframe,
        field: &'static str,
    },

    #[error("{timeframe} snapshot has non-positive price {price}")]
    NonPositivePrice { timeframe: Timeframe, price: f64 },

    #[error("{timeframe} snapshot has inverted zone in {field}: low {low} > high {high}")]
    InvalidZone {
        timeframe: Timeframe,
        field: &'static str,
        low: f64,
        high: f64,
    },

    #[error("{timeframe} snapshot has volatility bands out of order")]
    InvalidBands { timeframe: Timeframe },

    #[error("invalid risk context: {0}")]
    InvalidRiskContext(String),

    #[error("invalid engine configuration: {0}")]
    InvalidConfig(String),
}
