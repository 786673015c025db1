//! Error types for the estate intelligence service

use thiserror::Error;

/// Result type alias for estate operations
pub type Result<T> = std::result::Result<T, EstateError>;

#[derive(Error, Debug)]
pub enum EstateError {

    // =============================
    // Projection Input Errors
    // =============================

    #[error("Invalid base price: {0}")]
    InvalidPrice(f64),

    #[error("Unknown currency code: {0}")]
    UnknownCurrency(String),

    #[error("No conversion rate configured for {0}")]
    MissingRate(String),

    #[error("Purchase year {year} outside projection range {baseline}..={horizon}")]
    PurchaseYearOutOfRange { year: i32, baseline: i32, horizon: i32 },

    #[error("Unsupported purchase year: {0}")]
    UnsupportedPurchaseYear(i32),

    #[error("Plot not found: {0}")]
    PlotNotFound(usize),

    // =============================
    // Configuration Errors
    // =============================

    #[error("Invalid catalog: {0}")]
    InvalidCatalog(String),

    #[error("Configuration error: {0}")]
    Config(String),

    // =============================
    // Concierge Errors
    // =============================

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Upstream responder error: {0}")]
    Upstream(String),

    // =============================
    // External Library Conversions
    // =============================

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("HTTP client error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl EstateError {
    /// True for errors caused by what the caller sent rather than by the service
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            EstateError::InvalidPrice(_)
                | EstateError::UnknownCurrency(_)
                | EstateError::MissingRate(_)
                | EstateError::PurchaseYearOutOfRange { .. }
                | EstateError::UnsupportedPurchaseYear(_)
                | EstateError::InvalidInput(_)
        )
    }
}
