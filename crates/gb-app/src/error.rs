//! Error types for the gb-app service layer.

use gb_blend::BlendError;
use gb_instruments::InstrumentError;

/// Unified error for the CLI and the sequence worker.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Settings error: {0}")]
    Settings(String),

    #[error(transparent)]
    Blend(#[from] BlendError),

    #[error(transparent)]
    Instrument(#[from] InstrumentError),

    #[error("No diluent instrument configured")]
    NoDiluent,

    #[error("Diluent flow {flow} ln/min is outside the range of address {address}")]
    DiluentOutOfRange { address: gb_core::Address, flow: f64 },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Sequence worker failed: {0}")]
    Worker(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for gb-app operations.
pub type AppResult<T> = Result<T, AppError>;

impl From<gb_project::ProjectError> for AppError {
    fn from(err: gb_project::ProjectError) -> Self {
        AppError::Settings(err.to_string())
    }
}

impl From<gb_project::ValidationError> for AppError {
    fn from(err: gb_project::ValidationError) -> Self {
        AppError::Settings(err.to_string())
    }
}

impl From<gb_core::GbError> for AppError {
    fn from(err: gb_core::GbError) -> Self {
        AppError::InvalidInput(err.to_string())
    }
}
