//! Blend errors.

use gb_core::GbError;
use thiserror::Error;

/// Result type for allocation, selection and uncertainty operations.
pub type BlendResult<T> = Result<T, BlendError>;

/// Errors raised by the blend engine. None of them leaves partial results behind.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BlendError {
    /// Target is not between the two source concentrations.
    #[error(
        "Target {target_ppm} ppm is not achievable from sources spanning [{min_ppm}, {max_ppm}] ppm"
    )]
    InfeasibleConcentration {
        target_ppm: f64,
        min_ppm: f64,
        max_ppm: f64,
    },

    /// Both sources have the same concentration; the mixing ratio is undefined.
    #[error("Source concentrations must differ (both {ppm} ppm)")]
    DegenerateSources { ppm: f64 },

    /// Scaled flows ended up outside `[0, max_flow]`.
    #[error("No solution within flow constraints: ({flow1}, {flow2}) exceeds [0, {max_flow}]")]
    NoFeasibleSolution {
        flow1: f64,
        flow2: f64,
        max_flow: f64,
    },

    /// No candidate's calibrated range covers the required flow.
    #[error("No instrument range covers {required_flow} ln/min")]
    NoSuitableInstrument { required_flow: f64 },

    /// Target equals the companion source concentration.
    #[error("Target {target_ppm} ppm equals the companion source concentration")]
    DegenerateTarget { target_ppm: f64 },

    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error(transparent)]
    Core(#[from] GbError),
}
