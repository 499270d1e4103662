//! Instrument errors.

use gb_core::{Address, GbError};
use thiserror::Error;

use crate::driver::Parameter;

/// Result type for instrument operations.
pub type InstrumentResult<T> = Result<T, InstrumentError>;

/// Errors raised by the registry and the flow controller.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InstrumentError {
    /// No instrument is registered at this address.
    #[error("Unknown instrument at address {address}")]
    UnknownInstrument { address: Address },

    /// Two instruments claim the same bus address.
    #[error("Duplicate instrument address {address}")]
    DuplicateAddress { address: Address },

    /// Range or accuracy values that cannot describe a real instrument.
    #[error("Invalid instrument spec for address {address}: {what}")]
    InvalidSpec { address: Address, what: &'static str },

    /// Commanded flow lies outside `[0, max_flow]`.
    #[error("Setpoint {flow} {unit} out of range for address {address} (max {max_flow} {unit})")]
    SetpointOutOfRange {
        address: Address,
        flow: f64,
        max_flow: f64,
        unit: gb_core::FlowUnit,
    },

    /// The driver reported a failed write.
    #[error("Driver write of {parameter:?} failed for address {address}")]
    WriteFailed {
        address: Address,
        parameter: Parameter,
    },

    #[error(transparent)]
    Core(#[from] GbError),
}
