use thiserror::Error;

pub type GbResult<T> = Result<T, GbError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GbError {
    #[error("Non-finite numeric value for {what}: {value}")]
    NonFinite { what: &'static str, value: f64 },

    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error("Unknown flow unit '{unit}' (expected ln/min, l/min, mln/min or ml/min)")]
    UnknownUnit { unit: String },

    #[error("Invariant violated: {what}")]
    Invariant { what: &'static str },
}
