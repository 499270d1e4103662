//! gb-core: shared foundation for gasblend.
//!
//! Contains:
//! - units (flow units and their conversion, ppm helpers)
//! - numeric (Real + tolerances + float helpers)
//! - ids (bus addresses of flow instruments)
//! - error (shared error types)

pub mod error;
pub mod ids;
pub mod numeric;
pub mod units;

// Re-exports: nice ergonomics for downstream crates
pub use error::{GbError, GbResult};
pub use ids::*;
pub use numeric::*;
pub use units::*;
