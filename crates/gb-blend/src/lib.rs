//! gb-blend: concentration-to-flow allocation and uncertainty engine.
//!
//! Provides:
//! - Two-gas allocation: target concentration -> pair of flows under a per-channel cap
//! - Instrument selection: which MFC should carry a given flow
//! - Uncertainty propagation from instrument accuracy specs to concentration
//! - Inverse solving: companion flow for a fixed flow and a target
//! - Tank-fill timing for batch blending
//! - Value ± uncertainty formatting for display
//!
//! Everything here is synchronous and free of I/O; callers that share an
//! instrument pool across threads serialize selection themselves.
//!
//! # Example
//!
//! ```
//! use gb_blend::{AllocationRequest, allocate_two_gas_flows};
//!
//! let request = AllocationRequest {
//!     target_ppm: 1000.0,
//!     source1_ppm: 0.0,
//!     source2_ppm: 200_000.0,
//!     max_flow_per_channel: 1.5,
//! };
//! let flows = allocate_two_gas_flows(&request).unwrap();
//! assert_eq!(flows.flow1, 1.5);
//! assert!((flows.flow2 - 0.0075377).abs() < 1e-6);
//! ```

pub mod allocate;
pub mod error;
pub mod format;
pub mod inverse;
pub mod select;
pub mod tank;
pub mod uncertainty;

// Re-exports for ergonomics
pub use allocate::{AllocationRequest, AllocationResult, MixingRatio, allocate_two_gas_flows, mixing_ratio};
pub use error::{BlendError, BlendResult};
pub use format::format_with_uncertainty;
pub use inverse::{RequiredFlow, required_flow_with_uncertainty, solve_required_flow};
pub use select::{Selection, select_instrument};
pub use tank::{TankFillTimes, tank_fill_times};
pub use uncertainty::{UncertaintyResult, flow_uncertainty, propagate_uncertainty};
