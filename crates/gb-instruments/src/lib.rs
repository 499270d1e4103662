//! gb-instruments: mass-flow controller model for gasblend.
//!
//! Provides:
//! - Accuracy specifications (reading + full-scale error terms)
//! - Instrument specs with calibrated ranges and roles
//! - `InstrumentRegistry`, the explicit configuration object passed to selection
//!   and uncertainty code
//! - `InstrumentDriver`, the read/write boundary to the serial bus
//! - `FlowController`, which owns setpoint bookkeeping on top of a driver
//! - `SimulatedDriver`, an in-memory bus for tests and dry runs
//!
//! # Example
//!
//! ```
//! use gb_core::{Address, FlowUnit};
//! use gb_instruments::{FlowController, InstrumentRegistry, InstrumentSpec, SimulatedDriver};
//!
//! let spec = InstrumentSpec::new(Address::new(8), FlowUnit::MillilitersPerMinute, 0.1, 10.0).unwrap();
//! let registry = InstrumentRegistry::from_specs([spec]).unwrap();
//! let driver = SimulatedDriver::for_registry(&registry);
//!
//! let mut controller = FlowController::new(driver, registry);
//! controller.set_flow(Address::new(8), 0.005).unwrap(); // 5 mln/min, in ln/min
//! assert_eq!(controller.setpoint(Address::new(8)), 0.005);
//! ```

pub mod controller;
pub mod driver;
pub mod error;
pub mod registry;
pub mod sim;
pub mod spec;

pub use controller::FlowController;
pub use driver::{
    InstrumentDriver, Parameter, Readings, SETPOINT_FULL_SCALE_COUNTS, counts_to_flow,
    flow_to_counts,
};
pub use error::{InstrumentError, InstrumentResult};
pub use registry::InstrumentRegistry;
pub use sim::SimulatedDriver;
pub use spec::{AccuracySpec, InstrumentRole, InstrumentSpec};
