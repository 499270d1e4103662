//! Shared application service layer for gasblend.
//!
//! Sits between the CLI and the calculation crates: settings handling, blend
//! planning, calibration step generation and the background sequence worker.

pub mod calibration;
pub mod error;
pub mod plan;
pub mod sequence;
pub mod settings_service;

pub use calibration::{
    DurationEstimate, DurationUnit, StepMode, estimated_duration, generate_steps, linear_steps,
    manual_steps, parse_manual_steps, with_return_pass,
};
pub use error::{AppError, AppResult};
pub use plan::{BlendPlan, ChannelPlan, plan_blend};
pub use sequence::{
    SequenceConfig, SequenceMessage, SequenceWorker, StepRecord, apply_plan,
};
pub use settings_service::{
    InstrumentSummary, build_registry, list_instruments, load_settings, save_settings,
    simulated_controller, validate_settings,
};
