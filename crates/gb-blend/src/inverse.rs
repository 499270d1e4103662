//! Companion flow for a fixed flow and a target concentration.

use gb_core::{ensure_finite, ensure_non_negative};
use gb_instruments::InstrumentSpec;
use serde::Serialize;
use tracing::debug;

use crate::error::{BlendError, BlendResult};
use crate::uncertainty::{UncertaintyResult, propagate_uncertainty};

/// Required second flow and the uncertainty of the resulting blend.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct RequiredFlow {
    /// mL/min
    pub flow2_ml_per_min: f64,
    pub achieved_concentration_ppm: f64,
    /// `u_C / target * 100`, or 0 for a zero target.
    pub relative_error_pct: f64,
    pub uncertainty: UncertaintyResult,
}

/// `F2 = F1 * (C_target - C1) / (C2 - C_target)`.
///
/// # Errors
///
/// `DegenerateTarget` when `C2 == C_target`.
pub fn solve_required_flow(
    target_ppm: f64,
    c1_ppm: f64,
    flow1: f64,
    c2_ppm: f64,
) -> BlendResult<f64> {
    let target = ensure_finite(target_ppm, "target concentration")?;
    let c1 = ensure_finite(c1_ppm, "source 1 concentration")?;
    let c2 = ensure_finite(c2_ppm, "source 2 concentration")?;
    let flow1 = ensure_non_negative(flow1, "fixed flow")?;

    let denominator = c2 - target;
    if denominator == 0.0 {
        return Err(BlendError::DegenerateTarget { target_ppm });
    }
    Ok(flow1 * (target - c1) / denominator)
}

/// Solve for F2 (mL/min) and propagate both instruments' errors.
///
/// A degenerate target (`C2 == C_target`) is reported as an all-zero result so
/// a live display loop keeps running; other input errors are returned.
pub fn required_flow_with_uncertainty(
    target_ppm: f64,
    c1_ppm: f64,
    flow1_ml_per_min: f64,
    c2_ppm: f64,
    spec1: &InstrumentSpec,
    spec2: &InstrumentSpec,
) -> BlendResult<RequiredFlow> {
    let flow2 = match solve_required_flow(target_ppm, c1_ppm, flow1_ml_per_min, c2_ppm) {
        Ok(flow2) => flow2,
        Err(BlendError::DegenerateTarget { .. }) => {
            debug!("Target {} ppm equals source 2; no companion flow", target_ppm);
            return Ok(RequiredFlow::default());
        }
        Err(e) => return Err(e),
    };

    let uncertainty =
        propagate_uncertainty(c1_ppm, flow1_ml_per_min, c2_ppm, flow2, spec1, spec2);
    let relative_error_pct = if target_ppm > 0.0 {
        uncertainty.u_concentration_ppm / target_ppm * 100.0
    } else {
        0.0
    };

    Ok(RequiredFlow {
        flow2_ml_per_min: flow2,
        achieved_concentration_ppm: target_ppm,
        relative_error_pct,
        uncertainty,
    })
}
