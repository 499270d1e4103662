//! Two-gas flow allocation.
//!
//! Mixing `Q1` of gas 1 (concentration `C1`) with `Q2` of gas 2 (`C2`) gives
//! `C = (C1*Q1 + C2*Q2) / (Q1 + Q2)`. For a target `C_tot` the flow fractions are
//! `r1 = (C_tot - C2) / (C1 - C2)` and `r2 = 1 - r1`; the pair is then scaled so
//! the larger channel runs exactly at the per-channel cap.

use gb_core::{ensure_finite, ensure_non_negative, ppm_to_fraction};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{BlendError, BlendResult};

/// Inputs of a two-gas allocation. Concentrations in ppm, cap in ln/min.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AllocationRequest {
    pub target_ppm: f64,
    pub source1_ppm: f64,
    pub source2_ppm: f64,
    pub max_flow_per_channel: f64,
}

/// Fractions of the total flow contributed by each source; `r1 + r2 == 1`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MixingRatio {
    pub r1: f64,
    pub r2: f64,
}

/// Allocated flows, in the unit of the request's cap.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AllocationResult {
    pub flow1: f64,
    pub flow2: f64,
    pub ratio: MixingRatio,
}

impl AllocationResult {
    pub fn total_flow(&self) -> f64 {
        self.flow1 + self.flow2
    }
}

/// Flow fractions that blend `c1_ppm` and `c2_ppm` into `target_ppm`.
///
/// # Errors
///
/// - `DegenerateSources` when the sources are equal, whatever the target
/// - `InfeasibleConcentration` when the target lies outside `[min(C1,C2), max(C1,C2)]`
pub fn mixing_ratio(target_ppm: f64, c1_ppm: f64, c2_ppm: f64) -> BlendResult<MixingRatio> {
    ensure_non_negative(target_ppm, "target concentration")?;
    ensure_non_negative(c1_ppm, "source 1 concentration")?;
    ensure_non_negative(c2_ppm, "source 2 concentration")?;

    let c_tot = ppm_to_fraction(target_ppm);
    let c1 = ppm_to_fraction(c1_ppm);
    let c2 = ppm_to_fraction(c2_ppm);

    if c1 == c2 {
        return Err(BlendError::DegenerateSources { ppm: c1_ppm });
    }
    if c_tot < c1.min(c2) || c_tot > c1.max(c2) {
        return Err(BlendError::InfeasibleConcentration {
            target_ppm,
            min_ppm: c1_ppm.min(c2_ppm),
            max_ppm: c1_ppm.max(c2_ppm),
        });
    }

    let r1 = (c_tot - c2) / (c1 - c2);
    Ok(MixingRatio { r1, r2: 1.0 - r1 })
}

/// Flows that blend the two sources into the target concentration.
///
/// The channel with the larger ratio is saturated at `max_flow_per_channel`;
/// the other gets the proportional share below it.
///
/// # Errors
///
/// Everything [`mixing_ratio`] raises, `InvalidArg` for a non-positive cap, and
/// `NoFeasibleSolution` if the scaled pair leaves `[0, cap]`.
pub fn allocate_two_gas_flows(request: &AllocationRequest) -> BlendResult<AllocationResult> {
    let q_max = ensure_finite(request.max_flow_per_channel, "max flow per channel")?;
    if q_max <= 0.0 {
        return Err(BlendError::InvalidArg {
            what: "max flow per channel must be positive",
        });
    }

    let ratio = mixing_ratio(
        request.target_ppm,
        request.source1_ppm,
        request.source2_ppm,
    )?;
    let MixingRatio { r1, r2 } = ratio;

    let scale = q_max / r1.max(r2);
    let (flow1, flow2) = if r1 >= r2 {
        (q_max, r2 * scale)
    } else {
        (r1 * scale, q_max)
    };

    let outside = |q: f64| !(0.0..=q_max).contains(&q);
    if outside(flow1) || outside(flow2) {
        return Err(BlendError::NoFeasibleSolution {
            flow1,
            flow2,
            max_flow: q_max,
        });
    }

    debug!(
        "Allocated {} + {} for {} ppm (r1={}, r2={})",
        flow1, flow2, request.target_ppm, r1, r2
    );
    Ok(AllocationResult {
        flow1,
        flow2,
        ratio,
    })
}
