//! Blend planning: allocate, pick instruments, attach an error bar.

use gb_blend::{
    AllocationRequest, AllocationResult, UncertaintyResult, allocate_two_gas_flows,
    flow_uncertainty, format_with_uncertainty, propagate_uncertainty, select_instrument,
};
use gb_core::{Address, FlowUnit, to_ml_per_min};
use gb_instruments::InstrumentRegistry;
use serde::Serialize;
use tracing::debug;

use crate::error::{AppError, AppResult};

/// One instrument and the flow it is to carry.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ChannelPlan {
    pub address: Address,
    /// ln/min
    pub flow: f64,
    pub utilization: f64,
}

/// Everything needed to command one blend.
///
/// Gas 1 of the allocation is the diluent stream, gas 2 the source stream.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BlendPlan {
    pub request: AllocationRequest,
    pub allocation: AllocationResult,
    pub diluent: ChannelPlan,
    /// `None` when the target needs no source gas.
    pub source: Option<ChannelPlan>,
    pub uncertainty: UncertaintyResult,
}

impl BlendPlan {
    /// Expected concentration with its error bar, e.g. `2.00 ± 0.01 ppm`.
    pub fn concentration_display(&self) -> String {
        format_with_uncertainty(
            self.uncertainty.expected_concentration_ppm,
            self.uncertainty.u_concentration_ppm,
            "ppm",
        )
    }
}

/// Plan a blend of the diluent (`request.source1_ppm`) and the source gas
/// (`request.source2_ppm`) against the instruments in `registry`.
///
/// Nothing is commanded here; any failure leaves the instruments as they are.
pub fn plan_blend(
    request: &AllocationRequest,
    registry: &InstrumentRegistry,
) -> AppResult<BlendPlan> {
    let allocation = allocate_two_gas_flows(request)?;
    let diluent_spec = registry.diluent().ok_or(AppError::NoDiluent)?;

    let diluent_flow = allocation.flow1;
    if diluent_flow != 0.0 && !diluent_spec.covers(diluent_flow, FlowUnit::CANONICAL) {
        return Err(AppError::DiluentOutOfRange {
            address: diluent_spec.address,
            flow: diluent_flow,
        });
    }
    let diluent = ChannelPlan {
        address: diluent_spec.address,
        flow: diluent_flow,
        utilization: diluent_spec.utilization(diluent_flow, FlowUnit::CANONICAL),
    };

    let f1_ml = to_ml_per_min(allocation.flow1, FlowUnit::CANONICAL);
    let f2_ml = to_ml_per_min(allocation.flow2, FlowUnit::CANONICAL);

    let (source, uncertainty) = if allocation.flow2 > 0.0 {
        let selection = select_instrument(allocation.flow2, registry.sources())?;
        let source_spec = registry.get(selection.address)?;
        let uncertainty = propagate_uncertainty(
            request.source1_ppm,
            f1_ml,
            request.source2_ppm,
            f2_ml,
            diluent_spec,
            source_spec,
        );
        let source = ChannelPlan {
            address: selection.address,
            flow: allocation.flow2,
            utilization: selection.utilization,
        };
        (Some(source), uncertainty)
    } else {
        // Diluent only: the blend is the diluent itself.
        let uncertainty = UncertaintyResult {
            u_flow1: flow_uncertainty(diluent_spec, f1_ml),
            expected_concentration_ppm: request.source1_ppm,
            ..UncertaintyResult::default()
        };
        (None, uncertainty)
    };

    debug!(
        "Planned {} ppm: diluent {} ln/min on {}, source {:?}",
        request.target_ppm,
        diluent.flow,
        diluent.address,
        source.map(|s| (s.address.get(), s.flow))
    );

    Ok(BlendPlan {
        request: *request,
        allocation,
        diluent,
        source,
        uncertainty,
    })
}
