//! Instrument selection for a required flow.
//!
//! An MFC's absolute error has a fixed full-scale term, so among the instruments
//! whose range covers a flow, the one running closest to its top of range gives
//! the smallest relative error. The choice is greedy: it does not look ahead to
//! later requests against the same pool.

use gb_core::{Address, FlowUnit, ensure_non_negative};
use gb_instruments::InstrumentSpec;
use serde::Serialize;
use tracing::debug;

use crate::error::{BlendError, BlendResult};

/// Chosen instrument and how much of its full scale the flow uses.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Selection {
    pub address: Address,
    pub utilization: f64,
}

/// Pick the instrument that carries `required_flow_lpm` (ln/min) at the highest
/// utilization.
///
/// Only source-role candidates are considered; ranges are converted from each
/// instrument's native unit before comparison. Ties go to the lowest address.
pub fn select_instrument<'a>(
    required_flow_lpm: f64,
    candidates: impl IntoIterator<Item = &'a InstrumentSpec>,
) -> BlendResult<Selection> {
    let required = ensure_non_negative(required_flow_lpm, "required flow")?;

    let mut eligible: Vec<&InstrumentSpec> = candidates
        .into_iter()
        .filter(|spec| spec.role.is_selectable())
        .filter(|spec| spec.covers(required, FlowUnit::CANONICAL))
        .collect();
    eligible.sort_by_key(|spec| spec.address);

    let mut best: Option<Selection> = None;
    for spec in eligible {
        let utilization = spec.utilization(required, FlowUnit::CANONICAL);
        if best.is_none_or(|b| utilization > b.utilization) {
            best = Some(Selection {
                address: spec.address,
                utilization,
            });
        }
    }

    let selection = best.ok_or(BlendError::NoSuitableInstrument {
        required_flow: required,
    })?;
    debug!(
        "Selected address {} for {} ln/min ({:.1}% of full scale)",
        selection.address,
        required,
        selection.utilization * 100.0
    );
    Ok(selection)
}
