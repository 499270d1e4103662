//! First-order propagation of flow uncertainty into blended concentration.
//!
//! For `C = (C1*F1 + C2*F2) / (F1 + F2)`:
//!
//! ```text
//! dC/dF1 = (C1 - C2) * F2 / (F1 + F2)^2
//! dC/dF2 = (C2 - C1) * F1 / (F1 + F2)^2
//! u_C    = sqrt((dC/dF1 * u_F1)^2 + (dC/dF2 * u_F2)^2)
//! ```
//!
//! The two instruments' errors are treated as independent. Flows are in mL/min,
//! concentrations in ppm.

use gb_instruments::InstrumentSpec;
use serde::Serialize;

/// Concentration error bar and the terms that produced it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct UncertaintyResult {
    /// 1-sigma concentration uncertainty, ppm.
    pub u_concentration_ppm: f64,
    /// 1-sigma flow uncertainty of channel 1, mL/min.
    pub u_flow1: f64,
    /// 1-sigma flow uncertainty of channel 2, mL/min.
    pub u_flow2: f64,
    /// ppm per mL/min.
    pub sensitivity_dc_df1: f64,
    /// ppm per mL/min.
    pub sensitivity_dc_df2: f64,
    pub expected_concentration_ppm: f64,
}

impl UncertaintyResult {
    /// `u_C / C_expected` in percent; 0 when nothing is expected.
    pub fn relative_pct(&self) -> f64 {
        if self.expected_concentration_ppm > 0.0 {
            self.u_concentration_ppm / self.expected_concentration_ppm * 100.0
        } else {
            0.0
        }
    }
}

/// `±(Rd% * |flow| + FS% * full scale)` in mL/min.
///
/// The full-scale term uses the instrument's own rating, not any allocation cap.
pub fn flow_uncertainty(spec: &InstrumentSpec, flow_ml_per_min: f64) -> f64 {
    spec.flow_uncertainty_ml_per_min(flow_ml_per_min)
}

/// Expected concentration and its uncertainty for two metered flows.
///
/// Zero total flow yields zero concentration, zero sensitivities and zero
/// concentration uncertainty; the flow uncertainties are still reported.
pub fn propagate_uncertainty(
    c1_ppm: f64,
    flow1_ml_per_min: f64,
    c2_ppm: f64,
    flow2_ml_per_min: f64,
    spec1: &InstrumentSpec,
    spec2: &InstrumentSpec,
) -> UncertaintyResult {
    let u_flow1 = flow_uncertainty(spec1, flow1_ml_per_min);
    let u_flow2 = flow_uncertainty(spec2, flow2_ml_per_min);

    let f_total = flow1_ml_per_min + flow2_ml_per_min;
    if f_total == 0.0 {
        return UncertaintyResult {
            u_flow1,
            u_flow2,
            ..UncertaintyResult::default()
        };
    }

    let expected = (c1_ppm * flow1_ml_per_min + c2_ppm * flow2_ml_per_min) / f_total;
    let f_total_sq = f_total * f_total;
    let dc_df1 = (c1_ppm - c2_ppm) * flow2_ml_per_min / f_total_sq;
    let dc_df2 = (c2_ppm - c1_ppm) * flow1_ml_per_min / f_total_sq;

    let u_c = ((dc_df1 * u_flow1).powi(2) + (dc_df2 * u_flow2).powi(2)).sqrt();

    UncertaintyResult {
        u_concentration_ppm: u_c,
        u_flow1,
        u_flow2,
        sensitivity_dc_df1: dc_df1,
        sensitivity_dc_df2: dc_df2,
        expected_concentration_ppm: expected,
    }
}
