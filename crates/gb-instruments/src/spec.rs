//! Instrument specifications: calibrated range, role and accuracy.

use gb_core::{Address, FlowUnit, Tolerances, ensure_finite, nearly_equal};

use crate::error::{InstrumentError, InstrumentResult};

/// Vendor accuracy figure: `±(reading_pct %Rd + full_scale_pct %FS)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AccuracySpec {
    /// Error proportional to the actual reading, in percent.
    pub reading_pct: f64,
    /// Error proportional to the instrument's full scale, in percent.
    pub full_scale_pct: f64,
}

impl Default for AccuracySpec {
    fn default() -> Self {
        Self {
            reading_pct: 0.5,
            full_scale_pct: 0.1,
        }
    }
}

impl AccuracySpec {
    pub fn new(reading_pct: f64, full_scale_pct: f64) -> Option<Self> {
        let valid = |v: f64| v.is_finite() && v >= 0.0;
        (valid(reading_pct) && valid(full_scale_pct)).then_some(Self {
            reading_pct,
            full_scale_pct,
        })
    }

    /// Absolute 1-sigma error of a reading, in the unit of `reading` and `full_scale`.
    pub fn absolute_error(&self, reading: f64, full_scale: f64) -> f64 {
        self.reading_pct / 100.0 * reading.abs() + self.full_scale_pct / 100.0 * full_scale
    }
}

/// What an instrument is wired to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum InstrumentRole {
    /// Carries the trace-gas source; eligible for selection.
    #[default]
    Source,
    /// Dedicated base-gas channel.
    Diluent,
    /// Wired to something else (e.g. helium); never selected.
    Auxiliary,
}

impl InstrumentRole {
    pub fn is_selectable(self) -> bool {
        matches!(self, Self::Source)
    }
}

/// A physical MFC channel.
#[derive(Clone, Debug, PartialEq)]
pub struct InstrumentSpec {
    pub address: Address,
    pub name: String,
    pub role: InstrumentRole,
    /// Native unit of `min_flow` / `max_flow`.
    pub unit: FlowUnit,
    pub min_flow: f64,
    /// Full-scale rating.
    pub max_flow: f64,
    pub accuracy: AccuracySpec,
}

impl InstrumentSpec {
    /// Source-role instrument with the default accuracy spec.
    pub fn new(
        address: Address,
        unit: FlowUnit,
        min_flow: f64,
        max_flow: f64,
    ) -> InstrumentResult<Self> {
        let min_flow = ensure_finite(min_flow, "min_flow")?;
        let max_flow = ensure_finite(max_flow, "max_flow")?;
        if min_flow < 0.0 {
            return Err(InstrumentError::InvalidSpec {
                address,
                what: "min_flow must be >= 0",
            });
        }
        if max_flow <= min_flow {
            return Err(InstrumentError::InvalidSpec {
                address,
                what: "max_flow must exceed min_flow",
            });
        }
        Ok(Self {
            address,
            name: format!("MFC {address}"),
            role: InstrumentRole::Source,
            unit,
            min_flow,
            max_flow,
            accuracy: AccuracySpec::default(),
        })
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_role(mut self, role: InstrumentRole) -> Self {
        self.role = role;
        self
    }

    pub fn with_accuracy(mut self, accuracy: AccuracySpec) -> Self {
        self.accuracy = accuracy;
        self
    }

    /// `(min_flow, max_flow)` expressed in `unit`.
    pub fn range_in(&self, unit: FlowUnit) -> (f64, f64) {
        (
            self.unit.convert(self.min_flow, unit),
            self.unit.convert(self.max_flow, unit),
        )
    }

    pub fn full_scale_ml_per_min(&self) -> f64 {
        gb_core::to_ml_per_min(self.max_flow, self.unit)
    }

    /// Whether `flow` (in `unit`) lies inside the calibrated range.
    pub fn covers(&self, flow: f64, unit: FlowUnit) -> bool {
        let (min, max) = self.range_in(unit);
        min <= flow && flow <= max
    }

    /// `flow / max_flow`, with `flow` given in `unit`.
    pub fn utilization(&self, flow: f64, unit: FlowUnit) -> f64 {
        let (_, max) = self.range_in(unit);
        flow / max
    }

    /// 1-sigma flow uncertainty in mL/min for a flow given in mL/min.
    pub fn flow_uncertainty_ml_per_min(&self, flow_ml_per_min: f64) -> f64 {
        self.accuracy
            .absolute_error(flow_ml_per_min, self.full_scale_ml_per_min())
    }

    /// Strict overlap of calibrated ranges; shared endpoints do not count.
    pub fn overlaps(&self, other: &InstrumentSpec) -> bool {
        let unit = FlowUnit::MillilitersPerMinute;
        let (a_min, a_max) = self.range_in(unit);
        let (b_min, b_max) = other.range_in(unit);
        let below = |x: f64, y: f64| x < y && !nearly_equal(x, y, Tolerances::default());
        below(a_min, b_max) && below(b_min, a_max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn low_flow() -> InstrumentSpec {
        InstrumentSpec::new(Address::new(8), FlowUnit::MillilitersPerMinute, 0.1, 10.0).unwrap()
    }

    #[test]
    fn rejects_inverted_range() {
        let err =
            InstrumentSpec::new(Address::new(1), FlowUnit::LitersPerMinute, 1.0, 1.0).unwrap_err();
        assert!(matches!(err, InstrumentError::InvalidSpec { .. }));

        let err =
            InstrumentSpec::new(Address::new(1), FlowUnit::LitersPerMinute, -0.1, 1.0).unwrap_err();
        assert!(matches!(err, InstrumentError::InvalidSpec { .. }));
    }

    #[test]
    fn rejects_non_finite_range() {
        let err = InstrumentSpec::new(Address::new(1), FlowUnit::LitersPerMinute, 0.0, f64::NAN)
            .unwrap_err();
        assert!(matches!(err, InstrumentError::Core(_)));
    }

    #[test]
    fn range_converts_to_liters() {
        let spec = low_flow();
        let (min, max) = spec.range_in(FlowUnit::LitersPerMinute);
        assert!((min - 0.0001).abs() < 1e-15);
        assert!((max - 0.01).abs() < 1e-15);
        assert!(spec.covers(0.005, FlowUnit::LitersPerMinute));
        assert!(!spec.covers(0.02, FlowUnit::LitersPerMinute));
    }

    #[test]
    fn vendor_uncertainty_formula() {
        let spec = low_flow();
        // 0.5% of 5 + 0.1% of 10
        let u = spec.flow_uncertainty_ml_per_min(5.0);
        assert!((u - 0.035).abs() < 1e-12);
        // reading term uses |flow|
        assert_eq!(
            spec.flow_uncertainty_ml_per_min(-5.0),
            spec.flow_uncertainty_ml_per_min(5.0)
        );
    }

    #[test]
    fn accuracy_rejects_negative_terms() {
        assert!(AccuracySpec::new(-0.5, 0.1).is_none());
        assert!(AccuracySpec::new(0.5, f64::INFINITY).is_none());
        assert_eq!(AccuracySpec::new(0.5, 0.1), Some(AccuracySpec::default()));
    }

    #[test]
    fn overlap_ignores_shared_endpoint() {
        let medium =
            InstrumentSpec::new(Address::new(5), FlowUnit::MillilitersPerMinute, 10.0, 150.0)
                .unwrap();
        let high =
            InstrumentSpec::new(Address::new(3), FlowUnit::LitersPerMinute, 0.15, 1.5).unwrap();
        assert!(!low_flow().overlaps(&medium));
        assert!(!medium.overlaps(&high));

        let wide =
            InstrumentSpec::new(Address::new(9), FlowUnit::MillilitersPerMinute, 5.0, 50.0).unwrap();
        assert!(wide.overlaps(&low_flow()));
        assert!(wide.overlaps(&medium));
    }
}
