// gb-core/src/units.rs

use core::fmt;
use core::str::FromStr;

use crate::GbError;

/// Parts per million in one unit fraction.
pub const PPM_PER_UNIT: f64 = 1_000_000.0;

/// Volumetric flow units reported by the instruments.
///
/// Normal-condition spellings (`ln/min`, `mln/min`) and plain spellings
/// (`l/min`, `ml/min`) map onto the same variant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FlowUnit {
    #[cfg_attr(feature = "serde", serde(rename = "ln/min", alias = "l/min"))]
    LitersPerMinute,
    #[cfg_attr(feature = "serde", serde(rename = "mln/min", alias = "ml/min"))]
    MillilitersPerMinute,
}

impl FlowUnit {
    /// Canonical unit for allocation and selection.
    pub const CANONICAL: FlowUnit = FlowUnit::LitersPerMinute;

    /// Label as the instruments spell it.
    pub fn label(self) -> &'static str {
        match self {
            Self::LitersPerMinute => "ln/min",
            Self::MillilitersPerMinute => "mln/min",
        }
    }

    fn ml_per_min_factor(self) -> f64 {
        match self {
            Self::LitersPerMinute => 1000.0,
            Self::MillilitersPerMinute => 1.0,
        }
    }

    /// Convert `value` expressed in `self` into `to`.
    pub fn convert(self, value: f64, to: FlowUnit) -> f64 {
        if self == to {
            return value;
        }
        value * self.ml_per_min_factor() / to.ml_per_min_factor()
    }
}

impl fmt::Display for FlowUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for FlowUnit {
    type Err = GbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ln/min" | "l/min" => Ok(Self::LitersPerMinute),
            "mln/min" | "ml/min" => Ok(Self::MillilitersPerMinute),
            _ => Err(GbError::UnknownUnit {
                unit: s.to_string(),
            }),
        }
    }
}

#[inline]
pub fn ppm_to_fraction(ppm: f64) -> f64 {
    ppm / PPM_PER_UNIT
}

#[inline]
pub fn fraction_to_ppm(fraction: f64) -> f64 {
    fraction * PPM_PER_UNIT
}

/// Flow in mL/min, the unit the accuracy specs are evaluated in.
#[inline]
pub fn to_ml_per_min(flow: f64, unit: FlowUnit) -> f64 {
    unit.convert(flow, FlowUnit::MillilitersPerMinute)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn liters_to_milliliters_is_times_thousand() {
        assert_eq!(to_ml_per_min(1.5, FlowUnit::LitersPerMinute), 1500.0);
        assert_eq!(to_ml_per_min(10.0, FlowUnit::MillilitersPerMinute), 10.0);
        assert_eq!(
            FlowUnit::MillilitersPerMinute.convert(10.0, FlowUnit::LitersPerMinute),
            0.01
        );
    }

    #[test]
    fn parse_vendor_spellings() {
        assert_eq!("ln/min".parse::<FlowUnit>().unwrap(), FlowUnit::LitersPerMinute);
        assert_eq!("L/min".parse::<FlowUnit>().unwrap(), FlowUnit::LitersPerMinute);
        assert_eq!(
            " mln/min ".parse::<FlowUnit>().unwrap(),
            FlowUnit::MillilitersPerMinute
        );
        assert_eq!(
            "ml/min".parse::<FlowUnit>().unwrap(),
            FlowUnit::MillilitersPerMinute
        );
    }

    #[test]
    fn unknown_unit_is_an_error() {
        assert!(matches!(
            "sccm".parse::<FlowUnit>(),
            Err(GbError::UnknownUnit { unit }) if unit == "sccm"
        ));
    }

    #[test]
    fn decimal_range_endpoints_convert_exactly() {
        // setpoint counts are truncated, so endpoints must not drift below
        assert_eq!(to_ml_per_min(0.15, FlowUnit::LitersPerMinute), 150.0);
        assert_eq!(to_ml_per_min(0.005, FlowUnit::LitersPerMinute), 5.0);
        assert_eq!(
            FlowUnit::MillilitersPerMinute.convert(1500.0, FlowUnit::LitersPerMinute),
            1.5
        );
        assert_eq!(
            FlowUnit::MillilitersPerMinute.convert(150.0, FlowUnit::LitersPerMinute),
            0.15
        );
    }

    #[test]
    fn ppm_fraction_helpers() {
        assert_eq!(ppm_to_fraction(200_000.0), 0.2);
        assert_eq!(fraction_to_ppm(0.005), 5000.0);
    }
}
