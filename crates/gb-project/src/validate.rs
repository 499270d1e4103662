//! Settings validation logic.

use std::collections::HashSet;

use gb_core::{Tolerances, nearly_equal, to_ml_per_min};

use crate::schema::{InstrumentDef, LATEST_VERSION, RoleDef, Settings};

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Duplicate instrument address: {address}")]
    DuplicateAddress { address: u8 },

    #[error("Invalid value: {field} = {value} ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("More than one diluent instrument: {first} and {second}")]
    MultipleDiluents { first: u8, second: u8 },

    #[error("Source instruments {first} and {second} have overlapping ranges")]
    OverlappingRanges { first: u8, second: u8 },

    #[error("Unsupported version: {version}")]
    UnsupportedVersion { version: u32 },
}

fn invalid(field: impl Into<String>, value: f64, reason: &str) -> ValidationError {
    ValidationError::InvalidValue {
        field: field.into(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

pub fn validate_settings(settings: &Settings) -> Result<(), ValidationError> {
    if settings.version == 0 || settings.version > LATEST_VERSION {
        return Err(ValidationError::UnsupportedVersion {
            version: settings.version,
        });
    }

    let mut addresses = HashSet::new();
    let mut diluent: Option<u8> = None;
    for inst in &settings.instruments {
        if !addresses.insert(inst.address) {
            return Err(ValidationError::DuplicateAddress {
                address: inst.address,
            });
        }
        validate_instrument(inst)?;
        if inst.role == RoleDef::Diluent {
            if let Some(first) = diluent {
                return Err(ValidationError::MultipleDiluents {
                    first,
                    second: inst.address,
                });
            }
            diluent = Some(inst.address);
        }
    }

    let sources: Vec<&InstrumentDef> = settings
        .instruments
        .iter()
        .filter(|i| i.role == RoleDef::Source)
        .collect();
    for (i, a) in sources.iter().enumerate() {
        for b in &sources[i + 1..] {
            if ranges_overlap(a, b) {
                return Err(ValidationError::OverlappingRanges {
                    first: a.address.min(b.address),
                    second: a.address.max(b.address),
                });
            }
        }
    }

    let blend = &settings.blend;
    if !(blend.max_flow_per_channel.is_finite() && blend.max_flow_per_channel > 0.0) {
        return Err(invalid(
            "blend.max_flow_per_channel",
            blend.max_flow_per_channel,
            "must be positive",
        ));
    }
    for (field, value) in [
        ("blend.diluent_ppm", blend.diluent_ppm),
        ("blend.source_ppm", blend.source_ppm),
        ("blend.target_ppm", blend.target_ppm),
    ] {
        if !(value.is_finite() && value >= 0.0) {
            return Err(invalid(field, value, "must be finite and >= 0"));
        }
    }

    let cal = &settings.calibration;
    if !(cal.max_flow_per_channel.is_finite() && cal.max_flow_per_channel > 0.0) {
        return Err(invalid(
            "calibration.max_flow_per_channel",
            cal.max_flow_per_channel,
            "must be positive",
        ));
    }
    for (field, value) in [
        ("calibration.source_ppm", cal.source_ppm),
        ("calibration.initial_ppm", cal.initial_ppm),
        ("calibration.final_ppm", cal.final_ppm),
        ("calibration.step_duration_s", cal.step_duration_s),
    ] {
        if !(value.is_finite() && value >= 0.0) {
            return Err(invalid(field, value, "must be finite and >= 0"));
        }
    }

    Ok(())
}

fn validate_instrument(inst: &InstrumentDef) -> Result<(), ValidationError> {
    let field = |name: &str| format!("instrument {} {}", inst.address, name);

    if !(inst.min_flow.is_finite() && inst.min_flow >= 0.0) {
        return Err(invalid(field("min_flow"), inst.min_flow, "must be finite and >= 0"));
    }
    if !inst.max_flow.is_finite() || inst.max_flow <= inst.min_flow {
        return Err(invalid(field("max_flow"), inst.max_flow, "must exceed min_flow"));
    }
    for (name, value) in [
        ("accuracy.reading_pct", inst.accuracy.reading_pct),
        ("accuracy.full_scale_pct", inst.accuracy.full_scale_pct),
    ] {
        if !(value.is_finite() && value >= 0.0) {
            return Err(invalid(field(name), value, "must be finite and >= 0"));
        }
    }
    Ok(())
}

/// Strict overlap in mL/min; touching endpoints do not count.
fn ranges_overlap(a: &InstrumentDef, b: &InstrumentDef) -> bool {
    let (a_min, a_max) = (
        to_ml_per_min(a.min_flow, a.unit),
        to_ml_per_min(a.max_flow, a.unit),
    );
    let (b_min, b_max) = (
        to_ml_per_min(b.min_flow, b.unit),
        to_ml_per_min(b.max_flow, b.unit),
    );
    let lo = a_min.max(b_min);
    let hi = a_max.min(b_max);
    hi > lo && !nearly_equal(hi, lo, Tolerances::default())
}
