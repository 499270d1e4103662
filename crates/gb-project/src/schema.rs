//! Settings schema definitions.

use gb_core::{Address, FlowUnit};
use gb_instruments::{
    AccuracySpec, InstrumentError, InstrumentRegistry, InstrumentResult, InstrumentRole,
    InstrumentSpec,
};
use serde::{Deserialize, Serialize};

/// Current settings file version.
pub const LATEST_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Settings {
    pub version: u32,
    #[serde(default)]
    pub connection: ConnectionDef,
    #[serde(default)]
    pub instruments: Vec<InstrumentDef>,
    #[serde(default)]
    pub blend: BlendDef,
    #[serde(default)]
    pub calibration: CalibrationDef,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConnectionDef {
    pub port: String,
    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InstrumentDef {
    pub address: u8,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub role: RoleDef,
    pub unit: FlowUnit,
    #[serde(default)]
    pub min_flow: f64,
    pub max_flow: f64,
    #[serde(default)]
    pub accuracy: AccuracyDef,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum RoleDef {
    #[default]
    Source,
    Diluent,
    Auxiliary,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct AccuracyDef {
    pub reading_pct: f64,
    pub full_scale_pct: f64,
}

/// Defaults for the blend form.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BlendDef {
    /// ln/min
    pub max_flow_per_channel: f64,
    pub diluent_ppm: f64,
    pub source_ppm: f64,
    pub target_ppm: f64,
}

/// Defaults for a calibration sequence.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CalibrationDef {
    /// Concentration of the bottle feeding the source instruments.
    pub source_ppm: f64,
    /// ln/min
    pub max_flow_per_channel: f64,
    pub initial_ppm: f64,
    pub final_ppm: f64,
    pub steps: usize,
    pub step_duration_s: f64,
    #[serde(default)]
    pub back_and_forth: bool,
}

fn default_baud_rate() -> u32 {
    38_400
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: LATEST_VERSION,
            connection: ConnectionDef::default(),
            instruments: default_instruments(),
            blend: BlendDef::default(),
            calibration: CalibrationDef::default(),
        }
    }
}

impl Default for ConnectionDef {
    fn default() -> Self {
        Self {
            port: "COM5".to_string(),
            baud_rate: default_baud_rate(),
        }
    }
}

impl Default for AccuracyDef {
    fn default() -> Self {
        let spec = AccuracySpec::default();
        Self {
            reading_pct: spec.reading_pct,
            full_scale_pct: spec.full_scale_pct,
        }
    }
}

impl Default for BlendDef {
    fn default() -> Self {
        Self {
            max_flow_per_channel: 1.5,
            diluent_ppm: 0.0,
            // 2 ppm needs ~0.6 mln/min of source, inside the low-flow range
            source_ppm: 5000.0,
            target_ppm: 2.0,
        }
    }
}

impl Default for CalibrationDef {
    fn default() -> Self {
        Self {
            source_ppm: 5000.0,
            max_flow_per_channel: 1.0,
            initial_ppm: 0.0,
            final_ppm: 100.0,
            steps: 10,
            step_duration_s: 60.0,
            back_and_forth: false,
        }
    }
}

fn mln(address: u8, name: &str, role: RoleDef, min_flow: f64, max_flow: f64) -> InstrumentDef {
    InstrumentDef {
        address,
        name: name.to_string(),
        role,
        unit: FlowUnit::MillilitersPerMinute,
        min_flow,
        max_flow,
        accuracy: AccuracyDef::default(),
    }
}

/// The laboratory's instrument table.
pub fn default_instruments() -> Vec<InstrumentDef> {
    vec![
        mln(3, "High flow", RoleDef::Source, 150.0, 1500.0),
        mln(5, "Medium flow", RoleDef::Source, 10.0, 150.0),
        mln(8, "Low flow", RoleDef::Source, 0.1, 10.0),
        mln(10, "Helium", RoleDef::Auxiliary, 0.0, 2500.0),
        mln(20, "Base gas", RoleDef::Diluent, 0.0, 1500.0),
    ]
}

impl From<RoleDef> for InstrumentRole {
    fn from(role: RoleDef) -> Self {
        match role {
            RoleDef::Source => InstrumentRole::Source,
            RoleDef::Diluent => InstrumentRole::Diluent,
            RoleDef::Auxiliary => InstrumentRole::Auxiliary,
        }
    }
}

impl InstrumentDef {
    pub fn to_spec(&self) -> InstrumentResult<InstrumentSpec> {
        let address = Address::new(self.address);
        let accuracy = AccuracySpec::new(self.accuracy.reading_pct, self.accuracy.full_scale_pct)
            .ok_or(InstrumentError::InvalidSpec {
                address,
                what: "accuracy terms must be finite and >= 0",
            })?;
        let mut spec = InstrumentSpec::new(address, self.unit, self.min_flow, self.max_flow)?
            .with_role(self.role.into())
            .with_accuracy(accuracy);
        if !self.name.is_empty() {
            spec = spec.with_name(self.name.clone());
        }
        Ok(spec)
    }
}

impl Settings {
    /// Build the registry that selection and the controller work against.
    pub fn to_registry(&self) -> InstrumentResult<InstrumentRegistry> {
        let specs = self
            .instruments
            .iter()
            .map(InstrumentDef::to_spec)
            .collect::<InstrumentResult<Vec<_>>>()?;
        InstrumentRegistry::from_specs(specs)
    }
}
