//! Settings loading, saving and introspection.

use std::path::Path;

use gb_core::FlowUnit;
use gb_instruments::{FlowController, InstrumentRegistry, SimulatedDriver};
use gb_project::Settings;
use serde::Serialize;

use crate::error::{AppError, AppResult};

/// One row of the instrument table.
#[derive(Debug, Clone, Serialize)]
pub struct InstrumentSummary {
    pub address: u8,
    pub name: String,
    pub role: String,
    pub range: String,
    pub accuracy: String,
}

/// Load settings from `path`, or the built-in laboratory defaults.
pub fn load_settings(path: Option<&Path>) -> AppResult<Settings> {
    Ok(gb_project::load_or_default(path)?)
}

/// Write `settings` to `path`. An existing file is kept unless `overwrite` is set.
pub fn save_settings(path: &Path, settings: &Settings, overwrite: bool) -> AppResult<()> {
    if path.exists() && !overwrite {
        return Err(AppError::InvalidInput(format!(
            "{} already exists",
            path.display()
        )));
    }
    Ok(gb_project::save_yaml(path, settings)?)
}

pub fn validate_settings(settings: &Settings) -> AppResult<()> {
    Ok(gb_project::validate_settings(settings)?)
}

pub fn build_registry(settings: &Settings) -> AppResult<InstrumentRegistry> {
    validate_settings(settings)?;
    Ok(settings.to_registry()?)
}

/// A controller wired to the in-memory bus.
pub fn simulated_controller(settings: &Settings) -> AppResult<FlowController<SimulatedDriver>> {
    let registry = build_registry(settings)?;
    let driver = SimulatedDriver::for_registry(&registry);
    Ok(FlowController::new(driver, registry))
}

pub fn list_instruments(registry: &InstrumentRegistry) -> Vec<InstrumentSummary> {
    registry
        .iter()
        .map(|spec| {
            let (min, max) = spec.range_in(spec.unit);
            InstrumentSummary {
                address: spec.address.get(),
                name: spec.name.clone(),
                role: format!("{:?}", spec.role).to_lowercase(),
                range: format!("{} - {} {}", min, max, spec.unit),
                accuracy: format!(
                    "{}% Rd + {}% FS ({} {} FS)",
                    spec.accuracy.reading_pct,
                    spec.accuracy.full_scale_pct,
                    spec.unit.convert(spec.max_flow, FlowUnit::CANONICAL),
                    FlowUnit::CANONICAL
                ),
            }
        })
        .collect()
}
