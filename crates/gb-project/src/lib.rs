//! gb-project: settings file format, defaults and validation.

pub mod schema;
pub mod validate;

pub use schema::*;
pub use validate::{ValidationError, validate_settings};

use tracing::info;

pub type ProjectResult<T> = Result<T, ProjectError>;

#[derive(thiserror::Error, Debug)]
pub enum ProjectError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub fn load_yaml(path: &std::path::Path) -> ProjectResult<Settings> {
    let content = std::fs::read_to_string(path)?;
    let settings: Settings = serde_yaml::from_str(&content)?;
    validate_settings(&settings)?;
    info!(
        "Loaded settings from {}: {} instruments",
        path.display(),
        settings.instruments.len()
    );
    Ok(settings)
}

pub fn save_yaml(path: &std::path::Path, settings: &Settings) -> ProjectResult<()> {
    validate_settings(settings)?;
    let content = serde_yaml::to_string(settings)?;
    std::fs::write(path, content)?;
    Ok(())
}

/// Settings from `path`, or the built-in defaults when no path is given.
pub fn load_or_default(path: Option<&std::path::Path>) -> ProjectResult<Settings> {
    match path {
        Some(path) => load_yaml(path),
        None => Ok(Settings::default()),
    }
}
