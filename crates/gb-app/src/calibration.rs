//! Calibration step generation and duration estimates.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

/// Unit the step duration is entered in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DurationUnit {
    #[default]
    Seconds,
    Minutes,
    Hours,
}

impl DurationUnit {
    pub fn seconds_per_unit(self) -> f64 {
        match self {
            Self::Seconds => 1.0,
            Self::Minutes => 60.0,
            Self::Hours => 3600.0,
        }
    }
}

impl std::str::FromStr for DurationUnit {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "s" | "sec" | "seconds" => Ok(Self::Seconds),
            "min" | "minutes" => Ok(Self::Minutes),
            "h" | "hours" => Ok(Self::Hours),
            other => Err(AppError::InvalidInput(format!(
                "unknown duration unit '{other}'"
            ))),
        }
    }
}

/// How the target concentrations are produced.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum StepMode {
    Automatic {
        initial_ppm: f64,
        final_ppm: f64,
        steps: usize,
        back_and_forth: bool,
    },
    Manual(Vec<f64>),
}

/// `n` evenly spaced values from `initial` to `last`, both included.
///
/// Fewer than two steps yield just `initial`.
pub fn linear_steps(initial: f64, last: f64, n: usize) -> Vec<f64> {
    if n < 2 {
        return vec![initial];
    }
    let step = (last - initial) / (n - 1) as f64;
    (0..n).map(|i| initial + i as f64 * step).collect()
}

/// Append the way back, without repeating the turning point.
pub fn with_return_pass(mut steps: Vec<f64>) -> Vec<f64> {
    if steps.len() > 1 {
        let back: Vec<f64> = steps[..steps.len() - 1].iter().rev().copied().collect();
        steps.extend(back);
    }
    steps
}

/// Check an explicit list of targets.
pub fn manual_steps(values: &[f64]) -> AppResult<Vec<f64>> {
    if values.is_empty() {
        return Err(AppError::InvalidInput("no calibration steps given".into()));
    }
    if let Some(bad) = values.iter().find(|v| !(v.is_finite() && **v >= 0.0)) {
        return Err(AppError::InvalidInput(format!(
            "calibration step {bad} must be finite and >= 0"
        )));
    }
    Ok(values.to_vec())
}

/// Parse one target per line; blank lines are skipped.
///
/// Every unparsable line is reported, numbered from 1.
pub fn parse_manual_steps(text: &str) -> AppResult<Vec<f64>> {
    let mut values = Vec::new();
    let mut errors = Vec::new();
    for (i, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match line.parse::<f64>() {
            Ok(v) => values.push(v),
            Err(_) => errors.push(format!("line {}: '{}' is not a valid number", i + 1, line)),
        }
    }
    if !errors.is_empty() {
        return Err(AppError::InvalidInput(errors.join("; ")));
    }
    manual_steps(&values)
}

/// Targets for a mode. Back-and-forth only applies to automatic mode.
pub fn generate_steps(mode: &StepMode) -> AppResult<Vec<f64>> {
    match mode {
        StepMode::Automatic {
            initial_ppm,
            final_ppm,
            steps,
            back_and_forth,
        } => {
            let steps = manual_steps(&linear_steps(*initial_ppm, *final_ppm, *steps))?;
            Ok(if *back_and_forth {
                with_return_pass(steps)
            } else {
                steps
            })
        }
        StepMode::Manual(values) => manual_steps(values),
    }
}

/// Total run time of a step list.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct DurationEstimate {
    pub steps: usize,
    /// Total, in `unit`.
    pub total: f64,
    pub unit: DurationUnit,
}

impl DurationEstimate {
    pub fn total_seconds(&self) -> f64 {
        self.total * self.unit.seconds_per_unit()
    }
}

pub fn estimated_duration(steps: usize, step_duration: f64, unit: DurationUnit) -> DurationEstimate {
    DurationEstimate {
        steps,
        total: steps as f64 * step_duration,
        unit,
    }
}

impl fmt::Display for DurationEstimate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let t = self.total;
        match self.unit {
            DurationUnit::Seconds if t >= 3600.0 => write!(f, "{:.1} hours", t / 3600.0),
            DurationUnit::Seconds if t >= 60.0 => write!(f, "{:.1} minutes", t / 60.0),
            DurationUnit::Seconds => write!(f, "{t:.0} seconds"),
            DurationUnit::Minutes if t >= 60.0 => write!(f, "{:.1} hours", t / 60.0),
            DurationUnit::Minutes => write!(f, "{t:.0} minutes"),
            DurationUnit::Hours => write!(f, "{t:.1} hours"),
        }
    }
}
