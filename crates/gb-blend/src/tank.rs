//! Batch filling of a tank to a target concentration.
//!
//! Both gases flow into the tank; gas 1 is shut off after `t1` so that the
//! trace species reaches `C_tank` when the tank is full at `t1 + t2`.

use gb_core::{ensure_finite, ppm_to_fraction};
use serde::Serialize;

use crate::error::{BlendError, BlendResult};

/// Open times in minutes.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct TankFillTimes {
    /// Time gas 1 is open.
    pub t1_min: f64,
    /// Remaining fill time after gas 1 closes.
    pub t2_min: f64,
}

impl TankFillTimes {
    pub fn total_min(&self) -> f64 {
        self.t1_min + self.t2_min
    }
}

/// Times to fill `tank_volume_l` liters at flows `q1`, `q2` (ln/min).
///
/// # Errors
///
/// - `InvalidArg` when gas 1 does not flow or carries no species, gas 2 flow is
///   negative or the tank has no volume
/// - `NoFeasibleSolution` when either time comes out negative
pub fn tank_fill_times(
    q1: f64,
    q2: f64,
    tank_volume_l: f64,
    c_tank_ppm: f64,
    c1_ppm: f64,
    c2_ppm: f64,
) -> BlendResult<TankFillTimes> {
    for (v, what) in [
        (q1, "gas 1 flow"),
        (q2, "gas 2 flow"),
        (tank_volume_l, "tank volume"),
        (c_tank_ppm, "tank concentration"),
        (c1_ppm, "gas 1 concentration"),
        (c2_ppm, "gas 2 concentration"),
    ] {
        ensure_finite(v, what)?;
    }
    if q1 <= 0.0 {
        return Err(BlendError::InvalidArg {
            what: "gas 1 flow must be positive",
        });
    }
    if q2 < 0.0 {
        return Err(BlendError::InvalidArg {
            what: "gas 2 flow must be >= 0",
        });
    }
    if tank_volume_l <= 0.0 {
        return Err(BlendError::InvalidArg {
            what: "tank volume must be positive",
        });
    }
    if c1_ppm <= 0.0 {
        return Err(BlendError::InvalidArg {
            what: "gas 1 concentration must be positive",
        });
    }

    let c_tank = ppm_to_fraction(c_tank_ppm);
    let c1 = ppm_to_fraction(c1_ppm);
    let c2 = ppm_to_fraction(c2_ppm);

    let total_time = tank_volume_l / (q1 + q2);
    let t1 = (c_tank * tank_volume_l - c2 * q2 * total_time) / (c1 * q1);
    let t2 = total_time - t1;

    if t1 < 0.0 || t2 < 0.0 {
        return Err(BlendError::NoFeasibleSolution {
            flow1: q1,
            flow2: q2,
            max_flow: q1.max(q2),
        });
    }
    Ok(TankFillTimes {
        t1_min: t1,
        t2_min: t2,
    })
}
