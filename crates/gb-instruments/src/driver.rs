//! Serial-bus driver boundary.
//!
//! The transport itself (propar over RS-232/RS-485) lives outside this workspace;
//! everything here talks to it through [`InstrumentDriver`].

use gb_core::Address;

/// Setpoint register value that corresponds to 100 % of full scale.
pub const SETPOINT_FULL_SCALE_COUNTS: f64 = 32_000.0;

/// Instrument registers used by gasblend.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Parameter {
    /// Flow setpoint, in counts of [`SETPOINT_FULL_SCALE_COUNTS`].
    Setpoint,
    /// Measured flow, native unit.
    Measure,
    /// Valve output, percent.
    ValveOutput,
    /// Sensor temperature, °C.
    Temperature,
}

impl Parameter {
    /// `(process, parameter)` pair on the propar bus.
    pub fn propar_id(self) -> (u8, u8) {
        match self {
            Self::Setpoint => (1, 1),
            Self::Measure => (33, 0),
            Self::ValveOutput => (33, 1),
            Self::Temperature => (33, 7),
        }
    }
}

/// Black-box access to instrument registers.
///
/// Reads return `None` and writes return `false` on any bus failure; the driver
/// never retries.
pub trait InstrumentDriver: Send {
    fn read(&mut self, address: Address, parameter: Parameter) -> Option<f64>;

    fn write(&mut self, address: Address, parameter: Parameter, value: f64) -> bool;
}

impl<D: InstrumentDriver + ?Sized> InstrumentDriver for Box<D> {
    fn read(&mut self, address: Address, parameter: Parameter) -> Option<f64> {
        (**self).read(address, parameter)
    }

    fn write(&mut self, address: Address, parameter: Parameter, value: f64) -> bool {
        (**self).write(address, parameter, value)
    }
}

/// Process values of one instrument; each may be missing after a failed read.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Readings {
    /// ln/min
    pub flow: Option<f64>,
    /// %
    pub valve: Option<f64>,
    /// °C
    pub temperature: Option<f64>,
}

/// Setpoint counts for `flow`, truncated like the instrument firmware expects.
pub fn flow_to_counts(flow: f64, full_scale: f64) -> f64 {
    (flow / full_scale * SETPOINT_FULL_SCALE_COUNTS).trunc()
}

pub fn counts_to_flow(counts: f64, full_scale: f64) -> f64 {
    counts / SETPOINT_FULL_SCALE_COUNTS * full_scale
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_scale_to_full_range() {
        assert_eq!(flow_to_counts(1.5, 1.5), 32_000.0);
        assert_eq!(flow_to_counts(0.75, 1.5), 16_000.0);
        assert_eq!(flow_to_counts(0.0, 1.5), 0.0);
        // truncation, not rounding
        assert_eq!(flow_to_counts(1.0, 3.0), 10_666.0);
    }

    #[test]
    fn propar_ids_are_distinct_registers() {
        use std::collections::HashSet;

        let all = [
            Parameter::Setpoint,
            Parameter::Measure,
            Parameter::ValveOutput,
            Parameter::Temperature,
        ];
        let ids: HashSet<(u8, u8)> = all.iter().map(|p| p.propar_id()).collect();
        assert_eq!(ids.len(), all.len());
        assert_eq!(Parameter::Setpoint.propar_id(), (1, 1));
        assert_eq!(Parameter::Measure.propar_id(), (33, 0));
    }

    #[test]
    fn counts_back_to_flow() {
        assert_eq!(counts_to_flow(16_000.0, 10.0), 5.0);
    }

    #[test]
    fn boxed_driver_forwards() {
        struct Echo(f64);
        impl InstrumentDriver for Echo {
            fn read(&mut self, _: Address, _: Parameter) -> Option<f64> {
                Some(self.0)
            }
            fn write(&mut self, _: Address, _: Parameter, value: f64) -> bool {
                self.0 = value;
                true
            }
        }

        let mut driver: Box<dyn InstrumentDriver> = Box::new(Echo(0.0));
        assert!(driver.write(Address::new(1), Parameter::Setpoint, 7.0));
        assert_eq!(driver.read(Address::new(1), Parameter::Measure), Some(7.0));
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn counts_stay_in_register_range(
            full_scale in 0.001_f64..5000.0,
            fraction in 0.0_f64..=1.0,
        ) {
            let flow = full_scale * fraction;
            let counts = flow_to_counts(flow, full_scale);
            prop_assert!((0.0..=SETPOINT_FULL_SCALE_COUNTS).contains(&counts));

            // truncation loses less than one count
            let back = counts_to_flow(counts, full_scale);
            let one_count = full_scale / SETPOINT_FULL_SCALE_COUNTS;
            prop_assert!(back <= flow + 1e-9 * full_scale);
            prop_assert!(flow - back < one_count + 1e-9 * full_scale);
        }
    }
}
