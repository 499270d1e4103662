//! In-memory driver.

use std::collections::{BTreeMap, HashMap, HashSet};

use gb_core::Address;

use crate::driver::{InstrumentDriver, Parameter, SETPOINT_FULL_SCALE_COUNTS, counts_to_flow};
use crate::registry::InstrumentRegistry;

const AMBIENT_TEMPERATURE_C: f64 = 21.0;

/// Simulated bus: measured flow settles instantly on the setpoint.
#[derive(Debug, Default, Clone)]
pub struct SimulatedDriver {
    /// Full scale per attached address, native unit.
    full_scale: BTreeMap<Address, f64>,
    setpoint_counts: HashMap<Address, f64>,
    failing: HashSet<Address>,
    writes: Vec<(Address, Parameter, f64)>,
}

impl SimulatedDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach every instrument of `registry`.
    pub fn for_registry(registry: &InstrumentRegistry) -> Self {
        let mut driver = Self::new();
        for spec in registry.iter() {
            driver.attach(spec.address, spec.max_flow);
        }
        driver
    }

    pub fn attach(&mut self, address: Address, full_scale: f64) {
        self.full_scale.insert(address, full_scale);
        self.setpoint_counts.insert(address, 0.0);
    }

    /// Make every subsequent write to `address` fail.
    pub fn fail_writes_for(&mut self, address: Address) {
        self.failing.insert(address);
    }

    pub fn restore(&mut self, address: Address) {
        self.failing.remove(&address);
    }

    /// Every accepted write, oldest first.
    pub fn writes(&self) -> &[(Address, Parameter, f64)] {
        &self.writes
    }

    pub fn setpoint_counts(&self, address: Address) -> Option<f64> {
        self.setpoint_counts.get(&address).copied()
    }
}

impl InstrumentDriver for SimulatedDriver {
    fn read(&mut self, address: Address, parameter: Parameter) -> Option<f64> {
        let full_scale = *self.full_scale.get(&address)?;
        let counts = self.setpoint_counts.get(&address).copied().unwrap_or(0.0);
        match parameter {
            Parameter::Setpoint => Some(counts),
            Parameter::Measure => Some(counts_to_flow(counts, full_scale)),
            Parameter::ValveOutput => Some(counts / SETPOINT_FULL_SCALE_COUNTS * 100.0),
            Parameter::Temperature => Some(AMBIENT_TEMPERATURE_C),
        }
    }

    fn write(&mut self, address: Address, parameter: Parameter, value: f64) -> bool {
        if !self.full_scale.contains_key(&address) || self.failing.contains(&address) {
            return false;
        }
        if parameter != Parameter::Setpoint || !(0.0..=SETPOINT_FULL_SCALE_COUNTS).contains(&value)
        {
            return false;
        }
        self.setpoint_counts.insert(address, value);
        self.writes.push((address, parameter, value));
        true
    }
}
