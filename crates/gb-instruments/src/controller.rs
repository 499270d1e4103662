//! Setpoint bookkeeping on top of a driver.

use std::collections::BTreeMap;

use gb_core::{Address, FlowUnit, Tolerances, ensure_finite, nearly_equal};
use tracing::{debug, info, warn};

use crate::driver::{InstrumentDriver, Parameter, Readings, flow_to_counts};
use crate::error::{InstrumentError, InstrumentResult};
use crate::registry::InstrumentRegistry;

/// Commands instruments and remembers what was last commanded.
///
/// Setpoints are tracked in ln/min. Every registered address starts at 0, is
/// updated only by a successful write and returns to 0 on stop.
pub struct FlowController<D> {
    driver: D,
    registry: InstrumentRegistry,
    setpoints: BTreeMap<Address, f64>,
}

impl<D: InstrumentDriver> FlowController<D> {
    pub fn new(driver: D, registry: InstrumentRegistry) -> Self {
        let setpoints = registry.addresses().map(|a| (a, 0.0)).collect();
        Self {
            driver,
            registry,
            setpoints,
        }
    }

    pub fn registry(&self) -> &InstrumentRegistry {
        &self.registry
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    pub fn into_driver(self) -> D {
        self.driver
    }

    /// Last successfully commanded flow in ln/min (0 for unknown addresses).
    pub fn setpoint(&self, address: Address) -> f64 {
        self.setpoints.get(&address).copied().unwrap_or(0.0)
    }

    /// Command `flow_lpm` (ln/min) on `address`.
    ///
    /// The flow must lie within `[0, max_flow]` of that instrument. A failed
    /// write leaves the tracked setpoint untouched.
    pub fn set_flow(&mut self, address: Address, flow_lpm: f64) -> InstrumentResult<()> {
        let flow_lpm = ensure_finite(flow_lpm, "flow setpoint")?;
        let spec = self.registry.get(address)?;

        let mut native = FlowUnit::CANONICAL.convert(flow_lpm, spec.unit);
        if native > spec.max_flow && nearly_equal(native, spec.max_flow, Tolerances::default()) {
            native = spec.max_flow;
        }
        if !(0.0..=spec.max_flow).contains(&native) {
            return Err(InstrumentError::SetpointOutOfRange {
                address,
                flow: native,
                max_flow: spec.max_flow,
                unit: spec.unit,
            });
        }

        let counts = flow_to_counts(native, spec.max_flow);
        debug!(
            "Address {}: {} {} -> {} counts",
            address, native, spec.unit, counts
        );
        if !self.driver.write(address, Parameter::Setpoint, counts) {
            warn!("Setpoint write failed for address {}", address);
            return Err(InstrumentError::WriteFailed {
                address,
                parameter: Parameter::Setpoint,
            });
        }

        let commanded = spec.unit.convert(native, FlowUnit::CANONICAL);
        info!("Address {} setpoint {} ln/min", address, commanded);
        self.setpoints.insert(address, commanded);
        Ok(())
    }

    /// Command zero flow on `address`.
    pub fn stop(&mut self, address: Address) -> InstrumentResult<()> {
        self.set_flow(address, 0.0)
    }

    /// Stop every registered instrument.
    ///
    /// All instruments are attempted; the first failure is returned.
    pub fn stop_all(&mut self) -> InstrumentResult<()> {
        let addresses: Vec<Address> = self.registry.addresses().collect();
        let mut first_err = None;
        for address in addresses {
            if let Err(e) = self.stop(address) {
                first_err.get_or_insert(e);
            }
        }
        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Flow (ln/min), valve output and temperature of `address`.
    pub fn readings(&mut self, address: Address) -> InstrumentResult<Readings> {
        let unit = self.registry.get(address)?.unit;
        let flow = self
            .driver
            .read(address, Parameter::Measure)
            .map(|v| unit.convert(v, FlowUnit::CANONICAL));
        Ok(Readings {
            flow,
            valve: self.driver.read(address, Parameter::ValveOutput),
            temperature: self.driver.read(address, Parameter::Temperature),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::SimulatedDriver;
    use crate::spec::InstrumentSpec;

    fn controller() -> FlowController<SimulatedDriver> {
        let registry = InstrumentRegistry::from_specs([
            InstrumentSpec::new(Address::new(8), FlowUnit::MillilitersPerMinute, 0.1, 10.0).unwrap(),
            InstrumentSpec::new(Address::new(20), FlowUnit::LitersPerMinute, 0.0, 1.5).unwrap(),
        ])
        .unwrap();
        let driver = SimulatedDriver::for_registry(&registry);
        FlowController::new(driver, registry)
    }

    #[test]
    fn setpoints_start_at_zero() {
        let c = controller();
        assert_eq!(c.setpoint(Address::new(8)), 0.0);
        assert_eq!(c.setpoint(Address::new(20)), 0.0);
    }

    #[test]
    fn set_flow_converts_to_native_counts() {
        let mut c = controller();
        c.set_flow(Address::new(8), 0.005).unwrap();
        c.set_flow(Address::new(20), 1.5).unwrap();

        assert_eq!(c.setpoint(Address::new(8)), 0.005);
        assert_eq!(c.driver().setpoint_counts(Address::new(8)), Some(16_000.0));
        assert_eq!(c.driver().setpoint_counts(Address::new(20)), Some(32_000.0));
    }

    #[test]
    fn setpoint_just_above_full_scale_is_tracked_at_full_scale() {
        let mut c = controller();
        c.set_flow(Address::new(20), 1.5 * (1.0 + 1e-12)).unwrap();
        assert_eq!(c.setpoint(Address::new(20)), 1.5);
        assert_eq!(c.driver().setpoint_counts(Address::new(20)), Some(32_000.0));
    }

    #[test]
    fn out_of_range_is_rejected_without_write() {
        let mut c = controller();
        let err = c.set_flow(Address::new(8), 0.02).unwrap_err();
        assert!(matches!(err, InstrumentError::SetpointOutOfRange { .. }));
        let err = c.set_flow(Address::new(20), -0.1).unwrap_err();
        assert!(matches!(err, InstrumentError::SetpointOutOfRange { .. }));
        assert!(c.driver().writes().is_empty());
        assert_eq!(c.setpoint(Address::new(8)), 0.0);
    }

    #[test]
    fn unknown_address_is_rejected() {
        let mut c = controller();
        assert!(matches!(
            c.set_flow(Address::new(99), 0.1),
            Err(InstrumentError::UnknownInstrument { .. })
        ));
    }

    #[test]
    fn failed_write_keeps_previous_setpoint() {
        let mut c = controller();
        c.set_flow(Address::new(20), 1.0).unwrap();
        c.driver_mut().fail_writes_for(Address::new(20));

        let err = c.set_flow(Address::new(20), 1.2).unwrap_err();
        assert!(matches!(err, InstrumentError::WriteFailed { .. }));
        assert_eq!(c.setpoint(Address::new(20)), 1.0);
    }

    #[test]
    fn stop_all_resets_setpoints_and_reports_failures() {
        let mut c = controller();
        c.set_flow(Address::new(8), 0.005).unwrap();
        c.set_flow(Address::new(20), 1.5).unwrap();
        c.driver_mut().fail_writes_for(Address::new(8));

        let err = c.stop_all().unwrap_err();
        assert!(matches!(
            err,
            InstrumentError::WriteFailed { address, .. } if address == Address::new(8)
        ));
        assert_eq!(c.setpoint(Address::new(8)), 0.005);
        assert_eq!(c.setpoint(Address::new(20)), 0.0);
    }

    #[test]
    fn readings_report_flow_in_liters() {
        let mut c = controller();
        c.set_flow(Address::new(8), 0.005).unwrap();
        let r = c.readings(Address::new(8)).unwrap();
        assert!((r.flow.unwrap() - 0.005).abs() < 1e-12);
        assert_eq!(r.valve, Some(50.0));
        assert!(r.temperature.is_some());
    }
}
