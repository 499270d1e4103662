//! Integration tests for gb-instruments with a boxed driver.

use gb_core::{Address, FlowUnit};
use gb_instruments::{
    FlowController, InstrumentDriver, InstrumentRegistry, InstrumentRole, InstrumentSpec,
    Parameter, SimulatedDriver,
};

fn lab_registry() -> InstrumentRegistry {
    InstrumentRegistry::from_specs([
        InstrumentSpec::new(Address::new(8), FlowUnit::MillilitersPerMinute, 0.1, 10.0)
            .unwrap()
            .with_name("low flow"),
        InstrumentSpec::new(Address::new(5), FlowUnit::MillilitersPerMinute, 10.0, 150.0)
            .unwrap()
            .with_name("medium flow"),
        InstrumentSpec::new(Address::new(20), FlowUnit::MillilitersPerMinute, 0.0, 1500.0)
            .unwrap()
            .with_name("base gas")
            .with_role(InstrumentRole::Diluent),
    ])
    .unwrap()
}

#[test]
fn session_through_trait_object() {
    let registry = lab_registry();
    let driver: Box<dyn InstrumentDriver> = Box::new(SimulatedDriver::for_registry(&registry));
    let mut controller = FlowController::new(driver, registry);

    controller.set_flow(Address::new(20), 1.5).unwrap();
    controller.set_flow(Address::new(5), 0.075).unwrap();

    let base = controller.readings(Address::new(20)).unwrap();
    assert!((base.flow.unwrap() - 1.5).abs() < 1e-9);
    let medium = controller.readings(Address::new(5)).unwrap();
    assert!((medium.flow.unwrap() - 0.075).abs() < 1e-9);

    controller.stop_all().unwrap();
    for address in [8, 5, 20].map(Address::new) {
        assert_eq!(controller.setpoint(address), 0.0);
        assert_eq!(
            controller.driver_mut().read(address, Parameter::Setpoint),
            Some(0.0)
        );
    }
}

#[test]
fn write_history_records_counts() {
    let registry = lab_registry();
    let mut controller = FlowController::new(SimulatedDriver::for_registry(&registry), registry);

    controller.set_flow(Address::new(8), 0.01).unwrap();
    controller.stop(Address::new(8)).unwrap();

    let writes = controller.into_driver().writes().to_vec();
    assert_eq!(
        writes,
        vec![
            (Address::new(8), Parameter::Setpoint, 32_000.0),
            (Address::new(8), Parameter::Setpoint, 0.0),
        ]
    );
}
