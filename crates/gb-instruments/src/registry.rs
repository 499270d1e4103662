//! The instrument registry: every known address with its range and accuracy.

use std::collections::BTreeMap;

use gb_core::Address;
use tracing::warn;

use crate::error::{InstrumentError, InstrumentResult};
use crate::spec::{InstrumentRole, InstrumentSpec};

/// Known instruments keyed by bus address.
///
/// Iteration is in ascending address order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct InstrumentRegistry {
    instruments: BTreeMap<Address, InstrumentSpec>,
}

impl InstrumentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_specs(specs: impl IntoIterator<Item = InstrumentSpec>) -> InstrumentResult<Self> {
        let mut registry = Self::new();
        for spec in specs {
            registry.insert(spec)?;
        }
        for (a, b) in registry.overlapping_sources() {
            warn!("Source instruments {} and {} have overlapping ranges", a, b);
        }
        Ok(registry)
    }

    pub fn insert(&mut self, spec: InstrumentSpec) -> InstrumentResult<()> {
        if self.instruments.contains_key(&spec.address) {
            return Err(InstrumentError::DuplicateAddress {
                address: spec.address,
            });
        }
        self.instruments.insert(spec.address, spec);
        Ok(())
    }

    pub fn get(&self, address: Address) -> InstrumentResult<&InstrumentSpec> {
        self.instruments
            .get(&address)
            .ok_or(InstrumentError::UnknownInstrument { address })
    }

    pub fn contains(&self, address: Address) -> bool {
        self.instruments.contains_key(&address)
    }

    pub fn iter(&self) -> impl Iterator<Item = &InstrumentSpec> + '_ {
        self.instruments.values()
    }

    pub fn addresses(&self) -> impl Iterator<Item = Address> + '_ {
        self.instruments.keys().copied()
    }

    /// Instruments eligible for source-flow selection.
    pub fn sources(&self) -> impl Iterator<Item = &InstrumentSpec> + '_ {
        self.iter().filter(|s| s.role.is_selectable())
    }

    /// The dedicated base-gas channel, if one is configured.
    pub fn diluent(&self) -> Option<&InstrumentSpec> {
        self.iter().find(|s| s.role == InstrumentRole::Diluent)
    }

    /// Pairs of source instruments whose calibrated ranges strictly overlap.
    pub fn overlapping_sources(&self) -> Vec<(Address, Address)> {
        let sources: Vec<&InstrumentSpec> = self.sources().collect();
        let mut pairs = Vec::new();
        for (i, a) in sources.iter().enumerate() {
            for b in &sources[i + 1..] {
                if a.overlaps(b) {
                    pairs.push((a.address, b.address));
                }
            }
        }
        pairs
    }

    pub fn len(&self) -> usize {
        self.instruments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instruments.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gb_core::FlowUnit;

    fn spec(addr: u8, min: f64, max: f64) -> InstrumentSpec {
        InstrumentSpec::new(Address::new(addr), FlowUnit::MillilitersPerMinute, min, max).unwrap()
    }

    #[test]
    fn duplicate_address_rejected() {
        let err = InstrumentRegistry::from_specs([spec(8, 0.1, 10.0), spec(8, 10.0, 150.0)])
            .unwrap_err();
        assert_eq!(
            err,
            InstrumentError::DuplicateAddress {
                address: Address::new(8)
            }
        );
    }

    #[test]
    fn iteration_is_by_ascending_address() {
        let registry =
            InstrumentRegistry::from_specs([spec(20, 0.0, 1500.0), spec(3, 150.0, 1500.0), spec(8, 0.1, 10.0)])
                .unwrap();
        let addrs: Vec<u8> = registry.addresses().map(Address::get).collect();
        assert_eq!(addrs, vec![3, 8, 20]);
    }

    #[test]
    fn roles_filter_sources_and_diluent() {
        let registry = InstrumentRegistry::from_specs([
            spec(8, 0.1, 10.0),
            spec(20, 0.0, 1500.0).with_role(InstrumentRole::Diluent),
            spec(10, 0.0, 2500.0).with_role(InstrumentRole::Auxiliary),
        ])
        .unwrap();

        let sources: Vec<u8> = registry.sources().map(|s| s.address.get()).collect();
        assert_eq!(sources, vec![8]);
        assert_eq!(registry.diluent().map(|s| s.address), Some(Address::new(20)));
    }

    #[test]
    fn unknown_address_lookup() {
        let registry = InstrumentRegistry::new();
        assert!(registry.is_empty());
        assert!(matches!(
            registry.get(Address::new(5)),
            Err(InstrumentError::UnknownInstrument { .. })
        ));
    }

    #[test]
    fn reports_overlapping_sources_only() {
        let registry = InstrumentRegistry::from_specs([
            spec(8, 0.1, 10.0),
            spec(5, 10.0, 150.0),
            spec(9, 5.0, 50.0),
            spec(20, 0.0, 1500.0).with_role(InstrumentRole::Diluent),
        ])
        .unwrap();
        assert_eq!(
            registry.overlapping_sources(),
            vec![
                (Address::new(5), Address::new(9)),
                (Address::new(8), Address::new(9))
            ]
        );
    }
}
