use core::fmt;

/// Bus address of a flow instrument.
///
/// Propar node addresses are a single byte; ordering follows the numeric address,
/// which is the deterministic iteration order used when breaking selection ties.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Address(u8);

impl Address {
    pub const fn new(raw: u8) -> Self {
        Self(raw)
    }

    pub const fn get(self) -> u8 {
        self.0
    }
}

impl From<u8> for Address {
    fn from(raw: u8) -> Self {
        Self(raw)
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.0)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_orders_numerically() {
        let mut addrs = vec![Address::new(20), Address::new(3), Address::new(8)];
        addrs.sort();
        assert_eq!(
            addrs.iter().map(|a| a.get()).collect::<Vec<_>>(),
            vec![3, 8, 20]
        );
    }

    #[test]
    fn address_display_is_bare_number() {
        assert_eq!(Address::from(8).to_string(), "8");
        assert_eq!(format!("{:?}", Address::new(5)), "Address(5)");
    }
}
