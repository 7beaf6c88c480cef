//! Numeric and named data addresses.

use std::collections::BTreeMap;

use crate::fault::Fault;
use crate::state::registers::CORE_REGISTER_NAMES;

/// A data-memory address as written by a caller.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Address {
    /// Traditional or linear address.
    Numeric(u16),
    /// Register or bit name, resolved through a [`RegisterMap`].
    Named(String),
}

impl Address {
    /// Resolves the address to a number.
    ///
    /// # Errors
    ///
    /// [`Fault::UnknownRegister`] when a name is not in `names`.
    pub fn resolve(&self, names: &RegisterMap) -> Result<u16, Fault> {
        match self {
            Self::Numeric(address) => Ok(*address),
            Self::Named(name) => names
                .get(name)
                .ok_or_else(|| Fault::UnknownRegister(name.clone())),
        }
    }
}

impl From<u16> for Address {
    fn from(address: u16) -> Self {
        Self::Numeric(address)
    }
}

impl From<&str> for Address {
    fn from(name: &str) -> Self {
        Self::Named(name.to_owned())
    }
}

/// Mapping from uppercase register or bit name to its address or bit index.
///
/// Lookups fold the query to uppercase, so `status` and `STATUS` agree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct RegisterMap {
    entries: BTreeMap<String, u16>,
}

impl RegisterMap {
    /// Empty map.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Names of the core registers and their status bits.
    #[must_use]
    pub fn core_registers() -> Self {
        CORE_REGISTER_NAMES
            .iter()
            .map(|(name, value)| ((*name).to_owned(), *value))
            .collect()
    }

    /// Adds or replaces a name. Returns the previous value.
    pub fn insert(&mut self, name: &str, value: u16) -> Option<u16> {
        self.entries.insert(name.to_ascii_uppercase(), value)
    }

    /// Looks up a name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<u16> {
        self.entries.get(&name.to_ascii_uppercase()).copied()
    }

    /// Whether `name` is defined.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Entries in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u16)> + '_ {
        self.entries
            .iter()
            .map(|(name, value)| (name.as_str(), *value))
    }

    /// Number of names.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the map is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, u16)> for RegisterMap {
    fn from_iter<I: IntoIterator<Item = (String, u16)>>(iter: I) -> Self {
        let mut map = Self::new();
        map.extend(iter);
        map
    }
}

impl Extend<(String, u16)> for RegisterMap {
    fn extend<I: IntoIterator<Item = (String, u16)>>(&mut self, iter: I) {
        for (name, value) in iter {
            self.insert(&name, value);
        }
    }
}
