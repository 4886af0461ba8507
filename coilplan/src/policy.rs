//! Per-section resolution of construction policies.
//!
//! Orientation and alignment choices can be supplied once for the whole coil,
//! keyed by conduction-section name, or positionally by conduction-section
//! index. The three shapes accepted in coil description JSON are a bare
//! scalar, an object keyed by section name, and an array in section order;
//! serde's untagged representation maps them onto the three variants.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::errors::ConfigurationError;

/// A construction choice applied uniformly, by section name, or by index.
///
/// Resolution order for a given section: `ByIndex` entry at the section's
/// position, then `BySectionName` entry under the section's name, then the
/// coil-level default passed to [`Policy::resolve_or`]. Partial maps and short
/// arrays are allowed and fall back to the default; keys that name a section
/// the coil does not have are rejected up front by [`Policy::check_names`].
/// Supplying a policy never changes the section plan itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Policy<T> {
    /// One value for every section.
    Uniform(T),
    /// Values keyed by conduction-section name.
    BySectionName(BTreeMap<String, T>),
    /// Values in conduction-section order.
    ByIndex(Vec<T>),
}

impl<T: Clone> Policy<T> {
    /// Value for the conduction section at `index` named `name`, if the
    /// policy covers it.
    pub fn resolve(&self, index: usize, name: &str) -> Option<T> {
        match self {
            Policy::Uniform(value) => Some(value.clone()),
            Policy::BySectionName(map) => map.get(name).cloned(),
            Policy::ByIndex(values) => values.get(index).cloned(),
        }
    }

    /// Value for the section, falling back to `default` where the policy has
    /// no entry.
    pub fn resolve_or(&self, index: usize, name: &str, default: T) -> T {
        self.resolve(index, name).unwrap_or(default)
    }
}

impl<T> Policy<T> {
    /// Reject name-keyed entries that do not match any known section.
    pub fn check_names(&self, known: &[&str]) -> Result<(), ConfigurationError> {
        if let Policy::BySectionName(map) = self {
            for key in map.keys() {
                if !known.contains(&key.as_str()) {
                    return Err(ConfigurationError::UnknownSection { name: key.clone() });
                }
            }
        }
        Ok(())
    }
}

impl<T: Default> Default for Policy<T> {
    fn default() -> Self {
        Policy::Uniform(T::default())
    }
}
