//! Location Group Map

use crate::canonical::canonicalize;
use crate::error::{ArtifactError, EncodingError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use tracing::info;

/// Number of location groups (and location indicator columns)
pub const LOCATION_GROUP_COUNT: usize = 10;

/// Location indicator column names in model order
pub const LOCATION_COLUMNS: [&str; LOCATION_GROUP_COUNT] = [
    "LOCATIONNAME_0",
    "LOCATIONNAME_1",
    "LOCATIONNAME_2",
    "LOCATIONNAME_3",
    "LOCATIONNAME_4",
    "LOCATIONNAME_5",
    "LOCATIONNAME_6",
    "LOCATIONNAME_7",
    "LOCATIONNAME_8",
    "LOCATIONNAME_9",
];

/// Group id of a neighbourhood, always in `0..LOCATION_GROUP_COUNT`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct LocationGroup(u8);

impl LocationGroup {
    /// Create a group id, rejecting values outside the known groups
    pub fn new(id: u8) -> Option<Self> {
        ((id as usize) < LOCATION_GROUP_COUNT).then_some(Self(id))
    }

    /// Raw group id
    pub fn id(&self) -> u8 {
        self.0
    }

    /// Position of this group among the location indicator columns
    pub fn index(&self) -> usize {
        self.0 as usize
    }

    /// Name of the one-hot column for this group
    pub fn column_name(&self) -> &'static str {
        LOCATION_COLUMNS[self.index()]
    }
}

impl fmt::Display for LocationGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Mapping from canonical neighbourhood name to its location group.
///
/// Built once at startup and never mutated afterwards.
#[derive(Debug, Clone, Default)]
pub struct LocationGroupMap {
    groups: HashMap<String, LocationGroup>,
}

impl LocationGroupMap {
    /// Build from raw `(name, id)` pairs, canonicalizing every name
    pub fn from_entries<I, S>(entries: I) -> Result<Self, ArtifactError>
    where
        I: IntoIterator<Item = (S, u8)>,
        S: AsRef<str>,
    {
        let mut groups = HashMap::new();
        for (name, id) in entries {
            let name = name.as_ref();
            let group = LocationGroup::new(id).ok_or_else(|| {
                ArtifactError::Schema(format!(
                    "location '{}' has group {} outside 0..{}",
                    name, id, LOCATION_GROUP_COUNT
                ))
            })?;
            let key = canonicalize(name);
            match groups.insert(key.clone(), group) {
                Some(previous) if previous != group => {
                    return Err(ArtifactError::Schema(format!(
                        "location '{}' maps to both group {} and group {}",
                        key, previous, group
                    )));
                }
                _ => {}
            }
        }
        Ok(Self { groups })
    }

    /// Load from a JSON object of `{ "<location name>": <group id> }`
    pub fn load(path: &Path) -> Result<Self, ArtifactError> {
        let raw: HashMap<String, u8> = ArtifactError::read_json(path)?;
        let map = Self::from_entries(raw)?;
        info!("Loaded {} location groups from {}", map.len(), path.display());
        Ok(map)
    }

    /// Resolve a free-text location to its group.
    ///
    /// Matching is exact on the canonical form; there is no fuzzy fallback.
    pub fn resolve(&self, location: &str) -> Result<LocationGroup, EncodingError> {
        let key = canonicalize(location);
        match self.groups.get(&key) {
            Some(group) => Ok(*group),
            None => Err(EncodingError::UnknownLocation(key)),
        }
    }

    /// Number of known locations
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Whether the map has no entries
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}
