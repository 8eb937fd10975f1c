//! Version types for snapshot compatibility.

use serde::{Deserialize, Serialize};

use crate::error::{IronvaleError, IronvaleResult};

/// Schema version using semantic versioning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SchemaVersion {
    /// Major version (breaking changes)
    pub major: u16,
    /// Minor version (backwards-compatible additions)
    pub minor: u16,
    /// Patch version (bug fixes)
    pub patch: u16,
}

impl SchemaVersion {
    /// Creates a new schema version.
    #[must_use]
    pub const fn new(major: u16, minor: u16, patch: u16) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Current world snapshot version.
    pub const WORLD_SNAPSHOT: Self = Self::new(1, 0, 0);

    /// Current weapon catalog file version.
    pub const WEAPON_CATALOG: Self = Self::new(1, 0, 0);

    /// Checks if this version is compatible with another version.
    /// Compatible means same major version and this minor >= other minor.
    #[must_use]
    pub const fn is_compatible_with(&self, other: &Self) -> bool {
        self.major == other.major && self.minor >= other.minor
    }

    /// Fails with `VersionMismatch` unless this version can read `data_version`.
    pub fn ensure_can_read(&self, data_version: Self) -> IronvaleResult<()> {
        if self.is_compatible_with(&data_version) {
            Ok(())
        } else {
            Err(IronvaleError::VersionMismatch {
                expected: *self,
                actual: data_version,
            })
        }
    }
}

impl std::fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}
