//! OS build to interface version resolution

use crate::error::{InteropError, Result};
use std::fmt;

/// Interface versions with a distinct shell interface layout, ascending
pub const KNOWN_VERSIONS: &[u32] = &[10240, 20231, 21313, 22449];

/// OS build number of the running system
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BuildNumber(pub u32);

impl BuildNumber {
    pub fn new(value: u32) -> Self {
        Self(value)
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for BuildNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// First build at which a given interface layout appeared
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InterfaceVersion(pub u32);

impl InterfaceVersion {
    pub fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for InterfaceVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Maps a build number onto the greatest known version boundary at or below it
#[derive(Clone, Debug)]
pub struct VersionResolver {
    boundaries: Vec<u32>,
}

impl VersionResolver {
    /// Resolver over a custom boundary table, which must be strictly ascending
    pub fn new(boundaries: impl Into<Vec<u32>>) -> Result<Self> {
        let boundaries = boundaries.into();
        if boundaries.is_empty() {
            return Err(InteropError::InvalidVersionTable("no boundaries".into()));
        }
        if let Some(pair) = boundaries.windows(2).find(|w| w[0] >= w[1]) {
            return Err(InteropError::InvalidVersionTable(format!(
                "{} is not below {}",
                pair[0], pair[1]
            )));
        }
        Ok(Self { boundaries })
    }

    pub fn boundaries(&self) -> &[u32] {
        &self.boundaries
    }

    /// Lowest build any binding can be produced for
    pub fn floor(&self) -> u32 {
        self.boundaries[0]
    }

    pub fn resolve(&self, build: BuildNumber) -> Result<InterfaceVersion> {
        // Number of boundaries <= build; zero means below the floor.
        let idx = self.boundaries.partition_point(|&b| b <= build.0);
        if idx == 0 {
            return Err(InteropError::NoSupportedVersion { build: build.0 });
        }
        Ok(InterfaceVersion(self.boundaries[idx - 1]))
    }
}

impl Default for VersionResolver {
    fn default() -> Self {
        Self {
            boundaries: KNOWN_VERSIONS.to_vec(),
        }
    }
}
