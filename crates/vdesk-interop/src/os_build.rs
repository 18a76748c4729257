//! OS build number providers

use crate::error::{InteropError, Result};
use crate::version::BuildNumber;

/// Supplies the build number of the running system
pub trait BuildSource: Send + Sync {
    fn build_number(&self) -> Result<BuildNumber>;
}

/// Always reports the same build
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FixedBuild(pub BuildNumber);

impl FixedBuild {
    pub fn new(build: u32) -> Self {
        Self(BuildNumber(build))
    }
}

impl BuildSource for FixedBuild {
    fn build_number(&self) -> Result<BuildNumber> {
        Ok(self.0)
    }
}

/// Reads `CurrentBuildNumber` from the registry
#[cfg(windows)]
#[derive(Clone, Copy, Debug, Default)]
pub struct WindowsBuild;

#[cfg(windows)]
impl WindowsBuild {
    const KEY: &'static str = r"SOFTWARE\Microsoft\Windows NT\CurrentVersion";
    const VALUE: &'static str = "CurrentBuildNumber";
}

#[cfg(windows)]
impl BuildSource for WindowsBuild {
    fn build_number(&self) -> Result<BuildNumber> {
        let text = crate::winreg::read_string(crate::winreg::HKEY_LOCAL_MACHINE, Self::KEY, Self::VALUE)
            .map_err(InteropError::BuildUnavailable)?;
        parse_build(&text)
    }
}

/// Parse a build number as stored by the OS
pub fn parse_build(text: &str) -> Result<BuildNumber> {
    text.trim()
        .parse()
        .map(BuildNumber)
        .map_err(|_| InteropError::BuildUnavailable(format!("not a build number: {:?}", text)))
}
