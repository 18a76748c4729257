//! Interfaces wrapped at each interface version

use crate::version::InterfaceVersion;

const ALL_SHELL_INTERFACES: &[&str] = &[
    "IVirtualDesktop",
    "IVirtualDesktopManagerInternal",
    "IVirtualDesktopNotification",
    "IVirtualDesktopNotificationService",
    "IVirtualDesktopPinnedApps",
];

/// Interface names the binding wraps, keyed by interface version
pub static SHELL_INTERFACES: InterfaceRegistry = InterfaceRegistry {
    entries: &[
        (10240, ALL_SHELL_INTERFACES),
        (20231, ALL_SHELL_INTERFACES),
        (21313, ALL_SHELL_INTERFACES),
        (22449, ALL_SHELL_INTERFACES),
    ],
};

/// Static table from interface version to interface names
#[derive(Debug, Clone, Copy)]
pub struct InterfaceRegistry {
    entries: &'static [(u32, &'static [&'static str])],
}

impl InterfaceRegistry {
    pub const fn new(entries: &'static [(u32, &'static [&'static str])]) -> Self {
        Self { entries }
    }

    /// Names wrapped at exactly `version`; empty for unknown versions
    pub fn interfaces_for(&self, version: InterfaceVersion) -> &'static [&'static str] {
        self.entries
            .iter()
            .find(|(v, _)| *v == version.0)
            .map(|(_, names)| *names)
            .unwrap_or(&[])
    }

    pub fn versions(&self) -> impl Iterator<Item = InterfaceVersion> + '_ {
        self.entries.iter().map(|(v, _)| InterfaceVersion(*v))
    }
}

impl Default for InterfaceRegistry {
    fn default() -> Self {
        SHELL_INTERFACES
    }
}
