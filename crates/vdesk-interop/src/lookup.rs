//! Interface identifier lookup
//!
//! IIDs of the shell interfaces change between builds and are not published,
//! so they are resolved at runtime. Names without an identifier are simply
//! absent from the returned map.

use std::collections::BTreeMap;
use vdesk_idl::Guid;

/// Resolves interface names to identifiers for the running system
pub trait IidLookup: Send + Sync {
    fn lookup(&self, names: &[&str]) -> BTreeMap<String, Guid>;
}

/// Fixed in-memory name to IID table
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IidTable {
    entries: BTreeMap<String, Guid>,
}

impl IidTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, iid: Guid) -> Self {
        self.insert(name, iid);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, iid: Guid) {
        self.entries.insert(name.into(), iid);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, Guid)> for IidTable {
    fn from_iter<I: IntoIterator<Item = (String, Guid)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl IidLookup for IidTable {
    fn lookup(&self, names: &[&str]) -> BTreeMap<String, Guid> {
        names
            .iter()
            .filter_map(|name| self.entries.get(*name).map(|iid| (name.to_string(), *iid)))
            .collect()
    }
}

/// Resolves names from the registered interfaces under `HKCR\Interface`
#[cfg(windows)]
#[derive(Clone, Copy, Debug, Default)]
pub struct RegistryIidLookup;

#[cfg(windows)]
impl IidLookup for RegistryIidLookup {
    fn lookup(&self, names: &[&str]) -> BTreeMap<String, Guid> {
        use crate::winreg::{read_string, subkeys, HKEY_CLASSES_ROOT};

        let mut found = BTreeMap::new();
        let keys = match subkeys(HKEY_CLASSES_ROOT, "Interface") {
            Ok(keys) => keys,
            Err(e) => {
                tracing::warn!("cannot enumerate registered interfaces: {}", e);
                return found;
            }
        };

        for key in keys {
            let Ok(name) = read_string(HKEY_CLASSES_ROOT, &format!(r"Interface\{}", key), "") else {
                continue;
            };
            if !names.contains(&name.as_str()) {
                continue;
            }
            if let Some(iid) = Guid::parse(&key) {
                found.insert(name, iid);
            }
        }

        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_lookup_drops_unknown_names() {
        let iid: Guid = "3f07f4be-b107-441a-af0f-39d82529072c".parse().unwrap();
        let table = IidTable::new().with("IVirtualDesktop", iid);

        let found = table.lookup(&["IVirtualDesktop", "IVirtualDesktopPinnedApps"]);
        assert_eq!(found.len(), 1);
        assert_eq!(found["IVirtualDesktop"], iid);
    }

    #[test]
    fn test_table_only_answers_requested_names() {
        let table: IidTable = vec![
            ("IVirtualDesktop".to_string(), Guid::new_v4()),
            ("IVirtualDesktopPinnedApps".to_string(), Guid::new_v4()),
        ]
        .into_iter()
        .collect();

        assert_eq!(table.len(), 2);
        assert!(table.lookup(&[]).is_empty());
        assert_eq!(table.lookup(&["IVirtualDesktopPinnedApps"]).len(), 1);
    }
}
