//! The flat key/value record contract that bound schemas persist into.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Key that stores a record's title.
pub const TITLE_KEY: &str = "Title";
/// Key that stores a record's password.
pub const PASSWORD_KEY: &str = "Password";

/// A string value tagged with whether it must be protected at rest.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtectedString {
    pub protected: bool,
    pub value: String,
}

impl ProtectedString {
    pub fn new(protected: bool, value: impl Into<String>) -> Self {
        Self {
            protected,
            value: value.into(),
        }
    }

    pub fn plain(value: impl Into<String>) -> Self {
        Self::new(false, value)
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }
}

impl fmt::Debug for ProtectedString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.protected {
            f.write_str("ProtectedString(***)")
        } else {
            write!(f, "ProtectedString({:?})", self.value)
        }
    }
}

/// Keyed storage for one persisted record.
pub trait EntryStore {
    fn exists(&self, key: &str) -> bool;
    fn get(&self, key: &str) -> Option<&ProtectedString>;
    fn set(&mut self, key: &str, value: ProtectedString);
    fn remove(&mut self, key: &str) -> bool;
    fn keys(&self) -> Vec<String>;

    /// Protection policy applied to values that carry no tag of their own.
    fn protects(&self, key: &str) -> bool {
        key == PASSWORD_KEY
    }
}

/// An in-memory record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    #[serde(default)]
    pub strings: BTreeMap<String, ProtectedString>,
}

impl Entry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The record's title, if present.
    pub fn title(&self) -> Option<&str> {
        self.strings.get(TITLE_KEY).map(ProtectedString::as_str)
    }

    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }
}

impl EntryStore for Entry {
    fn exists(&self, key: &str) -> bool {
        self.strings.contains_key(key)
    }

    fn get(&self, key: &str) -> Option<&ProtectedString> {
        self.strings.get(key)
    }

    fn set(&mut self, key: &str, value: ProtectedString) {
        self.strings.insert(key.to_string(), value);
    }

    fn remove(&mut self, key: &str) -> bool {
        self.strings.remove(key).is_some()
    }

    fn keys(&self) -> Vec<String> {
        self.strings.keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::{Entry, EntryStore, ProtectedString, PASSWORD_KEY, TITLE_KEY};

    #[test]
    fn set_get_remove_round_trip() {
        let mut entry = Entry::new();
        entry.set(TITLE_KEY, ProtectedString::plain("HomeWifi"));

        assert!(entry.exists(TITLE_KEY));
        assert_eq!(entry.title(), Some("HomeWifi"));
        assert!(entry.remove(TITLE_KEY));
        assert!(!entry.remove(TITLE_KEY));
        assert!(entry.is_empty());
    }

    #[test]
    fn default_policy_protects_password_only() {
        let entry = Entry::new();
        assert!(entry.protects(PASSWORD_KEY));
        assert!(!entry.protects(TITLE_KEY));
    }

    #[test]
    fn debug_hides_protected_values() {
        let secret = ProtectedString::new(true, "hunter2");
        assert!(!format!("{secret:?}").contains("hunter2"));
    }
}
