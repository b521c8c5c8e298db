//! A minimal password database: named groups of entries, stored as JSON.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use xml_bind_core::Entry;

/// Errors returned when reading or writing a database file.
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("failed to read database {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse database {path}: {source}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },
    #[error("failed to write database {path}: {source}")]
    Write {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to serialize database: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("group '{0}' does not exist")]
    MissingGroup(String),
}

/// A group of entries directly below the database root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub name: String,
    #[serde(default)]
    pub entries: Vec<Entry>,
}

impl Group {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: Vec::new(),
        }
    }

    /// Index of the first entry whose title is exactly `title`.
    pub fn find_by_title(&self, title: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|entry| entry.title() == Some(title))
    }

    pub fn add(&mut self, entry: Entry) -> usize {
        self.entries.push(entry);
        self.entries.len() - 1
    }

    pub fn remove(&mut self, index: usize) -> Entry {
        self.entries.remove(index)
    }

    pub fn titles(&self) -> Vec<&str> {
        self.entries.iter().filter_map(Entry::title).collect()
    }
}

/// The whole database.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Database {
    #[serde(default)]
    pub groups: Vec<Group>,
}

impl Database {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(path: &Path) -> Result<Self, DatabaseError> {
        let raw = fs::read_to_string(path).map_err(|source| DatabaseError::Read {
            path: path.display().to_string(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| DatabaseError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    /// Load `path`, or start empty when the file does not exist yet.
    pub fn load_or_default(path: &Path) -> Result<Self, DatabaseError> {
        if path.exists() {
            Self::load(path)
        } else {
            debug!(path = %path.display(), "database file missing, starting empty");
            Ok(Self::default())
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), DatabaseError> {
        let mut json = serde_json::to_string_pretty(self)?;
        json.push('\n');
        fs::write(path, json).map_err(|source| DatabaseError::Write {
            path: path.display().to_string(),
            source,
        })
    }

    /// Group named `name`; the last one when several share it.
    pub fn group(&self, name: &str) -> Option<&Group> {
        self.groups.iter().rev().find(|group| group.name == name)
    }

    pub fn group_mut(&mut self, name: &str) -> Option<&mut Group> {
        self.groups.iter_mut().rev().find(|group| group.name == name)
    }

    /// The import target group. When several groups share the name the
    /// last one is used.
    pub fn standard_group(&mut self, name: &str, create: bool) -> Result<&mut Group, DatabaseError> {
        let existing = self.groups.iter().rposition(|group| group.name == name);
        let index = match existing {
            Some(index) => index,
            None if create => {
                debug!(group = name, "creating standard group");
                self.groups.push(Group::new(name));
                self.groups.len() - 1
            }
            None => return Err(DatabaseError::MissingGroup(name.to_string())),
        };
        Ok(&mut self.groups[index])
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use xml_bind_core::{Entry, EntryStore, ProtectedString, TITLE_KEY};

    use super::{Database, DatabaseError, Group};

    fn titled(title: &str) -> Entry {
        let mut entry = Entry::new();
        entry.set(TITLE_KEY, ProtectedString::plain(title));
        entry
    }

    #[test]
    fn standard_group_is_created_on_demand() {
        let mut db = Database::new();
        assert!(matches!(
            db.standard_group("WLan", false),
            Err(DatabaseError::MissingGroup(name)) if name == "WLan"
        ));
        db.standard_group("WLan", true).expect("created").add(titled("a"));
        assert_eq!(db.groups.len(), 1);
        assert_eq!(db.standard_group("WLan", true).expect("found").entries.len(), 1);
    }

    #[test]
    fn find_by_title_skips_untitled_entries() {
        let mut group = Group::new("WLan");
        group.add(Entry::new());
        group.add(titled("HomeWifi"));
        assert_eq!(group.find_by_title("HomeWifi"), Some(1));
        assert_eq!(group.find_by_title("Other"), None);
    }

    #[test]
    fn json_round_trip_keeps_protection_flags() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("db.json");

        let mut db = Database::new();
        let mut entry = titled("HomeWifi");
        entry.set("Password", ProtectedString::new(true, "secret"));
        db.standard_group("WLan", true).expect("group").add(entry);
        db.save(&path).expect("save");

        let loaded = Database::load(&path).expect("load");
        assert_eq!(loaded, db);
    }

    #[test]
    fn missing_file_loads_empty() {
        let dir = tempfile::tempdir().expect("tempdir");
        let db = Database::load_or_default(&dir.path().join("none.json")).expect("empty");
        assert!(db.groups.is_empty());
    }
}
