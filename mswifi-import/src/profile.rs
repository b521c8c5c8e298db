//! One WLAN profile bound to the profile schema.

use std::path::Path;

use thiserror::Error;
use tracing::warn;
use xml_bind_core::binding::{Composite, FieldState, Scalar};
use xml_bind_core::{parser, writer, EntryStore, ParseError, WriteError, XmlNode};

use crate::schema::{ns, profile_schema};

const NAME: &[&str] = &["name"];
const SSID_NAME: &[&str] = &["SSIDConfig", "SSID", "name"];
const SSID_HEX: &[&str] = &["SSIDConfig", "SSID", "hex"];

/// Errors raised while moving a profile in or out of XML.
#[derive(Debug, Error)]
pub enum ProfileError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Write(#[from] WriteError),
    #[error("root element <{found}> is not a WLANProfile in namespace {}", ns::WLAN_V1)]
    NotAProfile { found: String },
    #[error("profile '{0}' is incomplete and cannot be serialized")]
    Invalid(String),
}

/// A Wi-Fi connection profile.
#[derive(Debug, Clone, PartialEq)]
pub struct WlanProfile {
    root: Composite<'static>,
}

impl Default for WlanProfile {
    fn default() -> Self {
        Self::new()
    }
}

impl WlanProfile {
    /// An empty, invalid profile.
    pub fn new() -> Self {
        Self {
            root: Composite::root(profile_schema()),
        }
    }

    /// Read a profile from a parsed `WLANProfile` document.
    pub fn from_document(document: &XmlNode) -> Result<Self, ProfileError> {
        let mut profile = Self::new();
        if !profile.root.read_document(document) {
            return Err(ProfileError::NotAProfile {
                found: document.tag.clone(),
            });
        }
        Ok(profile)
    }

    pub fn parse_str(xml: &str) -> Result<Self, ProfileError> {
        Self::from_document(&parser::parse_str(xml)?)
    }

    pub fn parse_file(path: &Path) -> Result<Self, ProfileError> {
        Self::from_document(&parser::parse_file(path)?)
    }

    /// Load a profile from an entry. The result may be invalid; check
    /// [`WlanProfile::is_valid`].
    pub fn from_entry(store: &dyn EntryStore) -> Self {
        let mut profile = Self::new();
        profile.root.load_from(store);
        profile
    }

    pub fn is_valid(&self) -> bool {
        self.root.is_valid()
    }

    /// The explicit profile name, if valid.
    pub fn name(&self) -> Option<&str> {
        self.root.text(NAME)
    }

    /// The SSID as text, if the text form is valid.
    pub fn ssid_name(&self) -> Option<&str> {
        self.root.text(SSID_NAME)
    }

    /// The SSID, preferring the text form over the hex form. `None` unless
    /// the SSID configuration is valid.
    pub fn ssid(&self) -> Option<&str> {
        if !self.root.child(&["SSIDConfig"])?.is_valid() {
            return None;
        }
        self.ssid_name().or_else(|| self.root.text(SSID_HEX))
    }

    /// Effective identity: the name if valid, else the SSID.
    pub fn display_name(&self) -> Option<&str> {
        self.name().or_else(|| self.ssid())
    }

    pub fn set_name(&mut self, name: &str) -> bool {
        self.root.set(NAME, name)
    }

    /// Snapshot of the name leaf, for [`WlanProfile::restore_name`].
    pub(crate) fn name_leaf(&self) -> Option<Scalar> {
        self.root.leaf(NAME).cloned()
    }

    pub(crate) fn restore_name(&mut self, saved: Scalar) {
        if let Some(leaf) = self.root.leaf_mut(NAME) {
            *leaf = saved;
        }
    }

    /// Persist into `store`; `false` leaves the profile's keys removed.
    pub fn save_in(&self, store: &mut dyn EntryStore) -> bool {
        self.root.save_in(store)
    }

    /// Replace the profile with what `store` holds.
    pub fn load_from(&mut self, store: &dyn EntryStore) -> bool {
        self.root.load_from(store)
    }

    /// The `WLANProfile` element tree. Refuses incomplete profiles.
    pub fn to_document(&self) -> Result<XmlNode, ProfileError> {
        if !self.is_valid() {
            let label = self.display_name().unwrap_or("<unnamed>").to_string();
            warn!(profile = %label, "refusing to serialize incomplete profile");
            return Err(ProfileError::Invalid(label));
        }
        Ok(self.root.to_document())
    }

    /// The serialized document, with XML declaration.
    pub fn to_xml(&self) -> Result<String, ProfileError> {
        let bytes = writer::write_document(&self.to_document()?)?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    pub fn write_file(&self, path: &Path) -> Result<(), ProfileError> {
        writer::write_file(&self.to_document()?, path)?;
        Ok(())
    }

    /// Every bound leaf of the present subtree.
    pub fn fields(&self) -> Vec<FieldState> {
        self.root.field_states()
    }

    pub fn composite(&self) -> &Composite<'static> {
        &self.root
    }

    pub fn composite_mut(&mut self) -> &mut Composite<'static> {
        &mut self.root
    }
}
