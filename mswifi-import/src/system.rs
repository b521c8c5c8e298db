//! The operating system's WLAN profile store.
//!
//! [`WlanSystem`] is what import and push need from the native API. The
//! [`DirectorySystem`] implementation reads the layout `netsh wlan export
//! profile folder=...` leaves behind, one sub-directory per interface.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, warn};

use crate::profile::WlanProfile;
use crate::progress::{Span, StatusLogger};

#[derive(Debug, Error)]
pub enum SystemError {
    #[error("no wireless interface available")]
    NoInterface,
    #[error("unknown interface '{0}'")]
    UnknownInterface(String),
    #[error("profile '{0}' already exists and overwrite was not requested")]
    AlreadyExists(String),
    #[error("profile XML has no name")]
    Unnamed,
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
}

/// Access to the native WLAN configuration.
pub trait WlanSystem {
    /// Names of the wireless interfaces, in system order.
    fn interfaces(&self) -> Result<Vec<String>, SystemError>;

    /// Profile name to profile XML for one interface.
    fn profile_xmls(&self, interface: &str) -> Result<BTreeMap<String, String>, SystemError>;

    /// Store a profile on `interface`.
    fn set_profile(&mut self, interface: &str, xml: &str, overwrite: bool) -> Result<(), SystemError>;
}

/// A WLAN store kept in a directory tree: `<root>/<interface>/<profile>.xml`.
#[derive(Debug, Clone)]
pub struct DirectorySystem {
    root: PathBuf,
}

impl DirectorySystem {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn interface_dir(&self, interface: &str) -> Result<PathBuf, SystemError> {
        let dir = self.root.join(interface);
        if dir.is_dir() {
            Ok(dir)
        } else {
            Err(SystemError::UnknownInterface(interface.to_string()))
        }
    }
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> SystemError + '_ {
    move |source| SystemError::Io {
        path: path.display().to_string(),
        source,
    }
}

impl WlanSystem for DirectorySystem {
    fn interfaces(&self) -> Result<Vec<String>, SystemError> {
        let mut names = Vec::new();
        for item in fs::read_dir(&self.root).map_err(io_error(&self.root))? {
            let item = item.map_err(io_error(&self.root))?;
            if item.path().is_dir() {
                names.push(item.file_name().to_string_lossy().into_owned());
            }
        }
        names.sort();
        Ok(names)
    }

    fn profile_xmls(&self, interface: &str) -> Result<BTreeMap<String, String>, SystemError> {
        let dir = self.interface_dir(interface)?;
        let mut profiles = BTreeMap::new();
        for item in fs::read_dir(&dir).map_err(io_error(&dir))? {
            let path = item.map_err(io_error(&dir))?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("xml") {
                continue;
            }
            let Some(stem) = path.file_stem().map(|s| s.to_string_lossy().into_owned()) else {
                continue;
            };
            let xml = fs::read_to_string(&path).map_err(io_error(&path))?;
            profiles.insert(stem, xml);
        }
        Ok(profiles)
    }

    fn set_profile(&mut self, interface: &str, xml: &str, overwrite: bool) -> Result<(), SystemError> {
        let dir = self.interface_dir(interface)?;
        let name = xml_bind_core::parse_str(xml)
            .ok()
            .and_then(|doc| doc.get_text(&["name"]).map(str::to_string))
            .filter(|name| !name.is_empty())
            .ok_or(SystemError::Unnamed)?;

        let path = dir.join(format!("{}.xml", file_safe(&name)));
        if path.exists() && !overwrite {
            return Err(SystemError::AlreadyExists(name));
        }
        fs::write(&path, xml).map_err(io_error(&path))?;
        debug!(interface, profile = %name, "profile stored");
        Ok(())
    }
}

/// Replace characters that cannot appear in file names.
pub fn file_safe(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect()
}

/// Collect every valid profile of every interface, keyed by profile name.
///
/// Profiles that fail to parse or are incomplete are left out. Progress
/// moves through the first half of `span` per interface and the second half
/// per profile.
pub fn read_system_profiles(
    system: &dyn WlanSystem,
    status: &mut dyn StatusLogger,
    mut span: Span,
) -> Result<BTreeMap<String, WlanProfile>, SystemError> {
    let interfaces = system.interfaces()?;
    if interfaces.is_empty() {
        return Err(SystemError::NoInterface);
    }

    let per_interface = span.remaining() / interfaces.len() as f64;
    let mut profiles = BTreeMap::new();
    for interface in &interfaces {
        let xmls = system.profile_xmls(interface)?;
        span.advance(per_interface / 2.0, status);

        let per_profile = per_interface / 2.0 / xmls.len().max(1) as f64;
        for (name, xml) in xmls {
            match WlanProfile::parse_str(&xml) {
                Ok(profile) if profile.is_valid() => {
                    profiles.insert(name, profile);
                }
                Ok(_) => warn!(interface = %interface, profile = %name, "skipping incomplete profile"),
                Err(err) => warn!(interface = %interface, profile = %name, "skipping unreadable profile: {err}"),
            }
            span.advance(per_profile, status);
        }
    }
    Ok(profiles)
}
