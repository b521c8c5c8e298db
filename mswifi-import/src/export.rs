//! Turning stored entries back into WLAN profile XML.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};
use xml_bind_core::{Entry, EntryStore};

use crate::database::Group;
use crate::profile::{ProfileError, WlanProfile};
use crate::progress::{Severity, Span, StatusLogger};
use crate::schema::keys;
use crate::system::{file_safe, SystemError, WlanSystem};

/// Profile XML for `entry`, or `None` when the entry does not hold a
/// complete profile.
pub fn export_entry(entry: &Entry) -> Result<Option<String>, ProfileError> {
    let profile = WlanProfile::from_entry(entry);
    if !profile.is_valid() {
        debug!(title = entry.title().unwrap_or(""), "entry is not a complete profile");
        return Ok(None);
    }
    profile.to_xml().map(Some)
}

/// Label used for an entry in file names and messages: its title, else its
/// SSID text. Entries with neither are not exported.
pub fn entry_label(entry: &Entry) -> Option<&str> {
    entry
        .title()
        .filter(|title| !title.is_empty())
        .or_else(|| entry.get(keys::SSID).map(|ssid| ssid.as_str()))
        .filter(|label| !label.is_empty())
}

/// Summary of a group export.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ExportReport {
    pub written: Vec<PathBuf>,
    /// Labels of entries that were not complete profiles.
    pub skipped: Vec<String>,
}

/// Write one `<label>.xml` per complete profile of `group` into `dir`.
pub fn export_group(
    group: &Group,
    dir: &Path,
    status: &mut dyn StatusLogger,
    mut span: Span,
) -> Result<ExportReport, ProfileError> {
    let mut report = ExportReport::default();
    let step = span.remaining() / group.entries.len().max(1) as f64 / 2.0;

    for entry in &group.entries {
        let Some(label) = entry_label(entry) else {
            continue;
        };
        status.set_text(&format!("writing Wi-Fi profile {label}"), Severity::Info);
        span.advance(step, status);

        let profile = WlanProfile::from_entry(entry);
        if profile.is_valid() {
            let path = dir.join(format!("{}.xml", file_safe(label)));
            profile.write_file(&path)?;
            info!(path = %path.display(), "profile exported");
            report.written.push(path);
        } else {
            warn!(entry = label, "entry is not a complete profile, skipped");
            report.skipped.push(label.to_string());
        }
        span.advance(step, status);
    }
    span.finish(status);
    Ok(report)
}

/// Summary of a push to the system store.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PushReport {
    pub interface: String,
    pub pushed: Vec<String>,
    pub skipped: Vec<String>,
}

/// Store every complete profile among `entries` on the first interface,
/// overwriting profiles of the same name.
pub fn push_entries<'e>(
    entries: impl IntoIterator<Item = &'e Entry>,
    system: &mut dyn WlanSystem,
) -> Result<PushReport, PushError> {
    let interface = system
        .interfaces()?
        .into_iter()
        .next()
        .ok_or(SystemError::NoInterface)?;

    let mut report = PushReport {
        interface: interface.clone(),
        ..PushReport::default()
    };
    for entry in entries {
        let label = entry_label(entry).unwrap_or("<untitled>").to_string();
        match export_entry(entry)? {
            Some(xml) => {
                system.set_profile(&interface, &xml, true)?;
                info!(interface = %interface, profile = %label, "profile pushed");
                report.pushed.push(label);
            }
            None => report.skipped.push(label),
        }
    }
    Ok(report)
}

#[derive(Debug, thiserror::Error)]
pub enum PushError {
    #[error(transparent)]
    System(#[from] SystemError),
    #[error(transparent)]
    Profile(#[from] ProfileError),
}
