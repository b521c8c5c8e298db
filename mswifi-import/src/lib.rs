//! Import and export of Windows Wi-Fi profiles for a password database.
//!
//! A WLAN profile is the XML document Windows keeps per wireless network
//! (`netsh wlan export profile` writes the same format). This crate binds
//! that document to flat database entries through the schema engine in
//! `xml-bind-core`, so a profile can travel from XML to an entry and back
//! without losing any field the schema knows about.
//!
//! # Architecture
//!
//! - [`schema`] declares the profile tree: element names, namespaces, entry
//!   keys, mandatory flags and value rules.
//! - [`profile`] wraps one bound profile and defines its identity (the
//!   profile name, else the SSID).
//! - [`database`] is the entry store: named groups of entries kept as JSON.
//! - [`importer`] merges a profile into a group and resolves collisions
//!   with an existing entry according to a [`importer::CollisionPolicy`].
//! - [`export`] turns entries back into profile XML, for files or for the
//!   system store.
//! - [`system`] is the native WLAN store contract, with a directory backed
//!   implementation.
//! - [`progress`] carries progress percentages and status lines.
//! - [`inspect`] renders a profile's bound fields for the terminal or JSON.
//! - [`config`] loads tool settings from TOML.
//!
//! # Examples
//!
//! ```ignore
//! use mswifi_import::database::Database;
//! use mswifi_import::importer::{CollisionPolicy, Importer};
//! use mswifi_import::profile::WlanProfile;
//! use mswifi_import::progress::{Span, TracingStatus};
//!
//! let mut profile = WlanProfile::parse_file("HomeWifi.xml".as_ref())?;
//! let mut db = Database::load_or_default("wifi.json".as_ref())?;
//! let group = db.standard_group("WLan", true)?;
//! let mut status = TracingStatus;
//! let outcome = Importer::new(CollisionPolicy::RenameNewOne, &mut status)
//!     .import(&mut profile, group, Span::new(20.0, 80.0));
//! db.save("wifi.json".as_ref())?;
//! ```

pub mod config;
pub mod database;
pub mod export;
pub mod importer;
pub mod inspect;
pub mod profile;
pub mod progress;
pub mod schema;
pub mod system;
