//! Merging profiles into a group of entries.
//!
//! An import looks for an entry that already stands for the profile. Without
//! one, a fresh entry is created. Otherwise a [`CollisionPolicy`] decides
//! whether the old entry is replaced, the new one renamed, or the import
//! cancelled.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use xml_bind_core::Entry;

use crate::database::Group;
use crate::profile::WlanProfile;
use crate::progress::{Severity, Span, StatusLogger};

/// What to do when the group already holds an entry for the profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CollisionPolicy {
    /// Ask the configured [`CollisionPrompt`].
    #[serde(rename = "ask")]
    AskUser,
    /// Remove the old entry, then create the new one.
    #[serde(rename = "replace")]
    Replace,
    /// Keep the old entry and add the new one as `"<name> (n)"`.
    #[serde(rename = "rename")]
    RenameNewOne,
    /// Leave the group untouched.
    #[serde(rename = "skip")]
    CancelWithoutError,
    /// Leave the group untouched and report an error.
    #[serde(rename = "fail")]
    CancelWithError,
}

/// Interactive answer to [`CollisionPolicy::AskUser`].
pub trait CollisionPrompt {
    /// Pick a policy for a profile that collides with `existing_title`.
    fn choose(&mut self, profile: &str, existing_title: &str) -> CollisionPolicy;
}

/// How the entry came to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Resolution {
    Created,
    Replaced,
    Renamed,
}

/// Why no entry was created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Rejection {
    /// Neither a valid name nor a valid SSID.
    NoIdentity,
    Skipped,
    Cancelled,
    /// The profile is incomplete and could not be saved.
    SaveFailed,
}

/// Result of one import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ImportOutcome {
    Committed {
        index: usize,
        title: String,
        resolution: Resolution,
    },
    Rejected {
        name: Option<String>,
        reason: Rejection,
    },
}

impl ImportOutcome {
    pub fn is_committed(&self) -> bool {
        matches!(self, ImportOutcome::Committed { .. })
    }

    /// A rejection the caller should treat as a failure.
    pub fn is_error(&self) -> bool {
        matches!(
            self,
            ImportOutcome::Rejected {
                reason: Rejection::NoIdentity | Rejection::Cancelled | Rejection::SaveFailed,
                ..
            }
        )
    }
}

/// Index of the first entry whose title is the profile's name or, failing
/// that, its SSID text. Entries without a title never match.
pub fn find_existing(group: &Group, profile: &WlanProfile) -> Option<usize> {
    let name = profile.name();
    let ssid = profile.ssid_name();
    group.entries.iter().position(|entry| {
        entry
            .title()
            .is_some_and(|title| Some(title) == name || Some(title) == ssid)
    })
}

/// Runs imports into one group with a fixed policy.
pub struct Importer<'a> {
    policy: CollisionPolicy,
    prompt: Option<&'a mut dyn CollisionPrompt>,
    status: &'a mut dyn StatusLogger,
}

impl<'a> Importer<'a> {
    pub fn new(policy: CollisionPolicy, status: &'a mut dyn StatusLogger) -> Self {
        Self {
            policy,
            prompt: None,
            status,
        }
    }

    /// Answer [`CollisionPolicy::AskUser`] with `prompt`. Without a prompt,
    /// asking resolves to [`CollisionPolicy::CancelWithoutError`].
    pub fn with_prompt(mut self, prompt: &'a mut dyn CollisionPrompt) -> Self {
        self.prompt = Some(prompt);
        self
    }

    pub fn status(&mut self) -> &mut dyn StatusLogger {
        &mut *self.status
    }

    /// Import `profile` into `group`, reporting progress within `span`.
    ///
    /// The profile's name is used as working title during the import and is
    /// back to its original state when this returns.
    pub fn import(&mut self, profile: &mut WlanProfile, group: &mut Group, span: Span) -> ImportOutcome {
        let Some(working_name) = profile.display_name().map(str::to_string) else {
            self.status
                .set_text("profile has neither a name nor an SSID", Severity::Error);
            return ImportOutcome::Rejected {
                name: None,
                reason: Rejection::NoIdentity,
            };
        };
        let Some(saved_name) = profile.name_leaf() else {
            return ImportOutcome::Rejected {
                name: Some(working_name),
                reason: Rejection::NoIdentity,
            };
        };

        profile.set_name(&working_name);
        let outcome = self.resolve_and_commit(profile, group, &working_name, span);
        profile.restore_name(saved_name);
        outcome
    }

    fn resolve_and_commit(
        &mut self,
        profile: &mut WlanProfile,
        group: &mut Group,
        working_name: &str,
        mut span: Span,
    ) -> ImportOutcome {
        let step = span.remaining() / 3.0;
        span.report(self.status);

        let existing = find_existing(group, profile);
        span.advance(step, self.status);

        let mut resolution = Resolution::Created;
        let mut replaced = None;
        if let Some(index) = existing {
            let existing_title = group.entries[index].title().unwrap_or_default().to_string();
            let policy = self.effective_policy(working_name, &existing_title);
            debug!(profile = working_name, existing = %existing_title, ?policy, "collision");

            match policy {
                CollisionPolicy::CancelWithoutError | CollisionPolicy::AskUser => {
                    span.finish(self.status);
                    return ImportOutcome::Rejected {
                        name: Some(working_name.to_string()),
                        reason: Rejection::Skipped,
                    };
                }
                CollisionPolicy::CancelWithError => {
                    self.status.set_text(
                        &format!("an entry named '{existing_title}' already exists"),
                        Severity::Error,
                    );
                    span.finish(self.status);
                    return ImportOutcome::Rejected {
                        name: Some(working_name.to_string()),
                        reason: Rejection::Cancelled,
                    };
                }
                CollisionPolicy::Replace => {
                    replaced = Some(index);
                    resolution = Resolution::Replaced;
                }
                CollisionPolicy::RenameNewOne => {
                    let title = free_title(group, working_name);
                    profile.set_name(&title);
                    resolution = Resolution::Renamed;
                }
            }
        }

        let mut entry = Entry::new();
        span.advance(step, self.status);

        let outcome = if profile.save_in(&mut entry) {
            let title = entry.title().unwrap_or(working_name).to_string();
            // The old entry goes only once the new one is known to be complete.
            if let Some(old) = replaced {
                group.remove(old);
            }
            let index = group.add(entry);
            info!(title = %title, group = %group.name, ?resolution, "profile imported");
            ImportOutcome::Committed {
                index,
                title,
                resolution,
            }
        } else {
            warn!(profile = working_name, "profile is incomplete, no entry created");
            self.status.set_text(
                &format!("profile '{working_name}' is incomplete and was not imported"),
                Severity::Error,
            );
            ImportOutcome::Rejected {
                name: Some(working_name.to_string()),
                reason: Rejection::SaveFailed,
            }
        };
        span.finish(self.status);
        outcome
    }

    fn effective_policy(&mut self, working_name: &str, existing_title: &str) -> CollisionPolicy {
        if self.policy != CollisionPolicy::AskUser {
            return self.policy;
        }
        match self.prompt.as_mut() {
            Some(prompt) => prompt.choose(working_name, existing_title),
            None => CollisionPolicy::CancelWithoutError,
        }
    }
}

/// First `"<base> (n)"`, n >= 2, that no entry of `group` uses as title.
fn free_title(group: &Group, base: &str) -> String {
    (2usize..)
        .map(|n| format!("{base} ({n})"))
        .find(|candidate| group.find_by_title(candidate).is_none())
        .unwrap_or_else(|| base.to_string())
}
