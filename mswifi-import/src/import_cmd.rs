use std::io::IsTerminal;
use std::path::Path;

use anyhow::{bail, Context, Result};
use colored::Colorize;
use dialoguer::Select;
use mswifi_import::config::{resolve_config, Config};
use mswifi_import::database::Database;
use mswifi_import::importer::{CollisionPolicy, CollisionPrompt, ImportOutcome, Importer};
use mswifi_import::profile::WlanProfile;
use mswifi_import::progress::{Severity, Span, TracingStatus};
use mswifi_import::system::{read_system_profiles, DirectorySystem};

use crate::cli::{GlobalArgs, ImportArgs, ImportSystemArgs, TargetArgs};

/// Where imported profiles go and how collisions are settled.
struct Target {
    group: String,
    create_group: bool,
    policy: CollisionPolicy,
}

fn resolve_target(args: &TargetArgs, config: &Config) -> Target {
    Target {
        group: args.group.clone().unwrap_or_else(|| config.group.clone()),
        create_group: config.create_group && !args.no_create_group,
        policy: args
            .on_collision
            .map(CollisionPolicy::from)
            .unwrap_or(config.on_collision),
    }
}

/// Answers collisions with a menu on the terminal.
struct TerminalPrompt;

impl CollisionPrompt for TerminalPrompt {
    fn choose(&mut self, profile: &str, existing_title: &str) -> CollisionPolicy {
        let choices = &[
            "Replace the existing entry",
            "Keep both, rename the new one",
            "Skip this profile",
        ];
        let selection = Select::new()
            .with_prompt(format!(
                "An entry '{existing_title}' already exists for Wi-Fi profile '{profile}'"
            ))
            .items(choices)
            .default(1)
            .interact();
        match selection {
            Ok(0) => CollisionPolicy::Replace,
            Ok(1) => CollisionPolicy::RenameNewOne,
            _ => CollisionPolicy::CancelWithoutError,
        }
    }
}

#[derive(Default)]
struct ImportSummary {
    committed: usize,
    skipped: usize,
    failed: usize,
}

impl ImportSummary {
    fn record(&mut self, source: &str, outcome: &ImportOutcome) {
        match outcome {
            ImportOutcome::Committed {
                title, resolution, ..
            } => {
                self.committed += 1;
                println!("{} {source} -> {title} ({resolution:?})", "imported".green());
            }
            ImportOutcome::Rejected { reason, .. } if outcome.is_error() => {
                self.failed += 1;
                println!("{} {source} ({reason:?})", "failed".red());
            }
            ImportOutcome::Rejected { .. } => {
                self.skipped += 1;
                println!("{} {source}", "skipped".yellow());
            }
        }
    }

    fn finish(self) -> Result<()> {
        println!(
            "imported={} skipped={} failed={}",
            self.committed, self.skipped, self.failed
        );
        if self.failed > 0 {
            bail!("{} profile(s) could not be imported", self.failed);
        }
        Ok(())
    }
}

fn load_database(path: &Path) -> Result<Database> {
    Database::load_or_default(path)
        .with_context(|| format!("failed to open database {}", path.display()))
}

fn with_prompt<'a>(
    importer: Importer<'a>,
    policy: CollisionPolicy,
    prompt: &'a mut TerminalPrompt,
) -> Importer<'a> {
    if policy == CollisionPolicy::AskUser && std::io::stdin().is_terminal() {
        importer.with_prompt(prompt)
    } else {
        importer
    }
}

pub fn run_import(args: ImportArgs, global: &GlobalArgs) -> Result<()> {
    let config = resolve_config(global.config.as_deref())?;
    let target = resolve_target(&args.target, &config);
    let mut db = load_database(&global.database)?;
    let group = db
        .standard_group(&target.group, target.create_group)
        .context("cannot import without a target group")?;

    let mut status = TracingStatus;
    let mut prompt = TerminalPrompt;
    let mut importer = with_prompt(
        Importer::new(target.policy, &mut status),
        target.policy,
        &mut prompt,
    );

    let mut summary = ImportSummary::default();
    let share = 100.0 / args.files.len().max(1) as f64;
    for (i, file) in args.files.iter().enumerate() {
        let source = file.display().to_string();
        let mut span = Span::new(i as f64 * share, share);
        span.report(importer.status());

        let mut profile = match WlanProfile::parse_file(file) {
            Ok(profile) => profile,
            Err(err) => {
                importer.status().set_text(
                    &format!("failed to read Wi-Fi profile {source}: {err}"),
                    Severity::Error,
                );
                summary.failed += 1;
                println!("{} {source} ({err})", "failed".red());
                continue;
            }
        };
        span.advance(share / 5.0, importer.status());

        let outcome = importer.import(&mut profile, group, span);
        summary.record(&source, &outcome);
    }

    db.save(&global.database)
        .with_context(|| format!("failed to save database {}", global.database.display()))?;
    summary.finish()
}

pub fn run_import_system(args: ImportSystemArgs, global: &GlobalArgs) -> Result<()> {
    let config = resolve_config(global.config.as_deref())?;
    let target = resolve_target(&args.target, &config);
    let system = DirectorySystem::new(&args.system_dir);

    let mut status = TracingStatus;
    let profiles = read_system_profiles(&system, &mut status, Span::new(0.0, 20.0))
        .with_context(|| format!("failed to read WLAN store {}", args.system_dir.display()))?;

    let mut db = load_database(&global.database)?;
    let group = db
        .standard_group(&target.group, target.create_group)
        .context("cannot import without a target group")?;

    let mut prompt = TerminalPrompt;
    let mut importer = with_prompt(
        Importer::new(target.policy, &mut status),
        target.policy,
        &mut prompt,
    );

    let mut summary = ImportSummary::default();
    let share = 80.0 / profiles.len().max(1) as f64;
    for (i, (name, mut profile)) in profiles.into_iter().enumerate() {
        let span = Span::new(20.0 + i as f64 * share, share);
        let outcome = importer.import(&mut profile, group, span);
        let (text, severity) = if outcome.is_committed() {
            (format!("imported Wi-Fi profile {name}"), Severity::Info)
        } else if outcome.is_error() {
            (format!("failed to import Wi-Fi profile {name}"), Severity::Error)
        } else {
            (format!("skipped Wi-Fi profile {name}"), Severity::Info)
        };
        importer.status().set_text(&text, severity);
        summary.record(&name, &outcome);
    }

    db.save(&global.database)
        .with_context(|| format!("failed to save database {}", global.database.display()))?;
    summary.finish()
}
