use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use colored::Colorize;
use mswifi_import::config::resolve_config;
use mswifi_import::database::{Database, Group};
use mswifi_import::export::{entry_label, export_entry, export_group, push_entries};
use mswifi_import::progress::{Span, TracingStatus};
use mswifi_import::system::{file_safe, DirectorySystem};
use xml_bind_core::Entry;

use crate::cli::{ExportArgs, GlobalArgs, PushArgs};
use crate::path_guard;

fn open_group<'d>(db: &'d Database, name: &str) -> Result<&'d Group> {
    db.group(name)
        .with_context(|| format!("group '{name}' does not exist in the database"))
}

fn select<'g>(group: &'g Group, titles: &[String]) -> Result<Vec<&'g Entry>> {
    if titles.is_empty() {
        return Ok(group.entries.iter().collect());
    }
    titles
        .iter()
        .map(|title| {
            group
                .find_by_title(title)
                .map(|index| &group.entries[index])
                .with_context(|| format!("no entry titled '{title}' in group '{}'", group.name))
        })
        .collect()
}

pub fn run_export(args: ExportArgs, global: &GlobalArgs) -> Result<()> {
    let config = resolve_config(global.config.as_deref())?;
    let group_name = args.group.clone().unwrap_or(config.group);
    let db = Database::load(&global.database)
        .with_context(|| format!("failed to open database {}", global.database.display()))?;
    let group = open_group(&db, &group_name)?;
    path_guard::ensure_not_database(&args.output, &global.database)?;

    if args.titles.is_empty() {
        fs::create_dir_all(&args.output)
            .with_context(|| format!("failed to create {}", args.output.display()))?;
        let report = export_group(group, &args.output, &mut TracingStatus, Span::new(0.0, 100.0))?;
        for path in &report.written {
            println!("{} {}", "wrote".green(), path.display());
        }
        for label in &report.skipped {
            println!("{} {label} (not a complete Wi-Fi profile)", "skipped".yellow());
        }
        return Ok(());
    }

    let entries = select(group, &args.titles)?;
    let single_file = entries.len() == 1
        && args.output.extension().and_then(|ext| ext.to_str()) == Some("xml");
    if !single_file {
        fs::create_dir_all(&args.output)
            .with_context(|| format!("failed to create {}", args.output.display()))?;
    }

    for entry in entries {
        let label = entry_label(entry).unwrap_or("<untitled>");
        let Some(xml) = export_entry(entry)? else {
            bail!("entry '{label}' is not a complete Wi-Fi profile");
        };
        let path = if single_file {
            args.output.clone()
        } else {
            args.output.join(format!("{}.xml", file_safe(label)))
        };
        write_xml(&path, &xml)?;
        println!("{} {}", "wrote".green(), path.display());
    }
    Ok(())
}

fn write_xml(path: &Path, xml: &str) -> Result<()> {
    fs::write(path, xml).with_context(|| format!("failed to write {}", path.display()))
}

pub fn run_push(args: PushArgs, global: &GlobalArgs) -> Result<()> {
    let config = resolve_config(global.config.as_deref())?;
    let group_name = args.group.clone().unwrap_or(config.group);
    let db = Database::load(&global.database)
        .with_context(|| format!("failed to open database {}", global.database.display()))?;
    let group = open_group(&db, &group_name)?;
    let entries = select(group, &args.titles)?;

    let mut system = DirectorySystem::new(&args.system_dir);
    let report = push_entries(entries, &mut system)
        .with_context(|| format!("failed to push to WLAN store {}", args.system_dir.display()))?;

    for name in &report.pushed {
        println!("{} {name} -> {}", "pushed".green(), report.interface);
    }
    for name in &report.skipped {
        println!("{} {name} (not a complete Wi-Fi profile)", "skipped".yellow());
    }
    Ok(())
}
