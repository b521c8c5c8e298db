use anyhow::{Context, Result};
use clap::Parser;
use mswifi_import::inspect::{render_fields, render_tree, ProfileReport};
use mswifi_import::profile::WlanProfile;
use tracing_subscriber::EnvFilter;
use xml_bind_core::parse_file;

mod cli;
mod export_cmd;
mod import_cmd;
mod path_guard;

use cli::{Cli, Command, InspectArgs, OutputFormat};

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.global.verbose);

    match cli.command {
        Command::Inspect(args) => run_inspect(args),
        Command::Import(args) => import_cmd::run_import(args, &cli.global),
        Command::ImportSystem(args) => import_cmd::run_import_system(args, &cli.global),
        Command::Export(args) => export_cmd::run_export(args, &cli.global),
        Command::Push(args) => export_cmd::run_push(args, &cli.global),
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run_inspect(args: InspectArgs) -> Result<()> {
    let document = parse_file(&args.file)
        .with_context(|| format!("failed to parse {}", args.file.display()))?;

    if let Some(depth) = args.tree {
        print!("{}", render_tree(&document, depth));
        return Ok(());
    }

    let profile = WlanProfile::from_document(&document)
        .with_context(|| format!("{} is not a Wi-Fi profile", args.file.display()))?;
    let report = ProfileReport::new(&profile, args.show_secrets);
    match args.format {
        OutputFormat::Text => print!("{}", render_fields(&report)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
    }
    Ok(())
}
