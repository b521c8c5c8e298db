use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use mswifi_import::importer::CollisionPolicy;

#[derive(Parser, Debug)]
#[command(name = "mswifi-import")]
#[command(about = "Import and export Windows Wi-Fi profiles")]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(clap::Args, Debug)]
pub struct GlobalArgs {
    /// More output per occurrence (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
    /// Config file. Defaults to ./mswifi-import.toml if present.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    /// Database file holding the entries.
    #[arg(long, global = true, default_value = "wifi-db.json")]
    pub database: PathBuf,
}

#[derive(clap::Subcommand, Debug)]
pub enum Command {
    /// List the bound fields of a profile XML file.
    Inspect(InspectArgs),
    /// Import profile XML files into the database.
    Import(ImportArgs),
    /// Import every valid profile of the system WLAN store.
    ImportSystem(ImportSystemArgs),
    /// Write database entries back out as profile XML.
    Export(ExportArgs),
    /// Store database entries in the system WLAN store.
    Push(PushArgs),
}

#[derive(Parser, Debug)]
pub struct InspectArgs {
    pub file: PathBuf,
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
    /// Print the raw element tree up to this depth instead of the fields.
    #[arg(long)]
    pub tree: Option<usize>,
    /// Show key material in clear text.
    #[arg(long)]
    pub show_secrets: bool,
}

#[derive(clap::Args, Debug)]
pub struct TargetArgs {
    /// Group receiving the profiles. Overrides the config file.
    #[arg(long)]
    pub group: Option<String>,
    /// Fail instead of creating a missing group.
    #[arg(long)]
    pub no_create_group: bool,
    /// What to do when an entry for the profile already exists.
    #[arg(long, value_enum)]
    pub on_collision: Option<CollisionArg>,
}

#[derive(Parser, Debug)]
pub struct ImportArgs {
    #[arg(required = true)]
    pub files: Vec<PathBuf>,
    #[command(flatten)]
    pub target: TargetArgs,
}

#[derive(Parser, Debug)]
pub struct ImportSystemArgs {
    /// Directory holding one sub-directory of profile files per interface.
    #[arg(long)]
    pub system_dir: PathBuf,
    #[command(flatten)]
    pub target: TargetArgs,
}

#[derive(Parser, Debug)]
pub struct ExportArgs {
    /// Entries to export. Exports the whole group when omitted.
    #[arg(long = "title")]
    pub titles: Vec<String>,
    /// Group to read from. Overrides the config file.
    #[arg(long)]
    pub group: Option<String>,
    /// Output directory for group exports, or file for a single title.
    #[arg(long)]
    pub output: PathBuf,
}

#[derive(Parser, Debug)]
pub struct PushArgs {
    #[arg(long)]
    pub system_dir: PathBuf,
    #[arg(long)]
    pub group: Option<String>,
    /// Entries to push. Pushes the whole group when omitted.
    pub titles: Vec<String>,
}

#[derive(Clone, Copy, Debug, ValueEnum, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Clone, Copy, Debug, ValueEnum, PartialEq, Eq)]
pub enum CollisionArg {
    Ask,
    Replace,
    Rename,
    Skip,
    Fail,
}

impl From<CollisionArg> for CollisionPolicy {
    fn from(arg: CollisionArg) -> Self {
        match arg {
            CollisionArg::Ask => CollisionPolicy::AskUser,
            CollisionArg::Replace => CollisionPolicy::Replace,
            CollisionArg::Rename => CollisionPolicy::RenameNewOne,
            CollisionArg::Skip => CollisionPolicy::CancelWithoutError,
            CollisionArg::Fail => CollisionPolicy::CancelWithError,
        }
    }
}
