use std::net::SocketAddr;
use std::path::PathBuf;

use bk_studio::{AssetId, Category, ProjectName};
use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "brandkit",
    about = "Brand asset store with deduplicated uploads and per-project selection",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Data directory (overrides `root` in the config file)
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,

    /// TOML config file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create, list, or delete projects
    Project(ProjectArgs),
    /// Upload reference images (duplicates are skipped)
    Upload(UploadArgs),
    /// Import an image as a generated asset and select it
    Import(ImportArgs),
    /// List the assets of a project
    Assets(AssetsArgs),
    /// Write an asset's content to a file
    Export(ExportArgs),
    /// Delete an asset
    Rm(RmArgs),
    /// Select a generated asset
    Select(SelectArgs),
    /// Show the selected asset of a project
    Current(CurrentArgs),
    /// Start the HTTP server
    Serve(ServeArgs),
}

#[derive(Args)]
pub struct ProjectArgs {
    #[command(subcommand)]
    pub action: ProjectAction,
}

#[derive(Subcommand)]
pub enum ProjectAction {
    Create { name: ProjectName },
    List,
    /// Delete a project with all its assets
    Delete {
        name: ProjectName,
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Args)]
pub struct UploadArgs {
    pub project: ProjectName,
    #[arg(required = true)]
    pub files: Vec<PathBuf>,
}

#[derive(Args)]
pub struct ImportArgs {
    pub project: ProjectName,
    pub file: PathBuf,
}

#[derive(Args)]
pub struct AssetsArgs {
    pub project: ProjectName,
    /// `reference` or `generated`; both when omitted
    #[arg(short, long)]
    pub category: Option<Category>,
}

#[derive(Args)]
pub struct ExportArgs {
    pub id: AssetId,
    pub out: PathBuf,
}

#[derive(Args)]
pub struct RmArgs {
    pub project: ProjectName,
    pub id: AssetId,
}

#[derive(Args)]
pub struct SelectArgs {
    pub project: ProjectName,
    pub id: AssetId,
}

#[derive(Args)]
pub struct CurrentArgs {
    pub project: ProjectName,
}

#[derive(Args)]
pub struct ServeArgs {
    /// Listen address (overrides `[server] bind_addr`)
    #[arg(long)]
    pub bind: Option<SocketAddr>,
}
