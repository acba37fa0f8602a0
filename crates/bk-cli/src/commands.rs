use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context};
use bk_server::{BrandkitServer, ServerConfig};
use bk_studio::{AssetMeta, Backend, Category, ProjectName, Session, Studio, StudioConfig};
use colored::Colorize;
use serde::Serialize;
use serde_json::json;
use tracing::debug;

use crate::cli::*;

const SESSION_FILE: &str = "session.json";

/// An opened studio plus the session persisted next to it.
struct Workspace {
    studio: Studio,
    session: Session,
    session_path: Option<PathBuf>,
    server: ServerConfig,
    format: OutputFormat,
}

impl Workspace {
    fn open(
        root: Option<PathBuf>,
        config: Option<PathBuf>,
        format: OutputFormat,
    ) -> anyhow::Result<Self> {
        let text = match &config {
            Some(path) => fs::read_to_string(path)
                .with_context(|| format!("cannot read config {}", path.display()))?,
            None => String::new(),
        };
        let mut studio_config = StudioConfig::from_toml_str(&text)?;
        if let Some(root) = root {
            studio_config.root = root;
        }
        let server = ServerConfig::from_toml_str(&text)?;

        let session_path = match studio_config.backend {
            Backend::File => Some(studio_config.root.join(SESSION_FILE)),
            Backend::Memory => None,
        };
        let studio = Studio::open(studio_config)?;
        let session = match &session_path {
            Some(path) => load_session(&studio, path)?,
            None => studio.new_session(),
        };

        Ok(Self { studio, session, session_path, server, format })
    }

    fn save_session(&self) -> anyhow::Result<()> {
        let Some(path) = &self.session_path else {
            return Ok(());
        };
        let json = serde_json::to_string_pretty(&self.session)?;
        fs::write(path, json).with_context(|| format!("cannot write {}", path.display()))?;
        debug!(path = %path.display(), "session saved");
        Ok(())
    }

    fn switch(&mut self, project: &ProjectName) -> anyhow::Result<()> {
        self.studio.switch_project(&mut self.session, project)?;
        Ok(())
    }

    /// Print `value` as JSON, or run `text` for human output.
    fn emit<T: Serialize>(&self, value: &T, text: impl FnOnce()) -> anyhow::Result<()> {
        match self.format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
            OutputFormat::Text => text(),
        }
        Ok(())
    }
}

fn load_session(studio: &Studio, path: &Path) -> anyhow::Result<Session> {
    if !path.exists() {
        return Ok(studio.new_session());
    }
    let text = fs::read_to_string(path)
        .with_context(|| format!("cannot read {}", path.display()))?;
    let mut session: Session = serde_json::from_str(&text)
        .with_context(|| format!("corrupt session file {}", path.display()))?;
    session.set_fallback(studio.config().selection_fallback);
    Ok(session)
}

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let mut ws = Workspace::open(cli.root, cli.config, cli.format)?;
    match cli.command {
        Command::Project(args) => cmd_project(&mut ws, args.action),
        Command::Upload(args) => cmd_upload(&mut ws, args),
        Command::Import(args) => cmd_import(&mut ws, args),
        Command::Assets(args) => cmd_assets(&ws, args),
        Command::Export(args) => cmd_export(&ws, args),
        Command::Rm(args) => cmd_rm(&mut ws, args),
        Command::Select(args) => cmd_select(&mut ws, args),
        Command::Current(args) => cmd_current(&mut ws, args),
        Command::Serve(args) => cmd_serve(ws, args),
    }
}

fn cmd_project(ws: &mut Workspace, action: ProjectAction) -> anyhow::Result<()> {
    match action {
        ProjectAction::Create { name } => {
            let record = ws.studio.create_project(&name)?;
            ws.emit(&record, || {
                println!("{} Created project {}", "✓".green().bold(), name.as_str().yellow());
            })
        }
        ProjectAction::List => {
            let projects = ws.studio.list_projects()?;
            ws.emit(&projects, || {
                if projects.is_empty() {
                    println!("No projects.");
                }
                for p in &projects {
                    println!(
                        "  {}  {}",
                        p.name.as_str().yellow().bold(),
                        p.created_at.to_rfc3339().dimmed()
                    );
                }
            })
        }
        ProjectAction::Delete { name, yes } => {
            if !yes {
                bail!("deleting project {name} removes all of its assets; pass --yes to confirm");
            }
            let outcome = ws.studio.delete_project(&mut ws.session, &name)?;
            ws.save_session()?;
            ws.emit(&outcome, || {
                if outcome.existed || outcome.assets_removed > 0 {
                    println!(
                        "{} Deleted project {} ({} assets)",
                        "✓".green().bold(),
                        name.as_str().yellow(),
                        outcome.assets_removed
                    );
                } else {
                    println!("No project named {}.", name.as_str().yellow());
                }
            })
        }
    }
}

fn cmd_upload(ws: &mut Workspace, args: UploadArgs) -> anyhow::Result<()> {
    ws.switch(&args.project)?;
    let mut results = Vec::with_capacity(args.files.len());
    for path in &args.files {
        let content = fs::read(path).with_context(|| format!("cannot read {}", path.display()))?;
        let filename = display_name(path);
        let admission = ws.studio.upload_reference(&mut ws.session, &filename, content)?;
        results.push(json!({ "file": filename, "id": admission.id, "created": admission.created }));
        if ws.format == OutputFormat::Text {
            let status = if admission.created { "stored".green() } else { "duplicate".dimmed() };
            println!("  {} {} {}", status, filename, admission.id.short_id().cyan());
        }
    }
    ws.save_session()?;
    if ws.format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    }
    Ok(())
}

fn cmd_import(ws: &mut Workspace, args: ImportArgs) -> anyhow::Result<()> {
    ws.switch(&args.project)?;
    let content =
        fs::read(&args.file).with_context(|| format!("cannot read {}", args.file.display()))?;
    let filename = display_name(&args.file);
    let id = ws.studio.import_for_edit(&mut ws.session, &filename, content)?;
    ws.save_session()?;
    ws.emit(&json!({ "id": id, "filename": filename }), || {
        println!(
            "{} Imported {} as {} (selected)",
            "✓".green().bold(),
            filename,
            id.to_string().cyan()
        );
    })
}

fn cmd_assets(ws: &Workspace, args: AssetsArgs) -> anyhow::Result<()> {
    if !ws.studio.project_exists(&args.project)? {
        bail!("project not found: {}", args.project);
    }
    let categories = match args.category {
        Some(category) => vec![category],
        None => Category::ALL.to_vec(),
    };
    let mut assets: Vec<AssetMeta> = Vec::new();
    for category in categories {
        assets.extend(ws.studio.list_assets(&args.project, category)?);
    }
    ws.emit(&assets, || {
        if assets.is_empty() {
            println!("No assets.");
        }
        for a in &assets {
            println!(
                "{}  {:<9}  {:>8}  {}",
                a.id.to_string().cyan(),
                a.category.as_str(),
                a.size,
                a.filename
            );
        }
    })
}

fn cmd_export(ws: &Workspace, args: ExportArgs) -> anyhow::Result<()> {
    let content = ws.studio.asset_content(&args.id)?;
    fs::write(&args.out, &content).with_context(|| format!("cannot write {}", args.out.display()))?;
    ws.emit(&json!({ "id": args.id, "out": args.out, "bytes": content.len() }), || {
        println!(
            "{} Wrote {} bytes to {}",
            "✓".green().bold(),
            content.len(),
            args.out.display()
        );
    })
}

fn cmd_rm(ws: &mut Workspace, args: RmArgs) -> anyhow::Result<()> {
    ws.switch(&args.project)?;
    if let Some(meta) = ws.studio.store().meta(&args.id)? {
        if meta.project != args.project {
            bail!("asset {} belongs to project {}, not {}", args.id, meta.project, args.project);
        }
    }
    let deleted = ws.studio.delete_asset(&mut ws.session, &args.id)?;
    ws.save_session()?;
    ws.emit(&json!({ "id": args.id, "deleted": deleted }), || {
        if deleted {
            println!("{} Deleted {}", "✓".green().bold(), args.id.to_string().cyan());
        } else {
            println!("No asset {}.", args.id.to_string().cyan());
        }
    })
}

fn cmd_select(ws: &mut Workspace, args: SelectArgs) -> anyhow::Result<()> {
    ws.switch(&args.project)?;
    ws.studio.select(&mut ws.session, args.id)?;
    ws.save_session()?;
    ws.emit(&json!({ "project": args.project, "id": args.id }), || {
        println!("Selected {} in {}", args.id.to_string().cyan(), args.project.as_str().yellow());
    })
}

fn cmd_current(ws: &mut Workspace, args: CurrentArgs) -> anyhow::Result<()> {
    ws.switch(&args.project)?;
    let current = ws.studio.current(&mut ws.session)?;
    // A vanished selection is repaired on read; keep the repair.
    ws.save_session()?;
    ws.emit(&json!({ "project": args.project, "id": current }), || match current {
        Some(id) => println!("{}", id.to_string().cyan()),
        None => println!("Nothing selected in {}.", args.project.as_str().yellow()),
    })
}

fn cmd_serve(ws: Workspace, args: ServeArgs) -> anyhow::Result<()> {
    let mut config = ws.server;
    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }
    println!(
        "brandkit server on {} (root: {})",
        config.bind_addr.to_string().bold(),
        ws.studio.config().root.display()
    );
    let server = BrandkitServer::new(config, Arc::new(ws.studio));
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(server.serve())?;
    Ok(())
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
