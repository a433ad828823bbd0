use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use schemer::schema::layout::connectors;
use schemer::utils::logging::init_logging;
use schemer::{config, Config, SchemaEditor};

/// Schemer CLI: check, repair and export visual schema designer projects
#[derive(Parser)]
#[command(name = "schemer", version, about)]
struct Cli {
    /// Configuration file (default: ./schemer.toml when present)
    #[arg(long, short)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create a new project seeded by the configured framework
    New {
        /// Project file to write
        path: PathBuf,
        /// Project name (default: file stem)
        #[arg(long)]
        name: Option<String>,
    },

    /// Report schema invariant violations
    Check {
        /// Project file
        path: PathBuf,
    },

    /// Re-derive relations and drop orphaned fields
    Repair {
        /// Project file
        path: PathBuf,
        /// Show what would change without saving
        #[arg(long)]
        dry_run: bool,
    },

    /// Generate framework sources
    Export {
        /// Project file
        path: PathBuf,
        /// Output directory (default: from configuration)
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Print tables, fields and relations
    Inspect {
        /// Project file
        path: PathBuf,
        /// Print the raw project file as JSON
        #[arg(long)]
        json: bool,
    },
}

fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => {
            let default = PathBuf::from("schemer.toml");
            if !default.exists() {
                return Ok(Config::default());
            }
            default
        }
    };

    config::load_from_file(&path.to_string_lossy())
        .with_context(|| format!("loading configuration from {}", path.display()))
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = load_config(cli.config.as_deref())?;
    init_logging(&config.logging).context("initializing logging")?;

    match cli.command {
        Command::New { path, name } => {
            if path.exists() {
                bail!("{} already exists", path.display());
            }
            let name = match name {
                Some(n) => n,
                None => path
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .context("cannot derive a project name from the path")?,
            };

            let mut editor = SchemaEditor::new(config, &name)?;
            editor
                .save_as(&path)
                .with_context(|| format!("writing {}", path.display()))?;
            println!("Created project `{}` at {}", name, path.display());
        }

        Command::Check { path } => {
            config.project.validate_on_load = false;
            let editor = open(config, &path)?;
            let violations = editor.audit();

            if violations.is_empty() {
                println!("{}: consistent", path.display());
            } else {
                for violation in &violations {
                    println!("{}", violation);
                }
                bail!("{}: {} violation(s)", path.display(), violations.len());
            }
        }

        Command::Repair { path, dry_run } => {
            config.project.validate_on_load = false;
            let mut editor = open(config, &path)?;
            let changes = editor.reconcile()?;

            for delta in changes.iter() {
                println!("{:?}", delta);
            }
            if changes.is_empty() {
                println!("{}: nothing to repair", path.display());
            } else if dry_run {
                println!("{} change(s) not saved (dry run)", changes.len());
            } else {
                editor.save()?;
                println!("{} change(s) saved to {}", changes.len(), path.display());
            }
        }

        Command::Export { path, output } => {
            let editor = open(config, &path)?;
            let written = editor.export(output.as_deref())?;
            for file in &written {
                println!("{}", file.display());
            }
        }

        Command::Inspect { path, json } => {
            config.project.validate_on_load = false;
            let editor = open(config, &path)?;

            if json {
                let file = schemer::ProjectFile::from_store(editor.project().clone(), editor.store());
                println!("{}", serde_json::to_string_pretty(&file)?);
                return Ok(());
            }

            let store = editor.store();
            println!("Project: {} (zoom {}%)", editor.project().name, editor.project().zoom);
            for table in store.tables() {
                println!("\n{} @ ({}, {})", table.name, table.position.x, table.position.y);
                for field in store.fields_of(table.id) {
                    let target = store
                        .relation_for_field(field.id)?
                        .and_then(|r| store.table(r.to_table_id))
                        .map(|t| format!(" -> {}", t.name))
                        .unwrap_or_default();
                    println!("  {} {}{}", field.name, field.field_type, target);
                }
            }
            println!("\n{} relation(s) drawn", connectors(store).len());
        }
    }

    Ok(())
}

fn open(config: Config, path: &Path) -> anyhow::Result<SchemaEditor> {
    SchemaEditor::open(config, path).with_context(|| format!("opening {}", path.display()))
}
