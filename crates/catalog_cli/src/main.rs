//! Command-line front end for offline catalog checks.
//!
//! # Responsibility
//! - Load a JSON catalog fixture and a selection, run one reconciliation and
//!   print what a UI would show.
//! - Keep output line-oriented so it can be diffed in scripts.

use catalog_core::lookup::local_id;
use catalog_core::{
    init_stderr_logging, Catalog, CatalogObject, CatalogSettings, CatalogSource,
    FixtureCatalogSource, Selection,
};
use clap::{Parser, Subcommand};
use log::debug;
use std::error::Error;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(name = "catalog-cli", version, about = "Inspect a filtered analytics catalog")]
struct Cli {
    /// Overrides the log level from settings (trace|debug|info|warn|error).
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Lists workspaces as `id<TAB>name`.
    Workspaces {
        #[arg(long)]
        fixture: PathBuf,
    },
    /// Reconciles a workspace catalog against a selection.
    Report {
        #[arg(long)]
        fixture: PathBuf,
        #[arg(long)]
        workspace: String,
        /// Selection JSON; nothing selected when omitted.
        #[arg(long)]
        selection: Option<PathBuf>,
        /// Settings JSON; defaults when omitted.
        #[arg(long)]
        settings: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    match cli.command {
        Command::Workspaces { fixture } => {
            init_logging(cli.log_level.as_deref(), &CatalogSettings::default())?;
            let source = FixtureCatalogSource::from_path(&fixture)?;
            for workspace in source.workspaces()? {
                println!("{}\t{}", workspace.id, workspace.name);
            }
            Ok(())
        }
        Command::Report {
            fixture,
            workspace,
            selection,
            settings,
        } => {
            let settings = match settings {
                Some(path) => CatalogSettings::from_path(path)?,
                None => CatalogSettings::default(),
            };
            init_logging(cli.log_level.as_deref(), &settings)?;
            let selection = load_selection(selection.as_deref())?;
            let source = FixtureCatalogSource::from_path(&fixture)?;
            report(&source, &workspace, selection, settings)
        }
    }
}

fn init_logging(level: Option<&str>, settings: &CatalogSettings) -> Result<(), String> {
    init_stderr_logging(level.unwrap_or(settings.log_level.as_str()))
}

fn load_selection(path: Option<&Path>) -> Result<Selection, Box<dyn Error>> {
    let Some(path) = path else {
        return Ok(Selection::new());
    };
    let json = std::fs::read_to_string(path)
        .map_err(|err| format!("cannot read selection `{}`: {err}", path.display()))?;
    Ok(Selection::from_json_str(&json)?)
}

fn report(
    source: &FixtureCatalogSource,
    workspace: &str,
    selection: Selection,
    settings: CatalogSettings,
) -> Result<(), Box<dyn Error>> {
    let catalog = Catalog::load(source, workspace, selection, settings)?;
    let filtered = catalog.filtered_objects();
    debug!(
        "event=cli_report module=cli workspace={} remote_calls={}",
        workspace,
        source.call_count("compute_valid_objects")
    );

    println!("filtered {}/{}", filtered.count_filtered(), filtered.count_all());
    if let Some(report) = catalog.report_removed() {
        print!("{report}");
    }

    println!("selected:");
    for object in catalog.selected_all() {
        println!("\t{}", describe(object));
    }
    if let Some(attribute) = catalog.selected_segmented_by() {
        println!("segmented by: {}", attribute.title);
    }

    let sort = catalog.selected_sort_columns()?;
    for (column, ascending) in sort.columns.iter().zip(&sort.ascending) {
        let direction = if *ascending { "asc" } else { "desc" };
        println!("sort: {column} {direction}");
    }
    Ok(())
}

fn describe(object: &CatalogObject) -> String {
    format!(
        "{} [{}] {} ({})",
        object.kind,
        object.obj_id,
        object.title,
        local_id(&object.obj_id_key())
    )
}
