//! Command-line interface for report UI extraction.
//!
//! Wraps the extraction pipeline and the SQLite projector behind a small
//! set of subcommands: `extract` runs the whole pipeline and writes
//! artifacts, `ui` prints or writes the canonical model on its own,
//! `project` loads previously written artifacts into a store, and
//! `status`/`members` are read-only inspection commands.

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use pbix_extract_container::{ContainerReader, MemberKind};
use pbix_extract_core::{IssueKind, RunIssue, UiModel};
use pbix_extract_datamodel::{DataModelBundle, PipelineConfig};
use pbix_extract_discovery::{OutputFormat, UiExtractor, format_model};
use pbix_extract_sqlite::{Projector, StoreStatus};
use rusqlite::Connection;

#[derive(Debug, Parser)]
#[command(name = "pbix-extract")]
#[command(about = "Extract report UI structure from .pbix containers and project it into SQLite")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the full pipeline: extract the UI model, write artifacts, and
    /// project everything into a SQLite store.
    Extract(ExtractArgs),
    /// Extract the UI model and print it (or write it to one file).
    Ui(UiArgs),
    /// Project a previously written model artifact into a SQLite store.
    Project(ProjectArgs),
    /// Report whether a store exists and how many rows it holds.
    Status(StatusArgs),
    /// List container members with their classification and sizes.
    Members(MembersArgs),
}

#[derive(Debug, Args)]
struct ExtractArgs {
    /// Path to the report container (.pbix).
    input: PathBuf,
    /// Directory receiving the model artifact, summary, and database.
    #[arg(long)]
    output: PathBuf,
    /// Serialization format for the canonical-model artifact.
    #[arg(long, default_value = "json")]
    format: OutputFormat,
    /// Pipeline configuration YAML.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Data-model bundle JSON to project alongside the UI model.
    #[arg(long)]
    data_model: Option<PathBuf>,
    /// Database file path; defaults to the configured name inside the
    /// output directory.
    #[arg(long)]
    db: Option<PathBuf>,
    /// Table prefix for the projected store; overrides the config.
    #[arg(long)]
    prefix: Option<String>,
    /// Analyse layout members on a thread pool.
    #[arg(long)]
    parallel: bool,
}

#[derive(Debug, Args)]
struct UiArgs {
    /// Path to the report container (.pbix).
    input: PathBuf,
    /// Output format.
    #[arg(long, default_value = "text")]
    format: OutputFormat,
    /// Write to this file instead of stdout.
    #[arg(long)]
    output: Option<PathBuf>,
    /// Analyse layout members on a thread pool.
    #[arg(long)]
    parallel: bool,
}

#[derive(Debug, Args)]
struct ProjectArgs {
    /// Canonical-model JSON artifact written by `extract` or `ui`.
    model: PathBuf,
    /// Data-model bundle JSON to project alongside the UI model.
    #[arg(long)]
    data_model: Option<PathBuf>,
    /// Database file path.
    #[arg(long)]
    db: PathBuf,
    /// Table prefix.
    #[arg(long, default_value = "pbi_")]
    prefix: String,
}

#[derive(Debug, Args)]
struct StatusArgs {
    /// Database file path.
    #[arg(long)]
    db: PathBuf,
    /// Table prefix.
    #[arg(long, default_value = "pbi_")]
    prefix: String,
}

#[derive(Debug, Args)]
struct MembersArgs {
    /// Path to the report container (.pbix).
    input: PathBuf,
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Extract(args) => run_extract(args),
        Command::Ui(args) => run_ui(args),
        Command::Project(args) => run_project(args),
        Command::Status(args) => run_status(args),
        Command::Members(args) => run_members(args),
    };

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

// ---------------------------------------------------------------------------
// Subcommand runners
// ---------------------------------------------------------------------------

fn run_extract(args: ExtractArgs) -> Result<(), String> {
    let config = match &args.config {
        Some(path) => PipelineConfig::load(path)
            .map_err(|e| format!("Failed to load config '{}': {e}", path.display()))?,
        None => PipelineConfig::default(),
    };
    let parallel = args.parallel || config.extraction.parallel;
    let prefix = args
        .prefix
        .unwrap_or_else(|| config.projection.table_prefix.clone());
    let db_path = resolve_db_path(&args.output, args.db.as_deref(), &config);

    fs::create_dir_all(&args.output).map_err(|e| {
        format!(
            "Failed to create output directory '{}': {e}",
            args.output.display()
        )
    })?;

    let extractor = UiExtractor::open(&args.input)
        .map_err(|e| format!("Failed to open container '{}': {e}", args.input.display()))?
        .with_parallel(parallel);
    let mut model = extractor
        .extract()
        .map_err(|e| format!("Extraction failed: {e}"))?;
    let bundle = load_bundle(args.data_model.as_deref(), &mut model);

    let model_file = args
        .output
        .join(format!("ui_model.{}", args.format.extension()));
    let rendered = format_model(&model, args.format)?;
    fs::write(&model_file, rendered)
        .map_err(|e| format!("Failed to write '{}': {e}", model_file.display()))?;

    let mut summary = format_model(&model, OutputFormat::Text)?;
    append_bundle_summary(&mut summary, &bundle);
    let summary_file = args.output.join("summary.txt");
    fs::write(&summary_file, &summary)
        .map_err(|e| format!("Failed to write '{}': {e}", summary_file.display()))?;

    let conn = Connection::open(&db_path)
        .map_err(|e| format!("Failed to open database '{}': {e}", db_path.display()))?;
    let mut projector = Projector::new(conn, prefix.as_str()).map_err(|e| e.to_string())?;
    projector
        .up()
        .map_err(|e| format!("Failed to create store: {e}"))?;
    let report = projector
        .project(&model, &bundle)
        .map_err(|e| format!("Projection failed: {e}"))?;
    let status = projector
        .status()
        .map_err(|e| format!("Failed to read store status: {e}"))?;

    println!("{summary}");
    println!("Wrote model to '{}'", model_file.display());
    println!("Wrote summary to '{}'", summary_file.display());
    println!(
        "Projected {} row(s) into '{}'",
        report.total(),
        db_path.display()
    );
    print_status(&prefix, &status);
    Ok(())
}

fn run_ui(args: UiArgs) -> Result<(), String> {
    let extractor = UiExtractor::open(&args.input)
        .map_err(|e| format!("Failed to open container '{}': {e}", args.input.display()))?
        .with_parallel(args.parallel);
    let model = extractor
        .extract()
        .map_err(|e| format!("Extraction failed: {e}"))?;
    let rendered = format_model(&model, args.format)?;

    match &args.output {
        Some(path) => {
            fs::write(path, rendered)
                .map_err(|e| format!("Failed to write '{}': {e}", path.display()))?;
            println!("Wrote model to '{}'", path.display());
        }
        None => println!("{rendered}"),
    }
    Ok(())
}

fn run_project(args: ProjectArgs) -> Result<(), String> {
    let model = read_model(&args.model)?;
    let bundle = match &args.data_model {
        Some(path) => DataModelBundle::from_path(path).map_err(|e| {
            format!("Failed to load data-model bundle '{}': {e}", path.display())
        })?,
        None => DataModelBundle::default(),
    };

    let conn = Connection::open(&args.db)
        .map_err(|e| format!("Failed to open database '{}': {e}", args.db.display()))?;
    let mut projector = Projector::new(conn, args.prefix.as_str()).map_err(|e| e.to_string())?;
    projector
        .up()
        .map_err(|e| format!("Failed to create store: {e}"))?;
    let report = projector
        .project(&model, &bundle)
        .map_err(|e| format!("Projection failed: {e}"))?;

    println!("Projection complete:");
    println!("  Pages written: {}", report.pages_written);
    println!("  Visuals written: {}", report.visuals_written);
    println!("  Custom visuals written: {}", report.custom_visuals_written);
    println!("  Measures written: {}", report.measures_written);
    println!(
        "  Calculated columns written: {}",
        report.calculated_columns_written
    );
    println!("  Relationships written: {}", report.relationships_written);
    println!("  Source queries written: {}", report.source_queries_written);
    Ok(())
}

fn run_status(args: StatusArgs) -> Result<(), String> {
    let conn = Connection::open(&args.db)
        .map_err(|e| format!("Failed to open database '{}': {e}", args.db.display()))?;
    let projector = Projector::new(conn, args.prefix.as_str()).map_err(|e| e.to_string())?;
    let status = projector
        .status()
        .map_err(|e| format!("Failed to read store status: {e}"))?;
    print_status(&args.prefix, &status);
    Ok(())
}

fn run_members(args: MembersArgs) -> Result<(), String> {
    let reader = ContainerReader::open(&args.input)
        .map_err(|e| format!("Failed to open container '{}': {e}", args.input.display()))?;
    let members = reader.members();

    println!("{} member(s) in '{}':", members.len(), args.input.display());
    for member in members {
        println!(
            "  [{:<13}] {:>9}  {}",
            kind_label(member.kind),
            member.size,
            member.path
        );
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Explicit `--db` wins; otherwise the configured database name lands in
/// the output directory.
fn resolve_db_path(output: &Path, db: Option<&Path>, config: &PipelineConfig) -> PathBuf {
    match db {
        Some(path) => path.to_path_buf(),
        None => output.join(&config.projection.database),
    }
}

/// Loads the optional data-model bundle, degrading a failed load into a
/// run issue instead of aborting a finished extraction.
fn load_bundle(path: Option<&Path>, model: &mut UiModel) -> DataModelBundle {
    let Some(path) = path else {
        return DataModelBundle::default();
    };
    match DataModelBundle::from_path(path) {
        Ok(bundle) => bundle,
        Err(err) => {
            model.run.issues.push(RunIssue::new(
                &path.display().to_string(),
                IssueKind::CollaboratorFailure,
                &err.to_string(),
            ));
            DataModelBundle::default()
        }
    }
}

/// Appends data-model category counts to a textual summary.
fn append_bundle_summary(summary: &mut String, bundle: &DataModelBundle) {
    if bundle.is_empty() {
        return;
    }
    summary.push_str("\nData model:\n");
    for (category, count) in bundle.category_counts() {
        summary.push_str(&format!("  {category}: {count}\n"));
    }
}

fn read_model(path: &Path) -> Result<UiModel, String> {
    let raw = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read model '{}': {e}", path.display()))?;
    serde_json::from_str(&raw)
        .map_err(|e| format!("Failed to parse model '{}': {e}", path.display()))
}

fn print_status(prefix: &str, status: &StoreStatus) {
    println!("Store status for prefix '{prefix}':");
    println!(
        "  Tables exist: {}",
        if status.tables_exist { "yes" } else { "no" }
    );
    if !status.tables_exist {
        return;
    }
    println!(
        "  Views exist: {}",
        if status.views_exist { "yes" } else { "no" }
    );
    for (category, count) in status.category_counts() {
        println!("  {category}: {count}");
    }
    println!("  Total rows: {}", status.total_rows());
}

fn kind_label(kind: MemberKind) -> &'static str {
    match kind {
        MemberKind::Layout => "layout",
        MemberKind::Metadata => "metadata",
        MemberKind::CustomVisual => "custom-visual",
        MemberKind::Version => "version",
        MemberKind::Other => "other",
    }
}
