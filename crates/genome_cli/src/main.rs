//! CLI entry point.
//!
//! # Responsibility
//! - Verify `genome_core` linkage (`genome_cli` with no arguments).
//! - Summarize a genome document: `genome_cli <document.json> [catalog.json]`.
//!
//! Environment:
//! - `GENOME_LOG_DIR` enables file logging into that directory.
//! - `GENOME_DB_PATH` replays the modification log stored there over the
//!   document before summarizing.

use genome_core::{
    default_log_level, init_logging, load_genome_file, ComponentContextualizer, DrillDownManager,
    GenomeStateManager, GenomeTree, InMemoryComponentCatalog, Level, ModificationLog,
    SemanticPropertySystem, SqliteEventStore, StateManagerConfig, TemplateLibrary,
};
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

fn main() -> ExitCode {
    println!("genome_core ping={}", genome_core::ping());
    println!("genome_core version={}", genome_core::core_version());

    if let Some(dir) = env_path("GENOME_LOG_DIR") {
        if let Err(err) = init_logging(default_log_level(), &dir) {
            eprintln!("logging disabled: {err}");
        }
    }

    let mut args = std::env::args().skip(1);
    let Some(document) = args.next() else {
        return ExitCode::SUCCESS;
    };
    let catalog = args.next();

    match summarize(Path::new(&document), catalog.as_deref().map(Path::new)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("event=cli_summarize module=cli status=error");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn summarize(document: &Path, catalog: Option<&Path>) -> Result<(), String> {
    let base = load_genome_file(document).map_err(|err| err.to_string())?;
    let tree = match env_path("GENOME_DB_PATH") {
        Some(db_path) => replay_from_log(base, &db_path)?,
        None => Arc::new(base),
    };

    let catalog = match catalog {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .map_err(|err| format!("failed to read catalog `{}`: {err}", path.display()))?;
            InMemoryComponentCatalog::from_json_str(&raw)
                .map_err(|err| format!("invalid catalog `{}`: {err}", path.display()))?
        }
        None => InMemoryComponentCatalog::new(),
    };
    let contextualizer = ComponentContextualizer::new(catalog, TemplateLibrary::builtin());
    let navigator = DrillDownManager::new(&tree);

    println!("nodes={}", tree.node_count());
    for root in navigator.roots() {
        let context = contextualizer
            .contextualize_path(&tree, &root.path.to_string())
            .map_err(|err| err.to_string())?;
        println!(
            "{} name={:?} children={} tier={} confidence={:.2}",
            root.path,
            root.name,
            root.children_count,
            context.strategy.tier.number(),
            context.strategy.confidence
        );
    }

    let stats = contextualizer.statistics();
    let per_level = Level::ALL
        .iter()
        .map(|level| format!("{}={}", level.label(), stats.entries_per_level[level.depth()]))
        .collect::<Vec<_>>()
        .join(" ");
    println!(
        "catalog entries={} {per_level} templates={}",
        stats.total_entries, stats.template_count
    );
    Ok(())
}

fn replay_from_log(base: GenomeTree, db_path: &str) -> Result<Arc<GenomeTree>, String> {
    let store = SqliteEventStore::open(db_path).map_err(|err| err.to_string())?;
    let log = ModificationLog::open(store).map_err(|err| err.to_string())?;
    let manager = GenomeStateManager::open(
        base,
        log,
        SemanticPropertySystem::default(),
        StateManagerConfig::default(),
    )
    .map_err(|err| err.to_string())?;

    let state = manager.reconstruct_state();
    println!("modifications={}", state.modification_count);
    if !manager.log().validate_integrity() {
        eprintln!("warning: modification log failed its integrity check");
    }
    Ok(state.tree)
}

fn env_path(name: &str) -> Option<String> {
    let raw = std::env::var(name).ok()?;
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
