use anyhow::{bail, Context, Result};
use assetref_core::config::AppConfig;
use assetref_core::path_utils::{ensure_absolute, get_app_root};
use assetref_search::resolver::read_meta_guid;
use assetref_search::{
    AssetIndex, CancellationToken, Orchestrator, SearchBackend, SearchHistory, SearchRequest, SearchResult,
};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{debug, Level};

#[derive(Parser, Debug)]
#[command(author, version, about = "AssetRef - find what references a Unity asset", long_about = None)]
struct Args {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Write logs to this file instead of stderr
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Find references to an asset (path with a .meta file) or a raw string such as a GUID
    Find {
        /// Asset path or search text
        #[arg(index = 1)]
        target: String,
        /// Unity project directory (defaults to config / current dir)
        #[arg(long)]
        project: Option<PathBuf>,
        /// Restrict to these extensions (repeatable)
        #[arg(long = "ext")]
        extensions: Vec<String>,
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
        /// Do not record this search in the history
        #[arg(long)]
        no_history: bool,
    },
    /// List or edit past searches
    History {
        #[command(subcommand)]
        action: Option<HistoryAction>,
    },
    /// Check the search tool and project roots
    Doctor {
        #[arg(long)]
        project: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug)]
enum HistoryAction {
    /// List recorded searches (oldest first)
    List,
    /// Print one recorded result (the latest by default)
    Show {
        #[arg(index = 1)]
        index: Option<usize>,
    },
    /// Remove one entry by index
    Remove {
        #[arg(index = 1)]
        index: usize,
    },
    /// Remove every entry
    Clear,
}

fn history_path() -> PathBuf {
    get_app_root().join("history.json")
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    let level = if args.verbose { Level::DEBUG } else { Level::INFO };

    // Keep the guard alive so buffered log lines are flushed on exit
    let _guard = match &args.log_file {
        Some(path) => match std::fs::OpenOptions::new().create(true).append(true).open(path) {
            Ok(file) => {
                let (non_blocking, guard) = tracing_appender::non_blocking(file);
                tracing_subscriber::fmt()
                    .with_max_level(level)
                    .with_writer(non_blocking)
                    .with_ansi(false)
                    .init();
                Some(guard)
            }
            Err(e) => {
                eprintln!("❌ Cannot open log file {}: {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => {
            tracing_subscriber::fmt()
                .with_max_level(level)
                .with_writer(std::io::stderr)
                .with_ansi(true)
                .init();
            None
        }
    };

    assetref_core::init();

    let config = match AppConfig::load() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("❌ Error: Configuration invalid: {}", e);
            eprintln!("   Check assetref.toml and ASSETREF_* environment variables.");
            std::process::exit(1);
        }
    };

    let outcome = match args.command {
        Commands::Find {
            target,
            project,
            extensions,
            json,
            no_history,
        } => run_find(config, target, project, extensions, json, no_history).await,
        Commands::History { action } => run_history(&config, action.unwrap_or(HistoryAction::List)),
        Commands::Doctor { project } => run_doctor(config, project),
    };

    if let Err(e) = outcome {
        eprintln!("❌ {:#}", e);
        std::process::exit(1);
    }
}

async fn run_find(
    mut config: AppConfig,
    target: String,
    project: Option<PathBuf>,
    extensions: Vec<String>,
    json: bool,
    no_history: bool,
) -> Result<()> {
    if let Some(p) = project {
        config.project_root = Some(p);
    }
    let project_dir = config.project_dir();
    let roots = config.root_directories();
    let extensions = if extensions.is_empty() { config.extensions.clone() } else { extensions };

    let search_text = search_text_for(&target, &project_dir)?;
    debug!("Searching for '{}' under {}", search_text, project_dir.display());

    let index = {
        let roots = roots.clone();
        tokio::task::spawn_blocking(move || AssetIndex::build(&roots))
            .await
            .context("Asset indexing task failed")?
    };

    let orchestrator = Orchestrator::from_config(&config)?;
    let request = SearchRequest::new(search_text, roots, extensions);

    let cancel = CancellationToken::new();
    let ctrl_c = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        })
    };

    let result = orchestrator.search_with_cancel(&request, &index, &cancel).await;
    ctrl_c.abort();
    let result = result?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_result(&result, orchestrator.max_results());
    }

    if !no_history && !result.cancelled {
        let path = history_path();
        let mut history = SearchHistory::load(&path, config.history_capacity)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        history.push(result);
        history
            .save(&path)
            .with_context(|| format!("Failed to write {}", path.display()))?;
    }

    Ok(())
}

/// An existing asset path searches for its GUID; anything else is literal text.
fn search_text_for(target: &str, project_dir: &Path) -> Result<String> {
    let candidate = ensure_absolute(target, project_dir);
    let candidate = if candidate.exists() { candidate } else { ensure_absolute(target, Path::new(".")) };

    if !candidate.exists() {
        return Ok(target.to_string());
    }

    match read_meta_guid(&candidate)? {
        Some(guid) => Ok(guid),
        None => bail!("{} has no .meta file with a guid", candidate.display()),
    }
}

fn print_result(result: &SearchResult, max_results: usize) {
    if result.cancelled {
        println!("🛑 Search cancelled.");
        return;
    }
    if result.search_unavailable {
        println!("❌ The search tool could not be run. Try 'assetref doctor'.");
        return;
    }

    match &result.target_entity {
        Some(target) => println!("🎯 {} ({})", target.path, target.guid),
        None => println!("🎯 \"{}\"", result.search_text),
    }

    if result.is_empty() {
        println!("\nNo references found.");
    }

    if !result.matched_entities.is_empty() {
        println!("\n📦 Referenced by {} assets:", result.matched_entities.len());
        for entity in &result.matched_entities {
            println!("   {}", entity.path);
        }
    }

    if !result.unresolved_paths.is_empty() {
        println!("\n📄 Other files ({}):", result.unresolved_paths.len());
        for path in &result.unresolved_paths {
            println!("   {}", path);
        }
    }

    if result.truncated {
        println!("\n⚠️  Too many results; only the first {} are shown.", max_results);
    }
    if result.failed_invocations > 0 {
        println!("⚠️  {} searches failed; results may be incomplete.", result.failed_invocations);
    }
    println!("\n⏱️  {} ms", result.elapsed_ms);
}

fn run_history(config: &AppConfig, action: HistoryAction) -> Result<()> {
    let path = history_path();
    let mut history = SearchHistory::load(&path, config.history_capacity)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    match action {
        HistoryAction::List => {
            if history.is_empty() {
                println!("No searches recorded.");
            }
            for (i, entry) in history.iter().enumerate() {
                let r = &entry.result;
                let label = r.target_entity.as_ref().map(|t| t.path.as_str()).unwrap_or(&r.search_text);
                println!(
                    "[{}] {}  {}  ({} assets, {} other{})",
                    i,
                    entry.timestamp.format("%Y-%m-%d %H:%M:%S"),
                    label,
                    r.matched_entities.len(),
                    r.unresolved_paths.len(),
                    if r.truncated { ", truncated" } else { "" }
                );
            }
            return Ok(());
        }
        HistoryAction::Show { index } => {
            let entry = match index {
                Some(i) => history.get(i),
                None => history.latest(),
            };
            let Some(entry) = entry else {
                bail!("No such history entry");
            };
            print_result(&entry.result, config.max_results);
            return Ok(());
        }
        HistoryAction::Remove { index } => {
            if history.remove(index).is_none() {
                bail!("No history entry {}", index);
            }
            println!("🗑️  Removed entry {}", index);
        }
        HistoryAction::Clear => {
            history.clear();
            println!("🗑️  History cleared");
        }
    }

    history
        .save(&path)
        .with_context(|| format!("Failed to write {}", path.display()))
}

fn run_doctor(mut config: AppConfig, project: Option<PathBuf>) -> Result<()> {
    if let Some(p) = project {
        config.project_root = Some(p);
    }

    println!("🩺 AssetRef diagnostic\n");

    let orchestrator = Orchestrator::from_config(&config)?;
    let backend = orchestrator.backend();
    let tool_ok = backend.is_available();
    if tool_ok {
        println!("✅ {} found on PATH", backend.tool_name());
    } else {
        println!("❌ {} not found on PATH", backend.tool_name());
    }

    println!("📁 Project: {}", config.project_dir().display());
    let mut roots_ok = 0;
    for root in config.root_directories() {
        if root.is_dir() {
            roots_ok += 1;
            println!("✅ {}", root.display());
        } else {
            println!("⚠️  {} is missing", root.display());
        }
    }

    println!("🧾 Extensions: {}", config.extensions.join(", "));
    println!("📜 History: {}", history_path().display());

    if !tool_ok || roots_ok == 0 {
        bail!("AssetRef cannot search this project");
    }
    println!("\n✅ Ready.");
    Ok(())
}
