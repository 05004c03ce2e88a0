use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use codegraph_core::IndexerConfig;
use codegraph_graph::Store;
use codegraph_query::{OutputFormat as QueryFormat, QueryOptions, SymbolRef};
use colored::Colorize;
use std::env;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "codegraph")]
#[command(about = "CodeGraph CLI - index and query a TypeScript project's code graph", long_about = None)]
#[command(version)]
struct Cli {
    /// Output rendering (text or mermaid)
    #[arg(short, long, global = true, default_value = "text")]
    output: OutputFormat,

    /// Path to the sqlite graph database
    #[arg(long, global = true, env = "CODEGRAPH_STORAGE")]
    storage: Option<PathBuf>,

    /// Maximum BFS depth for traversal queries
    #[arg(long, global = true, default_value = "100")]
    depth: usize,

    /// Maximum number of nodes included in a formatted result
    #[arg(long, global = true, default_value = "50")]
    max_nodes: usize,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    Text,
    Mermaid,
}

impl From<OutputFormat> for QueryFormat {
    fn from(value: OutputFormat) -> Self {
        match value {
            OutputFormat::Text => QueryFormat::Text,
            OutputFormat::Mermaid => QueryFormat::Mermaid,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Index (or re-index) a project directory into the graph store
    Index {
        /// Project root to scan for source files
        project_root: PathBuf,

        /// Drop the existing graph and reindex everything from scratch
        #[arg(long)]
        full: bool,
    },

    /// Show what a symbol depends on
    Deps {
        project_root: PathBuf,
        file: String,
        symbol: String,
    },

    /// Show what depends on a symbol
    Dependents {
        project_root: PathBuf,
        file: String,
        symbol: String,
    },

    /// Show the shortest path between two symbols
    Paths {
        project_root: PathBuf,
        /// `symbol` or `symbol@file` for the start of the path
        from: String,
        /// `symbol` or `symbol@file` for the end of the path
        to: String,
    },

    /// Connect a set of seed symbols into one subgraph
    Connect {
        project_root: PathBuf,
        /// One or more `symbol` or `symbol@file` seeds
        #[arg(required = true, num_args = 2..)]
        seeds: Vec<String>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()))
        .init();

    let cli = Cli::parse();

    let result = run(&cli);
    match result {
        Ok(output) => {
            println!("{output}");
            Ok(())
        }
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);
            std::process::exit(1);
        }
    }
}

fn run(cli: &Cli) -> Result<String> {
    match &cli.command {
        Commands::Index { project_root, full } => run_index(project_root, cli.storage.as_deref(), *full),
        Commands::Deps { project_root, file, symbol } => {
            let store = open_store(project_root, cli.storage.as_deref())?;
            let out = codegraph_query::dependencies_of(
                &store,
                project_root,
                file,
                symbol,
                cli.depth,
                QueryOptions { max_nodes: cli.max_nodes },
                cli.output.clone().into(),
            )
            .context("dependencies_of query failed")?;
            Ok(out)
        }
        Commands::Dependents { project_root, file, symbol } => {
            let store = open_store(project_root, cli.storage.as_deref())?;
            let out = codegraph_query::dependents_of(
                &store,
                project_root,
                file,
                symbol,
                cli.depth,
                QueryOptions { max_nodes: cli.max_nodes },
                cli.output.clone().into(),
            )
            .context("dependents_of query failed")?;
            Ok(out)
        }
        Commands::Paths { project_root, from, to } => {
            let store = open_store(project_root, cli.storage.as_deref())?;
            let out = codegraph_query::paths_between(
                &store,
                project_root,
                &parse_symbol_ref(from),
                &parse_symbol_ref(to),
                cli.depth,
                QueryOptions { max_nodes: cli.max_nodes },
                cli.output.clone().into(),
            )
            .context("paths_between query failed")?;
            Ok(out)
        }
        Commands::Connect { project_root, seeds } => {
            let store = open_store(project_root, cli.storage.as_deref())?;
            let refs: Vec<SymbolRef> = seeds.iter().map(|s| parse_symbol_ref(s)).collect();
            let out = codegraph_query::search_graph(
                &store,
                project_root,
                &refs,
                cli.depth,
                QueryOptions { max_nodes: cli.max_nodes },
                cli.output.clone().into(),
            )
            .context("search_graph query failed")?;
            Ok(out)
        }
    }
}

fn run_index(project_root: &std::path::Path, storage_override: Option<&std::path::Path>, full: bool) -> Result<String> {
    let mut config = IndexerConfig::load(project_root).context("failed to load codegraph.toml")?;
    if let Some(storage) = storage_override {
        config.database_path = storage.to_path_buf();
    }
    let store = Store::open(&config.database_path).context("failed to open graph store")?;

    let report = if full {
        codegraph_parser::reindex_all(&store, &config)
    } else {
        codegraph_parser::ingest_project(&store, &config)
    }
    .context("ingestion failed")?;

    let mut summary = format!(
        "indexed {} files, skipped {} unchanged",
        report.indexed_files, report.skipped_files
    );
    if !report.errors.is_empty() {
        summary.push_str(&format!("\n{} file(s) failed:", report.errors.len()));
        for (path, err) in &report.errors {
            summary.push_str(&format!("\n  {path}: {err}"));
        }
    }
    Ok(summary)
}

fn open_store(project_root: &std::path::Path, storage_override: Option<&std::path::Path>) -> Result<Store> {
    let config = IndexerConfig::load(project_root).context("failed to load codegraph.toml")?;
    let path = storage_override.unwrap_or(&config.database_path);
    Store::open(path).context("failed to open graph store")
}

/// Parses a `symbol` or `symbol@file` CLI argument into a [`SymbolRef`].
fn parse_symbol_ref(arg: &str) -> SymbolRef {
    match arg.split_once('@') {
        Some((symbol, file)) => SymbolRef { symbol: symbol.to_string(), file_path: Some(file.to_string()) },
        None => SymbolRef { symbol: arg.to_string(), file_path: None },
    }
}
