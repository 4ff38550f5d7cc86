use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use nasfind::index::{self, IndexConfig, IndexOptions, MetaCatalog, SledStore};
use nasfind::query::{self, parse_file_size, CompareOp, FilesQuery, SearchEngine, SizeFilter};
use nasfind::utils::{progress, AppConfig};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "nasfind")]
#[command(about = "File name and path search for NAS volumes")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Index directory (overrides config)
    #[arg(long, global = true)]
    index_dir: Option<PathBuf>,

    /// Metadata store directory (overrides config)
    #[arg(long, global = true)]
    store_dir: Option<PathBuf>,

    /// Suppress progress output
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Walk roots and rebuild every index family
    Index {
        /// Roots to walk (defaults to the configured roots)
        roots: Vec<PathBuf>,

        /// Include dotfiles and dot-directories
        #[arg(long)]
        hidden: bool,

        /// Walk roots in parallel
        #[arg(long)]
        parallel: bool,
    },
    /// Build the index only when it is missing
    Ensure {
        /// Roots to walk (defaults to the configured roots)
        roots: Vec<PathBuf>,

        /// Include dotfiles and dot-directories
        #[arg(long)]
        hidden: bool,
    },
    /// Search the index
    Search {
        /// Query text (free text, a path, or field:value groups)
        #[arg(trailing_var_arg = true, required = true)]
        query: Vec<String>,

        /// Restrict results to this directory
        #[arg(long)]
        parent: Option<String>,

        #[arg(long, default_value_t = 0)]
        offset: usize,

        #[arg(long, default_value_t = 50)]
        limit: usize,

        /// Size filter such as ">1GB" or "<=100MB"
        #[arg(long, allow_hyphen_values = true)]
        size: Option<String>,
    },
    /// Print the parsed predicates of a query as JSON
    Parse {
        #[arg(trailing_var_arg = true, required = true)]
        query: Vec<String>,
    },
    /// Show index statistics
    Stats,
}

fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    let app = AppConfig::load()?;

    match cli.command {
        Commands::Index { roots, hidden, parallel } => {
            let options = IndexOptions {
                include_hidden: hidden || app.include_hidden,
                parallel_roots: parallel || app.parallel_roots,
            };
            let (config, catalog) = open(&cli.index_dir, &cli.store_dir, &app)?;
            run_index(&config, &catalog, roots_or_default(roots, &app)?, options, cli.quiet)?;
        }
        Commands::Ensure { roots, hidden } => {
            let (config, catalog) = open(&cli.index_dir, &cli.store_dir, &app)?;
            if index::index_exists(&config) {
                println!("Index present at {}", config.index_dir.display());
                return Ok(());
            }
            let options = IndexOptions {
                include_hidden: hidden || app.include_hidden,
                parallel_roots: app.parallel_roots,
            };
            run_index(&config, &catalog, roots_or_default(roots, &app)?, options, cli.quiet)?;
        }
        Commands::Search { query, parent, offset, limit, size } => {
            let (config, catalog) = open(&cli.index_dir, &cli.store_dir, &app)?;
            let files = FilesQuery::parse(&query.join(" "));

            let mut request = files.to_request(offset, limit);
            if let Some(parent) = parent {
                request.parent = parent;
            }
            if let Some(size) = size {
                request.size = Some(parse_size_arg(&size));
            }

            let engine = SearchEngine::new(config, catalog);
            for path in engine.search_index(&request)? {
                println!("{path}");
            }
        }
        Commands::Parse { query } => {
            let predicates = query::parse(&query.join(" "));
            println!("{}", serde_json::to_string_pretty(&predicates)?);
        }
        Commands::Stats => {
            let config = IndexConfig::new(resolve(&cli.index_dir, app.resolved_index_dir())?);
            index::stats::show_stats(&config)?;
        }
    }

    Ok(())
}

/// RUST_LOG controls verbosity; logs go to stderr so results stay pipeable
fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn resolve(flag: &Option<PathBuf>, fallback: Result<PathBuf>) -> Result<PathBuf> {
    match flag {
        Some(dir) => Ok(dir.clone()),
        None => fallback,
    }
}

fn open(
    index_dir: &Option<PathBuf>,
    store_dir: &Option<PathBuf>,
    app: &AppConfig,
) -> Result<(IndexConfig, MetaCatalog)> {
    let config = IndexConfig::new(resolve(index_dir, app.resolved_index_dir())?);
    let store_dir = resolve(store_dir, app.resolved_store_dir())?;
    let store = SledStore::open(&store_dir)
        .with_context(|| format!("Failed to open metadata store at {}", store_dir.display()))?;
    Ok((config, MetaCatalog::new(Arc::new(store))))
}

fn roots_or_default(roots: Vec<PathBuf>, app: &AppConfig) -> Result<Vec<PathBuf>> {
    let roots = if roots.is_empty() { app.roots.clone() } else { roots };
    if roots.is_empty() {
        anyhow::bail!("No roots given and none configured");
    }
    roots
        .into_iter()
        .map(|root| std::path::absolute(&root).with_context(|| format!("Invalid root: {}", root.display())))
        .collect()
}

fn run_index(
    config: &IndexConfig,
    catalog: &MetaCatalog,
    roots: Vec<PathBuf>,
    options: IndexOptions,
    quiet: bool,
) -> Result<()> {
    let spinner = progress::spinner("Indexing...", quiet);
    let report = index::index_paths(config, catalog, &roots, options)?;

    if let Some(spinner) = spinner {
        spinner.finish_with_message(format!(
            "Indexed {} entries ({} skipped)",
            report.entries, report.skipped
        ));
    }
    for (family, terms) in &report.families {
        println!("  {family:12} {terms} terms");
    }
    Ok(())
}

/// `>1GB`, `<=100MB`, or a bare size meaning equality
fn parse_size_arg(arg: &str) -> SizeFilter {
    match CompareOp::strip_prefix(arg.trim()) {
        Some((op, rest)) => SizeFilter::new(op, parse_file_size(rest)),
        None => SizeFilter::new(CompareOp::Eq, parse_file_size(arg)),
    }
}
