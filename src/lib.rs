//! orcestra-storage: a pipeline storage provider for ORCESTRA-hosted
//! scientific datasets.
//!
//! Datasets are addressed as `orcestra://<datatype>/<dataset_name>` (for
//! example `orcestra://pharmacosets/CCLE_2015`), resolved against catalogs
//! fetched from the ORCESTRA index and cached locally, and materialized as
//! local files a task runner can treat as build artifacts.
//!
//! # Modules
//!
//! - [`catalog`]: dataset configs, per-datatype catalog managers, and the
//!   registry facade
//! - [`query`]: query parsing, validation verdicts, and did-you-mean
//!   suggestions
//! - [`storage`]: storage capability traits and the read-only storage
//!   object
//! - [`error`]: error types for orcestra-storage operations

pub mod catalog;
pub mod error;
pub mod query;
pub mod storage;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};

use catalog::{DatasetConfig, UnifiedDataManager};
use query::{validate_query, Query};
use storage::{StorageGlob, StorageObject, StorageRead};

pub use error::OrcestraError;

/// The orcestra-storage CLI application.
#[derive(Parser)]
#[command(name = "orcestra-storage")]
#[command(version, author, about)]
#[command(propagate_version = true)]
struct Cli {
    /// Directory holding the per-datatype catalog cache files.
    #[arg(long, global = true, env = "ORCESTRA_CACHE_DIR", default_value = ".orcestra/cache")]
    cache_dir: PathBuf,

    /// Re-fetch every catalog instead of trusting the caches.
    #[arg(long, global = true)]
    refresh: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Check whether a query resolves against the hydrated catalogs.
    Validate(QueryArg),

    /// List dataset names for a datatype, or all datatypes when omitted.
    List {
        /// Datatype to list (e.g. 'pharmacosets').
        datatype: Option<String>,
    },

    /// Show the catalog metadata behind a query.
    Info(QueryArg),

    /// Download the dataset a query refers to.
    Fetch {
        /// Query naming the dataset, e.g. orcestra://pharmacosets/CCLE_2015.
        query: String,

        /// Where to write the payload (default: <datatype>/<dataset>).
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Expand a wildcarded query into its concrete candidates.
    Glob(QueryArg),
}

/// A single positional query argument.
#[derive(clap::Args)]
struct QueryArg {
    /// Query of the form orcestra://<datatype>/<dataset_name>.
    query: String,
}

/// Run the orcestra-storage CLI.
///
/// This is the main entry point for the CLI, called from `main.rs`.
pub fn run() -> Result<(), OrcestraError> {
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        // No subcommand: print a usage hint and exit successfully.
        println!("orcestra-storage {}", env!("CARGO_PKG_VERSION"));
        println!();
        println!("Storage provider for ORCESTRA-hosted scientific datasets.");
        println!();
        println!("Run 'orcestra-storage --help' for usage information.");
        return Ok(());
    };

    let provider = Arc::new(build_provider(&cli.cache_dir, cli.refresh)?);

    match command {
        Commands::Validate(args) => run_validate(&args.query, &provider),
        Commands::List { datatype } => run_list(datatype.as_deref(), &provider),
        Commands::Info(args) => run_info(&args.query, &provider),
        Commands::Fetch { query, output } => run_fetch(&query, output, &provider),
        Commands::Glob(args) => run_glob(&args.query, &provider),
    }
}

/// Build the provider and hydrate every catalog eagerly.
///
/// Per-datatype hydration failures are warnings: the affected datatype is
/// unusable for queries, the rest of the provider still works.
fn build_provider(cache_dir: &Path, refresh: bool) -> Result<UnifiedDataManager, OrcestraError> {
    let mut provider = UnifiedDataManager::from_configs(DatasetConfig::builtin(cache_dir))?;
    provider.hydrate_cache(refresh);
    Ok(provider)
}

/// Execute the validate subcommand.
fn run_validate(query: &str, provider: &UnifiedDataManager) -> Result<(), OrcestraError> {
    let verdict = validate_query(query, provider);
    println!("{verdict}");
    if verdict.valid {
        Ok(())
    } else {
        Err(OrcestraError::ValidationFailed {
            query: query.to_string(),
        })
    }
}

/// Execute the list subcommand.
fn run_list(datatype: Option<&str>, provider: &UnifiedDataManager) -> Result<(), OrcestraError> {
    match datatype {
        Some(datatype) => {
            let manager = provider.registry().get_manager(datatype)?;
            for name in manager.names()? {
                println!("{name}");
            }
        }
        None => {
            for datatype in provider.names() {
                println!("{datatype}");
            }
        }
    }
    Ok(())
}

/// Execute the info subcommand.
fn run_info(query: &str, provider: &UnifiedDataManager) -> Result<(), OrcestraError> {
    let parsed = Query::parse(query)?;
    let record = provider.dataset(parsed.datatype(), parsed.dataset()?)?;
    println!("name:     {}", record.name);
    println!("datatype: {}", parsed.datatype());
    if let Some(doi) = &record.doi {
        println!("doi:      {doi}");
    }
    if let Some(date) = &record.date_created {
        println!("created:  {date}");
    }
    if let Some(size) = record.file_size {
        println!("size:     {size} bytes");
    }
    if let Some(link) = &record.download_link {
        println!("download: {link}");
    }
    Ok(())
}

/// Execute the fetch subcommand.
fn run_fetch(
    query: &str,
    output: Option<PathBuf>,
    provider: &Arc<UnifiedDataManager>,
) -> Result<(), OrcestraError> {
    let parsed = Query::parse(query)?;
    let local_path = match output {
        Some(path) => path,
        None => PathBuf::from(parsed.local_suffix()?),
    };
    let object = StorageObject::new(Arc::clone(provider), parsed, local_path);
    object.retrieve_object()?;
    println!("{}", object.local_path().display());
    Ok(())
}

/// Execute the glob subcommand.
fn run_glob(query: &str, provider: &Arc<UnifiedDataManager>) -> Result<(), OrcestraError> {
    let parsed = Query::parse(query)?;
    let object = StorageObject::new(Arc::clone(provider), parsed, PathBuf::new());
    for candidate in object.list_candidate_matches()? {
        println!("{candidate}");
    }
    Ok(())
}
