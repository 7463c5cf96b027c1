//! CLI command definitions, routing, and tracing setup.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use docshelf_core::{BuildAllReport, LibraryBuild};
use docshelf_shared::{AppConfig, Document, config_file_path, init_config, load_config};
use docshelf_source::RepositoryCache;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// docshelf — documentation shelves built from library repositories.
#[derive(Parser)]
#[command(
    name = "docshelf",
    version,
    about = "Fetch library documentation from source repositories and compile it into render trees.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Fetch one library's documentation and list the resulting slugs.
    Fetch {
        /// Library id to fetch.
        library: String,
    },

    /// Fetch every registered library concurrently.
    FetchAll,

    /// List registered libraries and their source coordinates.
    List,

    /// Print one fetched document's front matter and body.
    Show {
        /// Library id the document belongs to.
        #[arg(short, long)]
        library: String,

        /// Document slug (e.g. `motion/guide/intro`).
        #[arg(short, long)]
        slug: String,
    },

    /// Compile one fetched document and emit its outline and render tree as JSON.
    Compile {
        /// Library id the document belongs to.
        #[arg(short, long)]
        library: String,

        /// Document slug (e.g. `motion/guide/intro`).
        #[arg(short, long)]
        slug: String,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Print the resolved config file path.
    Path,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "docshelf=info",
        1 => "docshelf=debug",
        _ => "docshelf=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt().json().with_env_filter(env_filter).init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Fetch { library } => cmd_fetch(&library).await,
        Command::FetchAll => cmd_fetch_all().await,
        Command::List => cmd_list().await,
        Command::Show { library, slug } => cmd_show(&library, &slug).await,
        Command::Compile { library, slug } => cmd_compile(&library, &slug).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Path => cmd_config_path().await,
        },
    }
}

/// Resolve the repository cache root: configured directory, or a
/// process-shared location under the system temp dir.
fn cache_root(config: &AppConfig) -> PathBuf {
    match &config.cache_dir {
        Some(dir) => PathBuf::from(dir),
        None => std::env::temp_dir().join("docshelf-cache"),
    }
}

/// Fetch one library's document set, failing if the library has no docs
/// configured.
async fn fetch_library(config: &AppConfig, library: &str) -> Result<LibraryBuild> {
    if docshelf_source::resolve(config, library).is_none() {
        return Err(eyre!(
            "library '{library}' has no documentation source configured — \
             add a [libraries.docs] table to the config"
        ));
    }

    let cache = RepositoryCache::new(cache_root(config));
    let build = docshelf_core::build_library(config, &cache, library).await?;
    Ok(build)
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_fetch(library: &str) -> Result<()> {
    let config = load_config()?;
    info!(library, "fetching documentation");

    let build = fetch_library(&config, library).await?;

    println!();
    println!("  Fetched '{library}'");
    println!("  Documents: {}", build.stats.documents);
    println!("  Skipped:   {}", build.stats.skipped);
    println!("  Time:      {:.1}s", build.stats.elapsed.as_secs_f64());
    println!();

    for document in build.documents.iter() {
        println!("  {}", document.slug.joined());
    }

    Ok(())
}

async fn cmd_fetch_all() -> Result<()> {
    let config = Arc::new(load_config()?);
    if config.libraries.is_empty() {
        println!("No libraries registered. Run `docshelf config init` and add some.");
        return Ok(());
    }

    let cache = Arc::new(RepositoryCache::new(cache_root(&config)));

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap()
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
    );
    spinner.enable_steady_tick(std::time::Duration::from_millis(80));
    spinner.set_message(format!("Fetching {} libraries", config.libraries.len()));

    let report: BuildAllReport = docshelf_core::build_all(config.clone(), cache).await;
    spinner.finish_and_clear();

    println!();
    println!("  Fetched {} libraries", config.libraries.len());
    println!("  Documents: {}", report.documents.len());
    println!("  Failures:  {}", report.failures.len());
    println!("  Time:      {:.1}s", report.elapsed.as_secs_f64());
    println!();

    for (library, error) in &report.failures {
        println!("  FAILED {library}: {error}");
    }

    Ok(())
}

async fn cmd_list() -> Result<()> {
    let config = load_config()?;

    if config.libraries.is_empty() {
        println!("No libraries registered.");
        return Ok(());
    }

    for entry in &config.libraries {
        match &entry.docs {
            Some(docs) => {
                let dir = if docs.dir.is_empty() { "/" } else { &docs.dir };
                println!("  {}  {}#{}  {}", entry.id, docs.repo, docs.branch, dir);
            }
            None => println!("  {}  (no docs configured)", entry.id),
        }
    }

    Ok(())
}

async fn cmd_show(library: &str, slug: &str) -> Result<()> {
    let document = lookup(library, slug).await?;

    if !document.front_matter.is_empty() {
        println!("---");
        print!(
            "{}",
            serde_yaml::to_string(&document.front_matter)
                .map_err(|e| eyre!("front matter serialization failed: {e}"))?
        );
        println!("---");
    }
    println!("{}", document.content);

    Ok(())
}

async fn cmd_compile(library: &str, slug: &str) -> Result<()> {
    let document = lookup(library, slug).await?;
    let compiled = docshelf_core::hydrate(&document)?;
    println!("{}", serde_json::to_string_pretty(&compiled)?);
    Ok(())
}

/// Fetch a library and pull one document out of its set by slug.
async fn lookup(library: &str, slug: &str) -> Result<Document> {
    let config = load_config()?;
    let build = fetch_library(&config, library).await?;

    build
        .documents
        .get(slug)
        .cloned()
        .ok_or_else(|| eyre!("no document '{slug}' in library '{library}'"))
}

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_path() -> Result<()> {
    println!("{}", config_file_path()?.display());
    Ok(())
}
