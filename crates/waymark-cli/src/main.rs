//! waymark CLI
//!
//! Command-line tool for checking patterns and dry-running route manifests.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context as _};
use clap::{Parser, Subcommand};
use serde_json::{json, Value};
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use waymark::{
    match_url, LoggingHandler, Manifest, MatchOptions, MemoryHistory, NavigateOptions, Navigation,
    RecordParams, ResolvedRoute, Router,
};

/// Client-side URL routing, from the command line.
#[derive(Parser)]
#[command(name = "waymark")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Route manifest (JSON).
    #[arg(short, long, env = "WAYMARK_MANIFEST", default_value = "routes.json")]
    manifest: PathBuf,

    /// Enable verbose output.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Match one URL against one pattern, without a manifest.
    Match {
        url: String,
        pattern: String,

        /// Return partial parameters instead of failing.
        #[arg(short, long)]
        lenient: bool,
    },

    /// List the manifest's routes in match order.
    Routes,

    /// Show which route a URL resolves to.
    Resolve { url: String },

    /// Navigate through URLs in order, printing each resolved context.
    Navigate {
        #[arg(required = true)]
        urls: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .without_time()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Match {
            url,
            pattern,
            lenient,
        } => match match_url(&url, &pattern, MatchOptions { lenient })? {
            Some(params) => println!("{}", serde_json::to_string_pretty(&params)?),
            None => bail!("`{url}` does not match `{pattern}`"),
        },

        Commands::Routes => {
            let router = load_router(&cli.manifest)?;
            for line in route_lines(&router) {
                println!("{line}");
            }
        }

        Commands::Resolve { url } => {
            let router = load_router(&cli.manifest)?;
            match router.resolve(&url)? {
                Some(resolved) => {
                    println!("{}", serde_json::to_string_pretty(&describe(&resolved))?);
                }
                None => bail!("no route in {} matches `{url}`", cli.manifest.display()),
            }
        }

        Commands::Navigate { urls } => {
            let history = Arc::new(MemoryHistory::default());
            let router = Manifest::from_path(&cli.manifest)
                .with_context(|| format!("loading {}", cli.manifest.display()))?
                .into_builder()?
                .before(LoggingHandler)
                .after(RecordParams::new())
                .history(history.clone())
                .build()?;
            router.start();

            for url in &urls {
                match router.navigate(url, NavigateOptions::default()).await {
                    Ok(Navigation::Completed(ctx)) => {
                        println!("{}", serde_json::to_string_pretty(&ctx)?);
                    }
                    Ok(other) => info!(url = %url, outcome = ?other, "navigation skipped"),
                    Err(err) => warn!(url = %url, error = %err, "navigation failed"),
                }
            }

            println!("\nHistory:");
            println!("{:-<60}", "");
            for entry in history.entries() {
                println!(" {}", entry.url);
            }
        }
    }

    Ok(())
}

/// Loads a manifest and builds a router with no handlers.
fn load_router(path: &Path) -> anyhow::Result<Router> {
    let router = Manifest::from_path(path)
        .with_context(|| format!("loading {}", path.display()))?
        .into_builder()?
        .build()?;
    Ok(router)
}

/// One line per route, in match order.
fn route_lines(router: &Router) -> Vec<String> {
    router
        .table()
        .iter()
        .map(|route| match &route.name {
            Some(name) => format!("{:<40} {name}", route.pattern.as_str()),
            None => route.pattern.as_str().to_string(),
        })
        .collect()
}

fn describe(resolved: &ResolvedRoute) -> Value {
    json!({
        "url": resolved.url,
        "pattern": resolved.route.pattern.as_str(),
        "name": resolved.route.name,
        "params": resolved.params,
    })
}
