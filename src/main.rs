use std::path::PathBuf;
use std::time::{Duration, Instant};

use clap::{Parser, Subcommand};
use furrymap::{Client, ClientConfig, SearchFilter};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;

#[derive(Parser)]
#[command(name = "furrymap", about = "Search furrymap users and markers")]
struct Cli {
    /// Marker cache file (default: $FURRYMAP_CACHE or furrymapCache.json)
    #[arg(long, global = true)]
    cache: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search users and markers by name
    Search {
        name: String,
        /// What to match against (nickname, species, location)
        #[arg(short, long)]
        filter: Option<SearchFilter>,
    },
    /// Show a user's full profile
    Profile { user: String },
    /// Load the marker feed (from cache unless --force)
    Markers {
        /// Ignore the cache file and download again
        #[arg(short, long)]
        force: bool,
        /// Only print the number of markers
        #[arg(long)]
        count: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();

    let mut config = ClientConfig::from_env();
    if let Some(cache) = cli.cache {
        config.cache_name = cache;
    }
    let client = Client::new(config)?;

    match cli.command {
        Commands::Search { name, filter } => {
            let result = client.search(&name, filter).await?;
            print_json(&result)?;
        }
        Commands::Profile { user } => {
            let profile = client.get_profile(&user).await?;
            print_json(&profile)?;
        }
        Commands::Markers { force, count } => {
            let spinner = ProgressBar::new_spinner();
            spinner.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
            spinner.set_message("Loading markers...");
            spinner.enable_steady_tick(Duration::from_millis(100));
            let markers = client.load_markers(force).await;
            spinner.finish_and_clear();

            let markers = markers?;
            if count {
                println!("{}", markers.len());
            } else {
                print_json(&markers)?;
            }
        }
    }

    tracing::debug!("Done in {:.1}s", t0.elapsed().as_secs_f64());
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
