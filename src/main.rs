// sdarchive: browse an SD card image folder the way the device archive does.
// Usage: sdarchive [-d] [--root DIR] <ls|shell|fav|tabs>

mod cli;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use sdarchive::browser::{ArchiveBrowser, BrowserOptions};
use sdarchive::config::Config;
use sdarchive::launcher::LogLauncher;
use sdarchive::storage::{LocalStorage, Storage};
use sdarchive::tabs::Tab;

#[derive(Parser, Debug)]
#[command(name = "sdarchive", version, about = "SD card archive browser")]
struct Cli {
    /// Debug logging (RUST_LOG still wins)
    #[arg(short, long)]
    debug: bool,

    /// Config file (default: platform config dir)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Host folder mounted at /ext
    #[arg(long)]
    root: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List a tab or a path and print the first window
    Ls {
        #[arg(long)]
        tab: Option<Tab>,
        /// Virtual path such as /ext/nfc
        path: Option<String>,
    },
    /// Interactive session: u d l r ok back long-ok menu, do <action> [name], q
    Shell {
        #[arg(long)]
        tab: Option<Tab>,
    },
    /// Manage the favorites list
    Fav {
        #[command(subcommand)]
        cmd: FavCommands,
    },
    /// Show every tab with its root, filter and whether it is empty
    Tabs,
}

#[derive(Subcommand, Debug)]
enum FavCommands {
    List,
    Add { path: String },
    Rm { path: String },
    Count,
    /// Drop entries whose files or apps are gone
    Clean,
}

fn main() -> Result<()> {
    let args = Cli::parse();

    let level = if args.debug { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let mut config = Config::load(args.config.as_deref())?;
    if let Some(root) = args.root {
        config.storage_root = root;
    }
    std::fs::create_dir_all(&config.storage_root)
        .with_context(|| format!("cannot create {}", config.storage_root.display()))?;
    log::debug!("storage root: {}", config.storage_root.display());

    let storage: Arc<dyn Storage> = Arc::new(LocalStorage::new(&config.storage_root));
    let mut browser = ArchiveBrowser::new(
        storage,
        Box::new(LogLauncher),
        BrowserOptions::from(&config),
    );

    match args.command {
        Commands::Ls { tab, path } => cli::ls(&mut browser, tab, path.as_deref())?,
        Commands::Shell { tab } => cli::shell(&mut browser, tab.unwrap_or(config.start_tab))?,
        Commands::Fav { cmd } => {
            let favorites = browser.favorites();
            match cmd {
                FavCommands::List => cli::fav_list(favorites)?,
                FavCommands::Add { path } => cli::fav_add(favorites, &path)?,
                FavCommands::Rm { path } => cli::fav_rm(favorites, &path)?,
                FavCommands::Count => cli::fav_count(favorites),
                FavCommands::Clean => cli::fav_clean(favorites)?,
            }
        }
        Commands::Tabs => cli::tabs(&browser),
    }
    Ok(())
}
