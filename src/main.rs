//! eve-launch-manager - Interchangeable settings profiles for the EVE
//! Online launcher
//!
//! Saves, switches, and backs up named snapshots of the launcher's
//! settings file. The launcher must be closed while profiles are
//! created or switched.

mod core;
mod persistence;

use std::io::{self, Write};

use anyhow::Result;
use clap::{Parser, Subcommand};
use single_instance::SingleInstance;
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::core::backup::create_backup;
use crate::core::paths::LAUNCHER_EXECUTABLE;
use crate::core::{LauncherPresence, Paths, ProcessPresence, ProfileManager};
use crate::persistence::RegistryStore;

/// Application name constant
pub const APP_NAME: &str = "eve-launch-manager";

/// Application version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[command(name = APP_NAME, version, about = "Profile manager for the EVE Online launcher's settings file")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List known profiles and mark the active one
    List,
    /// Create a new profile, empty or cloned from an existing one
    Create {
        /// Name of the new profile (letters, numbers, underscores, dashes)
        name: String,
        /// Existing profile whose snapshot seeds the new one
        #[arg(long)]
        based_on: Option<String>,
    },
    /// Switch the live settings file to the named profile
    Switch {
        /// Profile to activate
        name: String,
    },
    /// Back up the whole settings directory to a timestamped zip
    Backup,
}

fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    info!("{} v{} starting...", APP_NAME, APP_VERSION);

    // The registry and settings files tolerate exactly one writer.
    let guard = SingleInstance::new(APP_NAME).expect("Failed to create single instance lock");
    if !guard.is_single() {
        anyhow::bail!("another instance of {APP_NAME} is already running");
    }

    let paths = Paths::new()?;
    let mut presence = LauncherPresence::new(LAUNCHER_EXECUTABLE);

    // Gate mutating commands at entry; the lifecycle manager re-checks
    // before every destructive filesystem step.
    if !matches!(cli.command, Command::List) && presence.is_running() {
        anyhow::bail!("the EVE launcher is currently running; close it and try again");
    }

    match cli.command {
        Command::List => {
            let store = RegistryStore::load(&paths)?;
            let registry = store.get();
            for name in &registry.profiles {
                if *name == registry.active_profile {
                    println!("* {name} (active)");
                } else {
                    println!("  {name}");
                }
            }
        }
        Command::Create { name, based_on } => {
            let mut store = RegistryStore::load(&paths)?;
            store.subscribe(|registry| {
                debug!(
                    "Registry updated: {} profiles, '{}' active",
                    registry.profiles.len(),
                    registry.active_profile
                );
            });
            let mut manager = ProfileManager::new(store, paths, Box::new(presence));
            manager.create_profile(&name, based_on.as_deref())?;
            println!("Created profile {name}");
        }
        Command::Switch { name } => {
            let mut store = RegistryStore::load(&paths)?;
            store.subscribe(|registry| {
                debug!(
                    "Registry updated: {} profiles, '{}' active",
                    registry.profiles.len(),
                    registry.active_profile
                );
            });
            let mut manager = ProfileManager::new(store, paths, Box::new(presence));
            manager.switch_profile(&name)?;
            println!("Switched to profile {name}");
        }
        Command::Backup => {
            let destination = paths.backup_file();
            create_backup(&paths.settings_dir, &destination, |progress| {
                print!(
                    "\rBacking up files... {:.0}%",
                    progress.fraction() * 100.0
                );
                let _ = io::stdout().flush();
            })?;
            println!("\nBackup completed! File saved as: {}", destination.display());
        }
    }

    Ok(())
}

/// Initialize the logging system
fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("eve_launch_manager=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
