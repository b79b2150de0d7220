//! CLI entry point for touch-gesture-manager
//!
//! Provides commands for inspecting and changing gesture actions,
//! toggling off-screen gestures, restoring hardware state at boot and
//! managing preference backups.

use anyhow::Context;
use clap::{Parser, Subcommand};
use colored::*;
use std::path::{Path, PathBuf};
use tracing::info;

use touch_gesture_manager::config::{
    parser::parse_preferences, MemoryPreferenceStore, PreferenceFile, PreferenceStore,
};
use touch_gesture_manager::core::{Action, ConflictDetector, DefaultActions, Gesture};
use touch_gesture_manager::hal::{GestureActuator, HalError, SysfsGestureDevice};
use touch_gesture_manager::ipc::{BroadcastClient, ClientMode};
use touch_gesture_manager::watcher::ManifestWatcher;
use touch_gesture_manager::{logging, GestureConfigSync};

#[derive(Parser)]
#[command(name = "touch-gesture-manager")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the gesture preference file
    #[arg(long, global = true, default_value = "~/.config/touch-gestures/gestures.conf")]
    prefs: PathBuf,

    /// Path to the gesture manifest describing enable nodes
    #[arg(long, global = true, default_value = "/etc/touch-gestures/manifest.json")]
    manifest: PathBuf,

    /// Device default actions (JSON)
    #[arg(long, global = true)]
    defaults: Option<PathBuf>,

    /// Unix socket receiving gesture updates (stdout when omitted)
    #[arg(long, global = true)]
    socket: Option<PathBuf>,

    /// Never touch hardware, preferences or the socket
    #[arg(long, global = true)]
    dry_run: bool,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List gestures with their actions and effective state
    List,

    /// Set the action for one gesture
    Set {
        /// Gesture id or name
        gesture: String,

        /// Action code or name (e.g. "camera", "5", "disabled")
        action: String,
    },

    /// Enable off-screen gestures
    Enable,

    /// Disable all off-screen gestures
    Disable,

    /// Re-apply stored state to the hardware and broadcast it
    Restore,

    /// Broadcast the current keycode/action table
    Publish,

    /// Restore, then restore again whenever the manifest changes
    Watch,

    /// List, clean up or restore preference backups
    Backups {
        /// Delete all but the newest N backups
        #[arg(long)]
        cleanup: Option<usize>,

        /// Restore the preference file from this backup
        #[arg(long)]
        restore: Option<PathBuf>,
    },
}

/// Actuator used by `--dry-run`: logs instead of writing nodes
struct DryRunActuator;

impl GestureActuator for DryRunActuator {
    fn set_enabled(&self, gesture: &Gesture, enabled: bool) -> Result<(), HalError> {
        info!(gesture = %gesture, enabled, "Dry run: hardware not changed");
        Ok(())
    }
}

/// Broadcast mode for an invocation
///
/// Commands that only read never broadcast, so they get a ReadOnly client.
fn client_mode(cli: &Cli) -> ClientMode {
    if cli.dry_run {
        ClientMode::DryRun
    } else if matches!(cli.command, Commands::List | Commands::Backups { .. }) {
        ClientMode::ReadOnly
    } else {
        ClientMode::Live
    }
}

/// Where status lines go
///
/// A Live client without `--socket` writes update payloads to stdout, so
/// status lines move to stderr to keep stdout machine-readable.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Console {
    to_stderr: bool,
}

impl Console {
    fn for_cli(cli: &Cli) -> Self {
        Self {
            to_stderr: client_mode(cli) == ClientMode::Live && cli.socket.is_none(),
        }
    }

    fn line(self, args: std::fmt::Arguments<'_>) {
        if self.to_stderr {
            eprintln!("{}", args);
        } else {
            println!("{}", args);
        }
    }
}

macro_rules! status {
    ($console:expr, $($arg:tt)*) => {
        $console.line(format_args!($($arg)*))
    };
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let prefs_path = expand_path(&cli.prefs)?;
    let manifest_path = expand_path(&cli.manifest)?;

    match &cli.command {
        Commands::Backups { cleanup, restore } => {
            manage_backups(&prefs_path, *cleanup, restore.as_deref(), cli.dry_run)?
        }
        command => {
            let console = Console::for_cli(&cli);
            let mut sync = build_sync(&cli, &prefs_path, &manifest_path)?;
            match command {
                Commands::List => list_gestures(console, &mut sync),
                Commands::Set { gesture, action } => {
                    set_action(console, &mut sync, gesture, action)?
                }
                Commands::Enable => set_global(console, &mut sync, true),
                Commands::Disable => set_global(console, &mut sync, false),
                Commands::Restore => restore(console, &mut sync),
                Commands::Publish => publish(console, &mut sync)?,
                Commands::Watch => watch(console, &mut sync, &manifest_path)?,
                Commands::Backups { .. } => {}
            }
        }
    }

    Ok(())
}

/// Expands `~` in a path argument
fn expand_path(path: &Path) -> anyhow::Result<PathBuf> {
    let expanded = shellexpand::tilde(
        path.to_str()
            .ok_or_else(|| anyhow::anyhow!("Invalid path encoding: {}", path.display()))?,
    );
    Ok(PathBuf::from(expanded.as_ref()))
}

fn build_sync(cli: &Cli, prefs_path: &Path, manifest_path: &Path) -> anyhow::Result<GestureConfigSync> {
    let device = SysfsGestureDevice::new(manifest_path.to_path_buf());

    let defaults = match &cli.defaults {
        Some(path) => {
            let path = expand_path(path)?;
            DefaultActions::load(&path)
                .with_context(|| format!("Failed to load defaults from {}", path.display()))?
        }
        None => DefaultActions::new(),
    };

    let (actuator, store): (Box<dyn GestureActuator>, Box<dyn PreferenceStore>) = if cli.dry_run {
        (Box::new(DryRunActuator), Box::new(dry_run_store(prefs_path)?))
    } else {
        (
            Box::new(device.clone()),
            Box::new(PreferenceFile::open(prefs_path.to_path_buf())?),
        )
    };

    let client = BroadcastClient::new(client_mode(cli), cli.socket.clone());

    Ok(GestureConfigSync::new(device, actuator, store, client).with_defaults(defaults))
}

/// In-memory copy of the preference file, or an empty store if it is missing
fn dry_run_store(prefs_path: &Path) -> anyhow::Result<MemoryPreferenceStore> {
    if !prefs_path.exists() {
        return Ok(MemoryPreferenceStore::new());
    }

    let content = std::fs::read_to_string(prefs_path)
        .with_context(|| format!("Failed to read {}", prefs_path.display()))?;
    let entries = parse_preferences(&content)?;

    Ok(MemoryPreferenceStore::with_entries(
        entries.iter().map(|(k, v)| (k.as_str(), v.as_str())),
    ))
}

fn load_or_warn(console: Console, sync: &mut GestureConfigSync) {
    if let Err(e) = sync.load_gestures() {
        status!(console, "{} {}", "⚠".yellow(), e.to_string().yellow());
    }
}

/// List gestures with action names and effective state
fn list_gestures(console: Console, sync: &mut GestureConfigSync) {
    load_or_warn(console, sync);

    let global = if sync.global_enabled() {
        "enabled".green().bold()
    } else {
        "disabled".red().bold()
    };
    status!(console, "{}", format!("Off-screen gestures: {}\n", global).bold());

    let rows = sync.snapshot();
    for row in &rows {
        let state = if row.effective { "on".green() } else { "off".dimmed() };
        status!(
            console,
            "{} {} {} → {} [{}]",
            format!("{:>3}", row.gesture.id).dimmed(),
            row.gesture.name.cyan().bold(),
            format!("(keycode {})", row.gesture.keycode).dimmed(),
            row.action.to_string().green(),
            state,
        );
    }

    let detector = ConflictDetector::from_gestures(sync.gestures());
    for conflict in detector.find_conflicts() {
        let names: Vec<&str> = conflict
            .conflicting_gestures
            .iter()
            .map(|g| g.name.as_str())
            .collect();
        status!(
            console,
            "{} keycode {} shared by {}",
            "⚠".yellow(),
            conflict.keycode,
            names.join(", ")
        );
    }

    let stale = sync.stale_entries();
    if !stale.is_empty() {
        status!(
            console,
            "{} Stored actions for unknown gestures: {:?}",
            "⚠".yellow(),
            stale
        );
    }

    status!(console, "\n{} Total: {} gestures", "✓".green(), rows.len());
}

fn set_action(console: Console, sync: &mut GestureConfigSync, gesture: &str, action: &str) -> anyhow::Result<()> {
    let action: Action = action.parse().map_err(anyhow::Error::msg)?;

    if let Err(e) = sync.load_gestures() {
        status!(console, "{} {}", "✗".red().bold(), e);
        std::process::exit(1);
    }

    match sync.set_gesture_action_by_ref(gesture, action) {
        Ok(()) => {
            status!(console, "{} {} → {}", "✓".green(), gesture.cyan().bold(), action.to_string().green());
            Ok(())
        }
        Err(e) => {
            status!(console, "{} {}", "✗".red().bold(), e);
            std::process::exit(1);
        }
    }
}

fn set_global(console: Console, sync: &mut GestureConfigSync, enabled: bool) {
    load_or_warn(console, sync);

    match sync.set_global_enable(enabled) {
        Ok(()) => {
            let word = if enabled { "enabled".green() } else { "disabled".red() };
            status!(console, "{} Off-screen gestures {}", "✓".green(), word);
        }
        Err(e) => {
            status!(console, "{} {}", "✗".red().bold(), e);
            std::process::exit(1);
        }
    }
}

fn restore(console: Console, sync: &mut GestureConfigSync) {
    let report = sync.restore_all();

    status!(
        console,
        "{} Restored {} gestures ({} enabled)",
        "✓".green(),
        report.gestures,
        report.enabled
    );
    if report.failed > 0 {
        status!(
            console,
            "{} {} gesture{} rejected by hardware",
            "⚠".yellow(),
            report.failed,
            if report.failed == 1 { "" } else { "s" }
        );
    }
}

fn publish(console: Console, sync: &mut GestureConfigSync) -> anyhow::Result<()> {
    load_or_warn(console, sync);
    let update = sync.publish_update();
    info!(payload = %serde_json::to_string(&update)?, "Published");
    status!(console, "{} Published {} gestures", "✓".green(), update.len());
    Ok(())
}

fn watch(console: Console, sync: &mut GestureConfigSync, manifest_path: &Path) -> anyhow::Result<()> {
    let watcher = ManifestWatcher::new(manifest_path)
        .with_context(|| format!("Failed to watch {}", manifest_path.display()))?;

    restore(console, sync);
    status!(console, "{} Watching {}", "→".cyan(), manifest_path.display());

    while watcher.wait_for_change() {
        info!(manifest = %manifest_path.display(), "Manifest changed");
        restore(console, sync);
    }

    Ok(())
}

fn manage_backups(
    prefs_path: &Path,
    cleanup: Option<usize>,
    restore: Option<&Path>,
    dry_run: bool,
) -> anyhow::Result<()> {
    let mut prefs = PreferenceFile::open(prefs_path.to_path_buf())?;

    if let Some(backup) = restore {
        let backup = expand_path(backup)?;
        if dry_run {
            println!("{} Dry run: would restore {}", "→".cyan(), backup.display());
        } else {
            prefs.restore_backup(&backup)?;
            println!("{} Restored {}", "✓".green(), backup.display());
        }
    }

    if let Some(keep) = cleanup {
        if dry_run {
            println!("{} Dry run: would keep newest {} backups", "→".cyan(), keep);
        } else {
            let deleted = prefs.cleanup_old_backups(keep)?;
            println!("{} Deleted {} old backups", "✓".green(), deleted);
        }
    }

    let backups = prefs.list_backups()?;
    println!("{}", format!("Backups in: {}\n", prefs.backup_dir().display()).bold());
    for backup in &backups {
        println!("  {}", backup.display());
    }
    println!("\n{} Total: {} backups", "✓".green(), backups.len());

    Ok(())
}
