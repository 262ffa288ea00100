//! Entry point for the **touchbind** daemon.
//!
//! Loads the configuration, publishes the first binding table, clears out a
//! conflicting gesture client, then runs the event listener and the config
//! watcher on background threads while the main thread processes gestures.
//!
//! # Flags
//!
//! * `--config <path>`: config file (default
//!   `$XDG_CONFIG_HOME/touchbind/config.json`)
//! * `--socket <path>`: event socket (default `$XDG_RUNTIME_DIR/touchbind.sock`)
//! * `--dry-run`: log actions instead of talking to Hyprland
//! * `--no-kill`: leave a running conflicting client alone

use log::{error, info, warn};
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::{mpsc, Arc};
use touchbind::bindings::{apply_reload, SharedBindings};
use touchbind::config::watcher::ConfigWatcher;
use touchbind::config::Config;
use touchbind::daemon::kill_conflicting_client;
use touchbind::desktop::DryRunDesktop;
use touchbind::dispatch::ActionDispatcher;
use touchbind::gesture::GestureEvent;
use touchbind::hyprland::desktop::HyprlandDesktop;
use touchbind::ipc::listener::UnixSocketListener;
use touchbind::manager::GestureManager;
use touchbind::traits::{Desktop, EventSource};

/// Poll interval of the config watcher.
const CONFIG_POLL_MS: u64 = 1000;

/// Default socket path for the event listener.
fn default_socket_path() -> PathBuf {
    let runtime = std::env::var("XDG_RUNTIME_DIR").unwrap_or_else(|_| "/tmp".into());
    PathBuf::from(runtime).join("touchbind.sock")
}

/// Default config path, `$XDG_CONFIG_HOME/touchbind/config.json`.
fn default_config_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME").unwrap_or_else(|_| {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
        format!("{}/.config", home)
    });
    PathBuf::from(base).join("touchbind").join("config.json")
}

struct Args {
    config: PathBuf,
    socket: PathBuf,
    dry_run: bool,
    no_kill: bool,
}

fn parse_args() -> Result<Args, String> {
    let mut args = Args {
        config: default_config_path(),
        socket: default_socket_path(),
        dry_run: false,
        no_kill: false,
    };
    let mut iter = std::env::args().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" => {
                args.config = iter.next().ok_or("--config needs a path")?.into();
            }
            "--socket" => {
                args.socket = iter.next().ok_or("--socket needs a path")?.into();
            }
            "--dry-run" => args.dry_run = true,
            "--no-kill" => args.no_kill = true,
            other => return Err(format!("unknown argument: {}", other)),
        }
    }
    Ok(args)
}

/// Load the config, falling back to compiled-in defaults.
fn load_config(path: &Path) -> Config {
    match Config::load(path) {
        Ok(cfg) => {
            info!("loaded config from {}", path.display());
            cfg
        }
        Err(e) => {
            info!("no usable config file ({}), using defaults", e);
            Config::default()
        }
    }
}

//  Main

fn main() {
    env_logger::init();

    let args = match parse_args() {
        Ok(args) => args,
        Err(e) => {
            error!("{}", e);
            eprintln!("usage: touchbind [--config <path>] [--socket <path>] [--dry-run] [--no-kill]");
            std::process::exit(2);
        }
    };

    let config = load_config(&args.config);
    let bindings = SharedBindings::default();
    bindings.reload(&config.gestures);

    if args.no_kill || !config.daemon.kill_conflicting {
        info!("not looking for a conflicting gesture client");
    } else {
        kill_conflicting_client(&config.daemon.conflicting_client);
    }

    if args.dry_run {
        info!("dry run: actions are logged, not executed");
        run_daemon(DryRunDesktop::new(), bindings, &config, &args);
    } else {
        run_daemon(HyprlandDesktop::new(), bindings, &config, &args);
    }
}

fn run_daemon<D: Desktop>(desktop: D, bindings: SharedBindings, config: &Config, args: &Args) {
    let dispatcher = ActionDispatcher::new(desktop);
    dispatcher.set_natural_scroll(config.touchpad.natural_scroll);

    spawn_config_watcher(
        args.config.clone(),
        bindings.clone(),
        dispatcher.natural_scroll_handle(),
    );

    let (event_tx, event_rx) = mpsc::channel::<GestureEvent>();
    spawn_event_sources(args.socket.clone(), event_tx);

    let mut manager = GestureManager::new(bindings, dispatcher);
    manager.run(event_rx);
}

//  Helpers

/// Rebuild the binding table whenever the config file changes.  A file that
/// no longer parses leaves the current table in place.
fn spawn_config_watcher(path: PathBuf, bindings: SharedBindings, natural_scroll: Arc<AtomicBool>) {
    std::thread::spawn(move || {
        let watcher = match ConfigWatcher::new(&path, CONFIG_POLL_MS) {
            Ok(w) => w,
            Err(e) => {
                info!("config hot reload disabled: {}", e);
                return;
            }
        };
        while let Some(event) = watcher.recv() {
            if let Err(e) = apply_reload(&event.path, &bindings, &natural_scroll) {
                warn!("keeping previous bindings: {}", e);
            }
        }
    });
}

fn spawn_event_sources(socket: PathBuf, tx: mpsc::Sender<GestureEvent>) {
    std::thread::spawn(move || {
        let mut source = UnixSocketListener::new(&socket);
        if let Err(e) = source.run(tx) {
            error!("socket listener error: {}", e);
            std::process::exit(1);
        }
    });
}
