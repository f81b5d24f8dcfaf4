pub mod cli;
pub mod commands;
pub mod config;
pub mod dotenv;
pub mod error;
pub mod models;
pub mod notify;
pub mod output;
pub mod repo;
pub mod store;

use crate::cli::{Cli, Command};
use crate::commands::Context;
use crate::config::{Config, StoreConfig};
use crate::error::Error;
use crate::notify::SyncNotifier;
use crate::store::{DocumentStore, FirestoreStore, LocalStore};
use clap::{CommandFactory, Parser};
use log::{debug, info};

/// Exit status when no subcommand was given.
const EXIT_USAGE: i32 = 255;

fn open_store(cfg: &StoreConfig) -> Box<dyn DocumentStore> {
    match cfg {
        StoreConfig::Firestore {
            endpoint,
            project_id,
            access_token,
        } => {
            info!("Using Firestore project {project_id} at {endpoint}");
            Box::new(FirestoreStore::new(endpoint, project_id, access_token))
        }
        StoreConfig::Local { root } => {
            let store = LocalStore::new(root.clone());
            info!("Using local store at {}", store.root().display());
            Box::new(store)
        }
    }
}

pub fn run(cli: Cli, command: Command) -> Result<(), Error> {
    let cfg = Config::from_args(&cli.global)?;
    let store = open_store(&cfg.store);
    let notifier = SyncNotifier::new(&cfg.homegraph_base_url, cfg.api_key.clone());
    let ctx = Context {
        store: store.as_ref(),
        notifier: &notifier,
    };

    debug!("Running {command:?}");
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    commands::run(&ctx, command, &mut out)
}

fn main() {
    let loaded_env = match dotenv::load_from_args(std::env::args_os()) {
        Ok(info) => info,
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    };

    let mut cli = Cli::parse();

    // Init logging after environment so RUST_LOG from .env is respected.
    let level = match cli.global.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();

    if let Some(info) = loaded_env.as_ref() {
        let origin = if info.explicit { "CLI-specified" } else { "default" };
        info!(
            "Environment loaded from {} .env file: {} ({} variable(s) applied)",
            origin,
            info.path.display(),
            info.applied
        );
    }
    debug!(
        "home-registry {} (git {})",
        env!("CARGO_PKG_VERSION"),
        env!("BUILD_TIME_GIT_HASH")
    );

    let Some(command) = cli.command.take() else {
        eprintln!("{}", Cli::command().render_help());
        std::process::exit(EXIT_USAGE);
    };
    if let Err(e) = run(cli, command) {
        eprintln!("{e}");
        std::process::exit(1);
    }
}
