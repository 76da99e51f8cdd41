mod config;
mod executor;
mod notify;
mod passes;
mod rotor;
mod web;

use clap::{Parser, Subcommand};
use std::fs;
use std::process::ExitCode;
use std::sync::Arc;

use crate::config::Config;
use crate::executor::Executor;
use crate::notify::SlackNotifier;
use crate::passes::{PassRequest, PassStore, TrackingPass};
use crate::rotor::{AzEl, Rotor, SlewSim};
use crate::web::AppState;

#[derive(Parser)]
#[command(name = "trackctl")]
#[command(about = "Satellite tracking pass executor and rotator control")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a tracking pass file
    Validate { pass: String },
    /// Run the pass executor and its HTTP API
    Serve {
        #[arg(long, default_value = "trackctl.yaml")]
        config: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { pass } => validate(&pass),
        Commands::Serve { config } => serve(&config).await,
    }
}

fn validate(path: &str) -> ExitCode {
    let raw = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error reading file: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let request: PassRequest = match serde_json::from_str(&raw) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Parse error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match TrackingPass::from_request("unsaved".to_string(), request) {
        Ok(pass) => {
            println!("Pass is valid ({} waypoints)", pass.waypoints().len());
            println!("  spacecraft: {}", pass.spacecraft());
            println!("  window: {} - {}", pass.start_time(), pass.end_time());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Validation error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn serve(config_path: &str) -> ExitCode {
    let config = match Config::from_file(config_path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading config {}: {}", config_path, e);
            return ExitCode::FAILURE;
        }
    };

    let rotor = Arc::new(Rotor::new(
        AzEl::default(),
        Box::new(SlewSim::new(config.tracking.slew_step_deg)),
        config.tracking.slew_pacing,
    ));
    let store = Arc::new(PassStore::new(config.passes.base_folder.clone()));
    let notifier = SlackNotifier::new(config.notify.slack_webhook_url.clone());

    let (executor, handle, updates) = Executor::new(
        rotor.clone(),
        store.clone(),
        notifier.clone(),
        config.tracking.clone(),
    );
    tokio::spawn(executor.run());

    notify::spawn_daily_digest(store.clone(), notifier, &config.notify);

    let state = AppState {
        store,
        rotor,
        executor: handle,
        updates,
    };

    if let Err(e) = web::run_server(&config.web.bind, state).await {
        eprintln!("Server error: {}", e);
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
