//! Codebox - compile-and-run service with an HTTP API.
//!
//! Usage:
//!   codebox serve [--port 8080]           # Start HTTP server
//!   codebox run <FILE>                    # Compile and run one file, print the JSON result

use clap::{Parser, Subcommand};
use codebox::config::{Config, ConfigArgs};
use codebox::http_server;
use codebox::state::AppState;
use std::path::PathBuf;
use std::process::exit;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "codebox")]
#[command(about = "Compile and run code snippets over HTTP")]
struct Args {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    config: ConfigArgs,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Port to listen on
        #[arg(long, env = "PORT", default_value = "8080")]
        port: u16,
    },
    /// Compile and run a single source file
    Run {
        /// Source file to submit
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let state = AppState::from_config(Config::from(args.config));

    match args.command {
        Commands::Serve { port } => {
            if let Err(e) = http_server::run_server(port, state).await {
                eprintln!("Error: {}", e);
                exit(1);
            }
        }
        Commands::Run { file } => {
            let code = match tokio::fs::read_to_string(&file).await {
                Ok(code) => code,
                Err(e) => {
                    eprintln!("Error: cannot read {}: {}", file.display(), e);
                    exit(1);
                }
            };
            let result = state.executor.execute(&code).await;
            match serde_json::to_string_pretty(&result) {
                Ok(json) => println!("{}", json),
                Err(e) => {
                    eprintln!("Error: {}", e);
                    exit(1);
                }
            }
            exit(if result.is_success() { 0 } else { 1 });
        }
    }
}
