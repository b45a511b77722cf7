//! Metadata Agent - edit metadata-object JSON with natural language.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use metadata_agent::ai::ModelClient;
use metadata_agent::bridge::Assistant;
use metadata_agent::config::{AppConfig, ConfigLoader, StoreConfig};
use metadata_agent::display;
use metadata_agent::store::{LocalStore, ResourceStore, StoreClient, StoreServer};

#[derive(Parser)]
#[command(
    name = "metadata-agent",
    about = "Edit metadata-object JSON with natural language",
    version
)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short = 'v', long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Configuration file (defaults to .metadata-agent.toml, then the user config dir).
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ask for a change to the metadata object. Without a question, reads questions from stdin.
    Ask {
        /// The question, as one or more words.
        question: Vec<String>,
        /// Use a running Store server instead of the data directory.
        #[arg(long)]
        socket: Option<PathBuf>,
        /// Data directory of the in-process Store.
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },
    /// Serve the Store over a Unix socket until interrupted.
    Serve {
        /// Socket path to listen on.
        #[arg(long)]
        socket: Option<PathBuf>,
        /// Data directory to serve.
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },
    /// List the Store's resources and tools.
    Resources {
        /// Query a running Store server instead of the data directory.
        #[arg(long)]
        socket: Option<PathBuf>,
    },
}

fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn open_store(config: &AppConfig, socket: Option<PathBuf>) -> Arc<dyn ResourceStore> {
    match socket {
        Some(path) => {
            tracing::debug!(
                path = %path.display(),
                timeout_ms = ?config.store.timeout_ms,
                "Using remote store"
            );
            let store_config = StoreConfig {
                socket_path: path,
                ..config.store.clone()
            };
            Arc::new(StoreClient::from_config(&store_config))
        }
        None => {
            tracing::debug!(data_dir = %config.store.data_dir.display(), "Using local store");
            Arc::new(LocalStore::from_config(&config.store))
        }
    }
}

/// Process one question and print its outcome. Returns false on error.
async fn handle_question(assistant: &Assistant, question: &str) -> bool {
    match assistant.answer(question).await {
        Ok(answer) => {
            display::print_answer(&answer);
            true
        }
        Err(e) => {
            tracing::error!(error = %e, "Question aborted");
            display::print_error(&e.to_string());
            if let Some(raw) = e.raw_answer() {
                display::print_raw_answer(raw);
            }
            false
        }
    }
}

async fn run_interactive(assistant: &Assistant) -> ExitCode {
    println!("Enter a question (empty line to exit).");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        display::print_question_prompt();
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                tracing::error!(error = %e, "Failed to read stdin");
                return ExitCode::FAILURE;
            }
        };

        let question = line.trim();
        if question.is_empty() {
            break;
        }
        handle_question(assistant, question).await;
    }

    println!("Bye!");
    ExitCode::SUCCESS
}

async fn run_ask(config: AppConfig, question: &[String], socket: Option<PathBuf>) -> ExitCode {
    let model = match ModelClient::from_config(config.ai.clone()) {
        Ok(model) => model,
        Err(e) => {
            display::print_error(&e.to_string());
            return ExitCode::FAILURE;
        }
    };
    tracing::info!(model = %model.model(), provider = ?model.provider_kind(), "Model client ready");

    let assistant = Assistant::new(open_store(&config, socket), Arc::new(model));

    if question.is_empty() {
        return run_interactive(&assistant).await;
    }

    if handle_question(&assistant, &question.join(" ")).await {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

async fn run_serve(config: AppConfig, socket: Option<PathBuf>) -> ExitCode {
    let socket = socket.unwrap_or_else(|| config.store.socket_path.clone());
    let store = Arc::new(LocalStore::from_config(&config.store));
    tracing::info!(data_dir = %store.data_dir().display(), "Serving store");

    let handle = match StoreServer::new(&socket).start(store) {
        Ok(handle) => handle,
        Err(e) => {
            display::print_error(&e.to_string());
            return ExitCode::FAILURE;
        }
    };
    println!("Store listening on {}", handle.socket_path().display());

    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to wait for Ctrl-C");
    }
    handle.shutdown();
    ExitCode::SUCCESS
}

async fn run_resources(config: AppConfig, socket: Option<PathBuf>) -> ExitCode {
    match open_store(&config, socket).list().await {
        Ok(catalog) => {
            display::print_catalog(&catalog);
            ExitCode::SUCCESS
        }
        Err(e) => {
            display::print_error(&e.to_string());
            ExitCode::FAILURE
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let loader = cli.config.map_or_else(ConfigLoader::new, ConfigLoader::with_path);
    let mut config = match loader.load() {
        Ok(config) => config,
        Err(e) => {
            display::print_error(&e.to_string());
            return ExitCode::FAILURE;
        }
    };

    match cli.command {
        Commands::Ask {
            question,
            socket,
            data_dir,
        } => {
            if let Some(dir) = data_dir {
                config.store.data_dir = dir;
            }
            run_ask(config, &question, socket).await
        }
        Commands::Serve { socket, data_dir } => {
            if let Some(dir) = data_dir {
                config.store.data_dir = dir;
            }
            run_serve(config, socket).await
        }
        Commands::Resources { socket } => run_resources(config, socket).await,
    }
}
