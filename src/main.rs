//! Search Synth: chat server and one-shot command line client

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use search_synth::{
    chat::{ChatBackend, HttpBackend, Orchestrator, RenderUpdate, TurnOutcome},
    config::{self, RenderMode, Settings},
    network::HttpClient,
    web::{create_router, AppState},
    Conversation,
};
use std::io::Write;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser, Debug)]
#[command(name = "search-synth", version)]
#[command(about = "Web search and model knowledge, synthesized into one streamed answer")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP server (default)
    Serve,
    /// Answer one query and print it to stdout
    Ask {
        /// The question
        query: String,
        /// Base URL of a running server; the providers are called directly when absent
        #[arg(long)]
        server: Option<String>,
        /// Print the answer only once it is complete
        #[arg(long)]
        buffered: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let loaded = config::load(cli.config.as_deref())?;
    let settings = loaded.settings;

    // Initialize logging
    let default_level = if settings.general.debug { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match &loaded.source {
        Some(path) => info!("Loaded settings from: {}", path.display()),
        None => info!("No settings file found, using defaults"),
    }
    for name in settings.missing_credentials() {
        warn!("{} is not set; calls needing it will fail", name);
    }

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(settings).await,
        Command::Ask {
            query,
            server,
            buffered,
        } => ask(settings, &query, server, buffered).await,
    }
}

async fn serve(settings: Settings) -> Result<()> {
    info!("Starting Search Synth v{}", search_synth::VERSION);
    info!(
        "Loaded configuration for instance: {}",
        settings.general.instance_name
    );

    // Initialize HTTP client
    let client = HttpClient::with_settings(&settings.outgoing)?;

    let addr = SocketAddr::new(settings.server.bind_address.parse()?, settings.server.port);

    // Create application state
    let state = AppState::new(settings, client)?;
    info!("Search engine: {}", state.search.engine_name());
    let app = create_router(state);

    info!("Starting server on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn ask(settings: Settings, query: &str, server: Option<String>, buffered: bool) -> Result<()> {
    let render_mode = if buffered {
        RenderMode::Buffered
    } else {
        settings.ui.render_mode
    };
    let client = HttpClient::with_settings(&settings.outgoing)?;

    let outcome = match server {
        Some(base_url) => {
            let backend = HttpBackend::new(client, base_url)
                .with_knowledge_timeout(Duration::from_secs_f64(settings.llm.request_timeout));
            run_turn(backend, render_mode, query).await
        }
        None => {
            let state = AppState::new(settings, client)?;
            run_turn(state.local_backend(), render_mode, query).await
        }
    };

    match outcome {
        TurnOutcome::Ignored => bail!("query is blank"),
        TurnOutcome::Completed {
            search_failed,
            ai_failed,
        } => {
            if search_failed {
                warn!("Answer was produced without search results");
            }
            if ai_failed {
                warn!("Answer was produced without the initial model answer");
            }
            Ok(())
        }
        TurnOutcome::Failed(failure) => bail!("turn failed: {:?}", failure),
    }
}

async fn run_turn<B: ChatBackend>(backend: B, render_mode: RenderMode, query: &str) -> TurnOutcome {
    let orchestrator = Orchestrator::new(backend).with_render_mode(render_mode);
    let mut conversation = Conversation::new();
    let mut printed = false;

    let outcome = orchestrator
        .submit(&mut conversation, query, |update| {
            let mut stdout = std::io::stdout().lock();
            let _ = match update {
                RenderUpdate::Append(text) => write!(stdout, "{}", text),
                RenderUpdate::Replace(text) if printed => write!(stdout, "\n\n{}", text),
                RenderUpdate::Replace(text) => write!(stdout, "{}", text),
            };
            let _ = stdout.flush();
            printed = true;
        })
        .await;

    if printed {
        println!();
    }
    outcome
}
