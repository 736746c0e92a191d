//! persona-voice: scripted voice companion service.

mod config;
mod error;
mod persona;

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use persona::api::{start_api, ApiState};
use persona::context::{Persona, PersonaDeps};
use persona::events::TaskEventBus;

#[derive(Parser, Debug)]
#[command(name = "persona-voice", about = "Scripted voice persona service")]
struct Args {
    /// Path to persona.yaml
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the persona identifier
    #[arg(short, long)]
    persona: Option<String>,

    /// Disable idle chat
    #[arg(long)]
    no_idle: bool,

    /// Enable verbose (debug) logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Initialize logging (keep HTTP internals quiet)
    let filter = if args.verbose {
        EnvFilter::new("debug,hyper=info,reqwest=info")
    } else {
        EnvFilter::new("info,hyper=warn,reqwest=warn")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("persona-voice starting");

    let mut config = config::Config::load(args.config.as_deref());
    if let Some(id) = args.persona {
        config.persona.id = id;
    }
    info!(
        "Persona '{}' (sink: {:?}, cooldown: {}ms)",
        config.persona.id, config.voice.sink, config.persona.cooldown_ms
    );

    let persona = Arc::new(Persona::new(&config, PersonaDeps::from_config(&config)));
    let bus = Arc::new(TaskEventBus::new());

    let idle = config.idle.enabled && !args.no_idle;
    persona.initialize(Some(bus.as_ref()), idle).await;

    if config.api.enabled {
        let state = ApiState {
            persona: persona.clone(),
            bus: bus.clone(),
        };
        start_api(state, config.api.port).await;
    }

    tokio::signal::ctrl_c().await?;
    info!("Shutting down");

    persona.stop_idle();
    persona.farewell(true);
    // Give fire-and-forget sink and log requests a moment to leave
    tokio::time::sleep(std::time::Duration::from_millis(500)).await;

    Ok(())
}
