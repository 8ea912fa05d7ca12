//! ShotCoach command-line demo: guidance for one frame.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use shotcoach_advisor::OpenRouterClient;
use shotcoach_agent::{AgentConfig, GuidanceAgent};

#[derive(Debug, Parser)]
#[command(name = "shotcoach", version, about = "Shooting suggestions for a single photo")]
struct Cli {
    /// Frame to analyse (JPEG or PNG).
    image: PathBuf,

    /// What you are trying to shoot, e.g. "food" or "street portraits".
    #[arg(long, env = "SHOTCOACH_INTENT")]
    intent: Option<String>,

    /// Print the conversation summary after the guidance.
    #[arg(long)]
    history: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Colored output for dev, JSON for production
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::from_default_env().add_directive("shotcoach=info".parse().unwrap());

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_writer(std::io::stderr),
            )
            .with(env_filter)
            .init();
    }

    let cli = Cli::parse();

    let advisor = match OpenRouterClient::from_env() {
        Ok(client) => client,
        Err(e) => {
            error!("Failed to create advisor client: {}", e);
            std::process::exit(1);
        }
    };
    info!(model = %advisor.config().model, "Advisor ready");

    let config = AgentConfig::from_env();
    let agent = GuidanceAgent::new(config, Arc::new(advisor));

    agent.start_session().await;
    if let Some(intent) = cli.intent.as_deref() {
        agent.set_intent(intent).await?;
    }

    let response = agent.get_guidance(cli.image).await;
    println!("{}", serde_json::to_string_pretty(&response)?);

    if cli.history {
        println!("{}", serde_json::to_string_pretty(&agent.history_summary().await)?);
    }

    if response.is_error() {
        std::process::exit(2);
    }
    Ok(())
}
