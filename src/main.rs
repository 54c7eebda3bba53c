use std::sync::Arc;

use triage_assist::cli;
use triage_assist::config::BotConfig;
use triage_assist::conversation::Conversation;
use triage_assist::gateway::{HttpGateway, TriageApi};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = BotConfig::from_env()?;

    eprintln!("🩺 Triage Assist v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Backend: {}", config.api_base_url);
    eprintln!("   Answer with a number, or type 'quit' to exit.\n");

    let gateway: Arc<dyn TriageApi> = Arc::new(HttpGateway::new(&config));
    let conversation = Conversation::new(&config, gateway);

    cli::run(conversation).await?;

    Ok(())
}
