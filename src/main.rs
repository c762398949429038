use std::sync::Arc;

use anyhow::Context;

use quiz_match::catalog::load_catalog;
use quiz_match::channels::{DeliveryChannel, EventSource, TelegramChannel};
use quiz_match::config::BotConfig;
use quiz_match::dispatcher::Dispatcher;
use quiz_match::quiz::QuizService;
use quiz_match::session::SessionStore;

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

    let config = BotConfig::from_env().context("invalid configuration")?;

    let catalog = load_catalog(&config.catalog_path)
        .await
        .with_context(|| format!("failed to load catalog from {}", config.catalog_path.display()))?;

    eprintln!("🤖 Quiz Match v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Catalog: {}", config.catalog_path.display());
    eprintln!(
        "   Questions: {}, items: {}",
        catalog.questions.len(),
        catalog.items.len()
    );
    eprintln!("   Telegram allowed: {}", config.allowed_users_label());

    let telegram = Arc::new(
        TelegramChannel::new(config.bot_token.clone(), config.allowed_users.clone())
            .with_poll_timeout(config.poll_timeout),
    );
    telegram
        .health_check()
        .await
        .context("Telegram health check failed")?;

    let service = Arc::new(QuizService::new(
        Arc::new(catalog),
        SessionStore::new(),
        Arc::clone(&telegram) as Arc<dyn DeliveryChannel>,
    ));
    let dispatcher = Dispatcher::new(service);

    let events = telegram.start().await?;
    tracing::info!("Bot is running; press Ctrl+C to stop");

    tokio::select! {
        dispatched = dispatcher.run(events) => {
            tracing::info!(dispatched, "Event stream closed");
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutting down");
        }
    }

    Ok(())
}
