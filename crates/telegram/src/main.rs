use anyhow::Context;
use clap::Parser;
use finbot_core::llm::gemini::GeminiClient;
use finbot_core::llm::LlmClient;
use finbot_core::market::provider::{HttpJsonMarketData, MarketDataClient};
use finbot_core::subs::SubscriberStore;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod api;
mod commands;
mod scheduler;

#[derive(Debug, Parser)]
#[command(name = "finbot_telegram")]
struct Args {
    /// Handle commands only; do not send scheduled subscriber updates.
    #[arg(long)]
    no_scheduler: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = finbot_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();

    let token = settings
        .require_telegram_bot_token()
        .context("cannot start without a bot token")?;
    let telegram = api::TelegramApi::new(token)?;

    let market: Arc<dyn MarketDataClient> = Arc::new(HttpJsonMarketData::from_settings(&settings)?);

    // The bot stays useful without an AI key; /ask just answers that the
    // assistant is unavailable.
    let llm: Option<Arc<dyn LlmClient>> = match GeminiClient::from_settings(&settings) {
        Ok(client) => Some(Arc::new(client)),
        Err(err) => {
            tracing::warn!(error = %err, "AI assistant disabled");
            None
        }
    };

    let subs = Arc::new(SubscriberStore::from_settings(&settings));
    let cancel = CancellationToken::new();

    if settings.bot_owner_id.is_none() {
        tracing::warn!("BOT_OWNER_ID not set; /stop is unrestricted");
    }

    let ctx = Arc::new(commands::BotContext {
        api: telegram,
        market,
        llm,
        subs,
        owner_id: settings.bot_owner_id,
        cancel: cancel.clone(),
    });

    let scheduler_task = if args.no_scheduler {
        None
    } else {
        Some(tokio::spawn(scheduler::run(ctx.clone())))
    };

    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("ctrl-c received; shutting down");
                cancel.cancel();
            }
        }
    });

    tracing::info!("bot listening for commands");
    let result = commands::run_dispatcher(ctx).await;

    cancel.cancel();
    if let Some(task) = scheduler_task {
        let _ = task.await;
    }

    tracing::info!("bot stopped");
    result
}

fn init_sentry(settings: &finbot_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
