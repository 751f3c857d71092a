use crate::api::TelegramApiError;
use crate::commands::BotContext;
use anyhow::Result;
use finbot_core::domain::item::ScoreKind;
use finbot_core::report::{build_report, ReportCategory, ReportRequest};
use std::sync::Arc;
use std::time::Duration;

const DEFAULT_INTERVAL_HOURS: u64 = 12;
const PER_ITEM_LIMIT: usize = 5;

// Pause between subscriber sends so a long list does not trip rate limits.
const INTER_SEND_DELAY: Duration = Duration::from_secs(2);

/// Periodic broadcast loop: every interval, build the two top-5 ranked
/// reports and push them to every subscriber. Runs until cancelled.
pub async fn run(ctx: Arc<BotContext>) -> Result<()> {
    let interval_hours = std::env::var("SCHEDULE_INTERVAL_HOURS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .filter(|h| *h > 0)
        .unwrap_or(DEFAULT_INTERVAL_HOURS);
    let period = Duration::from_secs(interval_hours * 3600);

    tracing::info!(interval_hours, "scheduler started");

    loop {
        tokio::select! {
            _ = ctx.cancel.cancelled() => break,
            _ = tokio::time::sleep(period) => {}
        }

        if let Err(err) = run_tick(&ctx, interval_hours).await {
            if ctx.cancel.is_cancelled() {
                break;
            }
            sentry_anyhow::capture_anyhow(&err);
            tracing::error!(error = %err, "periodic broadcast failed");
        }
    }

    tracing::info!("scheduler stopped");
    Ok(())
}

async fn run_tick(ctx: &BotContext, interval_hours: u64) -> Result<()> {
    let subscribers = ctx.subs.snapshot().await;
    if subscribers.is_empty() {
        tracing::debug!("no subscribers; skipping periodic broadcast");
        return Ok(());
    }

    tracing::info!(count = subscribers.len(), "sending periodic updates");

    // One report pair per tick, shared across all subscribers.
    let etf = section(ctx, ReportCategory::Etf).await?;
    let stocks = section(ctx, ReportCategory::Stock).await?;
    let text = periodic_update_text(&etf, &stocks, interval_hours, chrono::Utc::now());

    for chat_id in subscribers {
        if ctx.cancel.is_cancelled() {
            break;
        }

        if let Err(err) = ctx.api.send_message(chat_id, &text).await {
            match err.downcast_ref::<TelegramApiError>() {
                Some(api_err) if api_err.is_blocked_by_chat() => {
                    // The chat blocked the bot; drop it from the list.
                    let _ = ctx.subs.remove(chat_id).await;
                    tracing::info!(chat_id, "unsubscribed blocked chat");
                }
                _ => tracing::warn!(chat_id, error = %err, "periodic send failed"),
            }
        }

        tokio::select! {
            _ = ctx.cancel.cancelled() => break,
            _ = tokio::time::sleep(INTER_SEND_DELAY) => {}
        }
    }

    Ok(())
}

async fn section(ctx: &BotContext, category: ReportCategory) -> Result<String> {
    let request = ReportRequest {
        category,
        limit: PER_ITEM_LIMIT,
        sort_by_score: true,
        score_kind: ScoreKind::LongTerm,
    };
    build_report(ctx.market.as_ref(), request, &ctx.cancel).await
}

fn periodic_update_text(
    etf: &str,
    stocks: &str,
    interval_hours: u64,
    now: chrono::DateTime<chrono::Utc>,
) -> String {
    format!(
        "🔔 **Your periodic financial brief** ({}) 🔔\n\n\
{etf}\n\n{stocks}\n\n\
_Next update in ~{interval_hours}h. The long-term score is experimental._",
        now.format("%Y-%m-%d %H:%M UTC"),
    )
}
