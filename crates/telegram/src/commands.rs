use crate::api::TelegramApi;
use anyhow::Result;
use finbot_core::domain::item::ScoreKind;
use finbot_core::llm::LlmClient;
use finbot_core::market::provider::MarketDataClient;
use finbot_core::report::detail::{build_detail, build_officers};
use finbot_core::report::{build_report, ReportCategory, ReportRequest};
use finbot_core::subs::SubscriberStore;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

const AI_DISCLAIMER: &str =
    "\n\n🧠 _AI answer (Gemini). General information, not financial advice. Always verify._";
const SCORE_DISCLAIMER: &str = "⚠️ _The long-term score is a simplified, experimental heuristic. \
It is NOT financial advice; always do your own research._";

/// Everything a command handler needs, shared with the scheduler task.
pub struct BotContext {
    pub api: TelegramApi,
    pub market: Arc<dyn MarketDataClient>,
    pub llm: Option<Arc<dyn LlmClient>>,
    pub subs: Arc<SubscriberStore>,
    pub owner_id: Option<i64>,
    pub cancel: CancellationToken,
}

/// Commands the bot reacts to. Anything else in a chat is ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    Help,
    Clear,
    LongTerm,
    LongTermEtf,
    LongTermStock,
    List,
    Detail(Option<String>),
    Officers(Option<String>),
    ToggleSubscription,
    Status,
    Ask(Option<String>),
    Stop,
}

/// Parse a message text into a command. Returns `None` for plain text,
/// unknown commands, and non-command chatter. A `@BotName` suffix on the
/// command word (group-chat style) is accepted and stripped; ticker
/// arguments are uppercased.
pub fn parse(text: &str) -> Option<Command> {
    let text = text.trim();
    if !text.starts_with('/') {
        return None;
    }

    let mut parts = text.splitn(2, char::is_whitespace);
    let word = parts.next()?;
    let rest = parts.next().map(str::trim).filter(|s| !s.is_empty());

    let name = word[1..]
        .split('@')
        .next()
        .unwrap_or_default()
        .to_lowercase();

    let command = match name.as_str() {
        "start" => Command::Start,
        "help" => Command::Help,
        "clear" => Command::Clear,
        "longterm" => Command::LongTerm,
        "longtermetf" => Command::LongTermEtf,
        "longtermact" => Command::LongTermStock,
        "list" => Command::List,
        "detail" => Command::Detail(rest.map(str::to_uppercase)),
        "officers" => Command::Officers(rest.map(str::to_uppercase)),
        "info" => Command::ToggleSubscription,
        "status" => Command::Status,
        "ask" => Command::Ask(rest.map(str::to_string)),
        "stop" => Command::Stop,
        _ => return None,
    };
    Some(command)
}

/// Long-poll Telegram and dispatch commands until cancelled. Transport
/// errors are logged and retried after a short pause; per-command failures
/// turn into an apology in the chat, never into a crash of the loop.
pub async fn run_dispatcher(ctx: Arc<BotContext>) -> Result<()> {
    let mut offset = 0i64;

    loop {
        let updates = tokio::select! {
            _ = ctx.cancel.cancelled() => break,
            res = ctx.api.get_updates(offset) => res,
        };

        let updates = match updates {
            Ok(updates) => updates,
            Err(err) => {
                tracing::warn!(error = %err, "getUpdates failed; backing off");
                tokio::time::sleep(Duration::from_secs(5)).await;
                continue;
            }
        };

        for update in updates {
            offset = offset.max(update.update_id + 1);

            let Some(message) = update.message else {
                continue;
            };
            let Some(command) = message.text.as_deref().and_then(parse) else {
                continue;
            };

            let chat_id = message.chat.id;
            let from_id = message.from.as_ref().map(|u| u.id);
            tracing::info!(chat_id, ?command, "handling command");

            if let Err(err) = handle_command(&ctx, chat_id, from_id, command).await {
                sentry_anyhow::capture_anyhow(&err);
                tracing::error!(chat_id, error = %err, "command handler failed");
                let _ = ctx
                    .api
                    .send_message(chat_id, "An error occurred while handling the command.")
                    .await;
            }

            if ctx.cancel.is_cancelled() {
                break;
            }
        }

        if ctx.cancel.is_cancelled() {
            break;
        }
    }

    tracing::info!("dispatcher stopped");
    Ok(())
}

async fn handle_command(
    ctx: &BotContext,
    chat_id: i64,
    from_id: Option<i64>,
    command: Command,
) -> Result<()> {
    match command {
        Command::Start | Command::Help => {
            ctx.api
                .send_message(chat_id, &welcome_text(ctx.owner_id.is_some(), false))
                .await
        }
        Command::Clear => handle_clear(ctx, chat_id).await,
        Command::LongTerm => {
            send_ranked_list(ctx, chat_id, ReportCategory::Both, 7, true).await
        }
        Command::LongTermEtf => {
            send_ranked_list(ctx, chat_id, ReportCategory::Etf, 10, true).await
        }
        Command::LongTermStock => {
            send_ranked_list(ctx, chat_id, ReportCategory::Stock, 10, true).await
        }
        Command::List => send_ranked_list(ctx, chat_id, ReportCategory::Both, 10, false).await,
        Command::Detail(symbol) => match symbol {
            Some(symbol) => {
                ctx.api.send_typing(chat_id).await;
                let text = build_detail(ctx.market.as_ref(), &symbol).await;
                ctx.api.send_message(chat_id, &text).await
            }
            None => ctx.api.send_message(chat_id, "Usage: `/detail <TICKER>`").await,
        },
        Command::Officers(symbol) => match symbol {
            Some(symbol) => {
                ctx.api.send_typing(chat_id).await;
                let text = build_officers(ctx.market.as_ref(), &symbol).await;
                ctx.api.send_message(chat_id, &text).await
            }
            None => {
                ctx.api
                    .send_message(chat_id, "Usage: `/officers <TICKER>`")
                    .await
            }
        },
        Command::ToggleSubscription => {
            let subscribed = ctx.subs.toggle(chat_id).await?;
            let text = if subscribed {
                "✅ Subscribed to periodic updates (every 12h)!"
            } else {
                "✅ Unsubscribed from periodic updates."
            };
            ctx.api.send_message(chat_id, text).await
        }
        Command::Status => {
            let text = if ctx.subs.contains(chat_id).await {
                "✅ Subscribed to periodic updates."
            } else {
                "❌ Not subscribed. Use /info."
            };
            ctx.api.send_message(chat_id, text).await
        }
        Command::Ask(question) => handle_ask(ctx, chat_id, question.as_deref()).await,
        Command::Stop => handle_stop(ctx, chat_id, from_id).await,
    }
}

async fn send_ranked_list(
    ctx: &BotContext,
    chat_id: i64,
    category: ReportCategory,
    limit: usize,
    sort_by_score: bool,
) -> Result<()> {
    ctx.api.send_typing(chat_id).await;

    let request = ReportRequest {
        category,
        limit,
        sort_by_score,
        score_kind: ScoreKind::LongTerm,
    };
    let report = build_report(ctx.market.as_ref(), request, &ctx.cancel).await?;
    ctx.api.send_message(chat_id, &report).await
}

// There is no real "clear chat" in the Bot API; push the history out of view
// with blank lines, then re-show the welcome text.
async fn handle_clear(ctx: &BotContext, chat_id: i64) -> Result<()> {
    ctx.api.send_typing(chat_id).await;
    ctx.api.send_message(chat_id, "🧹").await?;
    ctx.api
        .send_silent_message(chat_id, &"\n".repeat(30))
        .await?;
    ctx.api
        .send_message(chat_id, &welcome_text(ctx.owner_id.is_some(), true))
        .await
}

async fn handle_ask(ctx: &BotContext, chat_id: i64, question: Option<&str>) -> Result<()> {
    let Some(llm) = ctx.llm.as_ref() else {
        return ctx
            .api
            .send_message(chat_id, "🤖 The AI assistant is currently unavailable.")
            .await;
    };

    let Some(question) = question else {
        return ctx
            .api
            .send_message(
                chat_id,
                "Please put a question after /ask.\nE.g. `/ask Outlook for the semiconductor sector?`",
            )
            .await;
    };

    ctx.api.send_typing(chat_id).await;
    match llm.ask(question).await {
        Ok(answer) => {
            ctx.api
                .send_message(chat_id, &format!("{answer}{AI_DISCLAIMER}"))
                .await
        }
        Err(err) => {
            sentry_anyhow::capture_anyhow(&err);
            tracing::error!(chat_id, error = %err, "LLM request failed");
            ctx.api
                .send_message(
                    chat_id,
                    &format!("🤖 Oops! Could not reach the AI.{AI_DISCLAIMER}"),
                )
                .await
        }
    }
}

async fn handle_stop(ctx: &BotContext, chat_id: i64, from_id: Option<i64>) -> Result<()> {
    // Unrestricted until an owner id is configured, which eases local runs.
    let authorized = match ctx.owner_id {
        Some(owner) => from_id == Some(owner),
        None => true,
    };

    if !authorized {
        return ctx
            .api
            .send_message(chat_id, "🚫 This command is reserved for the bot owner.")
            .await;
    }

    ctx.api
        .send_message(chat_id, "⏳ Shutting down the bot...")
        .await?;
    tracing::info!(chat_id, ?from_id, "shutdown requested via /stop");
    ctx.cancel.cancel();
    Ok(())
}

fn welcome_text(owner_configured: bool, after_clear: bool) -> String {
    let intro = if after_clear {
        "Display reset. Available commands:\n"
    } else {
        "🤖 Personal financial information assistant (private use)\n\n**Available commands:**\n"
    };

    let mut text = format!(
        "{intro}\
/longterm : ETFs & stocks ranked by long-term potential.\n\
/longtermetf : ETFs ranked by long-term potential.\n\
/longtermact : Stocks ranked by long-term potential.\n\
\n\
/list : Selected watchlists (unsorted).\n\
/detail `<TICKER>` : Detailed info (e.g. `/detail AAPL`).\n\
/officers `<TICKER>` : Company officers (e.g. `/officers MSFT`).\n\
\n\
/info : Subscribe/unsubscribe to periodic updates (12h).\n\
/status : Subscription status.\n\
/ask `<question>` : Ask the AI assistant.\n\
/clear : Reset the display and show this message.\n\
\n\
{SCORE_DISCLAIMER}"
    );

    if owner_configured {
        text.push_str("\n/stop : Stop the bot (owner only).");
    }
    text
}
