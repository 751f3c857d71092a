use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://api.telegram.org";
const POLL_TIMEOUT_SECS: u64 = 20;

// Hard cap on a single sendMessage payload; longer texts are chunked.
pub const MESSAGE_LIMIT: usize = 4096;

/// Minimal Telegram Bot API client: long-polling for updates, sending
/// messages and chat actions. Only the handful of fields the bot reads are
/// modeled; everything else in the payloads is ignored.
#[derive(Debug, Clone)]
pub struct TelegramApi {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

/// Failure reported by the Bot API itself (`ok: false`), kept structured so
/// callers can react to specific codes (a 403 means the chat blocked us).
#[derive(Debug, Clone)]
pub struct TelegramApiError {
    pub method: &'static str,
    pub error_code: Option<i64>,
    pub description: String,
}

impl fmt::Display for TelegramApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "telegram {} failed (code={:?}): {}",
            self.method, self.error_code, self.description
        )
    }
}

impl std::error::Error for TelegramApiError {}

impl TelegramApiError {
    pub fn is_blocked_by_chat(&self) -> bool {
        self.error_code == Some(403)
    }
}

#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
struct ApiResponse<T> {
    ok: bool,
    #[serde(default)]
    result: Option<T>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    error_code: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<Message>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub chat: Chat,
    #[serde(default)]
    pub from: Option<User>,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: i64,
}

#[derive(Debug, Serialize)]
struct SendMessagePayload<'a> {
    chat_id: i64,
    text: &'a str,
    parse_mode: &'static str,
    disable_notification: bool,
}

impl TelegramApi {
    pub fn new(token: &str) -> Result<Self> {
        let base_url =
            std::env::var("TELEGRAM_API_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());

        // The client timeout must outlast the long-poll window.
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(POLL_TIMEOUT_SECS + 10))
            .build()
            .context("failed to build telegram http client")?;

        Ok(Self {
            http,
            base_url,
            token: token.to_string(),
        })
    }

    fn url(&self, method: &str) -> String {
        format!(
            "{}/bot{}/{method}",
            self.base_url.trim_end_matches('/'),
            self.token
        )
    }

    /// Long-poll for updates past `offset`. Blocks up to the poll window on
    /// the Telegram side when there is nothing to deliver.
    pub async fn get_updates(&self, offset: i64) -> Result<Vec<Update>> {
        let res = self
            .http
            .get(self.url("getUpdates"))
            .query(&[
                ("offset", offset.to_string()),
                ("timeout", POLL_TIMEOUT_SECS.to_string()),
            ])
            .send()
            .await
            .context("getUpdates request failed")?;

        decode(res, "getUpdates").await
    }

    /// Send Markdown text to a chat, transparently splitting anything longer
    /// than the per-message cap.
    pub async fn send_message(&self, chat_id: i64, text: &str) -> Result<()> {
        for chunk in chunk_text(text, MESSAGE_LIMIT) {
            self.send_chunk(chat_id, &chunk, false).await?;
        }
        Ok(())
    }

    /// Like `send_message`, without a notification on the receiving side.
    pub async fn send_silent_message(&self, chat_id: i64, text: &str) -> Result<()> {
        for chunk in chunk_text(text, MESSAGE_LIMIT) {
            self.send_chunk(chat_id, &chunk, true).await?;
        }
        Ok(())
    }

    async fn send_chunk(&self, chat_id: i64, text: &str, silent: bool) -> Result<()> {
        let payload = SendMessagePayload {
            chat_id,
            text,
            parse_mode: "Markdown",
            disable_notification: silent,
        };

        let res = self
            .http
            .post(self.url("sendMessage"))
            .json(&payload)
            .send()
            .await
            .context("sendMessage request failed")?;

        let _: Message = decode(res, "sendMessage").await?;
        Ok(())
    }

    /// Show "typing..." in the chat while a slow operation runs. Failures are
    /// cosmetic and swallowed.
    pub async fn send_typing(&self, chat_id: i64) {
        let res = self
            .http
            .post(self.url("sendChatAction"))
            .json(&serde_json::json!({"chat_id": chat_id, "action": "typing"}))
            .send()
            .await;

        if let Err(err) = res {
            tracing::debug!(chat_id, error = %err, "sendChatAction failed");
        }
    }
}

async fn decode<T: DeserializeOwned>(res: reqwest::Response, method: &'static str) -> Result<T> {
    let status = res.status();
    let text = res
        .text()
        .await
        .with_context(|| format!("failed to read telegram {method} response"))?;

    let parsed: ApiResponse<T> = serde_json::from_str(&text)
        .with_context(|| format!("telegram {method} response is not valid JSON: {text}"))?;

    if !parsed.ok {
        return Err(TelegramApiError {
            method,
            error_code: parsed.error_code.or(Some(status.as_u16() as i64)),
            description: parsed
                .description
                .unwrap_or_else(|| "no description".to_string()),
        }
        .into());
    }

    parsed
        .result
        .with_context(|| format!("telegram {method} response carried no result"))
}

/// Split text into chunks of at most `limit` characters, preferring to break
/// after a newline so list items stay intact.
pub fn chunk_text(text: &str, limit: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= limit {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut start = 0;
    while start < chars.len() {
        let window_end = (start + limit).min(chars.len());
        let mut cut = window_end;
        if window_end < chars.len() {
            if let Some(pos) = chars[start..window_end].iter().rposition(|c| *c == '\n') {
                cut = start + pos + 1;
            }
        }
        chunks.push(chars[start..cut].iter().collect());
        start = cut;
    }
    chunks
}
