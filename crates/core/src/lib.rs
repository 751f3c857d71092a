pub mod domain;
pub mod llm;
pub mod market;
pub mod report;
pub mod scoring;
pub mod subs;
pub mod universe;

pub mod config {
    use anyhow::Context;

    #[derive(Debug, Clone)]
    pub struct Settings {
        pub telegram_bot_token: Option<String>,
        pub bot_owner_id: Option<i64>,
        pub gemini_api_key: Option<String>,
        pub market_data_base_url: Option<String>,
        pub market_data_api_key: Option<String>,
        pub sentry_dsn: Option<String>,
        pub subscriptions_path: Option<String>,
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            let bot_owner_id = match std::env::var("BOT_OWNER_ID") {
                Ok(s) if !s.trim().is_empty() => Some(
                    s.trim()
                        .parse::<i64>()
                        .context("BOT_OWNER_ID must be an integer user id")?,
                ),
                _ => None,
            };

            Ok(Self {
                telegram_bot_token: std::env::var("TELEGRAM_BOT_TOKEN").ok(),
                bot_owner_id,
                gemini_api_key: std::env::var("GEMINI_API_KEY").ok(),
                market_data_base_url: std::env::var("MARKET_DATA_BASE_URL").ok(),
                market_data_api_key: std::env::var("MARKET_DATA_API_KEY").ok(),
                sentry_dsn: std::env::var("SENTRY_DSN").ok(),
                subscriptions_path: std::env::var("SUBSCRIPTIONS_PATH").ok(),
            })
        }

        pub fn require_telegram_bot_token(&self) -> anyhow::Result<&str> {
            self.telegram_bot_token
                .as_deref()
                .context("TELEGRAM_BOT_TOKEN is required")
        }

        pub fn require_gemini_api_key(&self) -> anyhow::Result<&str> {
            self.gemini_api_key
                .as_deref()
                .context("GEMINI_API_KEY is required")
        }

        pub fn require_market_data_base_url(&self) -> anyhow::Result<&str> {
            self.market_data_base_url
                .as_deref()
                .context("MARKET_DATA_BASE_URL is required")
        }
    }
}
