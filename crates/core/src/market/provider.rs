use crate::config::Settings;
use crate::market::types::MetricsBag;
use anyhow::{Context, Result};
use reqwest::header::{HeaderMap, HeaderValue};
use std::time::Duration;

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_PATH: &str = "/v1/quote";
const DEFAULT_RETRIES: u32 = 2;

#[async_trait::async_trait]
pub trait MarketDataClient: Send + Sync {
    fn provider_name(&self) -> &'static str;

    /// Fetch the raw metrics bag for one ticker. May fail for any reason
    /// (network, unknown symbol, malformed payload); callers treat every
    /// failure as "no data".
    async fn fetch_metrics(&self, symbol: &str) -> Result<MetricsBag>;
}

#[derive(Debug, Clone)]
pub struct HttpJsonMarketData {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    path: String,
    retries: u32,
}

impl HttpJsonMarketData {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let base_url = settings.require_market_data_base_url()?.to_string();
        let api_key = settings.market_data_api_key.clone();

        let timeout_secs = std::env::var("MARKET_DATA_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        let retries = std::env::var("MARKET_DATA_RETRIES")
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(DEFAULT_RETRIES);

        let path = std::env::var("MARKET_DATA_QUOTE_PATH")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_PATH.to_string());

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("failed to build market data http client")?;

        Ok(Self {
            http,
            base_url,
            api_key,
            path,
            retries,
        })
    }

    fn url(&self) -> String {
        let path = if self.path.starts_with('/') {
            self.path.clone()
        } else {
            format!("/{}", self.path)
        };

        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        if let Some(api_key) = &self.api_key {
            headers.insert("x-api-key", HeaderValue::from_str(api_key)?);
        }
        Ok(headers)
    }

    async fn fetch_once(&self, symbol: &str) -> Result<MetricsBag> {
        let url = self.url();
        let headers = self.headers()?;

        let res = self
            .http
            .get(url)
            .headers(headers)
            .query(&[("symbol", symbol)])
            .send()
            .await
            .context("market data request failed")?;

        let status = res.status();
        let text = res
            .text()
            .await
            .context("failed to read market data response")?;

        if !status.is_success() {
            anyhow::bail!("market data HTTP {status} for {symbol}: {text}");
        }

        let bag = serde_json::from_str::<MetricsBag>(&text)
            .with_context(|| format!("market data response is not a JSON object: {text}"))?;

        anyhow::ensure!(!bag.is_empty(), "provider returned no fields for {symbol}");
        Ok(bag)
    }
}

#[async_trait::async_trait]
impl MarketDataClient for HttpJsonMarketData {
    fn provider_name(&self) -> &'static str {
        "external_http_json"
    }

    async fn fetch_metrics(&self, symbol: &str) -> Result<MetricsBag> {
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            match self.fetch_once(symbol).await {
                Ok(bag) => return Ok(bag),
                Err(err) => {
                    if attempt >= self.retries {
                        return Err(err);
                    }
                    let backoff = Duration::from_secs(1 << (attempt - 1));
                    tracing::warn!(symbol, attempt, ?backoff, error = %err, "market data fetch failed; retrying");
                    tokio::time::sleep(backoff).await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::types;
    use serde_json::json;

    #[test]
    fn parses_expected_quote_shape() {
        let v = json!({
            "long_name": "SPDR S&P 500 ETF Trust",
            "currency": "USD",
            "current_price": 512.34,
            "five_year_average_return": 0.11,
            "expense_ratio": 0.000945,
        });

        let bag: MetricsBag = serde_json::from_value(v).unwrap();
        assert_eq!(bag.text(types::LONG_NAME), Some("SPDR S&P 500 ETF Trust"));
        assert_eq!(bag.number(types::CURRENT_PRICE), Some(512.34));
        assert_eq!(bag.number(types::EXPENSE_RATIO), Some(0.000945));
    }

    #[test]
    fn rejects_non_object_payload_via_deserialize() {
        let res = serde_json::from_value::<MetricsBag>(json!([1, 2, 3]));
        assert!(res.is_err());
    }
}
