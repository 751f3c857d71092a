pub mod detail;

use crate::domain::item::{Category, LongTermScore, ScoreKind, ScoredItem};
use crate::market::provider::MarketDataClient;
use crate::market::types as fields;
use crate::scoring;
use crate::universe;
use anyhow::Result;
use tokio_util::sync::CancellationToken;

// Fetch a few more symbols than requested so that network failures and data
// gaps do not routinely shrink the list below its limit.
const OVERFETCH_FACTOR: f64 = 1.5;

const NO_DATA_PLACEHOLDER: &str = "_No usable data found for the current ranking._";
const FEWER_THAN_REQUESTED_NOTE: &str = "_Fewer items than requested could be ranked._";
const SCORE_DISCLAIMER: &str = "⚠️ _The long-term score is a simplified, experimental heuristic. \
It is NOT financial advice; always do your own research._";

/// One ranked-list request, as issued by a chat command or the periodic job.
#[derive(Debug, Clone, Copy)]
pub struct ReportRequest {
    pub category: ReportCategory,
    pub limit: usize,
    pub sort_by_score: bool,
    pub score_kind: ScoreKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportCategory {
    Etf,
    Stock,
    Both,
}

/// Fetch one ticker and derive its display record.
///
/// Every failure mode collapses into an invalid item: a provider error, a
/// missing price, or a degenerate score. Nothing propagates; the batch loop
/// must survive any single symbol.
pub async fn fetch_scored_item(
    client: &dyn MarketDataClient,
    symbol: &str,
    category: Category,
    score_kind: ScoreKind,
) -> ScoredItem {
    let metrics = match client.fetch_metrics(symbol).await {
        Ok(m) => m,
        Err(err) => {
            tracing::warn!(symbol, error = %err, "metrics fetch failed; item marked unusable");
            return ScoredItem::unavailable(symbol);
        }
    };

    let display_name = metrics
        .text(fields::LONG_NAME)
        .or_else(|| metrics.text(fields::SHORT_NAME))
        .unwrap_or(symbol)
        .to_string();

    let price = metrics
        .number(fields::CURRENT_PRICE)
        .or_else(|| metrics.number(fields::REGULAR_MARKET_PRICE))
        .or_else(|| metrics.number(fields::PREVIOUS_CLOSE));

    let Some(price) = price else {
        return ScoredItem {
            symbol: symbol.to_string(),
            display_line: format!("{display_name} ({symbol}): basic price data missing"),
            display_name,
            price: None,
            currency: None,
            change_abs: None,
            change_pct: None,
            score: LongTermScore::Unscoreable,
        };
    };

    let score = match score_kind {
        ScoreKind::LongTerm => match category {
            Category::Etf => scoring::score_etf(&metrics),
            Category::Stock => scoring::score_stock(&metrics),
        },
    };

    let currency = metrics.text(fields::CURRENCY).map(str::to_string);
    let change_abs = metrics.number(fields::REGULAR_MARKET_CHANGE);
    let change_pct = metrics.number(fields::REGULAR_MARKET_CHANGE_PERCENT);

    let display_line = format_display_line(
        &display_name,
        symbol,
        price,
        currency.as_deref(),
        change_abs,
        change_pct,
    );

    ScoredItem {
        symbol: symbol.to_string(),
        display_name,
        price: Some(price),
        currency,
        change_abs,
        change_pct,
        score,
        display_line,
    }
}

fn format_display_line(
    name: &str,
    symbol: &str,
    price: f64,
    currency: Option<&str>,
    change_abs: Option<f64>,
    change_pct: Option<f64>,
) -> String {
    let currency = currency.unwrap_or("");
    let change = change_abs
        .map(|v| format!("{v:+.2}"))
        .unwrap_or_else(|| "N/A".to_string());
    let pct = change_pct
        .map(|v| format!("{:+.2}%", v * 100.0))
        .unwrap_or_else(|| "N/A".to_string());

    format!("{name} ({symbol}): {price:.2} {currency} ({change} {currency}, {pct})")
}

/// Build the full ranked report for a request.
///
/// Symbols are fetched sequentially; the cancellation token is honored
/// between fetches, never mid-fetch. The only error this returns is
/// cancellation. Per-symbol failures degrade into the placeholder texts.
pub async fn build_report(
    client: &dyn MarketDataClient,
    request: ReportRequest,
    cancel: &CancellationToken,
) -> Result<String> {
    let mut sections = Vec::new();

    if matches!(request.category, ReportCategory::Etf | ReportCategory::Both) {
        let symbols = universe::symbols_for(Category::Etf);
        sections.push(build_section(client, Category::Etf, symbols, &request, cancel).await?);
    }
    if matches!(request.category, ReportCategory::Stock | ReportCategory::Both) {
        let symbols = universe::symbols_for(Category::Stock);
        sections.push(build_section(client, Category::Stock, symbols, &request, cancel).await?);
    }

    let mut out = sections.join("\n\n");
    if request.sort_by_score {
        out.push_str("\n\n");
        out.push_str(SCORE_DISCLAIMER);
    }
    Ok(out)
}

async fn build_section(
    client: &dyn MarketDataClient,
    category: Category,
    symbols: &[&str],
    request: &ReportRequest,
    cancel: &CancellationToken,
) -> Result<String> {
    let fetch_count = ((request.limit as f64) * OVERFETCH_FACTOR).ceil() as usize;

    let mut items = Vec::with_capacity(fetch_count);
    for symbol in symbols.iter().take(fetch_count) {
        anyhow::ensure!(!cancel.is_cancelled(), "report generation cancelled");
        items.push(fetch_scored_item(client, symbol, category, request.score_kind).await);
    }

    let mut valid: Vec<ScoredItem> = items.into_iter().filter(|i| i.is_valid()).collect();

    if request.sort_by_score {
        // Vec::sort_by is stable: tied scores keep their fetch order, which
        // keeps the output deterministic.
        valid.sort_by(|a, b| {
            let a = a.score.value().unwrap_or(f64::NEG_INFINITY);
            let b = b.score.value().unwrap_or(f64::NEG_INFINITY);
            b.partial_cmp(&a).unwrap_or(std::cmp::Ordering::Equal)
        });
    }

    let shown = valid.len().min(request.limit);
    let mut lines = Vec::with_capacity(shown + 3);
    lines.push(title_for(category, request));

    for item in &valid[..shown] {
        let mut line = item.display_line.clone();
        if request.sort_by_score {
            if let Some(score) = item.score.value() {
                line.push_str(&format!(" (LT score: {score:.1})"));
            }
        }
        lines.push(line);
    }

    if shown == 0 {
        lines.push(NO_DATA_PLACEHOLDER.to_string());
    } else if valid.len() < request.limit {
        lines.push(String::new());
        lines.push(FEWER_THAN_REQUESTED_NOTE.to_string());
    }

    Ok(lines.join("\n"))
}

fn title_for(category: Category, request: &ReportRequest) -> String {
    let (emoji, label) = match category {
        Category::Etf => ("📈", "ETFs"),
        Category::Stock => ("📊", "Stocks"),
    };

    if request.sort_by_score {
        match request.score_kind {
            ScoreKind::LongTerm => {
                format!("{emoji} **{label} by long-term potential (score desc.):**")
            }
        }
    } else {
        format!("{emoji} **Selected {label}:**")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::types::MetricsBag;
    use serde_json::{json, Value};
    use std::collections::BTreeMap;

    struct StubMarket {
        responses: BTreeMap<String, Value>,
    }

    impl StubMarket {
        fn new(entries: &[(&str, Value)]) -> Self {
            let responses = entries
                .iter()
                .map(|(symbol, v)| (symbol.to_string(), v.clone()))
                .collect();
            Self { responses }
        }

        fn empty() -> Self {
            Self {
                responses: BTreeMap::new(),
            }
        }
    }

    #[async_trait::async_trait]
    impl MarketDataClient for StubMarket {
        fn provider_name(&self) -> &'static str {
            "stub"
        }

        async fn fetch_metrics(&self, symbol: &str) -> Result<MetricsBag> {
            match self.responses.get(symbol) {
                Some(v) => Ok(serde_json::from_value(v.clone())?),
                None => anyhow::bail!("unknown symbol {symbol}"),
            }
        }
    }

    // ETF bag scoring exactly 8.0: max return term (6.0) plus a mid-range
    // expense ratio (2.0).
    fn etf_bag_8(price: f64) -> Value {
        json!({
            "long_name": "Fund Eight",
            "currency": "USD",
            "current_price": price,
            "five_year_average_return": 0.20,
            "expense_ratio": 0.00425,
        })
    }

    // ETF bag scoring exactly 6.0: max return term, fees too high to score.
    fn etf_bag_6(price: f64) -> Value {
        json!({
            "long_name": "Fund Six",
            "currency": "USD",
            "current_price": price,
            "five_year_average_return": 0.20,
            "expense_ratio": 0.02,
        })
    }

    fn sorted_request(limit: usize) -> ReportRequest {
        ReportRequest {
            category: ReportCategory::Etf,
            limit,
            sort_by_score: true,
            score_kind: ScoreKind::LongTerm,
        }
    }

    #[tokio::test]
    async fn fetch_failure_becomes_invalid_item() {
        let item =
            fetch_scored_item(&StubMarket::empty(), "SPY", Category::Etf, ScoreKind::LongTerm)
                .await;

        assert!(!item.is_valid());
        assert_eq!(item.display_line, "SPY: data unavailable");
    }

    #[tokio::test]
    async fn missing_price_skips_scoring() {
        let stub = StubMarket::new(&[(
            "SPY",
            json!({"long_name": "SPDR S&P 500", "five_year_average_return": 0.2}),
        )]);

        let item = fetch_scored_item(&stub, "SPY", Category::Etf, ScoreKind::LongTerm).await;
        assert!(!item.is_valid());
        assert_eq!(item.score, LongTermScore::Unscoreable);
        assert!(item.display_line.contains("price data missing"));
    }

    #[tokio::test]
    async fn display_line_prefers_long_name_and_formats_changes() {
        let stub = StubMarket::new(&[(
            "AAPL",
            json!({
                "long_name": "Apple Inc.",
                "short_name": "Apple",
                "currency": "USD",
                "current_price": 190.5,
                "regular_market_change": -1.25,
                "regular_market_change_percent": -0.0065,
            }),
        )]);

        let item = fetch_scored_item(&stub, "AAPL", Category::Stock, ScoreKind::LongTerm).await;
        assert_eq!(
            item.display_line,
            "Apple Inc. (AAPL): 190.50 USD (-1.25 USD, -0.65%)"
        );
    }

    #[tokio::test]
    async fn display_line_defaults_absent_fields_to_na() {
        let stub = StubMarket::new(&[(
            "GLD",
            json!({"short_name": "Gold Trust", "previous_close": 180.0}),
        )]);

        let item = fetch_scored_item(&stub, "GLD", Category::Etf, ScoreKind::LongTerm).await;
        assert_eq!(item.display_line, "Gold Trust (GLD): 180.00  (N/A , N/A)");
    }

    #[tokio::test]
    async fn ranked_section_sorts_filters_and_truncates() {
        // A scores 8.0, C scores 6.0; B has metrics but no usable price and
        // must be excluded even though it was fetched between them.
        let stub = StubMarket::new(&[
            ("A", etf_bag_8(100.0)),
            ("B", json!({"five_year_average_return": 0.2, "expense_ratio": 0.002})),
            ("C", etf_bag_6(100.0)),
        ]);
        let cancel = CancellationToken::new();

        let section = build_section(
            &stub,
            Category::Etf,
            &["C", "B", "A"],
            &sorted_request(2),
            &cancel,
        )
        .await
        .unwrap();

        let lines: Vec<&str> = section.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].starts_with("Fund Eight (A):"));
        assert!(lines[1].ends_with("(LT score: 8.0)"));
        assert!(lines[2].starts_with("Fund Six (C):"));
        assert!(!section.contains('B'));
    }

    #[tokio::test]
    async fn tied_scores_keep_fetch_order() {
        let stub = StubMarket::new(&[
            ("T1", etf_bag_6(10.0)),
            ("T2", etf_bag_8(10.0)),
            ("T3", etf_bag_6(10.0)),
        ]);
        let cancel = CancellationToken::new();

        let section = build_section(
            &stub,
            Category::Etf,
            &["T1", "T2", "T3"],
            &sorted_request(3),
            &cancel,
        )
        .await
        .unwrap();

        let lines: Vec<&str> = section.lines().collect();
        assert!(lines[1].contains("(T2)"));
        // T1 and T3 tie at 6.0 and must stay in fetch order.
        assert!(lines[2].contains("(T1)"));
        assert!(lines[3].contains("(T3)"));
    }

    #[tokio::test]
    async fn unsorted_section_preserves_symbol_order_without_scores() {
        let stub = StubMarket::new(&[("T1", etf_bag_6(10.0)), ("T2", etf_bag_8(10.0))]);
        let cancel = CancellationToken::new();
        let request = ReportRequest {
            category: ReportCategory::Etf,
            limit: 2,
            sort_by_score: false,
            score_kind: ScoreKind::LongTerm,
        };

        let section = build_section(&stub, Category::Etf, &["T1", "T2"], &request, &cancel)
            .await
            .unwrap();

        let lines: Vec<&str> = section.lines().collect();
        assert_eq!(lines[0], "📈 **Selected ETFs:**");
        assert!(lines[1].contains("(T1)"));
        assert!(lines[2].contains("(T2)"));
        assert!(!section.contains("LT score"));
    }

    #[tokio::test]
    async fn fewer_valid_items_than_limit_appends_note() {
        let stub = StubMarket::new(&[("T1", etf_bag_6(10.0)), ("T2", etf_bag_8(10.0))]);
        let cancel = CancellationToken::new();

        let section = build_section(
            &stub,
            Category::Etf,
            &["T1", "T2", "MISSING1", "MISSING2", "MISSING3"],
            &sorted_request(5),
            &cancel,
        )
        .await
        .unwrap();

        assert!(section.contains("(T1)"));
        assert!(section.contains("(T2)"));
        assert!(section.ends_with(FEWER_THAN_REQUESTED_NOTE));
    }

    #[tokio::test]
    async fn all_fetches_failing_yields_placeholder() {
        let cancel = CancellationToken::new();

        let section = build_section(
            &StubMarket::empty(),
            Category::Etf,
            &["X", "Y", "Z"],
            &sorted_request(2),
            &cancel,
        )
        .await
        .unwrap();

        let lines: Vec<&str> = section.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1], NO_DATA_PLACEHOLDER);
    }

    #[tokio::test]
    async fn overfetch_rounds_up() {
        // limit 7 -> ceil(10.5) = 11 fetch attempts at most.
        let request = sorted_request(7);
        let fetch_count = ((request.limit as f64) * OVERFETCH_FACTOR).ceil() as usize;
        assert_eq!(fetch_count, 11);
    }

    #[tokio::test]
    async fn build_report_joins_sections_and_appends_disclaimer() {
        let cancel = CancellationToken::new();
        let request = ReportRequest {
            category: ReportCategory::Both,
            limit: 2,
            sort_by_score: true,
            score_kind: ScoreKind::LongTerm,
        };

        let report = build_report(&StubMarket::empty(), request, &cancel)
            .await
            .unwrap();

        assert!(report.contains("📈"));
        assert!(report.contains("📊"));
        assert!(report.contains("\n\n"));
        assert!(report.ends_with(SCORE_DISCLAIMER));
    }

    #[tokio::test]
    async fn cancellation_aborts_between_fetches() {
        let cancel = CancellationToken::new();
        cancel.cancel();

        let res = build_report(&StubMarket::empty(), sorted_request(2), &cancel).await;
        assert!(res.is_err());
    }
}
