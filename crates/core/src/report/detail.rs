use crate::market::provider::MarketDataClient;
use crate::market::types as fields;

const SUMMARY_MAX_CHARS: usize = 1000;

/// Detailed per-ticker view for the `/detail` command. All failure modes
/// collapse into a plain-text notice; this never errors out to the caller.
pub async fn build_detail(client: &dyn MarketDataClient, symbol: &str) -> String {
    let metrics = match client.fetch_metrics(symbol).await {
        Ok(m) => m,
        Err(err) => {
            tracing::warn!(symbol, error = %err, "detail fetch failed");
            return format!("No data for {symbol} (unknown or delisted?).");
        }
    };

    let name = metrics
        .text(fields::SHORT_NAME)
        .or_else(|| metrics.text(fields::LONG_NAME))
        .unwrap_or(symbol);
    let currency = metrics.text(fields::CURRENCY).unwrap_or("");

    let price = metrics
        .number(fields::CURRENT_PRICE)
        .or_else(|| metrics.number(fields::REGULAR_MARKET_PRICE))
        .or_else(|| metrics.number(fields::PREVIOUS_CLOSE));

    let mut out = format!("🔍 **Details for {name} ({symbol})**\n");

    if let Some(long_name) = metrics.text(fields::LONG_NAME) {
        out.push_str(&format!("_Name_: {long_name}\n"));
    }
    if let Some(price) = price {
        out.push_str(&format!("_Price_: {price:.2} {currency}\n"));
    }
    if let Some(prev) = metrics.number(fields::PREVIOUS_CLOSE) {
        out.push_str(&format!("_Previous close_: {prev:.2} {currency}\n"));
    }
    if let (Some(change), Some(pct)) = (
        metrics.number(fields::REGULAR_MARKET_CHANGE),
        metrics.number(fields::REGULAR_MARKET_CHANGE_PERCENT),
    ) {
        out.push_str(&format!(
            "_Change_: {change:+.2} {currency} ({:+.2}%)\n",
            pct * 100.0
        ));
    }
    if let Some(cap) = metrics.number(fields::MARKET_CAP) {
        out.push_str(&format!("_Market cap_: {}\n", group_thousands(cap)));
    }
    if let Some(sector) = metrics.text(fields::SECTOR) {
        out.push_str(&format!("_Sector_: {sector}\n"));
    }
    if let Some(industry) = metrics.text(fields::INDUSTRY) {
        out.push_str(&format!("_Industry_: {industry}\n"));
    }
    if let Some(pe) = metrics.number(fields::TRAILING_PE) {
        out.push_str(&format!("_P/E (TTM)_: {pe}\n"));
    }
    if let Some(pe) = metrics.number(fields::FORWARD_PE) {
        out.push_str(&format!("_P/E (fwd)_: {pe}\n"));
    }
    if let Some(dividend_yield) = metrics.number(fields::DIVIDEND_YIELD) {
        out.push_str(&format!("_Dividend yield_: {:.2}%\n", dividend_yield * 100.0));
    }
    if let Some(website) = metrics.text(fields::WEBSITE) {
        out.push_str(&format!("_Website_: {website}\n"));
    }

    if let Some(summary) = metrics.text(fields::BUSINESS_SUMMARY) {
        out.push_str("\n**Business summary:**\n");
        out.push_str(&truncate_chars(summary, SUMMARY_MAX_CHARS));
    }

    out
}

/// Company officers view for the `/officers` command.
pub async fn build_officers(client: &dyn MarketDataClient, symbol: &str) -> String {
    let metrics = match client.fetch_metrics(symbol).await {
        Ok(m) => m,
        Err(err) => {
            tracing::warn!(symbol, error = %err, "officers fetch failed");
            return format!("No data for {symbol} (unknown or delisted?).");
        }
    };

    let name = metrics
        .text(fields::SHORT_NAME)
        .or_else(|| metrics.text(fields::LONG_NAME))
        .unwrap_or(symbol);

    let Some(officers) = metrics.array(fields::COMPANY_OFFICERS) else {
        return format!("No officer information for {name}.");
    };

    let lines: Vec<String> = officers
        .iter()
        .filter_map(|officer| {
            let officer_name = officer.get("name").and_then(|v| v.as_str())?;
            let title = officer.get("title").and_then(|v| v.as_str())?;
            Some(format!("- {officer_name} ({title})"))
        })
        .collect();

    if lines.is_empty() {
        return format!("No detailed officer information for {name}.");
    }

    format!("🧑‍💼 **Officers of {name}:**\n{}", lines.join("\n"))
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max_chars).collect();
    out.push_str("...");
    out
}

fn group_thousands(value: f64) -> String {
    let negative = value < 0.0;
    let digits = format!("{:.0}", value.abs());

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    if negative {
        format!("-{grouped}")
    } else {
        grouped
    }
}
