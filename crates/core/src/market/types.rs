use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

// Field keys of the provider's per-symbol payload. Any of them may be absent
// for any given ticker.
pub const LONG_NAME: &str = "long_name";
pub const SHORT_NAME: &str = "short_name";
pub const CURRENCY: &str = "currency";
pub const CURRENT_PRICE: &str = "current_price";
pub const REGULAR_MARKET_PRICE: &str = "regular_market_price";
pub const PREVIOUS_CLOSE: &str = "previous_close";
pub const REGULAR_MARKET_CHANGE: &str = "regular_market_change";
pub const REGULAR_MARKET_CHANGE_PERCENT: &str = "regular_market_change_percent";

pub const PROFIT_MARGIN: &str = "profit_margin";
pub const REVENUE_GROWTH: &str = "revenue_growth";
pub const RETURN_ON_EQUITY: &str = "return_on_equity";
pub const FORWARD_PE: &str = "forward_pe";
pub const DEBT_TO_EQUITY: &str = "debt_to_equity";
pub const DIVIDEND_YIELD: &str = "dividend_yield";
pub const PAYOUT_RATIO: &str = "payout_ratio";

pub const FIVE_YEAR_AVERAGE_RETURN: &str = "five_year_average_return";
pub const THREE_YEAR_AVERAGE_RETURN: &str = "three_year_average_return";
pub const EXPENSE_RATIO: &str = "expense_ratio";

pub const MARKET_CAP: &str = "market_cap";
pub const SECTOR: &str = "sector";
pub const INDUSTRY: &str = "industry";
pub const TRAILING_PE: &str = "trailing_pe";
pub const DAY_HIGH: &str = "day_high";
pub const DAY_LOW: &str = "day_low";
pub const FIFTY_TWO_WEEK_HIGH: &str = "fifty_two_week_high";
pub const FIFTY_TWO_WEEK_LOW: &str = "fifty_two_week_low";
pub const VOLUME: &str = "volume";
pub const AVERAGE_VOLUME: &str = "average_volume";
pub const BETA: &str = "beta";
pub const WEBSITE: &str = "website";
pub const BUSINESS_SUMMARY: &str = "business_summary";
pub const COMPANY_OFFICERS: &str = "company_officers";

/// Bag of named metric fields for one ticker, exactly as returned by the
/// data provider. Values stay raw JSON; the typed accessors below are the
/// only sanctioned way to read them, so presence/fallback handling does not
/// leak into the scoring code.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetricsBag(BTreeMap<String, Value>);

impl MetricsBag {
    pub fn number(&self, key: &str) -> Option<f64> {
        self.0.get(key).and_then(Value::as_f64)
    }

    pub fn text(&self, key: &str) -> Option<&str> {
        self.0
            .get(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    pub fn array(&self, key: &str) -> Option<&[Value]> {
        self.0.get(key).and_then(Value::as_array).map(Vec::as_slice)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
