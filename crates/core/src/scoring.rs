//! Long-term potential heuristics.
//!
//! Each scorer combines a handful of normalized metrics into a weighted
//! composite in [0, 10]. The heuristics are deliberately simple; they rank
//! instruments for a personal watchlist and are not investment advice.

use crate::domain::item::LongTermScore;
use crate::market::types::{self as fields, MetricsBag};

const STOCK_WEIGHT_PROFIT_MARGIN: f64 = 0.25;
const STOCK_WEIGHT_REVENUE_GROWTH: f64 = 0.15;
const STOCK_WEIGHT_RETURN_ON_EQUITY: f64 = 0.20;
const STOCK_WEIGHT_FORWARD_PE: f64 = 0.20;
const STOCK_WEIGHT_DEBT_TO_EQUITY: f64 = 0.10;
const STOCK_WEIGHT_DIVIDEND: f64 = 0.10;

const ETF_WEIGHT_AVG_RETURN: f64 = 0.6;
const ETF_WEIGHT_EXPENSE_RATIO: f64 = 0.4;

// Sub-score granted when a fund does not report fees at all. Funds that
// simply omit the field should not score as badly as funds with high fees.
const ETF_MISSING_EXPENSE_CREDIT: f64 = 2.0;

/// Map a raw metric onto a [0, 10] desirability scale given a "good range".
///
/// Values beyond the favorable bound saturate at 10, values beyond the
/// unfavorable bound at 0, with linear interpolation in between. A missing
/// or non-finite value contributes nothing. `low` and `high` are distinct
/// caller-supplied constants, so the interpolation never divides by zero.
pub fn normalize(value: Option<f64>, low: f64, high: f64, lower_is_better: bool) -> f64 {
    let Some(v) = value else {
        return 0.0;
    };
    if !v.is_finite() {
        return 0.0;
    }

    if lower_is_better {
        if v <= low {
            return 10.0;
        }
        if v >= high {
            return 0.0;
        }
        10.0 * (high - v) / (high - low)
    } else {
        if v >= high {
            return 10.0;
        }
        if v <= low {
            return 0.0;
        }
        10.0 * (v - low) / (high - low)
    }
}

/// Composite long-term score for a single-name equity.
pub fn score_stock(metrics: &MetricsBag) -> LongTermScore {
    let mut score = 0.0;

    score += STOCK_WEIGHT_PROFIT_MARGIN * normalize(metrics.number(fields::PROFIT_MARGIN), 0.05, 0.25, false);
    score += STOCK_WEIGHT_REVENUE_GROWTH * normalize(metrics.number(fields::REVENUE_GROWTH), 0.03, 0.20, false);
    score += STOCK_WEIGHT_RETURN_ON_EQUITY * normalize(metrics.number(fields::RETURN_ON_EQUITY), 0.10, 0.30, false);

    // A P/E under 5 is usually a data artifact or a value trap; clamp it up
    // before normalizing so it cannot read as an exceptional bargain.
    let forward_pe = metrics.number(fields::FORWARD_PE).map(|v| v.max(5.0));
    score += STOCK_WEIGHT_FORWARD_PE * normalize(forward_pe, 10.0, 35.0, true);

    // Leverage counts only when reported; absence is not treated as a penalty.
    if let Some(dte) = metrics.number(fields::DEBT_TO_EQUITY) {
        score += STOCK_WEIGHT_DEBT_TO_EQUITY * normalize(Some(dte), 0.1, 1.5, true);
    }

    // The dividend term requires an actual payout and a sustainable payout
    // ratio; otherwise it contributes nothing at all.
    if let (Some(dividend_yield), Some(payout_ratio)) = (
        metrics.number(fields::DIVIDEND_YIELD),
        metrics.number(fields::PAYOUT_RATIO),
    ) {
        if dividend_yield > 0.0 && payout_ratio > 0.0 && payout_ratio < 0.75 {
            score += STOCK_WEIGHT_DIVIDEND * normalize(Some(dividend_yield), 0.01, 0.05, false);
        }
    }

    finalize(score)
}

/// Composite long-term score for a fund.
pub fn score_etf(metrics: &MetricsBag) -> LongTermScore {
    let mut score = 0.0;

    let avg_return = metrics
        .number(fields::FIVE_YEAR_AVERAGE_RETURN)
        .or_else(|| metrics.number(fields::THREE_YEAR_AVERAGE_RETURN));
    score += ETF_WEIGHT_AVG_RETURN * normalize(avg_return, 0.03, 0.15, false);

    match metrics.number(fields::EXPENSE_RATIO) {
        Some(expense_ratio) => {
            score += ETF_WEIGHT_EXPENSE_RATIO * normalize(Some(expense_ratio), 0.001, 0.0075, true);
        }
        None => score += ETF_WEIGHT_EXPENSE_RATIO * ETF_MISSING_EXPENSE_CREDIT,
    }

    finalize(score)
}

fn finalize(score: f64) -> LongTermScore {
    if score.is_finite() {
        LongTermScore::Scored((score * 100.0).round() / 100.0)
    } else {
        LongTermScore::Unscoreable
    }
}
