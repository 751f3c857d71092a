/// Instrument category a fetch or ranking targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Etf,
    Stock,
}

/// Which composite score to compute. Only the long-term heuristic exists
/// today; the enum keeps room for alternatives without touching callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScoreKind {
    #[default]
    LongTerm,
}

/// Outcome of a composite score computation.
///
/// `Unscoreable` marks items the scorer could not evaluate at all (no usable
/// data, degenerate arithmetic). It is distinct from a legitimately low
/// `Scored` value so that a failed computation can never outrank, or be
/// mistaken for, a real result.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LongTermScore {
    Scored(f64),
    Unscoreable,
}

impl LongTermScore {
    pub fn value(&self) -> Option<f64> {
        match self {
            LongTermScore::Scored(v) => Some(*v),
            LongTermScore::Unscoreable => None,
        }
    }

    pub fn is_scored(&self) -> bool {
        matches!(self, LongTermScore::Scored(_))
    }
}

/// Per-ticker record derived from one provider fetch. Built fresh per
/// request; never cached or mutated afterwards.
#[derive(Debug, Clone)]
pub struct ScoredItem {
    pub symbol: String,
    pub display_name: String,
    pub price: Option<f64>,
    pub currency: Option<String>,
    pub change_abs: Option<f64>,
    pub change_pct: Option<f64>,
    pub score: LongTermScore,
    pub display_line: String,
}

impl ScoredItem {
    /// Only valid items may appear in a ranked list or count toward its limit.
    pub fn is_valid(&self) -> bool {
        self.score.is_scored() && self.price.is_some()
    }

    /// Placeholder record for a symbol whose fetch failed outright.
    pub fn unavailable(symbol: &str) -> Self {
        Self {
            symbol: symbol.to_string(),
            display_name: symbol.to_string(),
            price: None,
            currency: None,
            change_abs: None,
            change_pct: None,
            score: LongTermScore::Unscoreable,
            display_line: format!("{symbol}: data unavailable"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unscoreable_item_is_never_valid() {
        let item = ScoredItem::unavailable("SPY");
        assert!(!item.is_valid());
        assert_eq!(item.score.value(), None);
    }

    #[test]
    fn scored_item_without_price_is_invalid() {
        let mut item = ScoredItem::unavailable("SPY");
        item.score = LongTermScore::Scored(7.5);
        assert!(!item.is_valid());

        item.price = Some(412.0);
        assert!(item.is_valid());
    }
}
