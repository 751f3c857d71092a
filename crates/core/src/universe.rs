use crate::domain::item::Category;

/// Static watchlists the ranked reports draw from. US majors, sector funds,
/// and a set of European listings; ranking re-fetches and re-scores them on
/// every request, so the lists themselves carry no data.
pub const ETF_SYMBOLS: &[&str] = &[
    "SPY", "QQQ", "VOO", "VTI", "DIA", "XLK", "XLF", "XLV", "XLE", "XLY", "XLP", "XLU", "XLB",
    "XLI", "XLRE", "VEA", "VWO", "IEUR", "EWJ", "EWG", "EWQ", "AGG", "BND", "GLD", "SLV", "USO",
    "CW8.PA", "EWLD.PA", "C40.PA", "LYXNAS.PA", "BNPPRE.PA", "PME.PA", "ESE.PA", "CE2.PA",
    "EUNK.PA", "AEEM.PA",
];

pub const STOCK_SYMBOLS: &[&str] = &[
    "AAPL", "MSFT", "GOOGL", "AMZN", "NVDA", "TSLA", "META", "AVGO", "CRM", "BRK-B", "JPM", "V",
    "JNJ", "PG", "UNH", "HD", "XOM", "LLY", "MA", "BAC", "CVX", "KO", "PEP", "MC.PA", "OR.PA",
    "TTE.PA", "SAN.PA", "AIR.PA", "RMS.PA", "SAF.PA", "BNP.PA", "KER.PA", "ACA.PA", "DG.PA",
    "SGO.PA", "AI.PA", "EL.PA", "VIE.PA", "GLE.PA", "CAP.PA", "STM.PA", "NESN.SW", "NOVN.SW",
    "ROG.SW", "ASML.AS", "SAP.DE", "SIE.DE", "VOW3.DE", "IBE.MC",
];

pub fn symbols_for(category: Category) -> &'static [&'static str] {
    match category {
        Category::Etf => ETF_SYMBOLS,
        Category::Stock => STOCK_SYMBOLS,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn universes_are_distinct_and_uppercase() {
        for symbol in ETF_SYMBOLS.iter().chain(STOCK_SYMBOLS) {
            assert_eq!(*symbol, symbol.to_uppercase());
        }
        assert!(!ETF_SYMBOLS.iter().any(|s| STOCK_SYMBOLS.contains(s)));
    }
}
