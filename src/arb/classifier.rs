use std::collections::HashSet;

use derive_more::Display;

/// Role a currency plays in routing.
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq, Hash)]
pub enum CurrencyClass {
    /// Fiat-pegged settlement currency (USDT, USDC, ...)
    #[display("stable")]
    Stable,
    /// Major currency many pairs are quoted in (BTC, ETH, ...)
    #[display("anchor")]
    Anchor,
    /// Everything else
    #[display("alt")]
    Alt,
}

/// Pure lookup from currency symbol to [`CurrencyClass`].
///
/// Built once from configuration. A symbol in both sets is `Stable`.
#[derive(Clone, Debug, Default)]
pub struct Classifier {
    /// Upper-cased stable symbols
    stable: HashSet<String>,
    /// Upper-cased anchor symbols
    anchor: HashSet<String>,
}

impl Classifier {
    /// Creates a classifier from the two configured symbol sets.
    pub fn new<S, A>(stable: S, anchor: A) -> Self
    where
        S: IntoIterator,
        S::Item: AsRef<str>,
        A: IntoIterator,
        A::Item: AsRef<str>,
    {
        let upper = |s: &str| s.trim().to_uppercase();
        Self {
            stable: stable.into_iter().map(|s| upper(s.as_ref())).collect(),
            anchor: anchor.into_iter().map(|s| upper(s.as_ref())).collect(),
        }
    }

    /// Classifies `symbol`. Unknown symbols are `Alt`.
    #[must_use]
    pub fn classify(&self, symbol: &str) -> CurrencyClass {
        let symbol = symbol.trim().to_uppercase();
        if self.stable.contains(&symbol) {
            CurrencyClass::Stable
        } else if self.anchor.contains(&symbol) {
            CurrencyClass::Anchor
        } else {
            CurrencyClass::Alt
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> Classifier {
        Classifier::new(["USDT", "usdc"], ["BTC", "ETH"])
    }

    #[test]
    fn test_classify_known_symbols() {
        let c = classifier();
        assert_eq!(c.classify("USDT"), CurrencyClass::Stable);
        assert_eq!(c.classify("USDC"), CurrencyClass::Stable);
        assert_eq!(c.classify("BTC"), CurrencyClass::Anchor);
        assert_eq!(c.classify("eth"), CurrencyClass::Anchor);
    }

    #[test]
    fn test_classify_unknown_is_alt() {
        let c = classifier();
        assert_eq!(c.classify("PEPE"), CurrencyClass::Alt);
        assert_eq!(c.classify(""), CurrencyClass::Alt);
        assert_eq!(Classifier::default().classify("USDT"), CurrencyClass::Alt);
    }

    #[test]
    fn test_stable_wins_over_anchor() {
        let c = Classifier::new(["DAI"], ["DAI"]);
        assert_eq!(c.classify("DAI"), CurrencyClass::Stable);
    }
}
