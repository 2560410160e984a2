use std::fmt::Write;

use itertools::Itertools;

use super::opportunity::Opportunity;

/// Orders accepted opportunities by return, best first.
///
/// Each opportunity carries the insertion index of its route. Equal returns
/// keep insertion order, so the result does not depend on the order in which
/// concurrent evaluations completed.
///
/// # Arguments
/// * `opportunities` - `(route index, opportunity)` pairs in any order
///
/// # Returns
/// Opportunities sorted by `profit_pct` descending
#[must_use]
pub fn rank(mut opportunities: Vec<(usize, Opportunity)>) -> Vec<Opportunity> {
    opportunities.sort_by(|(ia, a), (ib, b)| {
        b.profit_pct()
            .total_cmp(&a.profit_pct())
            .then_with(|| ia.cmp(ib))
    });
    opportunities.into_iter().map(|(_, opp)| opp).collect()
}

/// Renders the first `top_n` ranked opportunities as a plain-text table.
#[must_use]
pub fn render_top(ranked: &[Opportunity], top_n: usize) -> String {
    if ranked.is_empty() || top_n == 0 {
        return "no opportunities above threshold".to_string();
    }

    let mut out = String::new();
    for (i, opp) in ranked.iter().take(top_n).enumerate() {
        let prices = opp.prices().iter().map(|p| format!("{p:.8}")).join(" / ");
        // Writing into a String cannot fail
        let _ = writeln!(
            out,
            "{:>2}. {}  net {:+.4} {}  spread {:+.4}%  min liq {:.2}  prices {}",
            i + 1,
            opp.route,
            opp.profit(),
            opp.route.settlement(),
            opp.profit_pct(),
            opp.min_liquidity(),
            prices,
        );
    }
    out.truncate(out.trim_end().len());
    out
}
