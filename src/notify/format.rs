use std::fmt::Write;

use chrono::{DateTime, Local};

use crate::arb::opportunity::Opportunity;
use crate::arb::types::Side;

/// Renders an opportunity as a Telegram HTML message.
///
/// ```text
/// <b>[14:03:27]</b>
/// 🟥 1. BTC/USDT - 10.000000, book: $200
/// 🟢 2. BTC/ETH - 2.000000, book: $100
/// 🟢 3. ETH/USDT - 5.000000, book: $200
///
/// 💰 Profit: <b>1.25 USDT</b>
/// 📈 Spread: <b>1.25%</b>
/// 💧 Liquidity: <b>100 USDT</b>
/// ```
///
/// Buys (ask side) are marked red and sells (bid side) green.
#[must_use]
pub fn opportunity(opp: &Opportunity, now: DateTime<Local>) -> String {
    let quote = opp.route.settlement();
    let mut msg = format!("<b>[{}]</b>\n", now.format("%H:%M:%S"));

    for (i, leg) in opp.legs.iter().enumerate() {
        let marker = match leg.side {
            Side::Ask => "🟥",
            Side::Bid => "🟢",
        };
        // Writing into a String cannot fail
        let _ = writeln!(
            msg,
            "{marker} {}. {} - {:.6}, book: ${}",
            i + 1,
            escape(&leg.pair.to_string()),
            leg.price,
            thousands(leg.liquidity),
        );
    }

    let _ = write!(
        msg,
        "\n💰 Profit: <b>{:.2} {quote}</b>\n📈 Spread: <b>{:.2}%</b>\n💧 Liquidity: <b>{} {quote}</b>",
        opp.profit(),
        opp.profit_pct(),
        thousands(opp.min_liquidity()),
    );
    msg
}

/// Rounds to a whole number and groups digits by thousands (`12,345`)
fn thousands(value: f64) -> String {
    #[allow(clippy::cast_possible_truncation)]
    let rounded = value.round() as i64;
    let digits = rounded.unsigned_abs().to_string();
    let grouped = digits
        .as_bytes()
        .rchunks(3)
        .rev()
        .map(|chunk| String::from_utf8_lossy(chunk).into_owned())
        .collect::<Vec<_>>()
        .join(",");
    if rounded < 0 {
        format!("-{grouped}")
    } else {
        grouped
    }
}

/// Escapes the three characters Telegram's HTML mode reserves
fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
