//! Process-wide configuration.
//!
//! Read once at startup from the environment (after `.env` is loaded) and
//! never mutated afterwards. Any missing or invalid value is a
//! [`ConfigError`], which aborts the process before the first scan cycle.

use std::fmt::{self, Debug, Display};
use std::str::FromStr;
use std::time::Duration;

use url::Url;

use crate::arb::types::Currency;
use crate::error::ConfigError;

/// Settlement currencies
const DEFAULT_SETTLEMENTS: &[&str] = &["USDT"];
/// Fiat-pegged currencies
const DEFAULT_STABLES: &[&str] = &["USDT", "USDC", "DAI", "USDE", "USDR", "TUSD", "BUSD"];
/// Majors
const DEFAULT_ANCHORS: &[&str] = &["BTC", "ETH", "BNB", "SOL"];
/// Alerts mentioning these are dropped
const DEFAULT_BLACKLIST: &[&str] = &["DAI"];
/// Bybit production API
const DEFAULT_EXCHANGE_URL: &str = "https://api.bybit.com";

/// Exchange account credentials. Opaque to the scanner.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// API key
    pub api_key: String,
    /// API secret
    pub secret: String,
}

impl Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &self.api_key)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Telegram Bot API destination for alerts
#[derive(Clone, PartialEq, Eq)]
pub struct TelegramSettings {
    /// Bot token
    pub token: String,
    /// Target chat id
    pub chat_id: String,
}

impl Debug for TelegramSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramSettings")
            .field("token", &"<redacted>")
            .field("chat_id", &self.chat_id)
            .finish()
    }
}

/// Scanner configuration.
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    /// Amount of settlement currency spent on the first leg (`T`)
    pub trade_notional: f64,
    /// Taker fee rate applied to every leg's output
    pub fee: f64,
    /// Lower bound of the minimum top-of-book liquidity
    pub min_liquidity: f64,
    /// Upper bound of the minimum top-of-book liquidity
    pub max_liquidity: f64,
    /// Return percentage needed for acceptance
    pub min_profit_pct: f64,
    /// Returns above this are treated as bad data
    pub max_profit_pct: Option<f64>,
    /// `K`: final amounts above `K × T` are implausible
    pub sanity_multiplier: f64,
    /// Level prices above this are corrupt
    pub price_ceiling: f64,
    /// Routes evaluated per cycle
    pub route_cap: usize,
    /// Routes evaluated concurrently
    pub workers: usize,
    /// Minimum spacing between two book requests
    pub request_delay: Duration,
    /// Provider request timeout
    pub request_timeout: Duration,
    /// Pause between cycles
    pub cycle_cooldown: Duration,
    /// Age after which the pair listing and routes are rebuilt
    pub refresh_interval: Duration,
    /// Opportunities shown in the report
    pub top_n: usize,
    /// Levels requested per book side
    pub book_depth: usize,
    /// Currencies routes start and end in
    pub settlement_currencies: Vec<Currency>,
    /// Symbols classified as stable
    pub stable_symbols: Vec<Currency>,
    /// Symbols classified as anchor
    pub anchor_symbols: Vec<Currency>,
    /// Terms that suppress an alert
    pub alert_blacklist: Vec<String>,
    /// Market data API root
    pub exchange_url: Url,
    /// Exchange credentials
    pub credentials: Option<Credentials>,
    /// Alert channel
    pub telegram: Option<TelegramSettings>,
}

impl Default for Config {
    fn default() -> Self {
        let list = |items: &[&str]| -> Vec<String> { items.iter().map(|s| (*s).to_string()).collect() };
        Self {
            trade_notional: 100.0,
            fee: 0.001,
            min_liquidity: 100.0,
            max_liquidity: 500_000.0,
            min_profit_pct: 0.5,
            max_profit_pct: None,
            sanity_multiplier: 10.0,
            price_ceiling: 1_000_000.0,
            route_cap: 300,
            workers: 4,
            request_delay: Duration::from_millis(100),
            request_timeout: Duration::from_secs(15),
            cycle_cooldown: Duration::from_secs(10),
            refresh_interval: Duration::from_secs(3600),
            top_n: 10,
            book_depth: 50,
            settlement_currencies: list(DEFAULT_SETTLEMENTS),
            stable_symbols: list(DEFAULT_STABLES),
            anchor_symbols: list(DEFAULT_ANCHORS),
            alert_blacklist: list(DEFAULT_BLACKLIST),
            exchange_url: default_exchange_url(),
            credentials: None,
            telegram: None,
        }
    }
}

/// The default API root
#[allow(clippy::expect_used)]
fn default_exchange_url() -> Url {
    Url::parse(DEFAULT_EXCHANGE_URL).expect("default exchange URL is valid")
}

impl Config {
    /// Loads the configuration from the process environment.
    ///
    /// A `.env` file in the working directory is read first if present.
    ///
    /// # Errors
    /// * If any variable fails to parse or validate
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads the configuration through `lookup`, falling back to defaults.
    ///
    /// # Errors
    /// * If any variable fails to parse or validate
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let vars = Vars { lookup };
        let d = Self::default();

        let exchange_url = match vars.raw("EXCHANGE_URL") {
            Some(raw) => Url::parse(&raw).map_err(|e| invalid("EXCHANGE_URL", e))?,
            None => d.exchange_url,
        };

        let config = Self {
            trade_notional: vars.parse("TRADE_NOTIONAL", d.trade_notional)?,
            fee: vars.parse("FEE", d.fee)?,
            min_liquidity: vars.parse("MIN_LIQUIDITY", d.min_liquidity)?,
            max_liquidity: vars.parse("MAX_LIQUIDITY", d.max_liquidity)?,
            min_profit_pct: vars.parse("MIN_PROFIT_PCT", d.min_profit_pct)?,
            max_profit_pct: vars.optional("MAX_PROFIT_PCT")?,
            sanity_multiplier: vars.parse("SANITY_MULTIPLIER", d.sanity_multiplier)?,
            price_ceiling: vars.parse("PRICE_CEILING", d.price_ceiling)?,
            route_cap: vars.parse("ROUTE_CAP", d.route_cap)?,
            workers: vars.parse("WORKERS", d.workers)?,
            request_delay: Duration::from_millis(vars.parse("REQUEST_DELAY_MS", 100)?),
            request_timeout: Duration::from_secs(vars.parse("REQUEST_TIMEOUT_SECS", 15)?),
            cycle_cooldown: Duration::from_secs(vars.parse("CYCLE_COOLDOWN_SECS", 10)?),
            refresh_interval: Duration::from_secs(vars.parse("REFRESH_INTERVAL_SECS", 3600)?),
            top_n: vars.parse("TOP_N", d.top_n)?,
            book_depth: vars.parse("BOOK_DEPTH", d.book_depth)?,
            settlement_currencies: vars.list("SETTLEMENT_CURRENCIES", d.settlement_currencies),
            stable_symbols: vars.list("STABLE_SYMBOLS", d.stable_symbols),
            anchor_symbols: vars.list("ANCHOR_SYMBOLS", d.anchor_symbols),
            alert_blacklist: vars.list("ALERT_BLACKLIST", d.alert_blacklist),
            exchange_url,
            credentials: vars
                .both("API_KEY", "SECRET")?
                .map(|(api_key, secret)| Credentials { api_key, secret }),
            telegram: vars
                .both("TELEGRAM_TOKEN", "CHAT_ID")?
                .map(|(token, chat_id)| TelegramSettings { token, chat_id }),
        };

        config.validate()?;
        Ok(config)
    }

    /// Checks cross-field invariants.
    ///
    /// # Errors
    /// Returns the first violated rule as [`ConfigError::Invalid`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        let floats = [
            ("TRADE_NOTIONAL", self.trade_notional),
            ("FEE", self.fee),
            ("MIN_LIQUIDITY", self.min_liquidity),
            ("MAX_LIQUIDITY", self.max_liquidity),
            ("MIN_PROFIT_PCT", self.min_profit_pct),
            ("SANITY_MULTIPLIER", self.sanity_multiplier),
            ("PRICE_CEILING", self.price_ceiling),
        ];
        for (key, value) in floats {
            ensure(value.is_finite(), key, "must be a finite number")?;
        }

        ensure(self.trade_notional > 0.0, "TRADE_NOTIONAL", "must be positive")?;
        ensure(
            (0.0..1.0).contains(&self.fee),
            "FEE",
            "must be in [0, 1)",
        )?;
        ensure(self.min_liquidity > 0.0, "MIN_LIQUIDITY", "must be positive")?;
        ensure(
            self.min_liquidity <= self.max_liquidity,
            "MAX_LIQUIDITY",
            "must not be below MIN_LIQUIDITY",
        )?;
        if let Some(max) = self.max_profit_pct {
            ensure(
                max.is_finite() && max >= self.min_profit_pct,
                "MAX_PROFIT_PCT",
                "must be finite and not below MIN_PROFIT_PCT",
            )?;
        }
        ensure(self.sanity_multiplier > 0.0, "SANITY_MULTIPLIER", "must be positive")?;
        ensure(self.price_ceiling > 0.0, "PRICE_CEILING", "must be positive")?;
        ensure(self.route_cap >= 1, "ROUTE_CAP", "must be at least 1")?;
        ensure(self.workers >= 1, "WORKERS", "must be at least 1")?;
        ensure(self.top_n >= 1, "TOP_N", "must be at least 1")?;
        ensure(self.book_depth >= 1, "BOOK_DEPTH", "must be at least 1")?;
        ensure(
            !self.settlement_currencies.is_empty(),
            "SETTLEMENT_CURRENCIES",
            "must name at least one currency",
        )?;
        Ok(())
    }
}

/// Environment accessor with typed parsing
struct Vars<F> {
    /// Variable source
    lookup: F,
}

impl<F: Fn(&str) -> Option<String>> Vars<F> {
    /// Trimmed value; blank counts as unset
    fn raw(&self, key: &str) -> Option<String> {
        (self.lookup)(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    /// Parsed value or `default` when unset
    fn parse<T>(&self, key: &'static str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: Display,
    {
        Ok(self.optional(key)?.unwrap_or(default))
    }

    /// Parsed value or `None` when unset
    fn optional<T>(&self, key: &'static str) -> Result<Option<T>, ConfigError>
    where
        T: FromStr,
        T::Err: Display,
    {
        self.raw(key)
            .map(|raw| raw.parse::<T>().map_err(|e| invalid(key, e)))
            .transpose()
    }

    /// Comma-separated, upper-cased list or `default` when unset
    fn list(&self, key: &str, default: Vec<String>) -> Vec<String> {
        self.raw(key).map_or(default, |raw| {
            raw.split(',')
                .map(|item| item.trim().to_uppercase())
                .filter(|item| !item.is_empty())
                .collect()
        })
    }

    /// Two variables that must be set together
    fn both(
        &self,
        first: &'static str,
        second: &'static str,
    ) -> Result<Option<(String, String)>, ConfigError> {
        match (self.raw(first), self.raw(second)) {
            (Some(a), Some(b)) => Ok(Some((a, b))),
            (None, None) => Ok(None),
            (Some(_), None) => Err(ConfigError::Missing { key: second }),
            (None, Some(_)) => Err(ConfigError::Missing { key: first }),
        }
    }
}

/// Builds an `Invalid` error from any displayable cause
fn invalid(key: &'static str, reason: impl Display) -> ConfigError {
    ConfigError::Invalid {
        key,
        reason: reason.to_string(),
    }
}

/// `Ok` if `condition` holds, otherwise `Invalid { key, reason }`
fn ensure(condition: bool, key: &'static str, reason: &str) -> Result<(), ConfigError> {
    if condition {
        Ok(())
    } else {
        Err(invalid(key, reason))
    }
}
