//! Alert delivery.
//!
//! A [`Notifier`] sends one text message. [`Alerts`] sits in front of it,
//! drops blacklisted messages and makes sure a delivery failure never
//! reaches the scan loop.

use async_trait::async_trait;
use eyre::Result;
use log::{debug, info, warn};

use crate::arb::opportunity::Opportunity;

/// HTML alert rendering
pub mod format;
/// Telegram Bot API notifier
pub mod telegram;

pub use telegram::TelegramNotifier;

/// A channel that can deliver one text message.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Sends `text`.
    ///
    /// # Errors
    /// * If the message could not be delivered
    async fn send(&self, text: &str) -> Result<()>;
}

/// Writes alerts to the log. Used when no alert channel is configured.
#[derive(Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, text: &str) -> Result<()> {
        info!("notify::log: {}", text.replace('\n', " | "));
        Ok(())
    }
}

/// Blacklist gate and error sink in front of a [`Notifier`].
pub struct Alerts {
    /// Delivery channel
    notifier: Box<dyn Notifier>,
    /// Upper-cased terms that suppress a message
    blacklist: Vec<String>,
}

impl Alerts {
    /// Creates a dispatcher.
    ///
    /// # Arguments
    /// * `notifier` - Delivery channel
    /// * `blacklist` - Terms matched case-insensitively against the route and the text
    pub fn new<I, S>(notifier: Box<dyn Notifier>, blacklist: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            notifier,
            blacklist: blacklist
                .into_iter()
                .map(|term| term.as_ref().trim().to_uppercase())
                .filter(|term| !term.is_empty())
                .collect(),
        }
    }

    /// Whether an alert for `opportunity` with body `text` must be dropped
    #[must_use]
    pub fn is_suppressed(&self, opportunity: &Opportunity, text: &str) -> bool {
        let upper = text.to_uppercase();
        self.blacklist
            .iter()
            .any(|term| opportunity.touches(term) || upper.contains(term.as_str()))
    }

    /// Renders and sends an alert for `opportunity`.
    ///
    /// # Returns
    /// `true` if the message was delivered
    pub async fn opportunity(&self, opportunity: &Opportunity) -> bool {
        let text = format::opportunity(opportunity, chrono::Local::now());
        if self.is_suppressed(opportunity, &text) {
            debug!("notify: suppressed alert for {}", opportunity.route);
            return false;
        }
        self.deliver(&text).await
    }

    /// Sends `text` as-is, bypassing the blacklist.
    ///
    /// # Returns
    /// `true` if the message was delivered
    pub async fn raw(&self, text: &str) -> bool {
        self.deliver(text).await
    }

    /// Sends and swallows the failure
    async fn deliver(&self, text: &str) -> bool {
        match self.notifier.send(text).await {
            Ok(()) => true,
            Err(e) => {
                warn!("notify: delivery failed: {e:#}");
                false
            }
        }
    }
}
