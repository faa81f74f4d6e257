//! Share links: building them, reading ids back out of them, and tracking the
//! domain they point at.
//!
//! A share URL always has the form `https://{domain}/get/?id={id}`. The domain
//! comes from the store's `domain` config entry when that lookup succeeds and
//! from the configured fallback otherwise.

use std::sync::Arc;

use reqwest::Url;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::is_valid_hostname;
use crate::message::MessageId;
use crate::store::MessageStore;

/// Name of the query parameter carrying the message id.
pub const ID_PARAM: &str = "id";

/// Base used to resolve relative links such as `/get?id=...` or `?id=...`.
const RELATIVE_BASE: &str = "http://localhost/";

/// Build the share URL for `id` under `domain`.
#[must_use]
pub fn share_url(domain: &str, id: &MessageId) -> String {
    format!("https://{domain}/get/?{ID_PARAM}={id}")
}

/// Extract the message id from a share link.
///
/// Accepts a full URL, a path with a query (`/get?id=abc`), or a bare query
/// string (`?id=abc` or `id=abc`). Returns `None` when there is no `id`
/// parameter or it is blank.
#[must_use]
pub fn extract_message_id(link: &str) -> Option<MessageId> {
    let link = link.trim();
    if link.is_empty() {
        return None;
    }

    let url = match Url::parse(link) {
        Ok(url) => url,
        Err(_) => {
            let base = Url::parse(RELATIVE_BASE).ok()?;
            let relative = if link.starts_with('/') || link.starts_with('?') || link.contains('?') {
                link.to_string()
            } else {
                format!("?{link}")
            };
            base.join(&relative).ok()?
        }
    };

    url.query_pairs()
        .find(|(key, _)| key == ID_PARAM)
        .and_then(|(_, value)| MessageId::parse(&value))
}

/// The domain embedded in share URLs.
///
/// Starts at the fallback and may be replaced once, when the background
/// config lookup succeeds. Readers never wait: they see whatever value is
/// current at the moment they ask.
#[derive(Debug, Clone)]
pub struct ShareDomain {
    current: watch::Receiver<String>,
}

impl ShareDomain {
    /// A domain that never changes.
    #[must_use]
    pub fn fixed(domain: impl Into<String>) -> Self {
        let (_tx, rx) = watch::channel(domain.into());
        Self { current: rx }
    }

    /// Start with `fallback` and look up `key` in the store in the background.
    ///
    /// The lookup is best-effort: a missing entry, a blank or malformed value,
    /// or a store error leaves the fallback in place and is only logged.
    #[must_use]
    pub fn spawn_fetch(
        store: Arc<dyn MessageStore>,
        key: impl Into<String>,
        fallback: impl Into<String>,
    ) -> (Self, JoinHandle<()>) {
        let key = key.into();
        let (tx, rx) = watch::channel(fallback.into());

        let handle = tokio::spawn(async move {
            match store.find_config(&key).await {
                Ok(Some(value)) => {
                    let value = value.trim().to_string();
                    if is_valid_hostname(&value) {
                        info!(domain = %value, "Using share domain from store");
                        // No receivers left means the view is gone; nothing to update.
                        let _ = tx.send(value);
                    } else {
                        warn!(key = %key, value = %value, "Ignoring malformed share domain");
                    }
                }
                Ok(None) => {
                    debug!(key = %key, "No share domain configured in store; keeping fallback");
                }
                Err(e) => {
                    warn!(key = %key, error = %e, "Error fetching share domain; keeping fallback");
                }
            }
        });

        (Self { current: rx }, handle)
    }

    /// The domain to use right now.
    #[must_use]
    pub fn current(&self) -> String {
        self.current.borrow().clone()
    }

    /// Build the share URL for `id` with the current domain.
    #[must_use]
    pub fn url_for(&self, id: &MessageId) -> String {
        share_url(&self.current(), id)
    }
}
