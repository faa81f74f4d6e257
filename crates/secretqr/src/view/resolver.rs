//! The Get view: turn a share link back into the message.

use tracing::{debug, warn};

use super::{Notice, ViewError, ViewState};
use crate::message::MessageId;
use crate::share::extract_message_id;
use crate::store::MessageStore;

/// Resolver state for one opened link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolver {
    id: Option<MessageId>,
    state: ViewState<String>,
    notice: Option<Notice>,
}

impl Resolver {
    /// Start resolving `id`. Without an id the resolver fails immediately.
    #[must_use]
    pub fn new(id: Option<MessageId>) -> Self {
        let state = if id.is_some() {
            ViewState::Loading
        } else {
            ViewState::Failed(ViewError::NoMessageId)
        };
        Self {
            id,
            state,
            notice: None,
        }
    }

    /// Start resolving the id carried by a share link.
    #[must_use]
    pub fn from_link(link: &str) -> Self {
        Self::new(extract_message_id(link))
    }

    /// Start resolving the id in a query string such as `id=abc123`.
    #[must_use]
    pub fn from_query(query: &str) -> Self {
        let query = query.trim_start_matches('?');
        Self::new(extract_message_id(&format!("?{query}")))
    }

    /// The id being resolved, if the link had one.
    #[must_use]
    pub fn id(&self) -> Option<&MessageId> {
        self.id.as_ref()
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> &ViewState<String> {
        &self.state
    }

    /// The message content, once resolved.
    #[must_use]
    pub fn content(&self) -> Option<&str> {
        self.state.ready().map(String::as_str)
    }

    /// The most recent notice, if any.
    #[must_use]
    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    /// Look the message up. Issues exactly one read the first time it is
    /// called and does nothing once the state is terminal.
    pub async fn resolve(&mut self, store: &dyn MessageStore) -> &ViewState<String> {
        if self.state.is_terminal() {
            return &self.state;
        }
        let Some(id) = self.id.as_ref() else {
            self.state = ViewState::Failed(ViewError::NoMessageId);
            return &self.state;
        };

        self.state = match store.find_message(id).await {
            Ok(Some(message)) => {
                debug!(id = %id, len = message.content_len(), "Message retrieved");
                ViewState::Ready(message.content)
            }
            Ok(None) => {
                debug!(id = %id, "Message not found");
                ViewState::Failed(ViewError::NotFound)
            }
            Err(e) => {
                warn!(id = %id, error = %e, backend = store.backend_name(), "Failed to retrieve message");
                self.notice = Some(ViewError::RetrieveFailed.notice());
                ViewState::Failed(ViewError::RetrieveFailed)
            }
        };
        &self.state
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::error::{Error, Result};
    use crate::message::Message;
    use crate::store::SqliteStore;

    /// Counts lookups and answers with a canned result.
    #[derive(Debug)]
    struct ScriptedStore {
        lookups: AtomicUsize,
        answer: Option<Option<&'static str>>,
    }

    impl ScriptedStore {
        fn answering(content: Option<&'static str>) -> Self {
            Self {
                lookups: AtomicUsize::new(0),
                answer: Some(content),
            }
        }

        fn broken() -> Self {
            Self {
                lookups: AtomicUsize::new(0),
                answer: None,
            }
        }

        fn lookups(&self) -> usize {
            self.lookups.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl MessageStore for ScriptedStore {
        fn backend_name(&self) -> &'static str {
            "scripted"
        }

        async fn insert_message(&self, _content: &str) -> Result<Message> {
            Err(Error::internal("read-only"))
        }

        async fn find_message(&self, id: &MessageId) -> Result<Option<Message>> {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            match self.answer {
                Some(content) => Ok(content.map(|content| Message {
                    id: id.clone(),
                    content: content.to_string(),
                    created_at: None,
                })),
                None => Err(Error::invalid_response("connection reset")),
            }
        }

        async fn find_config(&self, _key: &str) -> Result<Option<String>> {
            Ok(None)
        }
    }

    #[tokio::test]
    async fn test_missing_id_fails_without_lookup() {
        let store = ScriptedStore::answering(Some("never read"));

        for link in ["/get", "/get/", "https://qr.julianschwab.dev/get/", "/get?id="] {
            let mut resolver = Resolver::from_link(link);
            assert_eq!(resolver.state(), &ViewState::Failed(ViewError::NoMessageId));
            resolver.resolve(&store).await;
            assert_eq!(resolver.state(), &ViewState::Failed(ViewError::NoMessageId));
        }

        assert_eq!(store.lookups(), 0);
    }

    #[tokio::test]
    async fn test_found_message() {
        let store = ScriptedStore::answering(Some("meet at 7pm"));
        let mut resolver = Resolver::from_link("https://qr.julianschwab.dev/get/?id=abc123");
        assert!(resolver.state().is_loading());
        assert_eq!(resolver.id().map(MessageId::as_str), Some("abc123"));

        resolver.resolve(&store).await;

        assert_eq!(resolver.content(), Some("meet at 7pm"));
        assert_eq!(store.lookups(), 1);
        assert_eq!(resolver.notice(), None);
    }

    #[tokio::test]
    async fn test_not_found() {
        let store = ScriptedStore::answering(None);
        let mut resolver = Resolver::from_query("id=does-not-exist");

        let state = resolver.resolve(&store).await;

        assert_eq!(state, &ViewState::Failed(ViewError::NotFound));
        assert_eq!(resolver.content(), None);
    }

    #[tokio::test]
    async fn test_store_error() {
        let store = ScriptedStore::broken();
        let mut resolver = Resolver::from_query("?id=abc123");

        resolver.resolve(&store).await;

        assert_eq!(
            resolver.state(),
            &ViewState::Failed(ViewError::RetrieveFailed)
        );
        assert_eq!(
            resolver.notice().map(|n| n.description.as_str()),
            Some("Failed to retrieve message")
        );
    }

    #[tokio::test]
    async fn test_resolve_is_single_shot() {
        let store = ScriptedStore::broken();
        let mut resolver = Resolver::new(MessageId::parse("abc123"));

        resolver.resolve(&store).await;
        resolver.resolve(&store).await;
        resolver.resolve(&store).await;

        assert_eq!(store.lookups(), 1);
    }

    #[tokio::test]
    async fn test_content_preserved_verbatim() {
        let store = SqliteStore::open_in_memory().unwrap();
        let content = "  first line\n\n\tindented\nlast line  \n";
        let message = store.storage().unwrap().insert_message(content).unwrap();

        let mut resolver = Resolver::new(Some(message.id));
        resolver.resolve(&store).await;

        assert_eq!(resolver.content(), Some(content));
    }
}
