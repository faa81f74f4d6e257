//! End-to-end Send → link → Get flows against the local store.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use secretqr::config::{QrConfig, DEFAULT_FALLBACK_DOMAIN};
use secretqr::{
    extract_message_id, Composer, Error, Message, MessageId, MessageStore, Resolver, Result,
    ShareDomain, SqliteStore, ViewError, ViewState,
};

/// Wraps a store and counts every call that reaches it.
#[derive(Debug)]
struct Counted<S> {
    inner: S,
    calls: AtomicUsize,
}

impl<S> Counted<S> {
    fn new(inner: S) -> Self {
        Self {
            inner,
            calls: AtomicUsize::new(0),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl<S: MessageStore> MessageStore for Counted<S> {
    fn backend_name(&self) -> &'static str {
        self.inner.backend_name()
    }

    async fn insert_message(&self, content: &str) -> Result<Message> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.insert_message(content).await
    }

    async fn find_message(&self, id: &MessageId) -> Result<Option<Message>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.find_message(id).await
    }

    async fn find_config(&self, key: &str) -> Result<Option<String>> {
        self.inner.find_config(key).await
    }
}

#[derive(Debug)]
struct Offline;

#[async_trait]
impl MessageStore for Offline {
    fn backend_name(&self) -> &'static str {
        "offline"
    }

    async fn insert_message(&self, _content: &str) -> Result<Message> {
        Err(Error::invalid_response("offline"))
    }

    async fn find_message(&self, _id: &MessageId) -> Result<Option<Message>> {
        Err(Error::invalid_response("offline"))
    }

    async fn find_config(&self, _key: &str) -> Result<Option<String>> {
        Err(Error::invalid_response("offline"))
    }
}

async fn send(store: Arc<dyn MessageStore>, text: &str) -> (MessageId, String) {
    let (domain, fetch) = ShareDomain::spawn_fetch(store.clone(), "domain", DEFAULT_FALLBACK_DOMAIN);
    fetch.await.unwrap();

    let mut composer = Composer::new(store, domain, QrConfig::default());
    composer.set_message(text);
    let id = composer.submit().await.unwrap();
    let url = composer.share_url().unwrap();
    (id, url)
}

#[tokio::test]
async fn test_meet_at_seven_round_trip() {
    let store: Arc<dyn MessageStore> = Arc::new(SqliteStore::open_in_memory().unwrap());

    let (id, url) = send(store.clone(), "meet at 7pm").await;
    assert_eq!(url, format!("https://qr.julianschwab.dev/get/?id={id}"));

    let mut resolver = Resolver::from_link(&url);
    resolver.resolve(store.as_ref()).await;
    assert_eq!(resolver.content(), Some("meet at 7pm"));
}

#[tokio::test]
async fn test_multiline_content_is_preserved() {
    let store: Arc<dyn MessageStore> = Arc::new(SqliteStore::open_in_memory().unwrap());
    let text = "line 1\n  line 2\n\n\tline 4 \n";

    let (_, url) = send(store.clone(), text).await;

    let mut resolver = Resolver::from_link(&url);
    resolver.resolve(store.as_ref()).await;
    assert_eq!(resolver.content(), Some(text));
}

#[tokio::test]
async fn test_configured_domain_is_used_in_links() {
    let sqlite = SqliteStore::open_in_memory().unwrap();
    sqlite
        .storage()
        .unwrap()
        .set_config("domain", "secrets.example.net")
        .unwrap();
    let store: Arc<dyn MessageStore> = Arc::new(sqlite);

    let (id, url) = send(store, "hello").await;

    assert_eq!(url, format!("https://secrets.example.net/get/?id={id}"));
}

#[tokio::test]
async fn test_unreachable_config_falls_back() {
    let (domain, fetch) =
        ShareDomain::spawn_fetch(Arc::new(Offline), "domain", DEFAULT_FALLBACK_DOMAIN);
    fetch.await.unwrap();

    let id = MessageId::parse("abc123").unwrap();
    assert_eq!(
        domain.url_for(&id),
        "https://qr.julianschwab.dev/get/?id=abc123"
    );
}

#[tokio::test]
async fn test_blank_message_never_reaches_store() {
    let store = Arc::new(Counted::new(SqliteStore::open_in_memory().unwrap()));
    let mut composer = Composer::new(
        store.clone(),
        ShareDomain::fixed(DEFAULT_FALLBACK_DOMAIN),
        QrConfig::default(),
    );

    composer.set_message(" \n\t ");
    assert_eq!(composer.submit().await, Err(ViewError::EmptyMessage));
    assert_eq!(store.calls(), 0);
    assert_eq!(store.inner.storage().unwrap().count().unwrap(), 0);
}

#[tokio::test]
async fn test_get_without_id_skips_store() {
    let store = Counted::new(SqliteStore::open_in_memory().unwrap());

    let mut resolver = Resolver::from_link("https://qr.julianschwab.dev/get");
    resolver.resolve(&store).await;

    assert_eq!(
        resolver.state(),
        &ViewState::Failed(ViewError::NoMessageId)
    );
    assert_eq!(
        resolver.state().error().map(|e| e.to_string()).as_deref(),
        Some("No message ID provided")
    );
    assert_eq!(store.calls(), 0);
}

#[tokio::test]
async fn test_unknown_id_is_not_found() {
    let store = SqliteStore::open_in_memory().unwrap();
    store.storage().unwrap().insert_message("someone else's").unwrap();

    let mut resolver = Resolver::from_link("/get/?id=00000000-0000-0000-0000-000000000000");
    resolver.resolve(&store).await;

    assert_eq!(resolver.state(), &ViewState::Failed(ViewError::NotFound));
    assert_eq!(resolver.content(), None);
}

#[tokio::test]
async fn test_qr_points_at_share_url() {
    let store: Arc<dyn MessageStore> = Arc::new(SqliteStore::open_in_memory().unwrap());
    let mut composer = Composer::new(
        store,
        ShareDomain::fixed(DEFAULT_FALLBACK_DOMAIN),
        QrConfig::default(),
    );
    composer.set_message("meet at 7pm");
    let id = composer.submit().await.unwrap();

    let qr = composer.qr_image().unwrap().unwrap();
    assert_eq!(extract_message_id(qr.data()), Some(id));

    let png = composer.export_png_bytes().unwrap().unwrap();
    let exported = image::load_from_memory(&png).unwrap().to_rgb8();
    let raw = qr.to_raster(QrConfig::default().module_px).unwrap();
    assert!(exported.width() > raw.width());
    assert!(exported.height() > raw.height());
    assert_eq!(*exported.get_pixel(0, 0), image::Rgb([255, 255, 255]));
    let (w, h) = exported.dimensions();
    assert_eq!(*exported.get_pixel(w - 1, h - 1), image::Rgb([255, 255, 255]));
}
