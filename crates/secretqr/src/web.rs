//! HTTP surface for the Composer and Resolver.
//!
//! Routes:
//! - `GET /` and `POST /`: the Composer form and its submission
//! - `GET /get` and `GET /get/`: the Resolver, reading the `id` query parameter
//! - `GET /qrcode.png?id=...`: the padded PNG export as a download

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{Form, RawQuery, State};
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use maud::{html, Markup, PreEscaped, DOCTYPE};
use serde::Deserialize;
use tracing::{error, info};

use crate::config::{Config, QrConfig};
use crate::error::{Error, Result};
use crate::qr::QrImage;
use crate::share::{ShareDomain, ID_PARAM};
use crate::store::MessageStore;
use crate::view::{Composer, Resolver, ViewError, ViewState};

/// State shared by every handler.
#[derive(Debug, Clone)]
pub struct AppState {
    store: Arc<dyn MessageStore>,
    domain: ShareDomain,
    qr: QrConfig,
}

impl AppState {
    /// Bundle the store, share domain, and QR settings.
    #[must_use]
    pub fn new(store: Arc<dyn MessageStore>, domain: ShareDomain, qr: QrConfig) -> Self {
        Self { store, domain, qr }
    }
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(compose_page).post(submit_message))
        .route("/get", get(resolve_page))
        .route("/get/", get(resolve_page))
        .route("/qrcode.png", get(download_qr))
        .with_state(state)
}

/// Bind the configured address and serve until Ctrl-C.
///
/// # Errors
///
/// Returns an error if the address is invalid or cannot be bound.
pub async fn serve(config: &Config, store: Arc<dyn MessageStore>) -> Result<()> {
    let addr: SocketAddr = config.server.bind.parse().map_err(|e| Error::ConfigValidation {
        message: format!("invalid bind address '{}': {e}", config.server.bind),
    })?;

    let (domain, _fetch) = ShareDomain::spawn_fetch(
        store.clone(),
        config.share.domain_key.clone(),
        config.share.fallback_domain.clone(),
    );
    let app = router(AppState::new(store, domain, config.qr.clone()));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "Web server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("Web server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
    }
}

#[derive(Debug, Deserialize)]
struct SubmitForm {
    #[serde(default)]
    message: String,
    /// Present (as `on`) when the "show message" box is ticked.
    #[serde(default)]
    show: Option<String>,
}

/// Internal failures that are not part of a view's normal flow.
struct WebError(Error);

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        error!(error = %self.0, "Request failed");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            render("Error", error_notice("Something went wrong")),
        )
            .into_response()
    }
}

impl From<Error> for WebError {
    fn from(e: Error) -> Self {
        Self(e)
    }
}

fn status_for(err: ViewError) -> StatusCode {
    match err {
        ViewError::EmptyMessage | ViewError::NoMessageId => StatusCode::BAD_REQUEST,
        ViewError::NotFound => StatusCode::NOT_FOUND,
        ViewError::SaveFailed | ViewError::RetrieveFailed => StatusCode::BAD_GATEWAY,
    }
}

async fn compose_page() -> Html<String> {
    render(COMPOSE_TITLE, compose_form("", false))
}

async fn submit_message(
    State(state): State<AppState>,
    Form(form): Form<SubmitForm>,
) -> std::result::Result<Response, WebError> {
    let mut composer = Composer::new(state.store, state.domain, state.qr.clone());
    composer.set_message(form.message);
    if form.show.is_some() {
        composer.toggle_visibility();
    }

    if let Err(err) = composer.submit().await {
        let body = html! {
            (compose_form(composer.message(), composer.is_visible()))
            (error_notice(&err.to_string()))
        };
        return Ok((status_for(err), render(COMPOSE_TITLE, body)).into_response());
    }

    let (Some(id), Some(url), Some(qr)) = (
        composer.message_id(),
        composer.share_url(),
        composer.qr_image()?,
    ) else {
        return Err(Error::internal("submitted message has no share URL").into());
    };

    let body = html! {
        @if let Some(notice) = composer.notice() {
            p.notice { (notice.description) }
        }
        (PreEscaped(qr.to_svg(state.qr.svg_size)))
        p { "Scan this QR code to view the message" }
        p {
            input id="share-url" type="text" readonly value=(url);
            button type="button" onclick=(COPY_SCRIPT) { "Copy link" }
        }
        p { a href=(url) { (url) } }
        p {
            a href={ "/qrcode.png?" (ID_PARAM) "=" (id.as_str()) } download=(state.qr.export_file) {
                "Download QR code"
            }
        }
        p { a href="/" { "Send another message" } }
    };
    Ok(render(COMPOSE_TITLE, body).into_response())
}

async fn resolve_page(State(state): State<AppState>, RawQuery(query): RawQuery) -> Response {
    let mut resolver = Resolver::from_query(query.as_deref().unwrap_or_default());
    match resolver.resolve(state.store.as_ref()).await {
        ViewState::Ready(content) => {
            render("Secret Message", html! { pre.message { (content) } }).into_response()
        }
        ViewState::Failed(err) => {
            let err = *err;
            (status_for(err), render("Error", error_notice(&err.to_string()))).into_response()
        }
        ViewState::Idle | ViewState::Loading => {
            WebError(Error::internal("resolver did not settle")).into_response()
        }
    }
}

async fn download_qr(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> std::result::Result<Response, WebError> {
    let resolver = Resolver::from_query(query.as_deref().unwrap_or_default());
    let Some(id) = resolver.id() else {
        let err = ViewError::NoMessageId;
        return Ok((status_for(err), err.to_string()).into_response());
    };

    let qr = QrImage::encode(&state.domain.url_for(id))?;
    let bytes = qr.png_bytes(state.qr.module_px, state.qr.padding_px)?;
    let disposition = format!("attachment; filename=\"{}\"", state.qr.export_file);

    Ok((
        [
            (header::CONTENT_TYPE, "image/png".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response())
}

const COMPOSE_TITLE: &str = "Secret Message Sharing";

const COPY_SCRIPT: &str = "navigator.clipboard.writeText(document.getElementById('share-url').value)";

fn compose_form(draft: &str, show: bool) -> Markup {
    html! {
        form method="post" action="/" {
            label for="message" { "Your Message" }
            input id="message"
                type=(if show { "text" } else { "password" })
                name="message"
                value=(draft)
                placeholder="Enter your secret message...";
            label {
                input type="checkbox" name="show" checked[show];
                " Show message"
            }
            button type="submit" { "Generate QR Code" }
        }
    }
}

fn error_notice(message: &str) -> Markup {
    html! { p.error { (message) } }
}

fn render(title: &str, body: Markup) -> Html<String> {
    let page = html! {
        (DOCTYPE)
        html {
            head {
                meta charset="utf-8";
                title { (title) }
            }
            body {
                h1 { (title) }
                (body)
            }
        }
    };
    Html(page.into_string())
}
