//! The Send view: write a message, store it, share the link.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};

use super::{Notice, ViewError, ViewState};
use crate::clipboard::ClipboardSink;
use crate::config::QrConfig;
use crate::error::Result;
use crate::message::MessageId;
use crate::qr::QrImage;
use crate::share::ShareDomain;
use crate::store::MessageStore;

/// Character shown in place of each hidden draft character.
const MASK_CHAR: char = '•';

/// Composer state for one session.
///
/// The draft is kept across failed submissions so the user can try again.
/// Only a successful insert produces a message id, and the id always comes
/// from the store.
#[derive(Debug)]
pub struct Composer {
    store: Arc<dyn MessageStore>,
    domain: ShareDomain,
    qr: QrConfig,
    message: String,
    visible: bool,
    state: ViewState<MessageId>,
    notice: Option<Notice>,
}

impl Composer {
    /// Create an empty composer.
    #[must_use]
    pub fn new(store: Arc<dyn MessageStore>, domain: ShareDomain, qr: QrConfig) -> Self {
        Self {
            store,
            domain,
            qr,
            message: String::new(),
            visible: false,
            state: ViewState::Idle,
            notice: None,
        }
    }

    /// The raw draft.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Replace the draft.
    pub fn set_message(&mut self, text: impl Into<String>) {
        self.message = text.into();
    }

    /// Flip between masked and plain display. Returns the new visibility.
    pub fn toggle_visibility(&mut self) -> bool {
        self.visible = !self.visible;
        self.visible
    }

    /// Whether the draft is shown in plain text.
    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// The draft as it should be displayed: verbatim when visible, one mask
    /// character per character otherwise.
    #[must_use]
    pub fn display_text(&self) -> String {
        if self.visible {
            self.message.clone()
        } else {
            std::iter::repeat(MASK_CHAR)
                .take(self.message.chars().count())
                .collect()
        }
    }

    /// Current submission state.
    #[must_use]
    pub fn state(&self) -> &ViewState<MessageId> {
        &self.state
    }

    /// The most recent notice, if any.
    #[must_use]
    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    /// Id of the stored message, once a submission has succeeded.
    #[must_use]
    pub fn message_id(&self) -> Option<&MessageId> {
        self.state.ready()
    }

    /// Store the draft.
    ///
    /// A blank draft is rejected without touching the store and without
    /// changing the current state. Otherwise exactly one insert is issued
    /// with the draft as typed.
    ///
    /// # Errors
    ///
    /// Returns [`ViewError::EmptyMessage`] for a blank draft and
    /// [`ViewError::SaveFailed`] when the store fails.
    pub async fn submit(&mut self) -> std::result::Result<MessageId, ViewError> {
        if self.message.trim().is_empty() {
            debug!("Rejected empty message");
            self.notice = Some(ViewError::EmptyMessage.notice());
            return Err(ViewError::EmptyMessage);
        }

        self.state = ViewState::Loading;
        match self.store.insert_message(&self.message).await {
            Ok(message) => {
                info!(
                    id = %message.id,
                    len = message.content_len(),
                    backend = self.store.backend_name(),
                    "Message saved"
                );
                self.state = ViewState::Ready(message.id.clone());
                self.notice = Some(Notice::success("Message saved successfully"));
                Ok(message.id)
            }
            Err(e) => {
                warn!(error = %e, backend = self.store.backend_name(), "Failed to save message");
                self.state = ViewState::Failed(ViewError::SaveFailed);
                self.notice = Some(ViewError::SaveFailed.notice());
                Err(ViewError::SaveFailed)
            }
        }
    }

    /// The share URL for the stored message, built with whatever domain is
    /// current right now.
    #[must_use]
    pub fn share_url(&self) -> Option<String> {
        self.message_id().map(|id| self.domain.url_for(id))
    }

    /// The QR code for the share URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL cannot be encoded.
    pub fn qr_image(&self) -> Result<Option<QrImage>> {
        self.share_url()
            .map(|url| QrImage::encode(&url))
            .transpose()
    }

    /// Copy the share URL to `clipboard`. Returns the copied URL, or `None`
    /// if there is nothing to copy yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the clipboard rejects the text.
    pub fn copy_url(&mut self, clipboard: &dyn ClipboardSink) -> Result<Option<String>> {
        let Some(url) = self.share_url() else {
            return Ok(None);
        };
        clipboard.set_text(&url)?;
        self.notice = Some(Notice::copied());
        Ok(Some(url))
    }

    /// The padded PNG export of the QR code.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding or rasterization fails.
    pub fn export_png_bytes(&self) -> Result<Option<Vec<u8>>> {
        self.qr_image()?
            .map(|qr| qr.png_bytes(self.qr.module_px, self.qr.padding_px))
            .transpose()
    }

    /// Write the padded PNG export to `path`, or to the configured export file
    /// name in the current directory. Returns the path written.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding, rasterization, or writing fails.
    pub fn export_png(&self, path: Option<&Path>) -> Result<Option<PathBuf>> {
        let Some(qr) = self.qr_image()? else {
            return Ok(None);
        };
        let path = path.map_or_else(|| PathBuf::from(&self.qr.export_file), Path::to_path_buf);
        qr.write_png(&path, self.qr.module_px, self.qr.padding_px)?;
        info!(path = %path.display(), "Exported QR code");
        Ok(Some(path))
    }
}
