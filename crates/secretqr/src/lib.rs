//! `secretqr` - Share secret messages through links and QR codes
//!
//! A message is written in the Composer, stored in a [`store::MessageStore`],
//! and shared as `https://{domain}/get/?id={id}`, both as text and as a QR
//! code. The Resolver reads the id back out of such a link and fetches the
//! message. The same views drive the CLI and the web interface.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod cli;
pub mod clipboard;
pub mod config;
pub mod error;
pub mod logging;
pub mod message;
pub mod qr;
pub mod share;
pub mod store;
pub mod view;
pub mod web;

pub use clipboard::{ClipboardSink, SystemClipboard};
pub use config::Config;
pub use error::{Error, Result};
pub use logging::init_logging;
pub use message::{Message, MessageId};
pub use qr::QrImage;
pub use share::{extract_message_id, share_url, ShareDomain};
pub use store::{MessageStore, SqliteStore, Storage, StorageStats};
pub use view::{Composer, Notice, Resolver, ViewError, ViewState};
