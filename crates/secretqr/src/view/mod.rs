//! The two user-facing views and the state they share.
//!
//! Both views follow the same lifecycle: they start `Idle` (Composer) or
//! `Loading` (Resolver), issue at most one store request per user action, and
//! settle in `Ready` or `Failed`. Failures carry a [`ViewError`] whose display
//! text is exactly what the user sees.

pub mod composer;
pub mod resolver;

pub use composer::Composer;
pub use resolver::Resolver;

use serde::Serialize;
use thiserror::Error;

/// What a view can tell the user went wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ViewError {
    /// The draft was empty or only whitespace.
    #[error("Please enter a message")]
    EmptyMessage,

    /// The store rejected or failed the insert.
    #[error("Failed to save message")]
    SaveFailed,

    /// The link carried no `id` parameter.
    #[error("No message ID provided")]
    NoMessageId,

    /// The store has no message with that id.
    #[error("Message not found")]
    NotFound,

    /// The store lookup failed.
    #[error("Failed to retrieve message")]
    RetrieveFailed,
}

impl ViewError {
    /// The transient notice shown alongside this error.
    #[must_use]
    pub fn notice(self) -> Notice {
        Notice::error(self.to_string())
    }
}

/// Lifecycle of a single view action.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ViewState<T> {
    /// Nothing requested yet.
    #[default]
    Idle,
    /// A request is in flight.
    Loading,
    /// The request succeeded.
    Ready(T),
    /// The request failed or could not be made.
    Failed(ViewError),
}

impl<T> ViewState<T> {
    /// True once the state can no longer change on its own.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Ready(_) | Self::Failed(_))
    }

    /// True while a request is in flight.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    /// The successful value, if any.
    #[must_use]
    pub fn ready(&self) -> Option<&T> {
        match self {
            Self::Ready(value) => Some(value),
            _ => None,
        }
    }

    /// The error, if the state is `Failed`.
    #[must_use]
    pub fn error(&self) -> Option<ViewError> {
        match self {
            Self::Failed(err) => Some(*err),
            _ => None,
        }
    }
}

/// Severity of a [`Notice`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    /// Something worked.
    Success,
    /// Something failed.
    Error,
}

/// A short-lived message such as a toast or a status line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    /// Severity.
    pub level: NoticeLevel,
    /// Short heading.
    pub title: &'static str,
    /// The message body.
    pub description: String,
}

impl Notice {
    /// A success notice.
    #[must_use]
    pub fn success(description: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            title: "Success",
            description: description.into(),
        }
    }

    /// An error notice.
    #[must_use]
    pub fn error(description: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            title: "Error",
            description: description.into(),
        }
    }

    /// Shown after the share URL is copied.
    #[must_use]
    pub fn copied() -> Self {
        Self {
            level: NoticeLevel::Success,
            title: "Copied!",
            description: "URL copied to clipboard".to_string(),
        }
    }
}

impl std::fmt::Display for Notice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.title, self.description)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_view_error_messages() {
        assert_eq!(ViewError::EmptyMessage.to_string(), "Please enter a message");
        assert_eq!(ViewError::SaveFailed.to_string(), "Failed to save message");
        assert_eq!(ViewError::NoMessageId.to_string(), "No message ID provided");
        assert_eq!(ViewError::NotFound.to_string(), "Message not found");
        assert_eq!(
            ViewError::RetrieveFailed.to_string(),
            "Failed to retrieve message"
        );
    }

    #[test]
    fn test_view_error_notice() {
        let notice = ViewError::SaveFailed.notice();
        assert_eq!(notice.level, NoticeLevel::Error);
        assert_eq!(notice.title, "Error");
        assert_eq!(notice.to_string(), "Error: Failed to save message");
    }

    #[test]
    fn test_view_state_default_is_idle() {
        let state: ViewState<String> = ViewState::default();
        assert_eq!(state, ViewState::Idle);
        assert!(!state.is_terminal());
        assert!(!state.is_loading());
    }

    #[test]
    fn test_view_state_accessors() {
        let ready: ViewState<&str> = ViewState::Ready("hi");
        assert!(ready.is_terminal());
        assert_eq!(ready.ready(), Some(&"hi"));
        assert_eq!(ready.error(), None);

        let failed: ViewState<&str> = ViewState::Failed(ViewError::NotFound);
        assert!(failed.is_terminal());
        assert_eq!(failed.ready(), None);
        assert_eq!(failed.error(), Some(ViewError::NotFound));

        let loading: ViewState<&str> = ViewState::Loading;
        assert!(loading.is_loading());
        assert!(!loading.is_terminal());
    }

    #[test]
    fn test_notice_serializes_level_lowercase() {
        let json = serde_json::to_string(&Notice::success("Message saved successfully")).unwrap();
        assert!(json.contains(r#""level":"success""#));
        assert!(json.contains("Message saved successfully"));
    }

    #[test]
    fn test_copied_notice() {
        assert_eq!(Notice::copied().to_string(), "Copied!: URL copied to clipboard");
    }
}
