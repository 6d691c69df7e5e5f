//! Error types for mailer configuration and delivery.

use std::path::PathBuf;

use thiserror::Error;

/// Errors returned by [`Mailer`](crate::Mailer) operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid mailer configuration: an empty profile list, a profile
    /// mapping with a missing or malformed key, or sending before any
    /// transport was selected.
    #[error("invalid mailer configuration: {0}")]
    Config(String),

    /// A sender or recipient address could not be parsed into a mailbox.
    #[error("invalid email address: {0}")]
    Address(String),

    /// The draft could not be assembled into a deliverable message.
    #[error("failed to build message: {0}")]
    Build(String),

    /// An attachment could not be read from disk at send time.
    #[error("failed to read attachment {path}: {source}")]
    Attachment {
        /// Path of the attachment that failed to load.
        path: PathBuf,
        /// Underlying filesystem error.
        source: std::io::Error,
    },

    /// The transport rejected or failed to deliver the message. The
    /// transport's original message text is preserved.
    #[error("mail sending failed: {0}")]
    Send(String),
}
