//! # Rotmail
//! Rotating SMTP mailer built on [lettre](https://lettre.rs), validating a set of credential profiles, picking one at random per send, and exposing a fluent message-building API via [`Mailer`] and [`Profile`].
//!
//! ## Audience and uses
//! For Rust developers who send notification or transactional mail through several SMTP accounts and want per-send load spreading without per-account plumbing: load the profiles ([`Profile`]), call [`Mailer::randomize_smtp`] to adopt one at random, fill in the message with the chained setters, then deliver with [`Mailer::send`].
//!
//! ## Runtime requirements
//! Synchronous and blocking; no async runtime is needed. Delivery uses lettre's blocking `SmtpTransport`, so [`Mailer::send`] holds the calling thread until the relay accepts or rejects the message.
//!
//! ## Out of scope
//! Not an SMTP implementation, queue, or campaign manager. Protocol framing, MIME encoding, TLS, and timeouts belong to lettre; there is no retry, no fallback to another profile on failure, and no internal locking for concurrent use.
//!
//! ## Errors
//! Construction problems (an empty profile list, missing keys in a JSON profile set) surface as [`Error::Config`]; delivery failures are wrapped as [`Error::Send`] with the transport's message text preserved. Address parsing, message assembly, and attachment reads report [`Error::Address`], [`Error::Build`], and [`Error::Attachment`]. The crate-wide [`Result`] alias wraps these errors.
//!
//! ## Example
//! ```no_run
//! use rotmail::Mailer;
//!
//! fn main() -> Result<(), rotmail::Error> {
//!     let mut mailer = Mailer::from_json(
//!         r#"[{
//!             "host": "smtp.example.com",
//!             "username": "user1@example.com",
//!             "password": "password1",
//!             "encryption": "tls",
//!             "port": 587,
//!             "from": ["noreply@example.com", "Example Support"]
//!         }]"#,
//!     )?;
//!
//!     mailer
//!         .randomize_smtp(0)
//!         .add_recipient("user@example.com")
//!         .set_subject("Welcome")
//!         .set_body("<h1>Welcome aboard</h1>", true);
//!
//!     mailer.send()?;
//!     Ok(())
//! }
//! ```

mod error;
mod mailer;
mod profile;

pub use error::Error;
pub use mailer::{AttachmentSpec, Mailer, SmtpSettings};
pub use profile::{Encryption, Profile, Sender};

/// Result type alias for mailer operations.
///
/// This is equivalent to `std::result::Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
