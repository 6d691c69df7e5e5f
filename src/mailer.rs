//! Rotating SMTP mailer implementation.

use std::path::PathBuf;
use std::sync::LazyLock;

use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use rand::Rng;
use regex::Regex;
use tracing::debug;

use crate::{Encryption, Error, Profile, Result, Sender};

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").unwrap());

/// Remove markup tags, leaving only the text content.
fn strip_tags(html: &str) -> String {
    TAG_RE.replace_all(html, "").into_owned()
}

/// Transport settings captured from the selected credential profile.
///
/// Produced by [`Mailer::randomize_smtp`] and consumed by [`Mailer::send`],
/// which builds an SMTP transport from them. Inspect via
/// [`Mailer::settings`].
#[derive(Debug, Clone, PartialEq)]
pub struct SmtpSettings {
    /// SMTP server hostname.
    pub host: String,
    /// Username for SMTP authentication.
    pub username: String,
    /// Password for SMTP authentication.
    pub password: String,
    /// Connection security mode.
    pub encryption: Encryption,
    /// SMTP server port.
    pub port: u16,
    /// Diagnostic verbosity; values above zero enable send-time debug
    /// events on this crate's tracing target.
    pub debug: u8,
}

/// An attachment registered by filesystem path.
///
/// The file is not touched until send time; a missing or unreadable file
/// surfaces as [`Error::Attachment`] from [`Mailer::send`].
#[derive(Debug, Clone)]
pub struct AttachmentSpec {
    /// Path of the file to attach.
    pub path: PathBuf,
    /// Display name override; derived from the path's file name when absent.
    pub name: Option<String>,
}

impl AttachmentSpec {
    /// The name the attachment is presented under.
    pub fn file_name(&self) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => self
                .path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
        }
    }

    /// Content type inferred from the file extension.
    fn content_type(&self) -> ContentType {
        let mime = match self.path.extension().and_then(|e| e.to_str()) {
            Some("txt") | Some("log") => "text/plain",
            Some("html") | Some("htm") => "text/html",
            Some("csv") => "text/csv",
            Some("json") => "application/json",
            Some("pdf") => "application/pdf",
            Some("png") => "image/png",
            Some("jpg") | Some("jpeg") => "image/jpeg",
            Some("zip") => "application/zip",
            _ => "application/octet-stream",
        };
        ContentType::parse(mime).unwrap()
    }

    /// Read the file and wrap it into a message part.
    fn to_part(&self) -> Result<SinglePart> {
        let content = std::fs::read(&self.path).map_err(|source| Error::Attachment {
            path: self.path.clone(),
            source,
        })?;
        Ok(Attachment::new(self.file_name()).body(content, self.content_type()))
    }
}

/// Mailer that rotates across a set of SMTP credential profiles.
///
/// Construct it with the full profile set, pick a profile with
/// [`randomize_smtp`](Mailer::randomize_smtp), fill in the message with the
/// fluent setters, and deliver with [`send`](Mailer::send). Every setter
/// returns `&mut Self` so calls chain.
///
/// The draft is kept as plain state and only assembled into a message at
/// send time, so sending again (or reconfiguring and re-sending) rebuilds
/// the message from the current state.
#[derive(Debug, Clone)]
pub struct Mailer {
    profiles: Vec<Profile>,
    smtp: Option<SmtpSettings>,
    from: Option<Sender>,
    recipients: Vec<String>,
    subject: String,
    body: String,
    alt_body: String,
    html: bool,
    attachments: Vec<AttachmentSpec>,
}

impl Mailer {
    /// Create a mailer over the given credential profiles.
    ///
    /// No network activity happens here. Fails with [`Error::Config`] when
    /// the profile list is empty, since a later random pick would have
    /// nothing to choose from.
    ///
    /// # Examples
    /// ```
    /// use rotmail::{Encryption, Mailer, Profile, Sender};
    ///
    /// let mailer = Mailer::new(vec![Profile {
    ///     host: "smtp.example.com".into(),
    ///     username: "user@example.com".into(),
    ///     password: "secret".into(),
    ///     encryption: Encryption::Tls,
    ///     port: 587,
    ///     from: Sender::new("noreply@example.com", "Example Support"),
    /// }])?;
    /// # let _ = mailer;
    /// # Ok::<(), rotmail::Error>(())
    /// ```
    pub fn new(profiles: Vec<Profile>) -> Result<Self> {
        if profiles.is_empty() {
            return Err(Error::Config("at least one SMTP profile is required".into()));
        }

        Ok(Self {
            profiles,
            smtp: None,
            from: None,
            recipients: Vec::new(),
            subject: String::new(),
            body: String::new(),
            alt_body: String::new(),
            html: false,
            attachments: Vec::new(),
        })
    }

    /// Create a mailer from a JSON array of profile mappings.
    ///
    /// Each mapping must carry all six keys: `host`, `username`, `password`,
    /// `encryption`, `port`, and `from` (a two-element `[email, name]`
    /// array). A missing or malformed key fails with [`Error::Config`]
    /// naming the offending field.
    ///
    /// # Examples
    /// ```
    /// use rotmail::Mailer;
    ///
    /// let mailer = Mailer::from_json(
    ///     r#"[{
    ///         "host": "smtp.example.com",
    ///         "username": "user@example.com",
    ///         "password": "secret",
    ///         "encryption": "tls",
    ///         "port": 587,
    ///         "from": ["noreply@example.com", "Example Support"]
    ///     }]"#,
    /// )?;
    /// # let _ = mailer;
    /// # Ok::<(), rotmail::Error>(())
    /// ```
    pub fn from_json(json: &str) -> Result<Self> {
        let profiles: Vec<Profile> =
            serde_json::from_str(json).map_err(|e| Error::Config(e.to_string()))?;
        Self::new(profiles)
    }

    /// The configured credential profiles.
    pub fn profiles(&self) -> &[Profile] {
        &self.profiles
    }

    /// Transport settings selected by the last [`randomize_smtp`] call.
    ///
    /// Returns `None` before the first selection.
    ///
    /// [`randomize_smtp`]: Mailer::randomize_smtp
    pub fn settings(&self) -> Option<&SmtpSettings> {
        self.smtp.as_ref()
    }

    /// The current sender identity, if one has been set.
    pub fn sender(&self) -> Option<&Sender> {
        self.from.as_ref()
    }

    /// Recipient addresses in the order they were added.
    pub fn recipients(&self) -> &[String] {
        &self.recipients
    }

    /// The current subject line.
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// The current message body.
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Plain-text alternative derived from the body by stripping tags.
    pub fn alt_body(&self) -> &str {
        &self.alt_body
    }

    /// Registered attachments in the order they were added.
    pub fn attachments(&self) -> &[AttachmentSpec] {
        &self.attachments
    }

    /// Select one profile uniformly at random and take over its transport
    /// settings and sender identity.
    ///
    /// Each call draws independently; it is a random pick, not a rotation.
    /// Previously selected settings and any sender set via
    /// [`set_from`](Mailer::set_from) are overwritten. `debug` levels above
    /// zero enable send-time diagnostics on this crate's tracing target.
    ///
    /// # Examples
    /// ```
    /// # use rotmail::{Encryption, Mailer, Profile, Sender};
    /// # let mut mailer = Mailer::new(vec![Profile {
    /// #     host: "smtp.example.com".into(),
    /// #     username: "user@example.com".into(),
    /// #     password: "secret".into(),
    /// #     encryption: Encryption::Tls,
    /// #     port: 587,
    /// #     from: Sender::new("noreply@example.com", "Example Support"),
    /// # }])?;
    /// mailer.randomize_smtp(0);
    /// assert_eq!(mailer.settings().unwrap().host, "smtp.example.com");
    /// # Ok::<(), rotmail::Error>(())
    /// ```
    pub fn randomize_smtp(&mut self, debug: u8) -> &mut Self {
        let index = rand::rng().random_range(0..self.profiles.len());
        let profile = &self.profiles[index];
        debug!(host = %profile.host, port = profile.port, "selected SMTP profile");

        self.smtp = Some(SmtpSettings {
            host: profile.host.clone(),
            username: profile.username.clone(),
            password: profile.password.clone(),
            encryption: profile.encryption,
            port: profile.port,
            debug,
        });
        self.from = Some(profile.from.clone());
        self
    }

    /// Set the sender address and display name, overriding any prior sender.
    pub fn set_from(&mut self, email: impl Into<String>, name: impl Into<String>) -> &mut Self {
        self.from = Some(Sender::new(email, name));
        self
    }

    /// Append one recipient address.
    ///
    /// Duplicates are kept, and the address is not validated here; a
    /// malformed address fails at send time.
    pub fn add_recipient(&mut self, address: impl Into<String>) -> &mut Self {
        self.recipients.push(address.into());
        self
    }

    /// Append each address in the given order.
    pub fn add_recipients(
        &mut self,
        addresses: impl IntoIterator<Item = impl Into<String>>,
    ) -> &mut Self {
        for address in addresses {
            self.add_recipient(address);
        }
        self
    }

    /// Register an attachment by path, presented under its file name.
    pub fn add_attachment(&mut self, path: impl Into<PathBuf>) -> &mut Self {
        self.attachments.push(AttachmentSpec {
            path: path.into(),
            name: None,
        });
        self
    }

    /// Register an attachment by path with an explicit display name.
    pub fn add_attachment_named(
        &mut self,
        path: impl Into<PathBuf>,
        name: impl Into<String>,
    ) -> &mut Self {
        self.attachments.push(AttachmentSpec {
            path: path.into(),
            name: Some(name.into()),
        });
        self
    }

    /// Set the subject line.
    pub fn set_subject(&mut self, subject: impl Into<String>) -> &mut Self {
        self.subject = subject.into();
        self
    }

    /// Set the message body.
    ///
    /// With `html` set, the message is delivered as `multipart/alternative`
    /// with a plain-text part derived by stripping all markup tags from the
    /// body. The derivation runs either way; on tag-free plain text it
    /// changes nothing.
    pub fn set_body(&mut self, body: impl Into<String>, html: bool) -> &mut Self {
        let body = body.into();
        self.alt_body = strip_tags(&body);
        self.body = body;
        self.html = html;
        self
    }

    /// Assemble the draft and deliver it through the selected SMTP server.
    ///
    /// Requires a prior [`randomize_smtp`](Mailer::randomize_smtp) call; the
    /// transport is built fresh from the selected settings, so there is no
    /// connection reuse across sends. Returns `Ok(true)` once the server
    /// accepts the message. Transport failures are wrapped as
    /// [`Error::Send`] with the transport's message text preserved; nothing
    /// is retried and no other profile is tried.
    ///
    /// # Examples
    /// ```no_run
    /// # use rotmail::Mailer;
    /// # let mut mailer = Mailer::from_json(r#"[{
    /// #     "host": "smtp.example.com", "username": "user@example.com",
    /// #     "password": "secret", "encryption": "tls", "port": 587,
    /// #     "from": ["noreply@example.com", "Example Support"]
    /// # }]"#)?;
    /// mailer
    ///     .randomize_smtp(0)
    ///     .add_recipient("user@example.com")
    ///     .set_subject("Welcome")
    ///     .set_body("<h1>Hello</h1>", true);
    /// assert!(mailer.send()?);
    /// # Ok::<(), rotmail::Error>(())
    /// ```
    pub fn send(&self) -> Result<bool> {
        let settings = self.smtp.as_ref().ok_or_else(|| {
            Error::Config("no SMTP transport selected; call randomize_smtp first".into())
        })?;

        let builder = match settings.encryption {
            Encryption::Ssl => {
                SmtpTransport::relay(&settings.host).map_err(|e| Error::Send(e.to_string()))?
            }
            Encryption::Tls => SmtpTransport::starttls_relay(&settings.host)
                .map_err(|e| Error::Send(e.to_string()))?,
            Encryption::None => SmtpTransport::builder_dangerous(&settings.host),
        };

        let transport = builder
            .port(settings.port)
            .credentials(Credentials::new(
                settings.username.clone(),
                settings.password.clone(),
            ))
            .build();

        self.send_with(&transport)
    }

    /// Assemble the draft and deliver it through the given transport.
    ///
    /// This is [`send`](Mailer::send) with the transport supplied by the
    /// caller instead of built from the selected settings. Useful with
    /// lettre's file or stub transports, or any other
    /// [`Transport`] implementation.
    pub fn send_with<T>(&self, transport: &T) -> Result<bool>
    where
        T: Transport,
        T::Error: std::fmt::Display,
    {
        let message = self.build_message()?;

        if self.smtp.as_ref().is_some_and(|s| s.debug > 0) {
            debug!(
                recipients = self.recipients.len(),
                subject = %self.subject,
                "handing message to transport"
            );
        }

        transport
            .send(&message)
            .map_err(|e| Error::Send(e.to_string()))?;
        Ok(true)
    }

    /// Build the message from the current draft state.
    fn build_message(&self) -> Result<Message> {
        let sender = self
            .from
            .as_ref()
            .ok_or_else(|| Error::Build("sender address required".into()))?;
        let from = Mailbox::new(
            Some(sender.name.clone()),
            sender
                .email
                .parse()
                .map_err(|_| Error::Address(sender.email.clone()))?,
        );

        let mut builder = Message::builder().from(from).subject(self.subject.clone());
        for address in &self.recipients {
            let mailbox: Mailbox = address
                .parse()
                .map_err(|_| Error::Address(address.clone()))?;
            builder = builder.to(mailbox);
        }

        let result = if self.attachments.is_empty() {
            if self.html {
                builder.multipart(MultiPart::alternative_plain_html(
                    self.alt_body.clone(),
                    self.body.clone(),
                ))
            } else {
                builder.singlepart(SinglePart::plain(self.body.clone()))
            }
        } else {
            let mut mixed = if self.html {
                MultiPart::mixed().multipart(MultiPart::alternative_plain_html(
                    self.alt_body.clone(),
                    self.body.clone(),
                ))
            } else {
                MultiPart::mixed().singlepart(SinglePart::plain(self.body.clone()))
            };
            for spec in &self.attachments {
                mixed = mixed.singlepart(spec.to_part()?);
            }
            builder.multipart(mixed)
        };

        result.map_err(|e| Error::Build(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profiles() -> Vec<Profile> {
        vec![
            Profile {
                host: "smtp.example.com".into(),
                username: "user1@example.com".into(),
                password: "password1".into(),
                encryption: Encryption::Tls,
                port: 587,
                from: Sender::new("noreply@example.com", "Example Support"),
            },
            Profile {
                host: "smtp.another.com".into(),
                username: "user2@another.com".into(),
                password: "password2".into(),
                encryption: Encryption::Ssl,
                port: 465,
                from: Sender::new("noreply@another.com", "Another Support"),
            },
        ]
    }

    fn mailer() -> Mailer {
        Mailer::new(profiles()).unwrap()
    }

    #[test]
    fn empty_profile_list_is_rejected() {
        let err = Mailer::new(Vec::new()).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn randomize_selects_a_configured_host() {
        let hosts = ["smtp.example.com", "smtp.another.com"];
        let mut mailer = mailer();

        for _ in 0..100 {
            mailer.randomize_smtp(0);
            let settings = mailer.settings().unwrap();
            assert!(hosts.contains(&settings.host.as_str()));
        }
    }

    #[test]
    fn randomize_adopts_the_profile_settings() {
        let mut mailer = mailer();
        mailer.randomize_smtp(2);

        let settings = mailer.settings().unwrap();
        let profile = profiles()
            .into_iter()
            .find(|p| p.host == settings.host)
            .unwrap();

        assert_eq!(settings.username, profile.username);
        assert_eq!(settings.password, profile.password);
        assert_eq!(settings.encryption, profile.encryption);
        assert_eq!(settings.port, profile.port);
        assert_eq!(settings.debug, 2);
        assert_eq!(mailer.sender(), Some(&profile.from));
    }

    #[test]
    fn set_from_overrides_the_profile_sender() {
        let mut mailer = mailer();
        mailer
            .randomize_smtp(0)
            .set_from("customsender@example.com", "Custom Sender");

        assert_eq!(
            mailer.sender(),
            Some(&Sender::new("customsender@example.com", "Custom Sender"))
        );
    }

    #[test]
    fn recipients_keep_insertion_order_and_duplicates() {
        let mut mailer = mailer();
        mailer
            .add_recipient("a@x.com")
            .add_recipient("b@y.com")
            .add_recipient("a@x.com");

        assert_eq!(mailer.recipients(), ["a@x.com", "b@y.com", "a@x.com"]);
    }

    #[test]
    fn add_recipients_matches_sequential_adds() {
        let mut batch = mailer();
        batch.add_recipients(["a@x.com", "b@y.com"]);

        let mut sequential = mailer();
        sequential.add_recipient("a@x.com").add_recipient("b@y.com");

        assert_eq!(batch.recipients(), sequential.recipients());
    }

    #[test]
    fn set_subject_stores_the_subject() {
        let mut mailer = mailer();
        mailer.set_subject("Test Subject");
        assert_eq!(mailer.subject(), "Test Subject");
    }

    #[test]
    fn html_body_derives_a_stripped_alternative() {
        let mut mailer = mailer();
        mailer.set_body("<h1>Test Body</h1>", true);

        assert_eq!(mailer.body(), "<h1>Test Body</h1>");
        assert_eq!(mailer.alt_body(), "Test Body");
    }

    #[test]
    fn plain_body_is_left_unchanged() {
        let mut mailer = mailer();
        mailer.set_body("no markup here", false);

        assert_eq!(mailer.body(), "no markup here");
        assert_eq!(mailer.alt_body(), "no markup here");
    }

    #[test]
    fn strip_tags_handles_nested_markup() {
        assert_eq!(
            strip_tags("<p>Hello <strong>world</strong></p>"),
            "Hello world"
        );
        assert_eq!(strip_tags("<br/>"), "");
        assert_eq!(strip_tags("plain"), "plain");
    }

    #[test]
    fn send_without_selection_is_a_config_error() {
        let mut mailer = mailer();
        mailer
            .set_from("noreply@example.com", "Example Support")
            .add_recipient("user@example.com")
            .set_body("hi", false);

        let err = mailer.send().unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn attachment_name_derives_from_path() {
        let spec = AttachmentSpec {
            path: PathBuf::from("/tmp/report.pdf"),
            name: None,
        };
        assert_eq!(spec.file_name(), "report.pdf");

        let named = AttachmentSpec {
            path: PathBuf::from("/tmp/report.pdf"),
            name: Some("q3-report.pdf".into()),
        };
        assert_eq!(named.file_name(), "q3-report.pdf");
    }
}
