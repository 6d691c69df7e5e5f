//! SMTP credential profile model.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A default sender identity: email address plus display name.
///
/// Stored on the wire as a two-element array, `["noreply@example.com",
/// "Example Support"]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "(String, String)", into = "(String, String)")]
pub struct Sender {
    /// Sender email address.
    pub email: String,
    /// Human-readable display name.
    pub name: String,
}

impl Sender {
    /// Create a sender identity from an address and display name.
    pub fn new(email: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            name: name.into(),
        }
    }
}

impl From<(String, String)> for Sender {
    fn from((email, name): (String, String)) -> Self {
        Self { email, name }
    }
}

impl From<Sender> for (String, String) {
    fn from(sender: Sender) -> Self {
        (sender.email, sender.name)
    }
}

/// Connection security for an SMTP profile.
///
/// Parsed leniently: `"tls"`/`"starttls"` select a STARTTLS upgrade,
/// `"ssl"`/`"smtps"` select implicit TLS, and anything else falls back to
/// cleartext.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Encryption {
    /// STARTTLS upgrade on a plaintext connection (commonly port 587).
    Tls,
    /// Implicit TLS from the first byte (commonly port 465).
    Ssl,
    /// No transport security.
    None,
}

impl Encryption {
    /// Canonical lowercase name of the mode.
    pub fn as_str(&self) -> &'static str {
        match self {
            Encryption::Tls => "tls",
            Encryption::Ssl => "ssl",
            Encryption::None => "none",
        }
    }
}

impl From<String> for Encryption {
    fn from(value: String) -> Self {
        match value.to_lowercase().as_str() {
            "tls" | "starttls" => Encryption::Tls,
            "ssl" | "smtps" => Encryption::Ssl,
            _ => Encryption::None,
        }
    }
}

impl From<Encryption> for String {
    fn from(value: Encryption) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for Encryption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One set of SMTP server connection parameters plus a default sender
/// identity.
///
/// All six fields are required; deserializing a mapping that omits any of
/// them fails, which [`Mailer::from_json`](crate::Mailer::from_json) reports
/// as a configuration error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
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
    /// Default sender identity applied when this profile is selected.
    pub from: Sender,
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROFILE_JSON: &str = r#"{
        "host": "smtp.example.com",
        "username": "user1@example.com",
        "password": "password1",
        "encryption": "tls",
        "port": 587,
        "from": ["noreply@example.com", "Example Support"]
    }"#;

    #[test]
    fn deserialize_full_profile() {
        let profile: Profile = serde_json::from_str(PROFILE_JSON).unwrap();

        assert_eq!(profile.host, "smtp.example.com");
        assert_eq!(profile.username, "user1@example.com");
        assert_eq!(profile.encryption, Encryption::Tls);
        assert_eq!(profile.port, 587);
        assert_eq!(profile.from, Sender::new("noreply@example.com", "Example Support"));
    }

    #[test]
    fn missing_key_is_rejected() {
        for key in ["host", "username", "password", "encryption", "port", "from"] {
            let mut value: serde_json::Value = serde_json::from_str(PROFILE_JSON).unwrap();
            value.as_object_mut().unwrap().remove(key);

            let err = serde_json::from_value::<Profile>(value).unwrap_err();
            assert!(err.to_string().contains(key), "error should name `{key}`: {err}");
        }
    }

    #[test]
    fn encryption_accepts_aliases() {
        assert_eq!(Encryption::from("starttls".to_string()), Encryption::Tls);
        assert_eq!(Encryption::from("SSL".to_string()), Encryption::Ssl);
        assert_eq!(Encryption::from("smtps".to_string()), Encryption::Ssl);
    }

    #[test]
    fn unknown_encryption_falls_back_to_none() {
        assert_eq!(Encryption::from("plaintext".to_string()), Encryption::None);
        assert_eq!(Encryption::from(String::new()), Encryption::None);
    }

    #[test]
    fn sender_round_trips_as_pair() {
        let sender = Sender::new("noreply@example.com", "Example Support");
        let json = serde_json::to_string(&sender).unwrap();
        assert_eq!(json, r#"["noreply@example.com","Example Support"]"#);

        let back: Sender = serde_json::from_str(&json).unwrap();
        assert_eq!(back, sender);
    }
}
