//! Report delivery over SMTP.
//!
//! One message per run carries every cleaned file (and, when enabled, every
//! summary log) as an attachment. The transport is STARTTLS with login
//! authentication against the configured relay.

use crate::config::{Credentials, EmailSettings};
use crate::error::{Result, ResultExt as _, ScrubError};
use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials as SmtpCredentials;
use lettre::{Message, SmtpTransport, Transport as _};
use secrecy::ExposeSecret as _;
use std::path::{Path, PathBuf};

/// Sends the outputs of a run somewhere.
pub trait Deliver {
    /// Delivers all attachments in one message, returning how many were sent.
    ///
    /// # Errors
    ///
    /// Returns an error if any attachment cannot be read or sending fails.
    fn deliver(&self, attachments: &[PathBuf]) -> Result<usize>;
}

#[derive(Debug, Clone)]
pub struct SmtpMailer {
    credentials: Credentials,
    settings: EmailSettings,
}

impl SmtpMailer {
    pub fn new(credentials: Credentials, settings: EmailSettings) -> Self {
        Self {
            credentials,
            settings,
        }
    }

    /// # Errors
    ///
    /// Returns [`ScrubError::MissingCredential`] if the login is not set.
    pub fn from_env(settings: EmailSettings) -> Result<Self> {
        Ok(Self::new(Credentials::from_env()?, settings))
    }

    /// Configured recipient, or the sending account itself.
    pub fn recipient(&self) -> &str {
        self.settings
            .recipient
            .as_deref()
            .unwrap_or(&self.credentials.user)
    }

    /// # Errors
    ///
    /// Returns an error if an address is invalid or an attachment cannot be
    /// read.
    pub fn build_message(&self, attachments: &[PathBuf]) -> Result<Message> {
        let from: Mailbox = self.credentials.user.parse()?;
        let to: Mailbox = self.recipient().parse()?;

        let mut body =
            MultiPart::mixed().singlepart(SinglePart::plain(self.settings.body.clone()));
        for path in attachments {
            body = body.singlepart(attachment_part(path)?);
        }

        Ok(Message::builder()
            .from(from)
            .to(to)
            .subject(self.settings.subject.clone())
            .multipart(body)?)
    }
}

fn attachment_part(path: &Path) -> Result<SinglePart> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("Failed to read attachment {}", path.display()))?;
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| ScrubError::InvalidPath(format!("{} has no file name", path.display())))?;
    let content_type = ContentType::parse("application/octet-stream")?;
    Ok(Attachment::new(filename).body(bytes, content_type))
}

impl Deliver for SmtpMailer {
    fn deliver(&self, attachments: &[PathBuf]) -> Result<usize> {
        let message = self.build_message(attachments)?;

        tracing::info!(
            "Connecting to {}:{} as {}",
            self.settings.smtp_host,
            self.settings.smtp_port,
            self.credentials.user
        );
        let transport = SmtpTransport::starttls_relay(&self.settings.smtp_host)?
            .port(self.settings.smtp_port)
            .credentials(SmtpCredentials::new(
                self.credentials.user.clone(),
                self.credentials.password.expose_secret().to_owned(),
            ))
            .build();
        transport.send(&message)?;

        tracing::info!(
            "Successfully sent email with {} attachments to {}",
            attachments.len(),
            self.recipient()
        );
        Ok(attachments.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{PASS_VAR, USER_VAR};

    fn mailer(recipient: Option<&str>) -> SmtpMailer {
        let credentials = Credentials::from_lookup(|key| match key {
            USER_VAR => Some("bot@example.com".to_owned()),
            PASS_VAR => Some("s3cret".to_owned()),
            _ => None,
        })
        .expect("credentials");
        let settings = EmailSettings {
            recipient: recipient.map(str::to_owned),
            ..EmailSettings::default()
        };
        SmtpMailer::new(credentials, settings)
    }

    #[test]
    fn test_recipient_defaults_to_sender() {
        assert_eq!(mailer(None).recipient(), "bot@example.com");
        assert_eq!(
            mailer(Some("team@example.com")).recipient(),
            "team@example.com"
        );
    }

    #[test]
    fn test_message_carries_every_attachment() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let csv = dir.path().join("cleaned_sales.csv");
        let log = dir.path().join("log_sales.txt");
        std::fs::write(&csv, "Total\n1.0\n")?;
        std::fs::write(&log, "--- sales.csv ---\n")?;

        let message = mailer(Some("team@example.com")).build_message(&[csv, log])?;
        let raw = String::from_utf8_lossy(&message.formatted()).into_owned();

        assert!(raw.contains("Subject: Automated Report"));
        assert!(raw.contains("To: team@example.com"));
        assert!(raw.contains("cleaned_sales.csv"));
        assert!(raw.contains("log_sales.txt"));
        assert_eq!(raw.matches("application/octet-stream").count(), 2);
        Ok(())
    }

    #[test]
    fn test_unreadable_attachment_aborts() {
        let result = mailer(None).deliver(&[PathBuf::from("/nonexistent/cleaned_x.csv")]);
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_recipient() {
        let result = mailer(Some("not an address")).build_message(&[]);
        assert!(matches!(result, Err(ScrubError::Mail(_))));
    }

    #[test]
    fn test_missing_credentials_fail_before_connecting() {
        let result = Credentials::from_lookup(|key| (key == PASS_VAR).then(|| "x".to_owned()));
        assert!(matches!(result, Err(ScrubError::MissingCredential(USER_VAR))));
    }
}
