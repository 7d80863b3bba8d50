//! Transactional mail
//!
//! `Mailer` resolves a named mail profile into a ready-to-send
//! `OutgoingMail` (server settings, sender identity, decoded attachments)
//! and hands it to a `MailTransport`. Failed deliveries are logged and,
//! when an alert push profile is configured, reported over push.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::config::{mail_secret_key, Config, MailProfile};
use crate::notify::push::{Notifier, PushOptions};
use crate::outcome::{DeliveryError, Outcome};
use crate::traits::{CredentialStore, MailTransport};
use crate::utils::validation::check_email;

/// A file attached to a mail, as posted by the front end
#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
pub struct Attachment {
    /// File name shown to the recipient
    pub title: String,
    /// Base64-encoded file content
    pub data: String,
}

/// A mail as requested by application code
#[derive(Debug, Clone, Default)]
pub struct MailMessage {
    pub subject: String,
    /// HTML body
    pub body: String,
    pub to: Vec<String>,
    pub cc: Vec<String>,
    pub bcc: Vec<String>,
    pub attachments: Vec<Attachment>,
}

/// Connection settings handed to the transport
#[derive(Clone, PartialEq)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub starttls: bool,
}

impl fmt::Debug for SmtpSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmtpSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("starttls", &self.starttls)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Mailbox {
    pub address: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DecodedAttachment {
    pub filename: String,
    pub content: Vec<u8>,
}

/// A fully resolved mail, ready for SMTP
#[derive(Debug, Clone, PartialEq)]
pub struct OutgoingMail {
    pub server: SmtpSettings,
    pub from: Mailbox,
    pub reply_to: Mailbox,
    pub to: Vec<String>,
    pub cc: Vec<String>,
    pub bcc: Vec<String>,
    pub subject: String,
    pub html_body: String,
    /// Always UTF-8, sent base64 transfer-encoded
    pub charset: &'static str,
    pub attachments: Vec<DecodedAttachment>,
}

/// Sends mail by profile name
pub struct Mailer {
    profiles: HashMap<String, MailProfile>,
    credentials: Arc<dyn CredentialStore>,
    transport: Arc<dyn MailTransport>,
    alert: Option<(Arc<Notifier>, String)>,
}

impl Mailer {
    pub fn new(
        profiles: HashMap<String, MailProfile>,
        credentials: Arc<dyn CredentialStore>,
        transport: Arc<dyn MailTransport>,
    ) -> Self {
        Self {
            profiles,
            credentials,
            transport,
            alert: None,
        }
    }

    /// Builds a mailer from the config, wiring up the alert profile if set
    pub fn from_config(
        config: &Config,
        credentials: Arc<dyn CredentialStore>,
        transport: Arc<dyn MailTransport>,
        notifier: Arc<Notifier>,
    ) -> Self {
        let mailer = Self::new(config.mail.clone(), credentials, transport);
        match &config.alert_push_profile {
            Some(profile) => mailer.with_alert(notifier, profile.clone()),
            None => mailer,
        }
    }

    /// Report failed deliveries to push profile `profile`
    pub fn with_alert(mut self, notifier: Arc<Notifier>, profile: String) -> Self {
        self.alert = Some((notifier, profile));
        self
    }

    /// Sends `message` using mail profile `profile`
    ///
    /// No retry. An unknown profile is logged and reported; any later
    /// failure is additionally raised on the alert push profile.
    pub async fn send_mail(&self, profile: &str, message: &MailMessage) -> Outcome<DeliveryError> {
        let Some(mail_profile) = self.profiles.get(profile) else {
            tracing::warn!(profile, "Mail not sent: unknown mail profile");
            return Outcome::failure(DeliveryError::UnknownProfile {
                kind: "mail",
                name: profile.to_string(),
            });
        };

        let result = match self.prepare(profile, mail_profile, message) {
            Ok(mail) => self
                .transport
                .deliver(&mail)
                .await
                .map_err(DeliveryError::Transport),
            Err(e) => Err(e),
        };

        if let Err(e) = &result {
            tracing::warn!(profile, subject = %message.subject, "Mail not sent: {}", e);
            self.raise_alert(message, e).await;
        }

        result.into()
    }

    /// Resolves profile, password, recipients and attachments
    pub fn prepare(
        &self,
        profile: &str,
        mail_profile: &MailProfile,
        message: &MailMessage,
    ) -> Result<OutgoingMail, DeliveryError> {
        if message.to.is_empty() {
            return Err(DeliveryError::NoRecipients);
        }

        for address in message.to.iter().chain(&message.cc).chain(&message.bcc) {
            check_email(address).map_err(|_| DeliveryError::InvalidAddress(address.clone()))?;
        }

        let secret_key = mail_secret_key(profile);
        let password = self
            .credentials
            .get_secret(&secret_key)
            .map_err(|_| DeliveryError::MissingSecret(secret_key))?;

        let attachments = message
            .attachments
            .iter()
            .map(decode_attachment)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(OutgoingMail {
            server: SmtpSettings {
                host: mail_profile.host.clone(),
                port: mail_profile.port,
                user: mail_profile.user.clone(),
                password,
                starttls: true,
            },
            from: Mailbox {
                address: mail_profile.from.clone(),
                name: mail_profile.sender.clone(),
            },
            reply_to: Mailbox {
                address: mail_profile.reply_to.clone(),
                name: mail_profile.sender.clone(),
            },
            to: message.to.clone(),
            cc: message.cc.clone(),
            bcc: message.bcc.clone(),
            subject: message.subject.clone(),
            html_body: message.body.clone(),
            charset: "UTF-8",
            attachments,
        })
    }

    async fn raise_alert(&self, message: &MailMessage, error: &DeliveryError) {
        let Some((notifier, alert_profile)) = &self.alert else {
            return;
        };

        let text = format!(
            "Message could not be sent. Mailer Error: {} - {}",
            error,
            message.to.join(", ")
        );
        let options = PushOptions::titled(format!("Mail Error: {}", message.subject));

        // Failures here are already logged by the notifier.
        let _ = notifier.send_push(alert_profile, &text, options).await;
    }
}

fn decode_attachment(attachment: &Attachment) -> Result<DecodedAttachment, DeliveryError> {
    let content = STANDARD
        .decode(attachment.data.trim())
        .map_err(|e| DeliveryError::Attachment {
            title: attachment.title.clone(),
            reason: e.to_string(),
        })?;

    Ok(DecodedAttachment {
        filename: attachment.title.clone(),
        content,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::push::tests::{ops_notifier, MockCredentials, RecordingSender};
    use anyhow::{anyhow, Result};
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingTransport {
        delivered: Mutex<Vec<OutgoingMail>>,
        fail: bool,
    }

    #[async_trait]
    impl MailTransport for RecordingTransport {
        async fn deliver(&self, mail: &OutgoingMail) -> Result<()> {
            if self.fail {
                return Err(anyhow!("535 authentication failed"));
            }
            self.delivered.lock().unwrap().push(mail.clone());
            Ok(())
        }
    }

    fn office_profile() -> MailProfile {
        MailProfile {
            host: "smtp.example.at".into(),
            port: 587,
            user: "office@example.at".into(),
            from: "office@example.at".into(),
            sender: "Fliix Office".into(),
            reply_to: "support@example.at".into(),
        }
    }

    fn mailer(transport: Arc<RecordingTransport>) -> Mailer {
        Mailer::new(
            HashMap::from([("office".to_string(), office_profile())]),
            Arc::new(MockCredentials::with("mail:office", "smtp-secret")),
            transport,
        )
    }

    fn invoice_mail() -> MailMessage {
        MailMessage {
            subject: "Ihre Rechnung".into(),
            body: "<p>Anbei die Rechnung.</p>".into(),
            to: vec!["kunde@example.com".into()],
            cc: vec![],
            bcc: vec!["archiv@example.at".into()],
            attachments: vec![Attachment {
                title: "rechnung.pdf".into(),
                data: STANDARD.encode(b"%PDF-1.4"),
            }],
        }
    }

    #[tokio::test]
    async fn test_send_mail_resolves_profile() {
        let transport = Arc::new(RecordingTransport::default());
        let outcome = mailer(transport.clone())
            .send_mail("office", &invoice_mail())
            .await;
        assert!(outcome.is_success());

        let delivered = transport.delivered.lock().unwrap();
        let mail = &delivered[0];
        assert_eq!(mail.server.password, "smtp-secret");
        assert!(mail.server.starttls);
        assert_eq!(mail.from.name, "Fliix Office");
        assert_eq!(mail.reply_to.address, "support@example.at");
        assert_eq!(mail.bcc, vec!["archiv@example.at".to_string()]);
        assert_eq!(mail.attachments[0].content, b"%PDF-1.4");
        assert_eq!(mail.charset, "UTF-8");
    }

    #[tokio::test]
    async fn test_invalid_recipient_is_rejected_before_delivery() {
        let transport = Arc::new(RecordingTransport::default());
        let mut message = invoice_mail();
        message.cc.push("not-an-address".into());

        let outcome = mailer(transport.clone()).send_mail("office", &message).await;
        assert!(matches!(
            outcome.error(),
            Some(DeliveryError::InvalidAddress(a)) if a == "not-an-address"
        ));
        assert!(transport.delivered.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_bad_attachment_data() {
        let mut message = invoice_mail();
        message.attachments[0].data = "***".into();

        let outcome = mailer(Arc::new(RecordingTransport::default()))
            .send_mail("office", &message)
            .await;
        assert!(matches!(
            outcome.error(),
            Some(DeliveryError::Attachment { title, .. }) if title == "rechnung.pdf"
        ));
    }

    #[tokio::test]
    async fn test_no_recipients() {
        let mut message = invoice_mail();
        message.to.clear();

        let outcome = mailer(Arc::new(RecordingTransport::default()))
            .send_mail("office", &message)
            .await;
        assert!(matches!(outcome.error(), Some(DeliveryError::NoRecipients)));
    }

    #[tokio::test]
    async fn test_unknown_profile_sends_no_alert() {
        let sender = Arc::new(RecordingSender::default());
        let mailer = mailer(Arc::new(RecordingTransport::default()))
            .with_alert(Arc::new(ops_notifier(sender.clone())), "ops".into());

        let outcome = mailer.send_mail("newsletter", &invoice_mail()).await;
        assert!(matches!(
            outcome.error(),
            Some(DeliveryError::UnknownProfile { kind: "mail", .. })
        ));
        assert!(sender.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_transport_failure_raises_push_alert() {
        let sender = Arc::new(RecordingSender::default());
        let transport = Arc::new(RecordingTransport {
            fail: true,
            ..Default::default()
        });
        let mailer =
            mailer(transport).with_alert(Arc::new(ops_notifier(sender.clone())), "ops".into());

        let outcome = mailer.send_mail("office", &invoice_mail()).await;
        assert!(matches!(outcome.error(), Some(DeliveryError::Transport(_))));

        let alerts = sender.sent.lock().unwrap();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].title, "Mail Error: Ihre Rechnung");
        assert!(alerts[0]
            .message
            .starts_with("Message could not be sent. Mailer Error: transport error: 535"));
        assert!(alerts[0].message.ends_with("kunde@example.com"));
    }

    #[tokio::test]
    async fn test_from_config_wires_alert_profile() {
        let mut config = Config::default();
        config.mail.insert("office".into(), office_profile());
        config.alert_push_profile = Some("ops".into());

        let sender = Arc::new(RecordingSender::default());
        let transport = Arc::new(RecordingTransport {
            fail: true,
            ..Default::default()
        });
        let mailer = Mailer::from_config(
            &config,
            Arc::new(MockCredentials::with("mail:office", "smtp-secret")),
            transport,
            Arc::new(ops_notifier(sender.clone())),
        );

        assert!(!mailer.send_mail("office", &invoice_mail()).await.is_success());
        assert_eq!(sender.sent.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_smtp_settings_debug_hides_password() {
        let settings = SmtpSettings {
            host: "smtp.example.at".into(),
            port: 587,
            user: "office".into(),
            password: "smtp-secret".into(),
            starttls: true,
        };
        assert!(!format!("{:?}", settings).contains("smtp-secret"));
    }
}
