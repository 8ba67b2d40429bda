//! Notification delivery for accepted submissions.
//!
//! [`Notifier`] is the seam the intake pipeline talks to. Three transports back it:
//! SMTP, the local sendmail binary, and a log-only notifier for development.
//! The From address and `X-Mailer` tag belong to the transport, not the message.

use std::sync::Arc;

use async_trait::async_trait;
use lettre::message::header::{ContentType, Header, HeaderName, HeaderValue};
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{
    AsyncSendmailTransport, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};

use consign_core::{Config, IntakeSettings, MailConfig, NotifyTransport};

#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("Invalid address: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[error("Failed to build message: {0}")]
    Build(#[from] lettre::error::Error),

    #[error("SMTP error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),

    #[error("Sendmail error: {0}")]
    Sendmail(#[from] lettre::transport::sendmail::Error),

    #[error("SMTP transport requires SMTP_HOST")]
    MissingHost,
}

/// Outbound notification transport.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(
        &self,
        recipient: &str,
        subject: &str,
        body: &str,
        reply_to: Option<&str>,
    ) -> Result<(), DeliveryError>;
}

/// `X-Mailer` header carrying the configured mailer tag.
#[derive(Debug, Clone, PartialEq)]
struct XMailer(String);

impl Header for XMailer {
    fn name() -> HeaderName {
        HeaderName::new_from_ascii_str("X-Mailer")
    }

    fn parse(s: &str) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        Ok(Self(s.to_string()))
    }

    fn display(&self) -> HeaderValue {
        HeaderValue::new(Self::name(), self.0.clone())
    }
}

/// Builds plain-text messages with a fixed From address and mailer tag.
#[derive(Debug, Clone)]
pub struct MessageComposer {
    from: Mailbox,
    mailer_tag: String,
}

impl MessageComposer {
    pub fn new(sender: &str, mailer_tag: impl Into<String>) -> Result<Self, DeliveryError> {
        Ok(Self {
            from: sender.parse()?,
            mailer_tag: mailer_tag.into(),
        })
    }

    pub fn from_settings(settings: &IntakeSettings) -> Result<Self, DeliveryError> {
        Self::new(&settings.sender, settings.mailer_tag.clone())
    }

    /// An unparseable Reply-To is dropped, not fatal.
    pub fn compose(
        &self,
        recipient: &str,
        subject: &str,
        body: &str,
        reply_to: Option<&str>,
    ) -> Result<Message, DeliveryError> {
        let to: Mailbox = recipient.parse()?;

        let mut builder = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(subject)
            .header(XMailer(self.mailer_tag.clone()))
            .header(ContentType::TEXT_PLAIN);

        if let Some(reply_to) = reply_to {
            match reply_to.parse::<Mailbox>() {
                Ok(mailbox) => builder = builder.reply_to(mailbox),
                Err(e) => {
                    tracing::debug!(reply_to = %reply_to, error = %e, "Reply-To omitted");
                }
            }
        }

        Ok(builder.body(body.to_string())?)
    }
}

/// SMTP relay (STARTTLS unless `SMTP_TLS=false`).
#[derive(Clone)]
pub struct SmtpNotifier {
    mailer: Arc<AsyncSmtpTransport<Tokio1Executor>>,
    composer: MessageComposer,
}

impl SmtpNotifier {
    pub fn new(mail: &MailConfig, composer: MessageComposer) -> Result<Self, DeliveryError> {
        let host = mail.smtp_host.as_deref().ok_or(DeliveryError::MissingHost)?;
        let port = mail.smtp_port;
        let credentials = match (&mail.smtp_user, &mail.smtp_password) {
            (Some(u), Some(p)) => Some(Credentials::new(u.clone(), p.clone())),
            _ => None,
        };

        let builder = if mail.smtp_tls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)?.port(port)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host).port(port)
        };
        let builder = match credentials {
            Some(c) => builder.credentials(c),
            None => builder,
        };

        tracing::info!(
            host = %host,
            port = port,
            starttls = mail.smtp_tls,
            "Notifier initialized (SMTP)"
        );

        Ok(Self {
            mailer: Arc::new(builder.build()),
            composer,
        })
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn send(
        &self,
        recipient: &str,
        subject: &str,
        body: &str,
        reply_to: Option<&str>,
    ) -> Result<(), DeliveryError> {
        let message = self.composer.compose(recipient, subject, body, reply_to)?;
        self.mailer.send(message).await?;
        tracing::info!(recipient = %recipient, "Notification sent (SMTP)");
        Ok(())
    }
}

/// Hands messages to the local `sendmail` binary.
pub struct SendmailNotifier {
    mailer: AsyncSendmailTransport<Tokio1Executor>,
    composer: MessageComposer,
}

impl SendmailNotifier {
    pub fn new(composer: MessageComposer) -> Self {
        tracing::info!("Notifier initialized (sendmail)");
        Self {
            mailer: AsyncSendmailTransport::<Tokio1Executor>::new(),
            composer,
        }
    }
}

#[async_trait]
impl Notifier for SendmailNotifier {
    async fn send(
        &self,
        recipient: &str,
        subject: &str,
        body: &str,
        reply_to: Option<&str>,
    ) -> Result<(), DeliveryError> {
        let message = self.composer.compose(recipient, subject, body, reply_to)?;
        self.mailer.send(message).await?;
        tracing::info!(recipient = %recipient, "Notification sent (sendmail)");
        Ok(())
    }
}

/// Development transport: the message is written to the log only.
#[derive(Clone)]
pub struct LogNotifier {
    composer: MessageComposer,
}

impl LogNotifier {
    pub fn new(composer: MessageComposer) -> Self {
        Self { composer }
    }
}

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(
        &self,
        recipient: &str,
        subject: &str,
        body: &str,
        reply_to: Option<&str>,
    ) -> Result<(), DeliveryError> {
        // Same checks a real transport would apply.
        self.composer.compose(recipient, subject, body, reply_to)?;
        tracing::info!(
            recipient = %recipient,
            subject = %subject,
            reply_to = ?reply_to,
            body = %body,
            "Notification (log transport)"
        );
        Ok(())
    }
}

/// Pick the transport named by the configuration.
pub fn create_notifier(config: &Config) -> Result<Arc<dyn Notifier>, DeliveryError> {
    let composer = MessageComposer::from_settings(&config.intake)?;
    let notifier: Arc<dyn Notifier> = match config.mail.transport {
        NotifyTransport::Smtp => Arc::new(SmtpNotifier::new(&config.mail, composer)?),
        NotifyTransport::Sendmail => Arc::new(SendmailNotifier::new(composer)),
        NotifyTransport::Log => {
            tracing::warn!("Notifications are only logged (NOTIFY_TRANSPORT=log)");
            Arc::new(LogNotifier::new(composer))
        }
    };
    Ok(notifier)
}
