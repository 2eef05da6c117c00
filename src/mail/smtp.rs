use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Attachment as LettreAttachment, Mailbox, MultiPart, SinglePart},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message as LettreMessage, Tokio1Executor,
};
use log::info;

use crate::config::SmtpConfig;
use crate::mail::error::MailError;

#[derive(Debug, Clone)]
pub struct OutgoingAttachment {
    pub filename: String,
    pub content_type: String,
    pub content: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub text: String,
    pub attachments: Vec<OutgoingAttachment>,
}

/// One outbound submission per call; no retry, no idempotency key, so a
/// duplicate submission produces a duplicate send.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(&self, email: OutgoingEmail) -> Result<(), MailError>;
}

/// [`EmailSender`] over an SMTP relay, built from injected configuration so
/// tests can swap in a fake.
pub struct SmtpMailer {
    config: SmtpConfig,
}

impl SmtpMailer {
    pub fn new(config: SmtpConfig) -> Self {
        Self { config }
    }

    fn build_message(&self, email: &OutgoingEmail) -> Result<LettreMessage, MailError> {
        let from: Mailbox = self
            .config
            .from
            .parse()
            .map_err(|e| MailError::Address(format!("invalid from address: {}", e)))?;
        let to: Mailbox = email
            .to
            .parse()
            .map_err(|e| MailError::Address(format!("invalid to address {}: {}", email.to, e)))?;

        let builder = LettreMessage::builder()
            .from(from)
            .to(to)
            .subject(&email.subject);

        if email.attachments.is_empty() {
            return Ok(builder
                .header(ContentType::TEXT_PLAIN)
                .body(email.text.clone())?);
        }

        let mut multipart = MultiPart::mixed().singlepart(
            SinglePart::builder()
                .header(ContentType::TEXT_PLAIN)
                .body(email.text.clone()),
        );
        for att in &email.attachments {
            let content_type = ContentType::parse(&att.content_type)
                .or_else(|_| ContentType::parse("application/octet-stream"))
                .map_err(|e| MailError::Address(format!("invalid content type: {}", e)))?;
            multipart = multipart.singlepart(
                LettreAttachment::new(att.filename.clone()).body(att.content.clone(), content_type),
            );
        }
        Ok(builder.multipart(multipart)?)
    }
}

#[async_trait]
impl EmailSender for SmtpMailer {
    async fn send(&self, email: OutgoingEmail) -> Result<(), MailError> {
        let message = self.build_message(&email)?;

        let creds = Credentials::new(self.config.user.clone(), self.config.pass.clone());
        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.config.host)?
            .port(self.config.port)
            .credentials(creds)
            .build();

        mailer.send(message).await?;
        info!(
            "Email sent to {} with {} attachment(s)",
            email.to,
            email.attachments.len()
        );
        Ok(())
    }
}
