// Notification collaborator: delivers a generated invoice document as an
// email attachment. Template management lives outside this subsystem.

use async_trait::async_trait;
use lettre::message::{header::ContentType, Attachment, Mailbox, Message, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{SmtpTransport, Transport};
use tracing::info;

use crate::config::SmtpConfig;
use crate::core::{AppError, Result};
use crate::modules::reports::services::invoice_report_service::GeneratedDocument;

#[async_trait]
pub trait NotificationService: Send + Sync {
    async fn send_invoice(
        &self,
        recipient: &str,
        subject: &str,
        body: &str,
        document: &GeneratedDocument,
    ) -> Result<()>;
}

/// SMTP mailer
pub struct SmtpNotifier {
    config: SmtpConfig,
}

impl SmtpNotifier {
    pub fn new(config: SmtpConfig) -> Self {
        Self { config }
    }

    fn build_message(
        &self,
        recipient: &str,
        subject: &str,
        body: &str,
        document: &GeneratedDocument,
    ) -> Result<Message> {
        let from: Mailbox = self
            .config
            .from_address
            .parse()
            .map_err(|_| AppError::Configuration("Invalid SMTP_FROM address".to_string()))?;
        let to: Mailbox = recipient
            .parse()
            .map_err(|_| AppError::validation(format!("Invalid recipient: {}", recipient)))?;

        let content_type = ContentType::parse(document.content_type)
            .map_err(|e| AppError::internal(format!("Attachment content type: {}", e)))?;

        let attachment = Attachment::new(document.filename.clone())
            .body(document.bytes.clone(), content_type);

        Message::builder()
            .from(from)
            .to(to)
            .subject(subject)
            .multipart(
                MultiPart::mixed()
                    .singlepart(SinglePart::plain(body.to_string()))
                    .singlepart(attachment),
            )
            .map_err(|e| AppError::Notification(format!("Message build failed: {}", e)))
    }
}

#[async_trait]
impl NotificationService for SmtpNotifier {
    async fn send_invoice(
        &self,
        recipient: &str,
        subject: &str,
        body: &str,
        document: &GeneratedDocument,
    ) -> Result<()> {
        let message = self.build_message(recipient, subject, body, document)?;

        let transport = SmtpTransport::relay(&self.config.host)
            .map_err(|e| AppError::Notification(format!("SMTP relay: {}", e)))?
            .port(self.config.port)
            .credentials(Credentials::new(
                self.config.username.clone(),
                self.config.password.clone(),
            ))
            .build();

        let recipient_label = recipient.to_string();
        tokio::task::spawn_blocking(move || transport.send(&message))
            .await
            .map_err(|e| AppError::internal(format!("Mail task join: {}", e)))?
            .map_err(|e| AppError::Notification(format!("SMTP send failed: {}", e)))?;

        info!(recipient = %recipient_label, "Invoice email sent");
        Ok(())
    }
}
