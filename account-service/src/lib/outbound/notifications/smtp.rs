use std::sync::Arc;

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::AsyncSmtpTransport;
use lettre::AsyncTransport;
use lettre::Message;
use lettre::Tokio1Executor;

use crate::config::SmtpConfig;
use crate::principal::errors::NotificationError;
use crate::principal::ports::Notification;
use crate::principal::ports::NotificationKind;
use crate::principal::ports::Notifier;

/// SMTP adapter for the notification gateway.
///
/// With an empty host the transport is absent and sends are logged only;
/// useful for development and tests without mail infrastructure.
#[derive(Clone)]
pub struct SmtpNotifier {
    transport: Option<Arc<AsyncSmtpTransport<Tokio1Executor>>>,
    from: Mailbox,
}

impl SmtpNotifier {
    pub fn new(config: &SmtpConfig) -> Result<Self, NotificationError> {
        let from = config
            .from
            .parse::<Mailbox>()
            .map_err(|e| NotificationError::BadRecipient(format!("Invalid from address: {}", e)))?;

        let transport = if config.host.trim().is_empty() {
            tracing::warn!("SMTP host not configured; mailer runs in no-op mode");
            None
        } else {
            let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
                .map_err(|e| NotificationError::SendFailed(format!("SMTP transport: {}", e)))?
                .port(config.port);

            if !config.username.is_empty() {
                builder = builder.credentials(Credentials::new(
                    config.username.clone(),
                    config.password.clone(),
                ));
            }

            Some(Arc::new(builder.build()))
        };

        Ok(Self { transport, from })
    }

    fn render(note: &Notification) -> (String, String) {
        match &note.kind {
            NotificationKind::OtpCode { code } => (
                "Your OTP Code".to_string(),
                format!(
                    "Dear {},\n\nYour OTP code is {}. Please enter this code to \
                     complete your login process.\n\nThanks,\nThe Patshala Team\n",
                    note.recipient_name, code
                ),
            ),
            NotificationKind::PasswordReset { reset_url } => (
                "Reset Your Password".to_string(),
                format!(
                    "Dear {},\n\nWe received a request to reset the password for your \
                     account. Please click on the following link, or paste it into \
                     your browser, to complete the process:\n\n{}\n\nIf you did not \
                     request this, please ignore this email and your password will \
                     remain unchanged.\n\nThanks,\nThe Patshala Team\n",
                    note.recipient_name, reset_url
                ),
            ),
        }
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn send(&self, note: Notification) -> Result<(), NotificationError> {
        let (subject, body) = Self::render(&note);

        let Some(transport) = &self.transport else {
            tracing::info!(
                recipient = %note.recipient,
                subject = %subject,
                "Mailer in no-op mode; message not sent"
            );
            return Ok(());
        };

        let to = note
            .recipient
            .parse::<Mailbox>()
            .map_err(|e| NotificationError::BadRecipient(e.to_string()))?;

        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body)
            .map_err(|e| NotificationError::SendFailed(format!("Message build: {}", e)))?;

        transport
            .send(message)
            .await
            .map(|_| ())
            .map_err(|e| NotificationError::SendFailed(e.to_string()))
    }
}
