use crate::config::EmailConfig;
use crate::error::app_error::AppError;
use crate::models::notification::{Envelope, Notification, Sender};
use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::{Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

/// Delivers a composed notification. Called once per notification, never retried.
#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(&self, notification: &Notification) -> Result<(), AppError>;
}

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailer {
    pub fn new(config: &EmailConfig) -> Result<Self, AppError> {
        let username = config.username().ok_or_else(|| AppError::email("SMTP username is not configured"))?;
        let password = config.password().ok_or_else(|| AppError::email("SMTP password is not configured"))?;

        let creds = Credentials::new(username.to_string(), password.to_string());
        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp_host)
            .map_err(|e| AppError::email(format!("Failed to create SMTP transport: {}", e)))?
            .credentials(creds)
            .port(config.smtp_port)
            .build();

        Ok(Self { transport })
    }
}

fn parse_address(raw: &str, role: &str) -> Result<Address, AppError> {
    raw.trim().parse::<Address>().map_err(|e| AppError::email(format!("Invalid {} address: {}", role, e)))
}

/// Sender and recipient for operator notifications, validated up front so a
/// typo in the configuration shows at startup instead of on every capture.
pub fn envelope(config: &EmailConfig) -> Result<Envelope, AppError> {
    let username = config.username().ok_or_else(|| AppError::email("SMTP username is not configured"))?;
    let recipient = config.recipient().ok_or_else(|| AppError::email("Recipient is not configured"))?;

    Ok(Envelope {
        sender: Sender {
            name: config.from_name.clone(),
            address: parse_address(username, "from")?.to_string(),
        },
        recipient: parse_address(recipient, "to")?.to_string(),
    })
}

fn build_message(notification: &Notification) -> Result<Message, AppError> {
    let from = Mailbox::new(Some(notification.from.name.clone()), parse_address(&notification.from.address, "from")?);
    let to = Mailbox::new(None, parse_address(&notification.to, "to")?);
    let html = SinglePart::builder().header(ContentType::TEXT_HTML).body(notification.html_body.clone());

    let builder = Message::builder().from(from).to(to).subject(notification.subject.clone());
    let message = match &notification.text_body {
        Some(text) => builder.multipart(
            MultiPart::alternative()
                .singlepart(SinglePart::builder().header(ContentType::TEXT_PLAIN).body(text.clone()))
                .singlepart(html),
        ),
        None => builder.singlepart(html),
    };

    message.map_err(|e| AppError::email(format!("Failed to build email: {}", e)))
}

#[async_trait]
impl MailTransport for SmtpMailer {
    async fn send(&self, notification: &Notification) -> Result<(), AppError> {
        let message = build_message(notification)?;

        self.transport
            .send(message)
            .await
            .map_err(|e| AppError::email(format!("Failed to send email: {}", e)))?;

        tracing::info!(to = %notification.to, subject = %notification.subject, "notification email sent");
        Ok(())
    }
}
