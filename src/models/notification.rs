use chrono::{DateTime, Utc};

#[derive(Debug, Clone, PartialEq)]
pub struct Sender {
    pub name: String,
    pub address: String,
}

/// Addressing shared by every notification, fixed at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    pub sender: Sender,
    pub recipient: String,
}

/// Message handed to the mail transport.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub subject: String,
    pub text_body: Option<String>,
    pub html_body: String,
    pub from: Sender,
    pub to: String,
    pub timestamp: DateTime<Utc>,
}
