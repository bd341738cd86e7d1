//! Outgoing email.

use async_trait::async_trait;
use aws_sdk_sesv2::error::DisplayErrorContext;
use aws_sdk_sesv2::types::{Body, Content, Destination, EmailContent, Message};

use super::UpstreamError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
    pub html: String,
}

#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), UpstreamError>;
}

pub struct SesEmailSender {
    client: aws_sdk_sesv2::Client,
}

impl SesEmailSender {
    pub fn new(shared: &aws_config::SdkConfig, region: &str) -> Self {
        let config = aws_sdk_sesv2::config::Builder::from(shared)
            .region(aws_sdk_sesv2::config::Region::new(region.to_string()))
            .build();
        Self {
            client: aws_sdk_sesv2::Client::from_conf(config),
        }
    }
}

fn utf8(data: &str) -> Result<Content, UpstreamError> {
    Content::builder()
        .data(data)
        .charset("UTF-8")
        .build()
        .map_err(|e| UpstreamError::Email(e.to_string()))
}

#[async_trait]
impl EmailSender for SesEmailSender {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), UpstreamError> {
        let message = Message::builder()
            .subject(utf8(&email.subject)?)
            .body(Body::builder().html(utf8(&email.html)?).build())
            .build();
        let destination = Destination::builder()
            .set_to_addresses(Some(email.to.clone()))
            .build();

        let output = self
            .client
            .send_email()
            .from_email_address(&email.from)
            .destination(destination)
            .content(EmailContent::builder().simple(message).build())
            .send()
            .await
            .map_err(|e| UpstreamError::Email(DisplayErrorContext(&e).to_string()))?;

        tracing::debug!(message_id = ?output.message_id(), to = ?email.to, "Email sent");
        Ok(())
    }
}
