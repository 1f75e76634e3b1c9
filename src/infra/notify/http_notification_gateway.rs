use crate::domain::models::notification::OutboundMessage;
use crate::domain::ports::NotificationGateway;
use crate::error::AppError;
use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::error;

pub struct HttpNotificationGateway {
    client: Client,
    api_url: String,
    api_key: String,
}

impl HttpNotificationGateway {
    pub fn new(api_url: String, api_key: String) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| AppError::InternalWithMsg(format!("notification client setup failed: {}", e)))?;

        Ok(Self { client, api_url, api_key })
    }
}

#[derive(Serialize)]
struct AttachmentPayload<'a> {
    filename: &'a str,
    content_base64: String,
}

#[derive(Serialize)]
struct SendPayload<'a> {
    channel: &'a str,
    to: &'a str,
    subject: &'a str,
    text_body: &'a str,
    attachments: Vec<AttachmentPayload<'a>>,
}

#[derive(Deserialize)]
struct SendReceipt {
    message_id: String,
}

#[async_trait]
impl NotificationGateway for HttpNotificationGateway {
    async fn send(&self, message: &OutboundMessage) -> Result<String, AppError> {
        let attachments = message.attachment.iter()
            .map(|a| AttachmentPayload {
                filename: &a.filename,
                content_base64: general_purpose::STANDARD.encode(&a.content),
            })
            .collect();

        let payload = SendPayload {
            channel: message.channel.as_str(),
            to: &message.recipient,
            subject: &message.subject,
            text_body: &message.body,
            attachments,
        };

        let res = self.client.post(&self.api_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                let msg = format!("Notification service connection error: {}", e);
                error!("{}", msg);
                AppError::InternalWithMsg(msg)
            })?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            let msg = format!("Notification service failed. Status: {}, Body: {}", status, text);
            error!("{}", msg);
            return Err(AppError::InternalWithMsg(msg));
        }

        let receipt: SendReceipt = res.json().await.map_err(|e| {
            AppError::InternalWithMsg(format!("Notification service returned an unreadable receipt: {}", e))
        })?;

        Ok(receipt.message_id)
    }
}
