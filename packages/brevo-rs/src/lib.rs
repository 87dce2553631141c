//! Minimal client for Brevo's transactional e-mail endpoint (`POST /v3/smtp/email`).

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

const API_BASE: &str = "https://api.brevo.com";

#[derive(Debug, Clone)]
pub struct BrevoOptions {
    pub api_key: String,
    pub sender_email: String,
    pub sender_name: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum BrevoError {
    #[error("request to Brevo failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Brevo send failed (status={status}): {body}")]
    Rejected { status: StatusCode, body: String },
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct EmailAddress {
    email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SendEmailBody {
    sender: EmailAddress,
    to: Vec<EmailAddress>,
    subject: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    html_content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    text_content: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendEmailResponse {
    pub message_id: Option<String>,
}

/// Outgoing message. At least one of `text` / `html` should be set.
#[derive(Debug, Clone, Default)]
pub struct Email {
    pub to_email: String,
    pub to_name: Option<String>,
    pub subject: String,
    pub text: Option<String>,
    pub html: Option<String>,
}

#[derive(Debug, Clone)]
pub struct BrevoClient {
    options: BrevoOptions,
    client: Client,
    base_url: String,
}

impl BrevoClient {
    pub fn new(options: BrevoOptions) -> Self {
        Self {
            options,
            client: Client::new(),
            base_url: API_BASE.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn body_for(&self, email: Email) -> SendEmailBody {
        SendEmailBody {
            sender: EmailAddress {
                email: self.options.sender_email.clone(),
                name: self.options.sender_name.clone(),
            },
            to: vec![EmailAddress {
                email: email.to_email,
                name: email.to_name,
            }],
            subject: email.subject,
            html_content: email.html,
            text_content: email.text,
        }
    }

    pub async fn send_email(&self, email: Email) -> Result<SendEmailResponse, BrevoError> {
        let url = format!("{}/v3/smtp/email", self.base_url.trim_end_matches('/'));
        let response = self
            .client
            .post(url)
            .header("api-key", &self.options.api_key)
            .header("accept", "application/json")
            .json(&self.body_for(email))
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(response.json::<SendEmailResponse>().await?);
        }

        let body = response.text().await.unwrap_or_default();
        Err(BrevoError::Rejected { status, body })
    }
}
