// Outbound mail seam. Delivery failure is a boolean plus a log entry, never
// an error: the export flows decide what an undelivered batch means.

use std::path::PathBuf;

use email_address::EmailAddress;
use reqwest::Client;
use tracing::{debug, error, warn};

use crate::models::Result;

#[async_trait::async_trait]
pub trait MailSender: Send + Sync {
    async fn send(&self, to: &str, subject: &str, body: &str, attachments: &[PathBuf]) -> bool;
}

#[derive(Debug, Clone)]
pub struct MailgunConfig {
    pub api_key: String,
    pub domain: String,
    pub from_email: String,
    pub from_name: String,
    pub base_url: String,
}

impl MailgunConfig {
    pub fn from_env() -> Result<Self> {
        let domain = std::env::var("MAILGUN_DOMAIN")
            .map_err(|_| "MAILGUN_DOMAIN environment variable required")?;
        Ok(MailgunConfig {
            api_key: std::env::var("MAILGUN_API_KEY")
                .map_err(|_| "MAILGUN_API_KEY environment variable required")?,
            from_email: std::env::var("FROM_EMAIL")
                .unwrap_or_else(|_| format!("contact-sync@{domain}")),
            from_name: std::env::var("FROM_NAME").unwrap_or_else(|_| "Contact Sync".to_string()),
            base_url: "https://api.mailgun.net/v3".to_string(),
            domain,
        })
    }
}

pub struct MailgunSender {
    config: MailgunConfig,
    client: Client,
}

impl MailgunSender {
    pub fn new(config: MailgunConfig) -> Self {
        debug!("created MailgunSender for domain: {}", config.domain);
        Self {
            config,
            client: Client::new(),
        }
    }

    async fn try_send(
        &self,
        to: &str,
        subject: &str,
        body: &str,
        attachments: &[PathBuf],
    ) -> Result<()> {
        if to.is_empty() || !EmailAddress::is_valid(to) {
            return Err(format!("invalid recipient: '{to}'").into());
        }

        let url = format!("{}/{}/messages", self.config.base_url, self.config.domain);
        let mut form = reqwest::multipart::Form::new()
            .text(
                "from",
                format!("{} <{}>", self.config.from_name, self.config.from_email),
            )
            .text("to", to.to_string())
            .text("subject", subject.to_string())
            .text("text", body.to_string());

        for path in attachments {
            let bytes = tokio::fs::read(path).await?;
            let filename = path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("contacts.csv")
                .to_string();
            let part = reqwest::multipart::Part::bytes(bytes)
                .file_name(filename)
                .mime_str("text/csv")?;
            form = form.part("attachment", part);
        }

        debug!("sending mail to {} via {}", to, url);
        let response = self
            .client
            .post(&url)
            .basic_auth("api", Some(&self.config.api_key))
            .multipart(form)
            .send()
            .await?;

        if response.status().is_success() {
            Ok(())
        } else {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            Err(format!("mailgun error ({status}): {text}").into())
        }
    }
}

#[async_trait::async_trait]
impl MailSender for MailgunSender {
    async fn send(&self, to: &str, subject: &str, body: &str, attachments: &[PathBuf]) -> bool {
        match self.try_send(to, subject, body, attachments).await {
            Ok(()) => true,
            Err(e) => {
                error!("mail send failed: {e}");
                false
            }
        }
    }
}

/// Used when no mail credentials are configured. Every send fails, which
/// leaves the affected ledger rows unexported for a later retry.
pub struct DisabledSender;

#[async_trait::async_trait]
impl MailSender for DisabledSender {
    async fn send(&self, to: &str, _subject: &str, _body: &str, _attachments: &[PathBuf]) -> bool {
        warn!("mail sender not configured, cannot deliver to {to}");
        false
    }
}
