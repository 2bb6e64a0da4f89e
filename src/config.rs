use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::models::{DedupeMode, DeliveryMode};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub delivery: DeliveryConfig,
    pub export: ExportConfig,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DeliveryConfig {
    pub mode: DeliveryMode,
    pub recipient: String,
    pub subject: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ExportConfig {
    pub dedupe_mode: DedupeMode,
    /// Comma-separated TLD allow-list. Empty string disables the filter.
    pub allowed_tlds: String,
    /// Comma-separated domains treated as personal in split mode.
    pub freemail_domains: String,
    pub split_mode: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    pub ledger_path: String,
    pub csv_directory: String,
    pub submissions_path: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    pub level: String,
}

/// Resolved export settings with the comma-separated lists parsed into
/// lower-cased sets.
#[derive(Debug, Clone)]
pub struct ExportSettings {
    pub dedupe_mode: DedupeMode,
    pub allowed_tlds: HashSet<String>,
    pub freemail_domains: HashSet<String>,
    pub split_mode: bool,
}

impl Config {
    pub fn export_settings(&self) -> ExportSettings {
        ExportSettings {
            dedupe_mode: self.export.dedupe_mode,
            allowed_tlds: parse_list(&self.export.allowed_tlds),
            freemail_domains: parse_list(&self.export.freemail_domains),
            split_mode: self.export.split_mode,
        }
    }
}

fn parse_list(raw: &str) -> HashSet<String> {
    raw.split(',')
        .map(|item| item.trim().to_lowercase())
        .filter(|item| !item.is_empty())
        .collect()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            delivery: DeliveryConfig {
                mode: DeliveryMode::Email,
                recipient: String::new(),
                subject: "Contacts (CSV)".to_string(),
            },
            export: ExportConfig {
                dedupe_mode: DedupeMode::Email,
                allowed_tlds: "se,com,info,nu".to_string(),
                freemail_domains: "gmail.com,outlook.com,hotmail.com,live.com,icloud.com,\
                                   yahoo.com,proton.me,protonmail.com,gmx.com,mail.com"
                    .to_string(),
                split_mode: false,
            },
            storage: StorageConfig {
                ledger_path: "data/ledger.json".to_string(),
                csv_directory: "out".to_string(),
                submissions_path: "history.yml".to_string(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
            },
        }
    }
}

pub async fn load_config(path: &str) -> crate::models::Result<Config> {
    let content = tokio::fs::read_to_string(path).await?;
    let config: Config = serde_yaml::from_str(&content)?;
    Ok(config)
}
