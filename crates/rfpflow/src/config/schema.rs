use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::db::default_database_path;
use crate::secrets::{expand_home, SecretRef};

/// Top-level runtime configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Absent means the poller starts disabled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mailbox: Option<MailboxConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub smtp: Option<SmtpConfig>,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseConfig {
    /// SQLite file path; `~` is expanded. Defaults to `~/.rfpflow/data/rfpflow.db`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl DatabaseConfig {
    /// `None` only when no path is configured and the home directory is unknown.
    pub fn resolved_path(&self) -> Option<PathBuf> {
        match self.path.as_deref().filter(|p| !p.is_empty()) {
            Some(path) => Some(PathBuf::from(expand_home(path))),
            None => default_database_path(),
        }
    }
}

/// IMAP inbox that receives vendor replies.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MailboxConfig {
    pub host: String,
    #[serde(default = "default_imap_port")]
    pub port: u16,
    #[serde(default = "default_true")]
    pub use_tls: bool,
    pub username: String,
    pub password: SecretRef,
    #[serde(default = "default_inbox")]
    pub folder: String,
    /// Seconds between scheduled scans.
    #[serde(default = "default_poll_interval")]
    pub poll_interval: u64,
    /// Upper bound on messages handled per scan; the rest wait for the next one.
    #[serde(default = "default_batch_size")]
    pub batch_size: u32,
}

/// SMTP relay used to send RFPs out.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SmtpConfig {
    #[serde(default = "default_smtp_host")]
    pub host: String,
    #[serde(default = "default_smtp_port")]
    pub port: u16,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: SecretRef,
    #[serde(default = "default_from_address")]
    pub from: String,
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            host: default_smtp_host(),
            port: default_smtp_port(),
            username: String::new(),
            password: SecretRef::default(),
            from: default_from_address(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LlmConfig {
    #[serde(default = "default_llm_base_url")]
    pub base_url: String,
    #[serde(default = "default_llm_model")]
    pub model: String,
    #[serde(default = "default_llm_api_key")]
    pub api_key: SecretRef,
    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: default_llm_base_url(),
            model: default_llm_model(),
            api_key: default_llm_api_key(),
            timeout_secs: default_llm_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoggingConfig {
    /// `EnvFilter` directive, e.g. `info` or `rfpflow=debug`.
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

fn default_true() -> bool {
    true
}

fn default_imap_port() -> u16 {
    993
}

fn default_inbox() -> String {
    "INBOX".to_string()
}

fn default_poll_interval() -> u64 {
    60
}

fn default_batch_size() -> u32 {
    50
}

fn default_smtp_host() -> String {
    "smtp.gmail.com".to_string()
}

fn default_smtp_port() -> u16 {
    587
}

fn default_from_address() -> String {
    "rfp@example.com".to_string()
}

fn default_llm_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_llm_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_llm_api_key() -> SecretRef {
    SecretRef::env("GEMINI_API_KEY")
}

fn default_llm_timeout() -> u64 {
    60
}

fn default_log_level() -> String {
    "info".to_string()
}

impl MailboxConfig {
    pub fn new(host: impl Into<String>, username: impl Into<String>, password: SecretRef) -> Self {
        Self {
            host: host.into(),
            port: default_imap_port(),
            use_tls: true,
            username: username.into(),
            password,
            folder: default_inbox(),
            poll_interval: default_poll_interval(),
            batch_size: default_batch_size(),
        }
    }
}
