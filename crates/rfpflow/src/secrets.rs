//! Credential lookup for the mailbox, SMTP relay and LLM API.
//!
//! A [`SecretRef`] names up to three places a credential may live. They are
//! consulted in order: an inline value, a file (Docker secrets), then an
//! environment variable.

use std::fmt;
use std::fs;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum SecretError {
    #[error("No secret source configured (expected an inline value, a file or an env var)")]
    NoSourceProvided,

    #[error("Failed to read secret file '{path}': {source}")]
    FileRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Environment variable '{name}' is not set")]
    EnvVarNotSet { name: String },

    #[error("Environment variable '{name}' is not valid UTF-8")]
    EnvVarNotUnicode { name: String },
}

pub type Result<T> = std::result::Result<T, SecretError>;

/// Where a credential can be found.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecretRef {
    /// Inline value. Only meant for local experiments.
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "value")]
    pub insecure: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env_var: Option<String>,
}

impl SecretRef {
    pub fn inline(value: impl Into<String>) -> Self {
        Self {
            insecure: Some(value.into()),
            ..Self::default()
        }
    }

    pub fn env(name: impl Into<String>) -> Self {
        Self {
            env_var: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn is_configured(&self) -> bool {
        has_secret_source(
            self.insecure.as_deref(),
            self.file.as_deref(),
            self.env_var.as_deref(),
        )
    }

    pub fn resolve(&self) -> Result<SecretString> {
        resolve_secret(
            self.insecure.as_deref(),
            self.file.as_deref(),
            self.env_var.as_deref(),
        )
    }
}

impl fmt::Debug for SecretRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretRef")
            .field("insecure", &self.insecure.as_ref().map(|_| "[REDACTED]"))
            .field("file", &self.file)
            .field("env_var", &self.env_var)
            .finish()
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|s| !s.is_empty())
}

/// Resolves a credential from the first non-empty source.
///
/// File contents and env values are trimmed, since both commonly carry a
/// trailing newline.
pub fn resolve_secret(
    direct: Option<&str>,
    file_path: Option<&str>,
    env_var: Option<&str>,
) -> Result<SecretString> {
    if let Some(value) = non_empty(direct) {
        return Ok(SecretString::from(value.to_string()));
    }

    if let Some(path) = non_empty(file_path) {
        let expanded = expand_home(path);
        let content = fs::read_to_string(&expanded).map_err(|source| SecretError::FileRead {
            path: expanded.clone(),
            source,
        })?;
        return Ok(SecretString::from(content.trim().to_string()));
    }

    if let Some(name) = non_empty(env_var) {
        return match std::env::var(name) {
            Ok(value) => Ok(SecretString::from(value.trim().to_string())),
            Err(std::env::VarError::NotPresent) => Err(SecretError::EnvVarNotSet {
                name: name.to_string(),
            }),
            Err(std::env::VarError::NotUnicode(_)) => Err(SecretError::EnvVarNotUnicode {
                name: name.to_string(),
            }),
        };
    }

    Err(SecretError::NoSourceProvided)
}

pub fn has_secret_source(
    direct: Option<&str>,
    file_path: Option<&str>,
    env_var: Option<&str>,
) -> bool {
    non_empty(direct).is_some() || non_empty(file_path).is_some() || non_empty(env_var).is_some()
}

/// Expands a leading `~` to the current user's home directory.
///
/// `~user/...` is not supported.
pub fn expand_home(path: &str) -> String {
    if path != "~" && !path.starts_with("~/") {
        return path.to_string();
    }
    match dirs::home_dir() {
        Some(home) => path.replacen('~', &home.to_string_lossy(), 1),
        None => path.to_string(),
    }
}
