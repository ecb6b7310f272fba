use std::path::Path;

use crate::config::schema::{AppConfig, LlmConfig, LogFormat, MailboxConfig, SmtpConfig};
use crate::error::ConfigError;
use crate::secrets::SecretRef;

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    load_config_from_str(&content)
}

pub fn load_config_from_str(content: &str) -> Result<AppConfig, ConfigError> {
    let config: AppConfig = serde_yaml::from_str(content)?;
    validate_config(&config)?;
    Ok(config)
}

pub fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    if let Some(mailbox) = &config.mailbox {
        if mailbox.host.trim().is_empty() {
            return Err(invalid("mailbox.host must not be empty"));
        }
        if mailbox.port == 0 {
            return Err(invalid("mailbox.port must be non-zero"));
        }
        if mailbox.folder.trim().is_empty() {
            return Err(invalid("mailbox.folder must not be empty"));
        }
        if mailbox.poll_interval == 0 {
            return Err(invalid("mailbox.pollInterval must be at least 1 second"));
        }
        if mailbox.batch_size == 0 {
            return Err(invalid("mailbox.batchSize must be non-zero"));
        }
        if !mailbox.password.is_configured() {
            return Err(invalid(
                "mailbox.password requires one of: insecure, file, or envVar",
            ));
        }
    }

    if let Some(smtp) = &config.smtp {
        if smtp.port == 0 {
            return Err(invalid("smtp.port must be non-zero"));
        }
        if smtp.from.parse::<lettre::message::Mailbox>().is_err() {
            return Err(ConfigError::InvalidValue {
                key: "smtp.from".to_string(),
                value: smtp.from.clone(),
            });
        }
    }

    if config.llm.model.trim().is_empty() {
        return Err(invalid("llm.model must not be empty"));
    }
    if config.llm.timeout_secs == 0 {
        return Err(invalid("llm.timeoutSecs must be non-zero"));
    }

    Ok(())
}

fn invalid(message: &str) -> ConfigError {
    ConfigError::Validation {
        message: message.to_string(),
    }
}

impl AppConfig {
    /// Builds configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_with(|key| std::env::var(key).ok())
    }

    /// Builds configuration from an arbitrary variable lookup.
    ///
    /// Blank values count as unset. The mailbox section is only produced when
    /// host, user and password are all present.
    pub fn from_env_with<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let mut config = AppConfig::default();
        config.database.path = var("DATABASE_PATH");

        if let (Some(host), Some(user), Some(pass)) =
            (var("IMAP_HOST"), var("IMAP_USER"), var("IMAP_PASS"))
        {
            let mut mailbox = MailboxConfig::new(host, user, SecretRef::inline(pass));
            if let Some(port) = var("IMAP_PORT") {
                mailbox.port = parse_number("IMAP_PORT", &port)?;
            }
            config.mailbox = Some(mailbox);
        }

        let smtp_user = var("SMTP_USER");
        let smtp_pass = var("SMTP_PASS");
        if smtp_user.is_some() || smtp_pass.is_some() || var("SMTP_HOST").is_some() {
            let mut smtp = SmtpConfig::default();
            if let Some(host) = var("SMTP_HOST") {
                smtp.host = host;
            }
            if let Some(port) = var("SMTP_PORT") {
                smtp.port = parse_number("SMTP_PORT", &port)?;
            }
            smtp.username = smtp_user.unwrap_or_default();
            if let Some(pass) = smtp_pass {
                smtp.password = SecretRef::inline(pass);
            }
            if let Some(from) = var("SMTP_FROM") {
                smtp.from = from;
            }
            config.smtp = Some(smtp);
        }

        config.llm = LlmConfig {
            api_key: match var("GEMINI_API_KEY") {
                Some(key) => SecretRef::inline(key),
                None => LlmConfig::default().api_key,
            },
            model: var("GEMINI_MODEL").unwrap_or_else(|| LlmConfig::default().model),
            ..LlmConfig::default()
        };

        if let Some(level) = var("RUST_LOG") {
            config.logging.level = level;
        }
        if let Some(format) = var("RFPFLOW_LOG_FORMAT") {
            config.logging.format = match format.to_ascii_lowercase().as_str() {
                "text" => LogFormat::Text,
                "json" => LogFormat::Json,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        key: "RFPFLOW_LOG_FORMAT".to_string(),
                        value: format,
                    })
                }
            };
        }

        validate_config(&config)?;
        Ok(config)
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_load_full_config() {
        let yaml = r#"
database:
  path: /var/lib/rfpflow/rfpflow.db
mailbox:
  host: imap.example.com
  username: rfp@example.com
  password:
    envVar: IMAP_PASS
  pollInterval: 120
smtp:
  username: rfp@example.com
  password:
    file: /run/secrets/smtp
  from: "Procurement <rfp@example.com>"
llm:
  model: gemini-2.5-pro
logging:
  level: debug
  format: json
"#;
        let config = load_config_from_str(yaml).unwrap();
        let mailbox = config.mailbox.unwrap();
        assert_eq!(mailbox.poll_interval, 120);
        assert_eq!(mailbox.port, 993);
        assert_eq!(config.smtp.unwrap().port, 587);
        assert_eq!(config.llm.model, "gemini-2.5-pro");
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = load_config_from_str("{}").unwrap();
        assert!(config.mailbox.is_none());
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_unknown_log_format_rejected() {
        let result = load_config_from_str("logging:\n  format: xml\n");
        assert!(matches!(result, Err(ConfigError::ParseYaml(_))));
    }

    #[test]
    fn test_zero_poll_interval_rejected() {
        let yaml = r#"
mailbox:
  host: imap.example.com
  username: rfp@example.com
  password: { insecure: secret }
  pollInterval: 0
"#;
        assert!(matches!(
            load_config_from_str(yaml),
            Err(ConfigError::Validation { .. })
        ));
    }

    #[test]
    fn test_empty_folder_rejected() {
        let yaml = r#"
mailbox:
  host: imap.example.com
  username: rfp@example.com
  password: { insecure: secret }
  folder: ""
"#;
        assert!(load_config_from_str(yaml).is_err());
    }

    #[test]
    fn test_mailbox_without_password_source_rejected() {
        let yaml = "mailbox:\n  host: imap.example.com\n  username: a@b.c\n  password: {}\n";
        assert!(load_config_from_str(yaml).is_err());
    }

    #[test]
    fn test_load_config_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "llm:\n  timeoutSecs: 30").unwrap();
        let config = load_config(file.path()).unwrap();
        assert_eq!(config.llm.timeout_secs, 30);
    }

    #[test]
    fn test_missing_file() {
        let result = load_config("/nonexistent/rfpflow.yaml");
        assert!(matches!(result, Err(ConfigError::ReadFile { .. })));
    }

    #[test]
    fn test_from_env_full() {
        let config = AppConfig::from_env_with(env(&[
            ("IMAP_HOST", "imap.gmail.com"),
            ("IMAP_USER", "rfp@example.com"),
            ("IMAP_PASS", "app-password"),
            ("IMAP_PORT", "1993"),
            ("SMTP_USER", "rfp@example.com"),
            ("SMTP_PASS", "smtp-password"),
            ("GEMINI_API_KEY", "key"),
            ("RUST_LOG", "rfpflow=debug"),
        ]))
        .unwrap();

        let mailbox = config.mailbox.unwrap();
        assert_eq!(mailbox.host, "imap.gmail.com");
        assert_eq!(mailbox.port, 1993);
        let smtp = config.smtp.unwrap();
        assert_eq!(smtp.host, "smtp.gmail.com");
        assert_eq!(smtp.port, 587);
        assert_eq!(smtp.from, "rfp@example.com");
        assert_eq!(config.llm.api_key, SecretRef::inline("key"));
        assert_eq!(config.llm.model, "gemini-2.5-flash");
        assert_eq!(config.logging.level, "rfpflow=debug");
    }

    #[test]
    fn test_from_env_partial_imap_disables_mailbox() {
        let config = AppConfig::from_env_with(env(&[
            ("IMAP_HOST", "imap.gmail.com"),
            ("IMAP_USER", "rfp@example.com"),
            ("IMAP_PASS", "   "),
        ]))
        .unwrap();
        assert!(config.mailbox.is_none());
        assert!(config.smtp.is_none());
    }

    #[test]
    fn test_from_env_bad_port() {
        let result = AppConfig::from_env_with(env(&[
            ("IMAP_HOST", "h"),
            ("IMAP_USER", "u"),
            ("IMAP_PASS", "p"),
            ("IMAP_PORT", "imaps"),
        ]));
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn test_from_env_runs_validation() {
        let result = AppConfig::from_env_with(env(&[
            ("IMAP_HOST", "h"),
            ("IMAP_USER", "u"),
            ("IMAP_PASS", "p"),
            ("IMAP_PORT", "0"),
        ]));
        assert!(matches!(result, Err(ConfigError::Validation { .. })));
    }

    #[test]
    fn test_from_env_bad_log_format() {
        let result = AppConfig::from_env_with(env(&[("RFPFLOW_LOG_FORMAT", "xml")]));
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }
}
