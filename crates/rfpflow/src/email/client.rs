//! IMAP client for the vendor-reply inbox.

use async_imap::Session;
use async_native_tls::TlsConnector;
use async_trait::async_trait;
use futures_util::StreamExt;
use log::{debug, info, warn};
use secrecy::{ExposeSecret, SecretString};

use crate::config::MailboxConfig;

use super::error::{EmailError, Result};
use super::mailbox::Mailbox;

/// TCP stream driven by async-io, the runtime async-imap is built against.
type AsyncTcpStream = async_io::Async<std::net::TcpStream>;

type TlsStream = async_native_tls::TlsStream<AsyncTcpStream>;

/// Password-authenticated IMAPS session.
pub struct ImapClient {
    session: Option<Session<TlsStream>>,
    config: MailboxConfig,
    current_folder: Option<String>,
}

impl ImapClient {
    pub fn new(config: MailboxConfig) -> Self {
        Self {
            session: None,
            config,
            current_folder: None,
        }
    }

    fn password(&self) -> Result<SecretString> {
        if self.config.password.insecure.is_some() {
            warn!("Mailbox password is configured inline; prefer `file` or `envVar`");
        }
        self.config
            .password
            .resolve()
            .map_err(|e| EmailError::CredentialsNotFound(e.to_string()))
    }

    fn session(&mut self) -> Result<&mut Session<TlsStream>> {
        self.session.as_mut().ok_or(EmailError::NotConnected)
    }

}

#[async_trait]
impl Mailbox for ImapClient {
    async fn connect(&mut self) -> Result<()> {
        if self.session.is_some() {
            debug!("Already connected to IMAP server");
            return Ok(());
        }

        if !self.config.use_tls {
            return Err(EmailError::ConfigError(
                "TLS is required for mailbox connections".to_string(),
            ));
        }

        let password = self.password()?;
        let addr = format!("{}:{}", self.config.host, self.config.port);
        info!("Connecting to IMAP server at {}", addr);

        let std_stream = std::net::TcpStream::connect(&addr)
            .map_err(|e| EmailError::ConnectionFailed(e.to_string()))?;
        std_stream
            .set_nonblocking(true)
            .map_err(|e| EmailError::ConnectionFailed(e.to_string()))?;
        let tcp_stream = async_io::Async::new(std_stream)
            .map_err(|e| EmailError::ConnectionFailed(e.to_string()))?;

        let tls_stream = TlsConnector::new()
            .connect(&self.config.host, tcp_stream)
            .await?;

        let session = async_imap::Client::new(tls_stream)
            .login(&self.config.username, password.expose_secret())
            .await
            .map_err(|(e, _)| EmailError::AuthenticationFailed(e.to_string()))?;

        info!("Authenticated to IMAP server as {}", self.config.username);
        self.session = Some(session);
        Ok(())
    }

    async fn select(&mut self, folder: &str) -> Result<()> {
        if self.current_folder.as_deref() == Some(folder) {
            return Ok(());
        }

        let session = self.session()?;
        let mailbox = session.select(folder).await.map_err(|e| {
            let message = e.to_string();
            if message.contains("doesn't exist") || message.contains("NO") {
                EmailError::FolderNotFound(folder.to_string())
            } else {
                EmailError::ProtocolError(message)
            }
        })?;

        debug!("Selected folder '{}' ({} messages)", folder, mailbox.exists);
        self.current_folder = Some(folder.to_string());
        Ok(())
    }

    async fn search_unseen(&mut self) -> Result<Vec<u32>> {
        let session = self.session()?;
        let uids = session
            .uid_search("UNSEEN")
            .await
            .map_err(|e| EmailError::ProtocolError(e.to_string()))?;

        let mut uids: Vec<u32> = uids.into_iter().collect();
        uids.sort_unstable();
        debug!("Found {} unseen messages", uids.len());
        Ok(uids)
    }

    /// Uses `BODY.PEEK[]` so that fetching alone never sets `\Seen`.
    async fn fetch_message(&mut self, uid: u32) -> Result<Vec<u8>> {
        let session = self.session()?;
        let mut body = None;
        {
            let mut messages = session
                .uid_fetch(uid.to_string(), "BODY.PEEK[]")
                .await
                .map_err(|e| EmailError::ProtocolError(e.to_string()))?;

            while let Some(message) = messages.next().await {
                let message = message.map_err(|e| EmailError::ProtocolError(e.to_string()))?;
                if body.is_none() {
                    body = message.body().map(|b| b.to_vec());
                }
            }
        }

        body.ok_or_else(|| EmailError::ProtocolError(format!("Message UID {} has no body", uid)))
    }

    async fn mark_seen(&mut self, uid: u32) -> Result<()> {
        let session = self.session()?;
        let mut updates = session
            .uid_store(uid.to_string(), "+FLAGS (\\Seen)")
            .await
            .map_err(|e| EmailError::ProtocolError(e.to_string()))?;
        while let Some(update) = updates.next().await {
            update.map_err(|e| EmailError::ProtocolError(e.to_string()))?;
        }
        Ok(())
    }
    /// Logs out. Errors are returned but the session is dropped regardless.
    async fn disconnect(&mut self) -> Result<()> {
        self.current_folder = None;
        if let Some(mut session) = self.session.take() {
            info!("Disconnecting from IMAP server");
            session
                .logout()
                .await
                .map_err(|e| EmailError::ProtocolError(e.to_string()))?;
        }
        Ok(())
    }
}

impl Drop for ImapClient {
    fn drop(&mut self) {
        if self.session.is_some() {
            warn!("ImapClient dropped without explicit disconnect");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::secrets::SecretRef;

    fn test_config() -> MailboxConfig {
        MailboxConfig::new(
            "imap.example.com",
            "rfp@example.com",
            SecretRef::env("RFPFLOW_TEST_IMAP_PASSWORD"),
        )
    }

    #[tokio::test]
    async fn test_disconnect_forgets_selected_folder() {
        let mut client = ImapClient::new(test_config());
        client.current_folder = Some("INBOX".to_string());

        client.disconnect().await.unwrap();

        // A reconnect must reselect, so without a session this now fails.
        assert!(matches!(
            client.select("INBOX").await,
            Err(EmailError::NotConnected)
        ));
    }

    #[tokio::test]
    async fn test_tls_required() {
        let mut config = test_config();
        config.use_tls = false;

        let mut client = ImapClient::new(config);
        let result = client.connect().await;
        assert!(matches!(result, Err(EmailError::ConfigError(_))));
    }

    #[tokio::test]
    async fn test_missing_password_fails_before_dialing() {
        let mut client = ImapClient::new(test_config());
        let result = client.connect().await;
        assert!(matches!(result, Err(EmailError::CredentialsNotFound(_))));
    }

    #[tokio::test]
    async fn test_operations_require_connection() {
        let mut client = ImapClient::new(test_config());
        assert!(matches!(
            client.search_unseen().await,
            Err(EmailError::NotConnected)
        ));
        assert!(matches!(
            client.mark_seen(1).await,
            Err(EmailError::NotConnected)
        ));
    }
}
