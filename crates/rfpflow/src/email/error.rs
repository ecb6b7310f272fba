//! Mail pipeline error types.

use thiserror::Error;

/// Errors raised by the mailbox, the parser and the outbound mailer.
#[derive(Error, Debug)]
pub enum EmailError {
    /// Failed to connect to the IMAP server.
    #[error("IMAP connection failed: {0}")]
    ConnectionFailed(String),

    /// TLS/SSL error during connection.
    #[error("TLS error: {0}")]
    TlsError(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// No password could be resolved for the mailbox or relay.
    #[error("Credentials not found: {0}")]
    CredentialsNotFound(String),

    /// IMAP protocol error.
    #[error("IMAP protocol error: {0}")]
    ProtocolError(String),

    /// An operation was attempted before `connect`.
    #[error("Not connected to the mailbox")]
    NotConnected,

    #[error("IMAP folder '{0}' not found")]
    FolderNotFound(String),

    /// The raw message could not be decoded at all.
    #[error("Failed to parse email: {0}")]
    ParseError(String),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    /// SMTP envelope or transport failure.
    #[error("SMTP error: {0}")]
    Smtp(String),

    /// A referenced RFP or vendor does not exist.
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    #[error("Database error: {0}")]
    Database(#[from] crate::db::DatabaseError),
}

impl From<async_native_tls::Error> for EmailError {
    fn from(err: async_native_tls::Error) -> Self {
        EmailError::TlsError(err.to_string())
    }
}

impl From<lettre::error::Error> for EmailError {
    fn from(err: lettre::error::Error) -> Self {
        EmailError::Smtp(err.to_string())
    }
}

/// Result type for email operations.
pub type Result<T> = std::result::Result<T, EmailError>;
