pub mod ai;
pub mod config;
pub mod db;
pub mod email;
pub mod error;
pub mod proposal;
pub mod secrets;

pub use ai::{AiService, EmailWriter, GeminiClient, ProposalExtractor, ProposalRanker};
pub use config::{load_config, AppConfig};
pub use db::{Database, DatabaseError};
pub use email::{Correlator, InboundProcessor, MailboxPoller, RfpMailer};
pub use error::{ConfigError, Result, RfpflowError};
pub use proposal::{compare_proposals, ProposalBuilder, ProposalError};
pub use secrets::{resolve_secret, SecretError, SecretRef};
