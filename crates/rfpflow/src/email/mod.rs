//! Vendor mail: the IMAP inbox poller and reply correlation on the way in,
//! SMTP dispatch of RFPs on the way out.
//!
//! Inbound flow: [`MailboxPoller`] fetches unseen messages through a
//! [`Mailbox`], hands the raw bytes to [`InboundProcessor`], which parses
//! them into an [`InboundEmail`], asks the [`Correlator`] for a vendor and
//! RFP, and finally builds a proposal.

pub mod client;
pub mod correlator;
pub mod error;
pub mod ingest;
pub mod mailbox;
pub mod parser;
pub mod poller;
pub mod sender;
pub mod template;

pub use client::ImapClient;
pub use correlator::{Correlation, Correlator, MatchSource, Unresolved};
pub use error::EmailError;
pub use ingest::{InboundProcessor, IngestOutcome};
pub use mailbox::Mailbox;
pub use parser::InboundEmail;
pub use poller::{CheckSummary, MailboxPoller, PollSettings, PollerState};
pub use sender::{
    build_smtp_transport, DispatchOutcome, EmailPreview, OutboundTransport, RfpMailer,
};
