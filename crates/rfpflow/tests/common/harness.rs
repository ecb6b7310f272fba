//! Test harness for isolated pipeline execution.

#![allow(dead_code)]

use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use rfpflow::ai::error::Result as AiResult;
use rfpflow::ai::{AiError, ProposalExtractor, StructuredProposal};
use rfpflow::db::Database;
use rfpflow::email::error::{EmailError, Result as EmailResult};
use rfpflow::email::{Correlator, InboundProcessor, Mailbox, MailboxPoller, PollSettings};
use rfpflow::proposal::ProposalBuilder;

/// Session calls observed by a [`ScriptedMailbox`].
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SessionLog {
    pub connects: usize,
    pub disconnects: usize,
}

/// In-memory inbox. Flags and session calls are shared with the test through
/// `seen` and `sessions`.
pub struct ScriptedMailbox {
    messages: BTreeMap<u32, Vec<u8>>,
    unreadable: HashSet<u32>,
    seen: Arc<Mutex<Vec<u32>>>,
    sessions: Arc<Mutex<SessionLog>>,
    selected: Option<String>,
    connected: bool,
    search_broken: bool,
}

impl ScriptedMailbox {
    pub fn new(seen: Arc<Mutex<Vec<u32>>>, sessions: Arc<Mutex<SessionLog>>) -> Self {
        Self {
            messages: BTreeMap::new(),
            unreadable: HashSet::new(),
            seen,
            sessions,
            selected: None,
            connected: true,
            search_broken: false,
        }
    }

    /// The server has dropped the connection but the folder still looks
    /// selected. Searches fail until the next `connect`.
    pub fn with_dropped_session(mut self) -> Self {
        self.selected = Some("INBOX".to_string());
        self.connected = false;
        self
    }

    /// Every search fails, even on a fresh session.
    pub fn with_broken_search(mut self) -> Self {
        self.search_broken = true;
        self
    }

    pub fn with_message(mut self, uid: u32, raw: Vec<u8>) -> Self {
        self.messages.insert(uid, raw);
        self
    }

    /// Listed as unseen, but every fetch fails.
    pub fn with_unreadable(mut self, uid: u32) -> Self {
        self.messages.insert(uid, Vec::new());
        self.unreadable.insert(uid);
        self
    }
}

#[async_trait]
impl Mailbox for ScriptedMailbox {
    async fn connect(&mut self) -> EmailResult<()> {
        self.sessions.lock().unwrap().connects += 1;
        self.connected = true;
        Ok(())
    }

    async fn select(&mut self, folder: &str) -> EmailResult<()> {
        if self.selected.as_deref() == Some(folder) {
            return Ok(());
        }
        if !self.connected {
            return Err(EmailError::NotConnected);
        }
        self.selected = Some(folder.to_string());
        Ok(())
    }

    async fn search_unseen(&mut self) -> EmailResult<Vec<u32>> {
        if self.search_broken {
            return Err(EmailError::ProtocolError("SEARCH failed".to_string()));
        }
        if !self.connected {
            return Err(EmailError::ProtocolError("connection reset".to_string()));
        }
        if self.selected.is_none() {
            return Err(EmailError::ProtocolError("no folder selected".to_string()));
        }
        let seen = self.seen.lock().unwrap();
        Ok(self
            .messages
            .keys()
            .copied()
            .filter(|uid| !seen.contains(uid))
            .collect())
    }

    async fn fetch_message(&mut self, uid: u32) -> EmailResult<Vec<u8>> {
        if self.unreadable.contains(&uid) {
            return Err(EmailError::ProtocolError(format!("fetch of {} failed", uid)));
        }
        self.messages
            .get(&uid)
            .cloned()
            .ok_or_else(|| EmailError::ProtocolError(format!("no message {}", uid)))
    }

    async fn mark_seen(&mut self, uid: u32) -> EmailResult<()> {
        self.seen.lock().unwrap().push(uid);
        Ok(())
    }

    async fn disconnect(&mut self) -> EmailResult<()> {
        self.sessions.lock().unwrap().disconnects += 1;
        self.connected = false;
        self.selected = None;
        Ok(())
    }
}

/// Extractor returning a fixed proposal and recording the bodies it saw.
/// Setting `fail` makes every extraction return an error instead.
#[derive(Default)]
pub struct StubExtractor {
    pub bodies: Mutex<Vec<String>>,
    pub fail: AtomicBool,
}

#[async_trait]
impl ProposalExtractor for StubExtractor {
    async fn extract(&self, email_body: &str) -> AiResult<StructuredProposal> {
        self.bodies.lock().unwrap().push(email_body.to_string());
        if self.fail.load(Ordering::SeqCst) {
            return Err(AiError::EmptyResponse);
        }
        Ok(StructuredProposal {
            price: Some(140_500.0),
            delivery_days: Some(10.0),
            completeness: Some(60.0),
            ..Default::default()
        })
    }
}

/// In-memory database plus the ingestion pipeline wired to a stub extractor.
pub struct TestHarness {
    pub db: Database,
    pub extractor: Arc<StubExtractor>,
    pub seen: Arc<Mutex<Vec<u32>>>,
    pub sessions: Arc<Mutex<SessionLog>>,
}

impl TestHarness {
    pub fn new() -> Self {
        Self {
            db: Database::open_in_memory().unwrap(),
            extractor: Arc::new(StubExtractor::default()),
            seen: Arc::new(Mutex::new(Vec::new())),
            sessions: Arc::new(Mutex::new(SessionLog::default())),
        }
    }

    pub fn correlator(&self) -> Correlator {
        Correlator::new(self.db.clone())
    }

    pub fn processor(&self) -> InboundProcessor {
        InboundProcessor::new(
            self.correlator(),
            ProposalBuilder::new(self.db.clone(), self.extractor.clone()),
        )
    }

    pub fn mailbox(&self) -> ScriptedMailbox {
        ScriptedMailbox::new(self.seen.clone(), self.sessions.clone())
    }

    pub fn poller(&self, mailbox: ScriptedMailbox) -> MailboxPoller {
        MailboxPoller::with_mailbox(Box::new(mailbox), PollSettings::default(), self.processor())
    }

    pub fn seen_uids(&self) -> Vec<u32> {
        self.seen.lock().unwrap().clone()
    }

    pub fn session_log(&self) -> SessionLog {
        self.sessions.lock().unwrap().clone()
    }
}
