//! Scheduled and on-demand scans of the vendor-reply inbox.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{Mutex, MutexGuard, Notify};
use tracing::{debug, error, info, info_span, warn, Instrument};

use crate::config::MailboxConfig;

use super::client::ImapClient;
use super::error::EmailError;
use super::ingest::{InboundProcessor, IngestOutcome};
use super::mailbox::Mailbox;

/// Message returned by manual checks while polling is disabled.
pub const DISABLED_MESSAGE: &str = "IMAP client not initialized. Check IMAP configuration.";

/// Result of one scan, as reported to a manual trigger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckSummary {
    pub success: bool,
    pub message: String,
    /// Proposals created during the scan.
    pub processed: usize,
}

impl CheckSummary {
    fn completed(processed: usize) -> Self {
        Self {
            success: true,
            message: format!(
                "Checked for new emails. Processed {} new proposal(s).",
                processed
            ),
            processed,
        }
    }

    fn failed(message: String, processed: usize) -> Self {
        Self {
            success: false,
            message,
            processed,
        }
    }
}

/// Whether the poller has a live mailbox. Decided once at startup.
pub enum PollerState {
    Disabled { reason: String },
    /// The mutex is the inbox lock: one scan at a time per connection.
    Active { mailbox: Mutex<Box<dyn Mailbox>> },
}

#[derive(Debug, Clone)]
pub struct PollSettings {
    pub folder: String,
    pub interval: Duration,
    pub batch_size: usize,
}

impl From<&MailboxConfig> for PollSettings {
    fn from(config: &MailboxConfig) -> Self {
        Self {
            folder: config.folder.clone(),
            interval: Duration::from_secs(config.poll_interval),
            batch_size: config.batch_size as usize,
        }
    }
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            folder: "INBOX".to_string(),
            interval: Duration::from_secs(60),
            batch_size: 50,
        }
    }
}

pub struct MailboxPoller {
    state: PollerState,
    settings: PollSettings,
    processor: InboundProcessor,
    shutdown: AtomicBool,
    wake: Notify,
}

impl MailboxPoller {
    /// Connects to the configured mailbox. Missing configuration or a failed
    /// connection yields a disabled poller rather than an error.
    pub async fn connect(config: Option<&MailboxConfig>, processor: InboundProcessor) -> Self {
        let Some(config) = config else {
            info!("IMAP credentials not configured, email polling disabled");
            return Self::disabled("mailbox not configured", processor);
        };

        let mut client = ImapClient::new(config.clone());
        match client.connect().await {
            Ok(()) => {
                info!(host = %config.host, folder = %config.folder, "IMAP client connected");
                Self::with_mailbox(Box::new(client), PollSettings::from(config), processor)
            }
            Err(e) => {
                error!(host = %config.host, error = %e, "failed to connect to mailbox, email polling disabled");
                Self::disabled(e.to_string(), processor)
            }
        }
    }

    /// Wraps an already connected mailbox.
    pub fn with_mailbox(
        mailbox: Box<dyn Mailbox>,
        settings: PollSettings,
        processor: InboundProcessor,
    ) -> Self {
        Self::from_state(
            PollerState::Active {
                mailbox: Mutex::new(mailbox),
            },
            settings,
            processor,
        )
    }

    pub fn disabled(reason: impl Into<String>, processor: InboundProcessor) -> Self {
        Self::from_state(
            PollerState::Disabled {
                reason: reason.into(),
            },
            PollSettings::default(),
            processor,
        )
    }

    fn from_state(state: PollerState, settings: PollSettings, processor: InboundProcessor) -> Self {
        Self {
            state,
            settings,
            processor,
            shutdown: AtomicBool::new(false),
            wake: Notify::new(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self.state, PollerState::Active { .. })
    }

    /// Manual trigger: waits for the inbox lock, then scans.
    pub async fn check_now(&self) -> CheckSummary {
        match &self.state {
            PollerState::Disabled { .. } => {
                CheckSummary::failed(DISABLED_MESSAGE.to_string(), 0)
            }
            PollerState::Active { mailbox } => {
                let guard = mailbox.lock().await;
                self.scan(guard).await
            }
        }
    }

    /// Timer trigger: skipped when a scan already holds the inbox.
    async fn scheduled_scan(&self) {
        let PollerState::Active { mailbox } = &self.state else {
            return;
        };
        match mailbox.try_lock() {
            Ok(guard) => {
                let summary = self.scan(guard).await;
                if !summary.success {
                    warn!(message = %summary.message, "scheduled mailbox scan failed");
                }
            }
            Err(_) => debug!("mailbox scan already in progress, skipping tick"),
        }
    }

    async fn scan(&self, mut mailbox: MutexGuard<'_, Box<dyn Mailbox>>) -> CheckSummary {
        let span = info_span!("mailbox_scan", folder = %self.settings.folder);
        self.scan_locked(&mut **mailbox).instrument(span).await
    }

    async fn open_inbox(&self, mailbox: &mut dyn Mailbox) -> Result<Vec<u32>, EmailError> {
        mailbox.select(&self.settings.folder).await?;
        mailbox.search_unseen().await
    }

    /// Drops the session and opens a new one. Used once per scan when the
    /// server has closed the connection under us.
    async fn reconnect(&self, mailbox: &mut dyn Mailbox) -> Result<Vec<u32>, EmailError> {
        if let Err(e) = mailbox.disconnect().await {
            debug!(error = %e, "error closing stale IMAP session");
        }
        mailbox.connect().await?;
        let uids = self.open_inbox(mailbox).await?;
        info!("mailbox reconnected");
        Ok(uids)
    }

    async fn scan_locked(&self, mailbox: &mut dyn Mailbox) -> CheckSummary {
        let uids = match self.open_inbox(mailbox).await {
            Ok(uids) => uids,
            Err(e) => {
                warn!(error = %e, "failed to open mailbox, reconnecting");
                match self.reconnect(mailbox).await {
                    Ok(uids) => uids,
                    Err(e) => {
                        error!(error = %e, "failed to search for unseen messages");
                        return CheckSummary::failed(format!("Error checking emails: {}", e), 0);
                    }
                }
            }
        };

        if uids.len() > self.settings.batch_size {
            info!(
                unseen = uids.len(),
                batch = self.settings.batch_size,
                "more unseen messages than batch size, remainder waits for next scan"
            );
        }

        let mut processed = 0;
        for uid in uids.into_iter().take(self.settings.batch_size) {
            let raw = match mailbox.fetch_message(uid).await {
                Ok(raw) => raw,
                Err(e) => {
                    warn!(uid, error = %e, "failed to fetch message, leaving it unseen");
                    continue;
                }
            };

            match self.processor.process(&raw).await {
                Ok(IngestOutcome::ProposalCreated(_)) => processed += 1,
                Ok(IngestOutcome::Unresolved(_)) => {}
                Err(e) => error!(uid, error = %e, "error processing email"),
            }

            if let Err(e) = mailbox.mark_seen(uid).await {
                warn!(uid, error = %e, "failed to flag message as seen");
            }
        }

        info!(processed, "mailbox scan complete");
        CheckSummary::completed(processed)
    }

    /// Scans immediately, then again `interval` after each scan finishes,
    /// until [`MailboxPoller::stop`] is called.
    pub async fn run(&self) {
        if let PollerState::Disabled { reason } = &self.state {
            info!(reason = %reason, "email polling disabled, scheduler not started");
            return;
        }

        loop {
            if self.shutdown.load(Ordering::Acquire) {
                break;
            }

            self.scheduled_scan().await;

            tokio::select! {
                _ = tokio::time::sleep(self.settings.interval) => {},
                _ = self.wake.notified() => {},
            }
        }
        self.disconnect().await;
        info!("email polling stopped");
    }

    /// Logs out of the mailbox, waiting for any scan in progress.
    pub async fn disconnect(&self) {
        let PollerState::Active { mailbox } = &self.state else {
            return;
        };
        if let Err(e) = mailbox.lock().await.disconnect().await {
            warn!(error = %e, "error closing IMAP session");
        }
    }

    /// Signals [`MailboxPoller::run`] to return after the current scan.
    pub fn stop(&self) {
        self.shutdown.store(true, Ordering::Release);
        self.wake.notify_one();
    }
}

/// Spawns the polling loop on the current runtime.
pub fn spawn(poller: Arc<MailboxPoller>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move { poller.run().await })
}
