//! The remote inbox as seen by the poller.

use async_trait::async_trait;

use super::error::Result;

/// Minimal IMAP surface the poller needs.
///
/// Message handles are UIDs. Implementations must not set `\Seen` as a side
/// effect of fetching; flags change only through [`Mailbox::mark_seen`].
#[async_trait]
pub trait Mailbox: Send {
    async fn connect(&mut self) -> Result<()>;

    /// Opens `folder` read-write for the rest of the scan.
    async fn select(&mut self, folder: &str) -> Result<()>;

    async fn search_unseen(&mut self) -> Result<Vec<u32>>;

    /// Full RFC 822 source of one message.
    async fn fetch_message(&mut self, uid: u32) -> Result<Vec<u8>>;

    async fn mark_seen(&mut self, uid: u32) -> Result<()>;

    /// Drops the session. A later [`Mailbox::connect`] starts a fresh one and
    /// the next [`Mailbox::select`] must reopen the folder.
    async fn disconnect(&mut self) -> Result<()>;
}
