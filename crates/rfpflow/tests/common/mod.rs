//! Shared test utilities for rfpflow integration tests.
//!
//! This module provides:
//! - `TestHarness` with an in-memory database and wired ingestion pipeline
//! - A scripted mailbox and a stub extractor standing in for IMAP and the LLM
//! - Seed builders for vendors, RFPs and outbound history

pub mod builders;
pub mod harness;

pub use builders::*;
pub use harness::{ScriptedMailbox, SessionLog, StubExtractor, TestHarness};
