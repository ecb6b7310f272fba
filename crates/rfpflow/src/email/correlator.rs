//! Maps an inbound reply to the RFP it answers.
//!
//! Explicit identifiers are tried first, in a fixed order, by independent
//! matchers; the first hit wins. Without one, the vendor's recent outbound
//! history is scanned for topical overlap with the subject line, and the
//! most recent send is the last resort.

use std::fmt;
use std::sync::LazyLock;

use chrono::{Duration, Utc};
use regex::Regex;
use thiserror::Error;
use tracing::debug;

use crate::db::email_record_repo::{self, SentContext};
use crate::db::vendor_repo::{self, VendorRow};
use crate::db::{Database, DatabaseError};

use super::parser::InboundEmail;

/// Outbound history window consulted by the fallback.
pub const HISTORY_WINDOW_DAYS: i64 = 30;
/// Maximum outbound records consulted by the fallback.
pub const HISTORY_LIMIT: u32 = 10;
/// Subject tokens that must hit an RFP for a keyword match.
pub const KEYWORD_THRESHOLD: usize = 2;

const UUID: &str = r"[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}";

static RE_LABELED_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"(?i)RFP\s*ID[:\s]+({})", UUID)).unwrap());
static RE_BRACKETED_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"(?i)\[\s*({})\s*\]", UUID)).unwrap());
static RE_ANY_UUID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"(?i)({})", UUID)).unwrap());

/// How an RFP was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchSource {
    /// `RFP ID: <uuid>` anywhere in the message.
    LabeledId,
    /// `[<uuid>]` in the subject.
    BracketedSubject,
    SubjectUuid,
    BodyUuid,
    /// A recent RFP sharing enough subject keywords.
    KeywordOverlap { hits: usize },
    /// The vendor's most recent RFP, with no topical evidence.
    MostRecent,
}

impl fmt::Display for MatchSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchSource::LabeledId => write!(f, "labeled id"),
            MatchSource::BracketedSubject => write!(f, "bracketed subject id"),
            MatchSource::SubjectUuid => write!(f, "subject uuid"),
            MatchSource::BodyUuid => write!(f, "body uuid"),
            MatchSource::KeywordOverlap { hits } => write!(f, "keyword overlap ({} hits)", hits),
            MatchSource::MostRecent => write!(f, "most recent outbound"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Correlation {
    pub vendor: VendorRow,
    /// The identifier exactly as found, or the stored id for history matches.
    pub rfp_id: String,
    pub source: MatchSource,
}

/// Why no RFP could be chosen.
#[derive(Error, Debug)]
pub enum Unresolved {
    #[error("message has no sender address")]
    MissingSender,

    #[error("sender '{0}' is not a known vendor")]
    UnknownVendor(String),

    #[error("no RFP identifier and no sent RFPs to '{0}' in the last 30 days")]
    NoHistory(String),

    #[error("lookup failed: {0}")]
    Lookup(#[from] DatabaseError),
}

type Matcher = fn(&InboundEmail) -> Option<&str>;

/// Identifier matchers in precedence order.
const MATCHERS: &[(MatchSource, Matcher)] = &[
    (MatchSource::LabeledId, labeled_id),
    (MatchSource::BracketedSubject, bracketed_subject_id),
    (MatchSource::SubjectUuid, subject_uuid),
    (MatchSource::BodyUuid, body_uuid),
];

fn first_capture<'a>(re: &Regex, text: &'a str) -> Option<&'a str> {
    re.captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

fn labeled_id(email: &InboundEmail) -> Option<&str> {
    [&email.subject, &email.body, &email.raw]
        .into_iter()
        .find_map(|text| first_capture(&RE_LABELED_ID, text))
}

fn bracketed_subject_id(email: &InboundEmail) -> Option<&str> {
    first_capture(&RE_BRACKETED_ID, &email.subject)
}

fn subject_uuid(email: &InboundEmail) -> Option<&str> {
    first_capture(&RE_ANY_UUID, &email.subject)
}

fn body_uuid(email: &InboundEmail) -> Option<&str> {
    first_capture(&RE_ANY_UUID, &email.body)
}

/// Runs the identifier matchers; first success wins.
pub fn find_rfp_identifier(email: &InboundEmail) -> Option<(String, MatchSource)> {
    MATCHERS
        .iter()
        .find_map(|(source, matcher)| matcher(email).map(|id| (id.to_string(), *source)))
}

/// Picks an RFP from newest-first outbound history by subject overlap.
///
/// A candidate is accepted as soon as it reaches [`KEYWORD_THRESHOLD`]; later,
/// older candidates are not compared even if they would score higher.
pub fn select_by_context(subject: &str, history: &[SentContext]) -> Option<(String, MatchSource)> {
    let subject = subject.to_lowercase();
    let tokens: Vec<&str> = subject.split_whitespace().collect();

    let overlap = history.iter().find_map(|ctx| {
        let category = ctx.rfp.category().unwrap_or_default().to_lowercase();
        let description = ctx.rfp.description_raw.to_lowercase();
        let hits = tokens
            .iter()
            .filter(|token| category.contains(*token) || description.contains(*token))
            .count();
        (hits >= KEYWORD_THRESHOLD)
            .then(|| (ctx.rfp.id.clone(), MatchSource::KeywordOverlap { hits }))
    });

    overlap.or_else(|| {
        history
            .first()
            .map(|ctx| (ctx.rfp.id.clone(), MatchSource::MostRecent))
    })
}

/// Resolves inbound replies against the vendor directory and outbound history.
#[derive(Clone)]
pub struct Correlator {
    db: Database,
}

impl Correlator {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// The sender must be a known vendor before any identifier is considered.
    pub fn correlate(&self, email: &InboundEmail) -> Result<Correlation, Unresolved> {
        let sender = email.from.as_deref().ok_or(Unresolved::MissingSender)?;
        let vendor = vendor_repo::find_by_email(&self.db, sender)?
            .ok_or_else(|| Unresolved::UnknownVendor(sender.to_string()))?;

        if let Some((rfp_id, source)) = find_rfp_identifier(email) {
            return Ok(Correlation {
                vendor,
                rfp_id,
                source,
            });
        }

        debug!(sender = %sender, "no RFP identifier found, trying outbound history");
        let since = Utc::now() - Duration::days(HISTORY_WINDOW_DAYS);
        let history =
            email_record_repo::recent_sent_for_vendor(&self.db, &vendor.id, since, HISTORY_LIMIT)?;

        match select_by_context(&email.subject, &history) {
            Some((rfp_id, source)) => Ok(Correlation {
                vendor,
                rfp_id,
                source,
            }),
            None => Err(Unresolved::NoHistory(sender.to_string())),
        }
    }
}
