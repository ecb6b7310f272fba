//! Decoding of inbound vendor replies.
//!
//! MIME decoding goes through mail-parser. When it cannot make sense of a
//! message, a line-oriented regex pass over the raw source recovers the
//! `From:` address, the `Subject:` and the first `text/plain` part.

use std::sync::LazyLock;

use log::debug;
use mail_parser::MessageParser;
use regex::Regex;

use crate::db::vendor_repo::normalize_email;

static RE_FROM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?mi)^From:[^\r\n]*?<([^>\s]+)>|^From:\s*([^\s<]+)").unwrap()
});
static RE_SUBJECT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?mi)^Subject:[ \t]*([^\r\n]*)").unwrap());
static RE_PLAIN_PART: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)Content-Type:\s*text/plain;.*?\r?\n\r?\n(.*?)(?:\r?\n--|\r?\nContent-Type:|\z)")
        .unwrap()
});

/// The parts of a reply the correlator and proposal builder look at.
#[derive(Debug, Clone, PartialEq)]
pub struct InboundEmail {
    /// Sender address, trimmed and lowercased.
    pub from: Option<String>,
    pub subject: String,
    /// Decoded plain-text body, or the raw source if no text part exists.
    pub body: String,
    /// Undecoded source, kept for identifier search.
    pub raw: String,
}

impl InboundEmail {
    pub fn parse(raw: &[u8]) -> Self {
        let source = String::from_utf8_lossy(raw).into_owned();

        match MessageParser::default().parse(raw) {
            Some(message) => {
                let from = message
                    .from()
                    .and_then(|addrs| addrs.first())
                    .and_then(|addr| addr.address())
                    .map(normalize_email)
                    .or_else(|| from_header(&source));
                let subject = message
                    .subject()
                    .map(|s| s.trim().to_string())
                    .unwrap_or_else(|| subject_header(&source));
                let body = message
                    .body_text(0)
                    .map(|text| text.trim().to_string())
                    .filter(|text| !text.is_empty())
                    .unwrap_or_else(|| plain_text_part(&source));

                Self {
                    from,
                    subject,
                    body,
                    raw: source,
                }
            }
            None => {
                debug!("mail-parser rejected message, falling back to header regexes");
                Self {
                    from: from_header(&source),
                    subject: subject_header(&source),
                    body: plain_text_part(&source),
                    raw: source,
                }
            }
        }
    }
}

fn from_header(source: &str) -> Option<String> {
    let caps = RE_FROM.captures(source)?;
    caps.get(1)
        .or_else(|| caps.get(2))
        .map(|m| normalize_email(m.as_str()))
        .filter(|addr| !addr.is_empty())
}

fn subject_header(source: &str) -> String {
    RE_SUBJECT
        .captures(source)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_default()
}

fn plain_text_part(source: &str) -> String {
    RE_PLAIN_PART
        .captures(source)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_else(|| source.to_string())
}
