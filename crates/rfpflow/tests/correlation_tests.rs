//! Correlation of inbound replies against the vendor directory and
//! outbound history, through a real database.

mod common;

use common::*;
use rfpflow::email::{InboundEmail, MatchSource, Unresolved};

fn parse(from: &str, subject: &str, body: &str) -> InboundEmail {
    InboundEmail::parse(&raw_email(from, subject, body))
}

#[test]
fn test_labeled_identifier_resolves_to_literal_uuid() {
    let h = TestHarness::new();
    seed_vendor(&h.db, "Acme", "sales@acme.test");
    let rfp = seed_rfp(&h.db, "20 laptops", "Laptops");

    let email = parse(
        "Acme Sales <sales@acme.test>",
        "Quotation",
        &format!("Please find our offer.\nRFP ID: {}\nRegards", rfp.id),
    );
    let correlation = h.correlator().correlate(&email).unwrap();

    assert_eq!(correlation.rfp_id, rfp.id);
    assert_eq!(correlation.source, MatchSource::LabeledId);
    assert_eq!(correlation.vendor.email, "sales@acme.test");
}

#[test]
fn test_bracketed_subject_uuid() {
    let h = TestHarness::new();
    seed_vendor(&h.db, "Acme", "sales@acme.test");
    let rfp = seed_rfp(&h.db, "20 laptops", "Laptops");

    let email = parse(
        "sales@acme.test",
        &format!("Re: RFP [{}]", rfp.id),
        "Our price is attached.",
    );
    let correlation = h.correlator().correlate(&email).unwrap();

    assert_eq!(correlation.rfp_id, rfp.id);
    assert_eq!(correlation.source, MatchSource::BracketedSubject);
}

#[test]
fn test_labeled_identifier_beats_bracketed_subject() {
    let h = TestHarness::new();
    seed_vendor(&h.db, "Acme", "sales@acme.test");
    let labeled = seed_rfp(&h.db, "20 laptops", "Laptops");
    let bracketed = seed_rfp(&h.db, "15 chairs", "Office Chairs");

    let email = parse(
        "sales@acme.test",
        &format!("Re: [{}]", bracketed.id),
        &format!("RFP ID: {}", labeled.id),
    );
    let correlation = h.correlator().correlate(&email).unwrap();

    assert_eq!(correlation.rfp_id, labeled.id);
    assert_eq!(correlation.source, MatchSource::LabeledId);
}

#[test]
fn test_recent_history_selects_most_recent_laptop_rfp() {
    let h = TestHarness::new();
    let vendor = seed_vendor(&h.db, "Acme", "sales@acme.test");
    let laptops = seed_rfp(&h.db, "Need 20 laptops for the new office", "Laptops");
    let chairs = seed_rfp(&h.db, "Need 15 ergonomic chairs", "Office Chairs");
    seed_sent(&h.db, &laptops, &vendor, 1);
    seed_sent(&h.db, &chairs, &vendor, 10);

    let email = parse("sales@acme.test", "Re: Laptops quotation", "Price: 50,000");
    let correlation = h.correlator().correlate(&email).unwrap();

    assert_eq!(correlation.rfp_id, laptops.id);
    assert!(matches!(
        correlation.source,
        MatchSource::KeywordOverlap { .. } | MatchSource::MostRecent
    ));
}

#[test]
fn test_first_candidate_over_threshold_wins() {
    let h = TestHarness::new();
    let vendor = seed_vendor(&h.db, "Acme", "sales@acme.test");
    let newer = seed_rfp(&h.db, "office chairs", "Office Chairs");
    let older = seed_rfp(&h.db, "office chairs and desks for the office", "Office Chairs");
    seed_sent(&h.db, &newer, &vendor, 2);
    seed_sent(&h.db, &older, &vendor, 5);

    let email = parse("sales@acme.test", "office chairs desks", "see attached");
    let correlation = h.correlator().correlate(&email).unwrap();

    assert_eq!(correlation.rfp_id, newer.id);
    assert_eq!(correlation.source, MatchSource::KeywordOverlap { hits: 2 });
}

#[test]
fn test_history_older_than_window_is_ignored() {
    let h = TestHarness::new();
    let vendor = seed_vendor(&h.db, "Acme", "sales@acme.test");
    let rfp = seed_rfp(&h.db, "20 laptops", "Laptops");
    seed_sent(&h.db, &rfp, &vendor, 45);

    let email = parse("sales@acme.test", "Re: Laptops quotation", "Price: 50,000");
    let err = h.correlator().correlate(&email).unwrap_err();

    assert!(matches!(err, Unresolved::NoHistory(_)));
}

#[test]
fn test_no_history_is_unresolvable() {
    let h = TestHarness::new();
    seed_vendor(&h.db, "Acme", "sales@acme.test");

    let email = parse("sales@acme.test", "Re: quotation", "Price: 100");
    let err = h.correlator().correlate(&email).unwrap_err();

    assert!(matches!(err, Unresolved::NoHistory(ref s) if s == "sales@acme.test"));
}

#[test]
fn test_unknown_sender_is_unresolvable() {
    let h = TestHarness::new();
    let rfp = seed_rfp(&h.db, "20 laptops", "Laptops");

    let email = parse(
        "stranger@elsewhere.test",
        &format!("Re: [{}]", rfp.id),
        "Price: 100",
    );
    let err = h.correlator().correlate(&email).unwrap_err();

    assert!(matches!(err, Unresolved::UnknownVendor(_)));
}

#[test]
fn test_sender_lookup_ignores_case() {
    let h = TestHarness::new();
    seed_vendor(&h.db, "Acme", "sales@acme.test");
    let rfp = seed_rfp(&h.db, "20 laptops", "Laptops");

    let email = parse(
        "Acme <Sales@ACME.test>",
        &format!("Re: [{}]", rfp.id),
        "Price: 100",
    );
    assert!(h.correlator().correlate(&email).is_ok());
}
