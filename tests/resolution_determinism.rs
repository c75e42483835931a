//! Resolution Determinism Tests
//!
//! - The outcome depends on the record's contents, not on append order
//! - A resolved winner always carries the highest configured trust
//! - Equal top trust with different values is never silently decided
//! - Ownership follows the trust table as configured now

use chrono::{DateTime, Duration, TimeZone, Utc};
use extfield::extensions::{ProvenanceEntry, ProvenanceRecord};
use extfield::trust::{ResolutionOutcome, TrustResolver, TrustScore, TrustTable};
use proptest::prelude::*;
use serde_json::{json, Value};

// =============================================================================
// Helper Functions
// =============================================================================

const SOURCES: [&str; 4] = ["allscripts", "cerner", "epic", "hint"];

fn t(secs: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 7, 1, 0, 0, 0).unwrap() + Duration::seconds(secs)
}

fn score(v: f64) -> TrustScore {
    TrustScore::new(v).unwrap()
}

fn entry(ns: &str, value: Value, secs: i64) -> ProvenanceEntry {
    ProvenanceEntry {
        namespace: ns.to_string(),
        field: "phone".to_string(),
        value,
        trust: TrustScore::ZERO,
        timestamp: t(secs),
    }
}

fn record_of(entries: &[ProvenanceEntry]) -> ProvenanceRecord {
    let mut record = ProvenanceRecord::new();
    for e in entries {
        record.append(e.clone());
    }
    record
}

fn table_from(trusts: &[u8]) -> TrustTable {
    SOURCES
        .iter()
        .zip(trusts)
        .fold(TrustTable::new(TrustScore::ZERO), |table, (ns, v)| {
            table.with_namespace_default(ns, score(f64::from(*v) / 10.0))
        })
}

/// Entries with distinct timestamps, so append order cannot matter
fn entries_strategy() -> impl Strategy<Value = Vec<ProvenanceEntry>> {
    proptest::collection::vec((0..4usize, 0..3u8), 1..20).prop_map(|claims| {
        claims
            .into_iter()
            .enumerate()
            .map(|(i, (src, value))| entry(SOURCES[src], json!(format!("555-010{}", value)), i as i64))
            .collect()
    })
}

// =============================================================================
// Examples
// =============================================================================

#[test]
fn test_highest_trust_wins_regardless_of_recency() {
    let record = record_of(&[entry("epic", json!("555-0100"), 0), entry("hint", json!("555-0199"), 60)]);
    let table = TrustTable::new(TrustScore::ZERO)
        .with_namespace_default("epic", score(0.9))
        .with_namespace_default("hint", score(0.6));

    match TrustResolver::resolve(&record, &table) {
        ResolutionOutcome::Resolved { value, namespace, .. } => {
            assert_eq!(value, json!("555-0100"));
            assert_eq!(namespace, "epic");
        }
        other => panic!("expected resolution, got {:?}", other),
    }
}

#[test]
fn test_tie_with_agreement_resolves_to_first_namespace() {
    let record = record_of(&[entry("hint", json!("555-0100"), 0), entry("epic", json!("555-0100"), 1)]);
    let table = TrustTable::new(score(0.5));

    match TrustResolver::resolve(&record, &table) {
        ResolutionOutcome::Resolved { namespace, .. } => assert_eq!(namespace, "epic"),
        other => panic!("expected resolution, got {:?}", other),
    }
}

#[test]
fn test_tie_with_disagreement_needs_review() {
    let record = record_of(&[
        entry("hint", json!("555-0101"), 0),
        entry("epic", json!("555-0100"), 1),
        entry("allscripts", json!("555-0102"), 2),
    ]);
    let table = TrustTable::new(TrustScore::ZERO)
        .with_namespace_default("epic", score(0.7))
        .with_namespace_default("hint", score(0.7))
        .with_namespace_default("allscripts", score(0.2));

    match TrustResolver::resolve(&record, &table) {
        ResolutionOutcome::NeedsReview { candidates } => {
            let names: Vec<&str> = candidates.iter().map(|c| c.namespace.as_str()).collect();
            assert_eq!(names, ["epic", "hint"]);
        }
        other => panic!("expected review, got {:?}", other),
    }
}

#[test]
fn test_table_change_moves_ownership() {
    let record = record_of(&[entry("epic", json!("555-0100"), 0), entry("cerner", json!("555-0111"), 0)]);
    let before = TrustTable::new(TrustScore::ZERO).with_namespace_default("epic", score(0.9));
    let after = TrustTable::new(TrustScore::ZERO).with_namespace_default("cerner", score(0.9));

    let owner = |table: &TrustTable| match TrustResolver::resolve(&record, table) {
        ResolutionOutcome::Resolved { namespace, .. } => namespace,
        other => panic!("expected resolution, got {:?}", other),
    };
    assert_eq!(owner(&before), "epic");
    assert_eq!(owner(&after), "cerner");
}

#[test]
fn test_only_latest_claim_per_source_counts() {
    let record = record_of(&[
        entry("epic", json!("555-0100"), 0),
        entry("cerner", json!("555-0111"), 5),
        entry("epic", json!("555-0111"), 10),
    ]);
    let table = TrustTable::new(score(0.4));

    let outcome = TrustResolver::resolve(&record, &table);
    assert!(outcome.is_resolved());
    assert_eq!(TrustResolver::candidates(&record, &table).len(), 2);
}

#[test]
fn test_empty_record_needs_review() {
    let outcome = TrustResolver::resolve(&ProvenanceRecord::new(), &TrustTable::default());
    assert_eq!(outcome, ResolutionOutcome::NeedsReview { candidates: Vec::new() });
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    /// Shuffling the append order never changes the outcome.
    #[test]
    fn outcome_ignores_append_order(
        (entries, shuffled) in entries_strategy().prop_flat_map(|v| (Just(v.clone()), Just(v).prop_shuffle())),
        trusts in proptest::collection::vec(0..10u8, 4)
    ) {
        let table = table_from(&trusts);
        let a = TrustResolver::resolve(&record_of(&entries), &table);
        let b = TrustResolver::resolve(&record_of(&shuffled), &table);
        prop_assert_eq!(a, b);
    }

    /// A winner has the top trust and agrees with every other top candidate.
    #[test]
    fn winner_holds_top_trust(
        entries in entries_strategy(),
        trusts in proptest::collection::vec(0..10u8, 4)
    ) {
        let table = table_from(&trusts);
        let record = record_of(&entries);
        let candidates = TrustResolver::candidates(&record, &table);
        let top = candidates.iter().map(|c| c.trust).max();

        match TrustResolver::resolve(&record, &table) {
            ResolutionOutcome::Resolved { value, trust, .. } => {
                prop_assert_eq!(Some(trust), top);
                for c in candidates.iter().filter(|c| Some(c.trust) == top) {
                    prop_assert_eq!(&c.value, &value);
                }
            }
            ResolutionOutcome::NeedsReview { candidates: leaders } => {
                prop_assert!(leaders.len() >= 2);
                prop_assert!(leaders.iter().all(|c| Some(c.trust) == top));
                prop_assert!(leaders.iter().any(|c| c.value != leaders[0].value));
            }
        }
    }

    /// Raising one source strictly above the rest hands it the field.
    #[test]
    fn raised_source_takes_ownership(
        entries in entries_strategy(),
        trusts in proptest::collection::vec(0..10u8, 4),
        pick in 0..20usize
    ) {
        let record = record_of(&entries);
        let chosen = entries[pick % entries.len()].namespace.clone();
        let table = table_from(&trusts).with_namespace_default(&chosen, score(2.0));

        match TrustResolver::resolve(&record, &table) {
            ResolutionOutcome::Resolved { namespace, .. } => prop_assert_eq!(namespace, chosen),
            other => prop_assert!(false, "expected resolution, got {:?}", other),
        }
    }

    /// Resolving twice gives the same answer.
    #[test]
    fn resolution_is_repeatable(
        entries in entries_strategy(),
        trusts in proptest::collection::vec(0..10u8, 4)
    ) {
        let table = table_from(&trusts);
        let record = record_of(&entries);
        prop_assert_eq!(
            TrustResolver::resolve(&record, &table),
            TrustResolver::resolve(&record, &table)
        );
    }
}
