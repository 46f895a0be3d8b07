mod common;

use chrono::{Duration, TimeZone, Utc};
use common::*;
use facility_pricing_core::{
    clock::FixedClock,
    engine::PricingEngine,
    error::PricingError,
    facility::ProposalStatus,
    frequency::Frequency,
    proposal::Proposal,
    repository::PricingRepository,
    store::PricingStore,
};
use std::sync::Arc;

fn setup() -> (PricingEngine<PricingStore>, Arc<FixedClock>) {
    let clock = Arc::new(FixedClock::at(Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()));
    let engine = PricingEngine::build_test().unwrap().with_clock(clock.clone());
    let store = engine.repository();
    store.insert_account(&account()).unwrap();
    store
        .insert_facility_bundle(&bundle(vec![area("a1", 2000.0)], vec![]))
        .unwrap();
    store
        .save_proposal(&Proposal::draft("prop-1", ACCOUNT, FACILITY, Frequency::OncePerWeek))
        .unwrap();
    (engine, clock)
}

fn raise_base_rate(engine: &PricingEngine<PricingStore>, rate: f64) {
    let mut plan = engine.repository().pricing_plan("sqft_standard").unwrap().unwrap();
    plan.base_rate_per_sqft = rate;
    engine.repository().upsert_plan(&plan, true).unwrap();
}

#[test]
fn recalculate_records_totals_on_the_draft() {
    let (engine, _) = setup();
    let quote = engine.recalculate_proposal("prop-1").unwrap();
    assert_eq!(quote.monthly_total, 200.0);

    let stored = engine.repository().proposal("prop-1").unwrap().unwrap();
    assert_eq!(stored.monthly_total, Some(200.0));
    assert_eq!(stored.subcontractor_payout, Some(120.0));
    assert_eq!(stored.quoted_plan_id.as_deref(), Some("sqft_standard"));
    assert!(!stored.pricing_locked);
}

#[test]
fn locked_quote_is_byte_stable_after_plan_edits() {
    let (engine, clock) = setup();
    let locked = engine.lock_pricing("prop-1").unwrap();
    assert_eq!(locked.monthly_total, 200.0);

    clock.advance(Duration::days(30));
    raise_base_rate(&engine, 0.25);

    let reread = engine.locked_quote("prop-1").unwrap().unwrap();
    assert_eq!(reread.quote_json, locked.quote_json);
    assert_eq!(reread.snapshot_json, locked.snapshot_json);
    assert_eq!(reread.snapshot().unwrap().base_rate_per_sqft, 0.10);
    assert_eq!(reread.snapshot().unwrap().captured_at, "2024-05-01T12:00:00Z");

    // live quoting now sees the edited plan
    let live = engine.quote(&request(Frequency::OncePerWeek)).unwrap();
    assert_eq!(live.monthly_total, 500.0);
}

#[test]
fn lock_freezes_the_recalculated_quote() {
    let (engine, _) = setup();
    let shown = engine.recalculate_proposal("prop-1").unwrap();
    assert_eq!(shown.monthly_total, 200.0);
    let stored_json = engine
        .repository()
        .proposal("prop-1")
        .unwrap()
        .unwrap()
        .last_quote_json
        .unwrap();

    raise_base_rate(&engine, 0.25);
    let locked = engine.lock_pricing("prop-1").unwrap();

    assert_eq!(locked.monthly_total, 200.0);
    assert_eq!(locked.quote_json, stored_json);
    assert_eq!(locked.snapshot().unwrap().base_rate_per_sqft, 0.10);
    let stored = engine.repository().proposal("prop-1").unwrap().unwrap();
    assert_eq!(stored.monthly_total, Some(200.0));
    assert!(stored.pricing_locked);
}

#[test]
fn lock_requotes_when_inputs_changed_after_recalculation() {
    let (engine, _) = setup();
    engine.recalculate_proposal("prop-1").unwrap();

    let mut edited = engine.repository().proposal("prop-1").unwrap().unwrap();
    edited.service_frequency = Frequency::TwicePerWeek;
    engine.repository().save_proposal(&edited).unwrap();

    let locked = engine.lock_pricing("prop-1").unwrap();
    let quote = locked.quote().unwrap();
    assert_eq!(quote.service_frequency, Frequency::TwicePerWeek);
    assert_eq!(
        engine.repository().proposal("prop-1").unwrap().unwrap().monthly_total,
        Some(locked.monthly_total)
    );
}

#[test]
fn relocking_is_rejected_without_a_second_record() {
    let (engine, _) = setup();
    engine.lock_pricing("prop-1").unwrap();

    let err = engine.lock_pricing("prop-1").unwrap_err();
    assert!(matches!(err, PricingError::PricingLocked { .. }), "{err}");
    assert_eq!(engine.repository().locked_quote_count("prop-1").unwrap(), 1);
}

#[test]
fn recalculating_a_locked_proposal_is_rejected() {
    let (engine, _) = setup();
    engine.lock_pricing("prop-1").unwrap();
    raise_base_rate(&engine, 0.25);

    let err = engine.recalculate_proposal("prop-1").unwrap_err();
    assert!(matches!(err, PricingError::PricingLocked { .. }));

    let stored = engine.repository().proposal("prop-1").unwrap().unwrap();
    assert_eq!(stored.monthly_total, Some(200.0), "totals untouched");
}

#[test]
fn non_draft_proposals_cannot_be_priced() {
    let (engine, _) = setup();
    let mut sent = engine.repository().proposal("prop-1").unwrap().unwrap();
    sent.status = ProposalStatus::Sent;
    engine.repository().save_proposal(&sent).unwrap();

    let err = engine.recalculate_proposal("prop-1").unwrap_err();
    assert!(matches!(err, PricingError::NotEditable { ref status, .. } if status == "sent"));

    let err = engine.lock_pricing("prop-1").unwrap_err();
    assert!(matches!(err, PricingError::NotEditable { .. }));
    assert_eq!(engine.repository().locked_quote_count("prop-1").unwrap(), 0);

    let stored = engine.repository().proposal("prop-1").unwrap().unwrap();
    assert_eq!(stored.monthly_total, None);
    assert!(!stored.pricing_locked);
}

#[test]
fn unlock_then_relock_keeps_history() {
    let (engine, clock) = setup();
    let first = engine.lock_pricing("prop-1").unwrap();

    let unlocked = engine.unlock_pricing("prop-1").unwrap();
    assert!(!unlocked.pricing_locked);

    raise_base_rate(&engine, 0.15);
    clock.advance(Duration::hours(1));
    let second = engine.lock_pricing("prop-1").unwrap();

    assert_ne!(first.lock_id, second.lock_id);
    assert_eq!(second.monthly_total, 300.0);
    assert_eq!(engine.repository().locked_quote_count("prop-1").unwrap(), 2);
    assert_eq!(engine.locked_quote("prop-1").unwrap().unwrap().lock_id, second.lock_id);
}

#[test]
fn unlocking_an_unlocked_proposal_fails() {
    let (engine, _) = setup();
    let err = engine.unlock_pricing("prop-1").unwrap_err();
    assert!(matches!(err, PricingError::NotLocked { .. }));
}

#[test]
fn unknown_proposal_is_reported() {
    let (engine, _) = setup();
    let err = engine.lock_pricing("missing").unwrap_err();
    assert!(matches!(err, PricingError::ProposalNotFound { .. }));
}

#[test]
fn locked_quote_survives_a_reopened_file_store() {
    let dir = std::env::temp_dir().join(format!("pricing-lock-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("lock.db");
    let _ = std::fs::remove_file(&path);

    let store = PricingStore::open(path.to_str().unwrap()).unwrap();
    store.migrate().unwrap();
    let config = facility_pricing_core::config::EngineConfig::default_test();
    for plan in &config.plans {
        store.upsert_plan(plan, plan.plan_id == "sqft_standard").unwrap();
    }
    store.insert_account(&account()).unwrap();
    store
        .insert_facility_bundle(&bundle(vec![area("a1", 2000.0)], vec![]))
        .unwrap();
    store
        .save_proposal(&Proposal::draft("prop-1", ACCOUNT, FACILITY, Frequency::OncePerWeek))
        .unwrap();

    let second = store.reopen().unwrap();
    let engine = PricingEngine::new(store, config);
    let locked = engine.lock_pricing("prop-1").unwrap();

    let reread = second.latest_locked_quote("prop-1").unwrap().unwrap();
    assert_eq!(reread.quote_json, locked.quote_json);
    assert!(second.proposal("prop-1").unwrap().unwrap().pricing_locked);

    drop(engine);
    drop(second);
    let _ = std::fs::remove_dir_all(&dir);
}
