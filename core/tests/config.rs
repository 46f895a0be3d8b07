use facility_pricing_core::{
    config::EngineConfig,
    facility::FacilityBundle,
    settings::PricingType,
    strategy::SQUARE_FOOTAGE_KEY,
};

fn data_dir() -> String {
    format!("{}/../data", env!("CARGO_MANIFEST_DIR"))
}

#[test]
fn shipped_config_loads_and_validates() {
    let config = EngineConfig::load(&data_dir()).unwrap();

    assert_eq!(config.default_strategy_key, SQUARE_FOOTAGE_KEY);
    assert_eq!(config.default_plan_id.as_deref(), Some("sqft_standard"));
    assert_eq!(config.default_subcontractor_pct, 0.60);
    assert_eq!(config.batch_lock_ttl_secs, 900);
    assert_eq!(config.plan("hourly_standard").unwrap().pricing_type, PricingType::Hourly);
    for plan in &config.plans {
        plan.validate().unwrap();
    }
}

#[test]
fn missing_data_dir_is_an_error() {
    let err = EngineConfig::load("/definitely/not/here").unwrap_err();
    assert!(err.to_string().contains("engine_config.json"));
}

#[test]
fn sample_facility_parses() {
    let path = format!("{}/facilities/sample_office.json", data_dir());
    let bundle: FacilityBundle =
        serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();

    assert_eq!(bundle.areas.len(), 3);
    assert_eq!(bundle.facility_wide_tasks().count(), 1);
    assert_eq!(bundle.total_square_feet(), 1200.0 + 4500.0 + 720.0);
}

#[test]
fn test_config_plans_are_valid() {
    for plan in &EngineConfig::default_test().plans {
        plan.validate().unwrap();
    }
}

/// A data dir holding the shipped plans and the given engine config.
fn data_dir_with_engine_config(name: &str, engine_json: &str) -> std::path::PathBuf {
    let dir = std::env::temp_dir().join(format!("pricing-config-{name}-{}", std::process::id()));
    std::fs::create_dir_all(dir.join("engine")).unwrap();
    std::fs::create_dir_all(dir.join("pricing")).unwrap();
    std::fs::copy(
        format!("{}/pricing/plans.json", data_dir()),
        dir.join("pricing/plans.json"),
    )
    .unwrap();
    std::fs::write(dir.join("engine/engine_config.json"), engine_json).unwrap();
    dir
}

#[test]
fn non_positive_lock_ttl_is_rejected_on_load() {
    for ttl in [0, -30] {
        let dir = data_dir_with_engine_config(
            &format!("ttl{ttl}"),
            &format!(r#"{{"batch_lock_ttl_secs": {ttl}}}"#),
        );
        let err = EngineConfig::load(dir.to_str().unwrap()).unwrap_err();
        assert!(err.to_string().contains("batch_lock_ttl_secs"), "{err}");
        let _ = std::fs::remove_dir_all(&dir);
    }
}

#[test]
fn non_positive_proration_cap_is_rejected_on_load() {
    let dir = data_dir_with_engine_config("cap", r#"{"max_proration_days": 0}"#);
    let err = EngineConfig::load(dir.to_str().unwrap()).unwrap_err();
    assert!(err.to_string().contains("max_proration_days"), "{err}");
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn omitted_engine_fields_take_their_defaults() {
    let dir = data_dir_with_engine_config("defaults", "{}");
    let config = EngineConfig::load(dir.to_str().unwrap()).unwrap();
    assert_eq!(config.batch_lock_ttl_secs, 900);
    assert_eq!(config.max_proration_days, 366);
    assert_eq!(config.default_subcontractor_pct, 0.60);
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn engine_bounds_are_checked() {
    assert!(EngineConfig::default_test().validate().is_ok());

    let zero_ttl = EngineConfig { batch_lock_ttl_secs: 0, ..EngineConfig::default_test() };
    assert!(zero_ttl.validate().is_err());

    let bad_pct = EngineConfig { default_subcontractor_pct: 1.5, ..EngineConfig::default_test() };
    assert!(bad_pct.validate().is_err());
}
