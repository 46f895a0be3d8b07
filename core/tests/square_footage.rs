mod common;

use common::*;
use facility_pricing_core::{
    config::EngineConfig,
    frequency::Frequency,
    keys::{BuildingType, ConditionLevel, FloorType, TaskComplexity},
    quote::{AreaDetail, CostBreakdown},
    settings::PricingSettings,
    strategy::SquareFootageStrategy,
};

fn standard_plan() -> PricingSettings {
    EngineConfig::default_test()
        .plan("sqft_standard")
        .cloned()
        .unwrap()
}

#[test]
fn single_neutral_area_prices_at_rate_times_area() {
    let bundle = bundle(vec![area("a1", 1000.0)], vec![]);
    let quote = run(
        &SquareFootageStrategy::new(),
        &bundle,
        &sqft_plan(),
        &request(Frequency::OncePerWeek),
    );

    assert_eq!(quote.areas.len(), 1);
    assert_eq!(quote.areas[0].monthly_amount, 100.0);
    assert_eq!(quote.monthly_total, 100.0);
    assert!(!quote.minimum_applied);
    assert_eq!(quote.strategy_key, "square_footage_v1");
}

#[test]
fn minimum_charge_replaces_a_low_total() {
    let plan = PricingSettings {
        minimum_monthly_charge: 150.0,
        ..sqft_plan()
    };
    let bundle = bundle(vec![area("a1", 1000.0)], vec![]);
    let quote = run(&SquareFootageStrategy::new(), &bundle, &plan, &request(Frequency::OncePerWeek));

    assert!(quote.minimum_applied);
    assert_eq!(quote.monthly_total, 150.0, "floor replaces, never adds");
    assert_eq!(quote.subtotal, 100.0);
}

#[test]
fn total_above_minimum_is_untouched() {
    let plan = PricingSettings {
        minimum_monthly_charge: 50.0,
        ..sqft_plan()
    };
    let bundle = bundle(vec![area("a1", 1000.0)], vec![]);
    let quote = run(&SquareFootageStrategy::new(), &bundle, &plan, &request(Frequency::OncePerWeek));

    assert!(!quote.minimum_applied);
    assert_eq!(quote.monthly_total, 100.0);
}

#[test]
fn subtotal_is_the_sum_of_rounded_rows() {
    // Each row is 3.3335 before rounding: rows round to 3.33, the
    // unrounded sum would round to 10.00.
    let bundle = bundle(
        vec![area("a1", 33.335), area("a2", 33.335), area("a3", 33.335)],
        vec![],
    );
    let quote = run(&SquareFootageStrategy::new(), &bundle, &sqft_plan(), &request(Frequency::OncePerWeek));

    for row in &quote.areas {
        assert_eq!(row.monthly_amount, 3.33);
    }
    assert_eq!(quote.subtotal, 9.99);
    assert_eq!(quote.monthly_total, 9.99);
}

#[test]
fn multipliers_and_add_on_stack_per_area() {
    let mut a = area("a1", 1000.0);
    a.floor_type = FloorType::Carpet;
    a.condition_level = ConditionLevel::Heavy;
    let bundle = bundle(vec![a], vec![]);
    let req = request(Frequency::ThricePerWeek).with_task_complexity(TaskComplexity::Biohazard);

    let quote = run(&SquareFootageStrategy::new(), &bundle, &standard_plan(), &req);

    // 100 × 1.1 × 1.25 × 2.8 × 1.5
    approx(quote.monthly_total, 577.50);
    assert_eq!(quote.task_complexity_add_on, 0.50);
    match &quote.areas[0].detail {
        AreaDetail::SquareFoot {
            floor_multiplier,
            condition_multiplier,
            frequency_multiplier,
            price_before_frequency,
            ..
        } => {
            assert_eq!(*floor_multiplier, 1.1);
            assert_eq!(*condition_multiplier, 1.25);
            assert_eq!(*frequency_multiplier, 2.8);
            approx(*price_before_frequency, 137.50);
        }
        other => panic!("unexpected detail {other:?}"),
    }
}

#[test]
fn building_multiplier_adjusts_the_subtotal() {
    let mut bundle = bundle(vec![area("a1", 1000.0), area("a2", 1000.0)], vec![]);
    bundle.facility.building_type = BuildingType::Medical;

    let quote = run(&SquareFootageStrategy::new(), &bundle, &standard_plan(), &request(Frequency::OncePerWeek));

    assert_eq!(quote.subtotal, 200.0);
    match quote.breakdown {
        CostBreakdown::SquareFoot { building_multiplier, building_adjustment } => {
            assert_eq!(building_multiplier, 1.2);
            approx(building_adjustment, 40.0);
        }
        other => panic!("unexpected breakdown {other:?}"),
    }
    approx(quote.monthly_total, 240.0);
}

#[test]
fn unknown_keys_fall_back_to_neutral_factors() {
    let mut a = area("a1", 1000.0);
    a.floor_type = FloorType::parse("bamboo");
    assert_eq!(a.floor_type, FloorType::Other);
    let mut bundle = bundle(vec![a], vec![]);
    bundle.facility.building_type = BuildingType::parse("stadium");
    let req = request(Frequency::parse("every_full_moon"));

    let quote = run(&SquareFootageStrategy::new(), &bundle, &standard_plan(), &req);

    // floor, building and frequency are all 1.0; the plan minimum is 150
    assert_eq!(quote.subtotal, 100.0);
    assert_eq!(quote.monthly_visits, 4.33);
    assert!(quote.minimum_applied);
    assert_eq!(quote.monthly_total, 150.0);
}

#[test]
fn area_quantity_scales_square_footage() {
    let mut a = area("restroom", 200.0);
    a.quantity = 4;
    let bundle = bundle(vec![a], vec![]);
    let quote = run(&SquareFootageStrategy::new(), &bundle, &sqft_plan(), &request(Frequency::OncePerWeek));

    assert_eq!(quote.areas[0].total_square_feet, 800.0);
    assert_eq!(quote.monthly_total, 80.0);
}

#[test]
fn split_always_sums_to_total() {
    let bundle = bundle(vec![area("a1", 1234.0)], vec![]);
    let quote = run(&SquareFootageStrategy::new(), &bundle, &standard_plan(), &request(Frequency::FivePerWeek));

    assert_eq!(quote.split.payout + quote.split.company_revenue, quote.split.total);
    assert_eq!(quote.split.percentage, 0.60);
}

#[test]
fn snapshot_captures_plan_and_strategy() {
    let bundle = bundle(vec![area("a1", 1000.0)], vec![]);
    let quote = run(
        &SquareFootageStrategy::new(),
        &bundle,
        &standard_plan(),
        &request(Frequency::OncePerWeek).with_workers(3),
    );

    assert_eq!(quote.snapshot.plan_id, "sqft_standard");
    assert_eq!(quote.snapshot.strategy_key, "square_footage_v1");
    assert_eq!(quote.snapshot.base_rate_per_sqft, 0.10);
    assert_eq!(quote.snapshot.worker_count, Some(3));
    assert_eq!(quote.snapshot.captured_at, "2024-03-01T09:30:00Z");
}
