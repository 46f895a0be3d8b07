use chrono::{Datelike, NaiveDate};
use facility_pricing_core::{
    error::PricingError,
    numeric::round2,
    proration::{check_window_cap, days_in_month, is_full_month, prorate, segments},
};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64Mcg;

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

#[test]
fn full_month_prorates_to_the_monthly_value() {
    assert_eq!(prorate(310.0, d(2023, 1, 1), d(2023, 1, 31)).unwrap(), 310.0);
    assert_eq!(prorate(199.99, d(2023, 2, 1), d(2023, 2, 28)).unwrap(), 199.99);
    assert_eq!(prorate(450.0, d(2024, 2, 1), d(2024, 2, 29)).unwrap(), 450.0);
    assert!(is_full_month(d(2024, 2, 1), d(2024, 2, 29)));
    assert!(!is_full_month(d(2024, 2, 1), d(2024, 2, 28)));
}

#[test]
fn window_spanning_two_months_is_weighted_per_month() {
    // 310 × 12/31 + 310 × 5/28 = 120 + 55.357…
    let amount = prorate(310.0, d(2023, 1, 20), d(2023, 2, 5)).unwrap();
    assert_eq!(amount, round2(310.0 * 12.0 / 31.0 + 310.0 * 5.0 / 28.0));
    assert_eq!(amount, 175.36);

    let parts = segments(310.0, d(2023, 1, 20), d(2023, 2, 5)).unwrap();
    assert_eq!(parts.len(), 2);
    assert_eq!((parts[0].overlap_days, parts[0].days_in_month), (12, 31));
    assert_eq!((parts[1].overlap_days, parts[1].days_in_month), (5, 28));
}

#[test]
fn leap_february_uses_29_days() {
    let parts = segments(290.0, d(2024, 2, 10), d(2024, 2, 19)).unwrap();
    assert_eq!(parts[0].days_in_month, 29);
    assert_eq!(prorate(290.0, d(2024, 2, 10), d(2024, 2, 19)).unwrap(), 100.0);
    assert_eq!(days_in_month(2023, 2), Some(28));
    assert_eq!(days_in_month(2000, 2), Some(29));
    assert_eq!(days_in_month(1900, 2), Some(28));
}

#[test]
fn single_day_and_year_crossing_windows() {
    assert_eq!(prorate(310.0, d(2023, 3, 15), d(2023, 3, 15)).unwrap(), 10.0);

    let parts = segments(300.0, d(2023, 12, 17), d(2024, 3, 3)).unwrap();
    let months: Vec<(i32, u32)> = parts.iter().map(|s| (s.year, s.month)).collect();
    assert_eq!(months, vec![(2023, 12), (2024, 1), (2024, 2), (2024, 3)]);
    assert_eq!(parts[1].overlap_days, 31);
    assert_eq!(parts[2].overlap_days, 29);
    assert_eq!(parts[3].overlap_days, 3);
}

#[test]
fn inverted_window_is_rejected() {
    let err = prorate(100.0, d(2023, 5, 10), d(2023, 5, 1)).unwrap_err();
    assert!(matches!(err, PricingError::InvalidWindow { .. }));
}

#[test]
fn window_cap_bounds_long_ranges() {
    assert!(check_window_cap(d(2023, 1, 1), d(2023, 12, 31), 366).is_ok());
    assert!(check_window_cap(d(2023, 1, 1), d(2025, 1, 1), 366).is_err());
}

#[test]
fn whole_months_sum_to_the_monthly_value_times_month_count() {
    let mut rng = Pcg64Mcg::seed_from_u64(2024);
    for _ in 0..300 {
        let year = rng.gen_range(1990..2060);
        let month = rng.gen_range(1..=12);
        let span = rng.gen_range(0..12u32);
        let start = d(year, month, 1);
        let end_month = start
            .checked_add_months(chrono::Months::new(span + 1))
            .and_then(|m| m.pred_opt())
            .unwrap();
        let monthly = f64::from(rng.gen_range(1..100_000)) / 100.0;

        let amount = prorate(monthly, start, end_month).unwrap();
        assert!(
            (amount - monthly * f64::from(span + 1)).abs() < 0.011,
            "{start}..{end_month} at {monthly} gave {amount}"
        );
    }
}

#[test]
fn segments_cover_every_day_exactly_once() {
    let mut rng = Pcg64Mcg::seed_from_u64(99);
    for _ in 0..300 {
        let start = d(rng.gen_range(2000..2040), rng.gen_range(1..=12), rng.gen_range(1..=28));
        let end = start + chrono::Duration::days(rng.gen_range(0..400));
        let parts = segments(100.0, start, end).unwrap();

        let covered: i64 = parts.iter().map(|s| i64::from(s.overlap_days)).sum();
        assert_eq!(covered, (end - start).num_days() + 1);
        assert_eq!(parts.first().unwrap().start, start);
        assert_eq!(parts.last().unwrap().end, end);
        for s in &parts {
            assert_eq!(s.start.month(), s.end.month());
            assert!(s.overlap_days <= s.days_in_month);
        }
    }
}
