//! quote-runner: headless quoting for the facility pricing engine.
//!
//! Usage:
//!   quote-runner --facility-file data/facilities/sample_office.json --frequency 5x_week
//!   quote-runner --facility-file f.json --plan hourly_standard --workers 2
//!   quote-runner --facility-file f.json --compare 1x_week,3x_week,5x_week
//!   quote-runner --prorate 310 --start 2024-01-20 --end 2024-02-05
//!   quote-runner --list-strategies

use anyhow::{Context, Result};
use chrono::NaiveDate;
use facility_pricing_core::{
    config::EngineConfig,
    engine::PricingEngine,
    facility::{Account, FacilityBundle},
    frequency::Frequency,
    keys::TaskComplexity,
    proration,
    quote::QuoteRequest,
    store::PricingStore,
};
use std::env;

#[derive(serde::Serialize)]
struct CompareRow {
    frequency: Frequency,
    monthly_visits: f64,
    monthly_total: f64,
    minimum_applied: bool,
    subcontractor_payout: f64,
}

#[derive(serde::Serialize)]
struct ProrationOutput {
    monthly_value: f64,
    start: NaiveDate,
    end: NaiveDate,
    amount: f64,
    segments: Vec<proration::ProrationSegment>,
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let data_dir = arg_str(&args, "--data-dir").unwrap_or("./data");
    let config = EngineConfig::load(data_dir)?;

    if args.iter().any(|a| a == "--list-strategies") {
        let store = open_store(&args, &config)?;
        let engine = PricingEngine::new(store, config);
        println!("{}", serde_json::to_string_pretty(&engine.strategies())?);
        return Ok(());
    }

    if let Some(monthly) = arg_str(&args, "--prorate") {
        return run_proration(&args, monthly, config.max_proration_days);
    }

    let facility_file = arg_str(&args, "--facility-file")
        .context("--facility-file is required (or use --prorate / --list-strategies)")?;
    let content = std::fs::read_to_string(facility_file)
        .with_context(|| format!("Cannot read {facility_file}"))?;
    let bundle: FacilityBundle = serde_json::from_str(&content)
        .with_context(|| format!("Cannot parse {facility_file}"))?;

    let store = open_store(&args, &config)?;
    store.insert_account(&Account {
        account_id: bundle.facility.account_id.clone(),
        name: bundle.facility.account_id.clone(),
        default_strategy_key: None,
        default_pricing_plan_id: None,
    })?;
    store.insert_facility_bundle(&bundle)?;
    log::info!(
        "quote-runner: loaded facility '{}' ({} areas, {} tasks)",
        bundle.facility.facility_id,
        bundle.areas.len(),
        bundle.tasks.len()
    );

    let engine = PricingEngine::new(store, config);
    let request = build_request(&args, &bundle.facility.facility_id);

    match arg_str(&args, "--compare") {
        Some(list) => {
            let frequencies: Vec<Frequency> = list.split(',').map(Frequency::parse).collect();
            let rows: Vec<CompareRow> = engine
                .compare_frequencies(&request, &frequencies)?
                .into_iter()
                .map(|q| CompareRow {
                    frequency: q.service_frequency,
                    monthly_visits: q.monthly_visits,
                    monthly_total: q.monthly_total,
                    minimum_applied: q.minimum_applied,
                    subcontractor_payout: q.split.payout_amount(),
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
        None => {
            let quote = engine.quote(&request)?;
            println!("{}", serde_json::to_string_pretty(&quote)?);
        }
    }
    Ok(())
}

/// Opens `--db` (default in-memory), migrates, and seeds config plans.
fn open_store(args: &[String], config: &EngineConfig) -> Result<PricingStore> {
    let store = match arg_str(args, "--db") {
        Some(path) => PricingStore::open(path)?,
        None => PricingStore::in_memory()?,
    };
    store.migrate()?;
    for plan in &config.plans {
        let is_default = config.default_plan_id.as_deref() == Some(plan.plan_id.as_str());
        store.upsert_plan(plan, is_default)?;
    }
    Ok(store)
}

fn build_request(args: &[String], facility_id: &str) -> QuoteRequest {
    let frequency = Frequency::parse(arg_str(args, "--frequency").unwrap_or("1x_week"));
    let mut request = QuoteRequest::new(facility_id, frequency);
    if let Some(plan) = arg_str(args, "--plan") {
        request = request.with_plan(plan);
    }
    if let Some(key) = arg_str(args, "--strategy") {
        request = request.with_strategy(key);
    }
    if let Some(c) = arg_str(args, "--complexity") {
        request = request.with_task_complexity(TaskComplexity::parse(c));
    }
    let workers = parse_arg(args, "--workers", 0u32);
    if workers > 0 {
        request = request.with_workers(workers);
    }
    let sub_pct = parse_arg(args, "--sub-pct", f64::NAN);
    if sub_pct.is_finite() {
        request = request.with_subcontractor_pct(sub_pct);
    }
    request
}

fn run_proration(args: &[String], monthly: &str, max_days: i64) -> Result<()> {
    let monthly_value: f64 = monthly
        .parse()
        .with_context(|| format!("--prorate expects a monthly amount, got '{monthly}'"))?;
    let start = parse_date(args, "--start")?;
    let end = parse_date(args, "--end")?;
    proration::check_window_cap(start, end, max_days)?;
    let output = ProrationOutput {
        monthly_value,
        start,
        end,
        amount: proration::prorate(monthly_value, start, end)?,
        segments: proration::segments(monthly_value, start, end)?,
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn parse_date(args: &[String], flag: &str) -> Result<NaiveDate> {
    let raw = arg_str(args, flag).with_context(|| format!("{flag} YYYY-MM-DD is required"))?;
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").with_context(|| format!("{flag}: bad date '{raw}'"))
}

fn arg_str<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}
