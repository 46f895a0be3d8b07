//! Pricing strategy trait and the shared quote-finishing step.
//!
//! RULE: A strategy is a pure function of its `QuoteInput`.
//! It never fetches anything; the engine hands it records that
//! were already loaded. Two quotes computed from equal inputs are
//! equal, so strategies may run concurrently over shared data.

pub mod per_hour;
pub mod square_footage;

use crate::{
    error::PricingResult,
    facility::FacilityBundle,
    quote::{
        apply_minimum, resolve_subcontractor_pct, AreaQuoteRow, CostBreakdown, QuoteRequest,
        QuoteResult, SubcontractorSplit,
    },
    settings::{PricingSettings, PricingType},
    snapshot::SettingsSnapshot,
    types::{Money, StrategyKey},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use per_hour::{PerHourStrategy, PER_HOUR_KEY};
pub use square_footage::{SquareFootageStrategy, SQUARE_FOOTAGE_KEY};

/// Static registration data for a strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyMetadata {
    pub key: StrategyKey,
    pub name: String,
    pub version: String,
    pub description: String,
    /// The plan type this strategy prices.
    pub pricing_type: PricingType,
    pub is_default: bool,
    pub is_active: bool,
}

/// Everything a strategy reads.
#[derive(Debug, Clone, Copy)]
pub struct QuoteInput<'a> {
    pub bundle: &'a FacilityBundle,
    pub settings: &'a PricingSettings,
    pub request: &'a QuoteRequest,
    /// Used when neither the request nor the plan states a share.
    pub default_subcontractor_pct: f64,
    pub captured_at: DateTime<Utc>,
}

impl QuoteInput<'_> {
    /// Add-on fraction for the requested complexity; 0 when none.
    pub fn task_complexity_add_on(&self) -> f64 {
        self.request
            .task_complexity
            .map(|c| self.settings.task_complexity_add_ons.rate(c))
            .unwrap_or(0.0)
    }

    pub fn subcontractor_pct(&self) -> f64 {
        resolve_subcontractor_pct(
            self.request.subcontractor_pct_override,
            self.settings.subcontractor_pct,
            self.default_subcontractor_pct,
        )
    }
}

pub trait PricingStrategy: Send + Sync {
    fn metadata(&self) -> &StrategyMetadata;

    fn quote(&self, input: &QuoteInput<'_>) -> PricingResult<QuoteResult>;

    fn key(&self) -> &str {
        &self.metadata().key
    }
}

/// Parts a strategy has computed before the shared finish.
pub(crate) struct QuoteParts {
    pub areas: Vec<AreaQuoteRow>,
    pub breakdown: CostBreakdown,
    pub subtotal: Money,
    pub task_complexity_add_on: f64,
    /// Total before the minimum-charge floor.
    pub pre_minimum_total: Money,
}

/// Minimum floor (last), split, snapshot.
pub(crate) fn finish_quote(
    metadata: &StrategyMetadata,
    input: &QuoteInput<'_>,
    parts: QuoteParts,
) -> QuoteResult {
    let (monthly_total, minimum_applied) =
        apply_minimum(parts.pre_minimum_total, input.settings.minimum_monthly_charge);
    let split = SubcontractorSplit::compute(monthly_total, input.subcontractor_pct());
    let snapshot = SettingsSnapshot::capture(
        input.settings,
        metadata,
        input.request.worker_count,
        input.captured_at,
    );

    log::info!(
        "facility={} {}: monthly_total=${:.2} minimum_applied={} payout=${:.2}",
        input.bundle.facility.facility_id,
        metadata.key,
        monthly_total,
        minimum_applied,
        split.payout_amount(),
    );

    QuoteResult {
        facility_id: input.bundle.facility.facility_id.clone(),
        strategy_key: metadata.key.clone(),
        strategy_version: metadata.version.clone(),
        service_frequency: input.request.service_frequency,
        monthly_visits: input.request.service_frequency.monthly_visits(),
        areas: parts.areas,
        breakdown: parts.breakdown,
        subtotal: parts.subtotal,
        task_complexity: input.request.task_complexity,
        task_complexity_add_on: parts.task_complexity_add_on,
        monthly_total,
        minimum_applied,
        split,
        snapshot,
    }
}
