//! Proposals and locked quotes.
//!
//! A locked quote is stored as the exact JSON text produced at lock
//! time. Readers get that text back verbatim; it is never rebuilt
//! from a `QuoteResult` or from live settings.

use crate::{
    facility::ProposalStatus,
    frequency::Frequency,
    keys::TaskComplexity,
    quote::{QuoteRequest, QuoteResult},
    snapshot::SettingsSnapshot,
    types::{EntityId, Money, StrategyKey},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Proposal {
    pub proposal_id: EntityId,
    pub account_id: EntityId,
    pub facility_id: EntityId,
    pub status: ProposalStatus,
    pub service_frequency: Frequency,
    #[serde(default)]
    pub task_complexity: Option<TaskComplexity>,
    #[serde(default)]
    pub strategy_key: Option<StrategyKey>,
    #[serde(default)]
    pub pricing_plan_id: Option<EntityId>,
    #[serde(default)]
    pub worker_count: Option<u32>,
    #[serde(default)]
    pub subcontractor_pct_override: Option<f64>,
    #[serde(default)]
    pub pricing_locked: bool,

    // ── Last computed totals ──────────────────────────────────
    #[serde(default)]
    pub monthly_total: Option<Money>,
    #[serde(default)]
    pub subcontractor_payout: Option<Money>,
    #[serde(default)]
    pub quoted_strategy_key: Option<StrategyKey>,
    #[serde(default)]
    pub quoted_plan_id: Option<EntityId>,
    #[serde(default)]
    pub last_quoted_at: Option<DateTime<Utc>>,
    /// Serialized `QuoteResult` from the last recalculation. Locking
    /// freezes this text when it still matches the proposal's inputs.
    #[serde(default)]
    pub last_quote_json: Option<String>,
}

impl Proposal {
    pub fn draft(proposal_id: &str, account_id: &str, facility_id: &str, frequency: Frequency) -> Self {
        Self {
            proposal_id: proposal_id.to_string(),
            account_id: account_id.to_string(),
            facility_id: facility_id.to_string(),
            status: ProposalStatus::Draft,
            service_frequency: frequency,
            task_complexity: None,
            strategy_key: None,
            pricing_plan_id: None,
            worker_count: None,
            subcontractor_pct_override: None,
            pricing_locked: false,
            monthly_total: None,
            subcontractor_payout: None,
            quoted_strategy_key: None,
            quoted_plan_id: None,
            last_quoted_at: None,
            last_quote_json: None,
        }
    }

    /// The engine request this proposal stands for.
    pub fn to_request(&self) -> QuoteRequest {
        QuoteRequest {
            facility_id: self.facility_id.clone(),
            service_frequency: self.service_frequency,
            task_complexity: self.task_complexity,
            pricing_plan_id: self.pricing_plan_id.clone(),
            strategy_key: self.strategy_key.clone(),
            proposal_id: Some(self.proposal_id.clone()),
            worker_count: self.worker_count,
            subcontractor_pct_override: self.subcontractor_pct_override,
        }
    }

    /// Copy a quote's totals onto the proposal and keep the quote itself.
    pub fn record_quote(&mut self, quote: &QuoteResult, at: DateTime<Utc>) -> serde_json::Result<()> {
        self.last_quote_json = Some(serde_json::to_string(quote)?);
        self.monthly_total = Some(quote.monthly_total);
        self.subcontractor_payout = Some(quote.split.payout_amount());
        self.quoted_strategy_key = Some(quote.strategy_key.clone());
        self.quoted_plan_id = Some(quote.snapshot.plan_id.clone());
        self.last_quoted_at = Some(at);
        Ok(())
    }

    /// The stored quote text, if one exists and was priced for the
    /// proposal's current facility, frequency, complexity and workers.
    pub fn stored_quote_json(&self) -> serde_json::Result<Option<&str>> {
        let Some(json) = self.last_quote_json.as_deref() else {
            return Ok(None);
        };
        let quote: QuoteResult = serde_json::from_str(json)?;
        let current = quote.facility_id == self.facility_id
            && quote.service_frequency == self.service_frequency
            && quote.task_complexity == self.task_complexity
            && quote.snapshot.worker_count == self.worker_count;
        Ok(current.then_some(json))
    }
}

/// The immutable record written when a proposal's pricing is locked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LockedQuote {
    pub lock_id: Uuid,
    pub proposal_id: EntityId,
    pub locked_at: DateTime<Utc>,
    pub monthly_total: Money,
    /// Serialized `QuoteResult` as written at lock time.
    pub quote_json: String,
    /// Serialized `SettingsSnapshot` as written at lock time.
    pub snapshot_json: String,
}

impl LockedQuote {
    pub fn from_quote(
        proposal_id: &str,
        quote: &QuoteResult,
        locked_at: DateTime<Utc>,
    ) -> serde_json::Result<Self> {
        Ok(Self {
            lock_id: Uuid::new_v4(),
            proposal_id: proposal_id.to_string(),
            locked_at,
            monthly_total: quote.monthly_total,
            quote_json: serde_json::to_string(quote)?,
            snapshot_json: quote.snapshot.to_json()?,
        })
    }

    /// Lock previously serialized quote text without re-encoding it.
    pub fn from_quote_json(
        proposal_id: &str,
        quote_json: &str,
        locked_at: DateTime<Utc>,
    ) -> serde_json::Result<Self> {
        let quote: QuoteResult = serde_json::from_str(quote_json)?;
        Ok(Self {
            lock_id: Uuid::new_v4(),
            proposal_id: proposal_id.to_string(),
            locked_at,
            monthly_total: quote.monthly_total,
            quote_json: quote_json.to_string(),
            snapshot_json: quote.snapshot.to_json()?,
        })
    }

    pub fn snapshot(&self) -> serde_json::Result<SettingsSnapshot> {
        SettingsSnapshot::from_json(&self.snapshot_json)
    }

    pub fn quote(&self) -> serde_json::Result<QuoteResult> {
        serde_json::from_str(&self.quote_json)
    }
}
