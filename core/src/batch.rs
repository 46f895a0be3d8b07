//! Batch invoice generation for recurring contracts.
//!
//! RULE: One batch per (period, timezone, proration mode) at a time.
//! `InvoiceBatchLock` is an advisory, in-process lock with a TTL.
//! A second start while the key is held is rejected with
//! `BatchInProgress`; it never silently runs twice. The lock is
//! injected, not global, so it can later be swapped for a shared one.
//!
//! Per-contract failures are caught and reported; the batch carries on.

use crate::{
    clock::Clock,
    error::{PricingError, PricingResult},
    numeric::round2,
    proration::{self, ProrationSegment},
    repository::InvoiceRepository,
    types::{EntityId, Money},
};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BillingPeriod {
    pub year: i32,
    pub month: u32,
}

impl BillingPeriod {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, 1).map(|_| Self { year, month })
    }

    /// Parse `"YYYY-MM"`.
    pub fn parse(s: &str) -> Option<Self> {
        let (year, month) = s.trim().split_once('-')?;
        Self::new(year.parse().ok()?, month.parse().ok()?)
    }

    pub fn first_day(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
    }

    pub fn last_day(&self) -> Option<NaiveDate> {
        self.first_day().and_then(proration::last_of_month)
    }

    pub fn key(&self) -> String {
        format!("{:04}-{:02}", self.year, self.month)
    }
}

impl fmt::Display for BillingPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProrationMode {
    /// Partial months are day-weighted.
    Prorated,
    /// Every billable contract is charged the whole monthly value.
    FullMonth,
}

impl ProrationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProrationMode::Prorated  => "prorated",
            ProrationMode::FullMonth => "full_month",
        }
    }
}

pub struct InvoiceBatchLock {
    ttl: Duration,
    clock: Arc<dyn Clock>,
    /// key → expiry
    entries: Mutex<HashMap<String, DateTime<Utc>>>,
}

impl InvoiceBatchLock {
    pub fn new(ttl_secs: i64, clock: Arc<dyn Clock>) -> Self {
        Self {
            ttl: Duration::seconds(ttl_secs),
            clock,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn key(period: BillingPeriod, timezone: &str, mode: ProrationMode) -> String {
        format!("{}|{}|{}", period.key(), timezone, mode.as_str())
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Claim `key` until the returned guard drops or the TTL passes.
    pub fn acquire(&self, key: &str) -> PricingResult<BatchLockGuard<'_>> {
        let now = self.clock.now();
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| anyhow::anyhow!("invoice batch lock poisoned"))?;

        if let Some(expires_at) = entries.get(key) {
            if *expires_at > now {
                log::warn!("batch: rejected duplicate start for '{key}' (held until {expires_at})");
                return Err(PricingError::BatchInProgress {
                    key: key.to_string(),
                    expires_at: *expires_at,
                });
            }
            log::info!("batch: reclaiming expired lock '{key}'");
        }

        let expires_at = now + self.ttl;
        entries.insert(key.to_string(), expires_at);
        Ok(BatchLockGuard { lock: self, key: key.to_string(), expires_at })
    }

    /// Whether `key` is currently held and unexpired.
    pub fn is_held(&self, key: &str) -> bool {
        let now = self.clock.now();
        self.entries
            .lock()
            .map(|entries| entries.get(key).is_some_and(|exp| *exp > now))
            .unwrap_or(false)
    }

    /// Only the holder that set `expires_at` may release. A guard whose
    /// claim expired and was reclaimed leaves the new claim alone.
    fn release(&self, key: &str, expires_at: DateTime<Utc>) {
        if let Ok(mut entries) = self.entries.lock() {
            if entries.get(key) == Some(&expires_at) {
                entries.remove(key);
            }
        }
    }
}

/// Releases the batch key on drop.
pub struct BatchLockGuard<'a> {
    lock: &'a InvoiceBatchLock,
    key: String,
    expires_at: DateTime<Utc>,
}

impl BatchLockGuard<'_> {
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }
}

impl Drop for BatchLockGuard<'_> {
    fn drop(&mut self) {
        self.lock.release(&self.key, self.expires_at);
    }
}

/// A recurring monthly service contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecurringContract {
    pub contract_id: EntityId,
    pub facility_id: EntityId,
    pub monthly_value: Money,
    pub start_date: NaiveDate,
    /// Inclusive. `None` for open-ended contracts.
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    pub invoice_id: Uuid,
    pub batch_run_id: Uuid,
    pub contract_id: EntityId,
    pub facility_id: EntityId,
    pub period: String,
    pub billing_start: NaiveDate,
    pub billing_end: NaiveDate,
    pub monthly_value: Money,
    pub amount: Money,
    pub prorated: bool,
    #[serde(default)]
    pub segments: Vec<ProrationSegment>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchFailure {
    pub contract_id: EntityId,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    pub run_id: Uuid,
    pub lock_key: String,
    pub generated: Vec<Invoice>,
    pub skipped_duplicate: Vec<EntityId>,
    /// Contracts with no active day in the period.
    pub not_billable: Vec<EntityId>,
    pub errors: Vec<BatchFailure>,
}

enum ContractOutcome {
    Generated(Invoice),
    Duplicate,
    NotBillable,
}

pub struct BatchInvoiceGenerator<'a, R: InvoiceRepository> {
    repo: &'a R,
    lock: &'a InvoiceBatchLock,
    max_proration_days: i64,
}

impl<'a, R: InvoiceRepository> BatchInvoiceGenerator<'a, R> {
    pub fn new(repo: &'a R, lock: &'a InvoiceBatchLock, max_proration_days: i64) -> Self {
        Self { repo, lock, max_proration_days }
    }

    pub fn run(
        &self,
        period: BillingPeriod,
        timezone: &str,
        mode: ProrationMode,
        contracts: &[RecurringContract],
    ) -> PricingResult<BatchReport> {
        let lock_key = InvoiceBatchLock::key(period, timezone, mode);
        let _guard = self.lock.acquire(&lock_key)?;

        let mut report = BatchReport {
            run_id: Uuid::new_v4(),
            lock_key: lock_key.clone(),
            generated: Vec::new(),
            skipped_duplicate: Vec::new(),
            not_billable: Vec::new(),
            errors: Vec::new(),
        };

        for contract in contracts {
            match self.invoice_contract(report.run_id, period, mode, contract) {
                Ok(ContractOutcome::Generated(invoice)) => report.generated.push(invoice),
                Ok(ContractOutcome::Duplicate) => {
                    log::debug!("batch: contract={} already invoiced for {period}", contract.contract_id);
                    report.skipped_duplicate.push(contract.contract_id.clone());
                }
                Ok(ContractOutcome::NotBillable) => {
                    report.not_billable.push(contract.contract_id.clone());
                }
                Err(e) => {
                    log::warn!("batch: contract={} failed: {e}", contract.contract_id);
                    report.errors.push(BatchFailure {
                        contract_id: contract.contract_id.clone(),
                        message: e.to_string(),
                    });
                }
            }
        }

        log::info!(
            "batch: {lock_key} generated={} skipped={} not_billable={} errors={}",
            report.generated.len(),
            report.skipped_duplicate.len(),
            report.not_billable.len(),
            report.errors.len()
        );
        Ok(report)
    }

    fn invoice_contract(
        &self,
        run_id: Uuid,
        period: BillingPeriod,
        mode: ProrationMode,
        contract: &RecurringContract,
    ) -> PricingResult<ContractOutcome> {
        if !contract.monthly_value.is_finite() || contract.monthly_value < 0.0 {
            return Err(anyhow::anyhow!(
                "monthly value must be a non-negative amount, got {}",
                contract.monthly_value
            )
            .into());
        }

        let (period_start, period_end) = match (period.first_day(), period.last_day()) {
            (Some(s), Some(e)) => (s, e),
            _ => return Err(anyhow::anyhow!("invalid billing period {period}").into()),
        };

        let start = contract.start_date.max(period_start);
        let end = contract.end_date.map_or(period_end, |e| e.min(period_end));
        if start > end {
            return Ok(ContractOutcome::NotBillable);
        }

        let period_key = period.key();
        if self.repo.invoice_exists(&contract.contract_id, &period_key)? {
            return Ok(ContractOutcome::Duplicate);
        }

        let whole_month = proration::is_full_month(start, end);
        let (amount, prorated, segments) = if mode == ProrationMode::FullMonth || whole_month {
            (round2(contract.monthly_value), false, Vec::new())
        } else {
            proration::check_window_cap(start, end, self.max_proration_days)?;
            let segments = proration::segments(contract.monthly_value, start, end)?;
            (proration::prorate(contract.monthly_value, start, end)?, true, segments)
        };

        let invoice = Invoice {
            invoice_id: Uuid::new_v4(),
            batch_run_id: run_id,
            contract_id: contract.contract_id.clone(),
            facility_id: contract.facility_id.clone(),
            period: period_key,
            billing_start: start,
            billing_end: end,
            monthly_value: contract.monthly_value,
            amount,
            prorated,
            segments,
            created_at: self.lock.now(),
        };
        // A concurrent run under another lock key can win the insert.
        match self.repo.insert_invoice(&invoice) {
            Ok(()) => Ok(ContractOutcome::Generated(invoice)),
            Err(PricingError::DuplicateInvoice { .. }) => Ok(ContractOutcome::Duplicate),
            Err(e) => Err(e),
        }
    }
}
