//! SQLite persistence layer.
//!
//! RULE: Only the store talks to the database.
//! The engine and the batch generator go through `PricingRepository`
//! and `InvoiceRepository`; they never execute SQL directly.

use crate::{
    batch::Invoice,
    error::PricingResult,
    facility::{Account, FacilityBundle},
    proposal::{LockedQuote, Proposal},
    repository::{InvoiceRepository, PricingRepository},
    settings::PricingSettings,
    types::EntityId,
};
use rusqlite::Connection;
use serde::de::DeserializeOwned;

mod facility;
mod invoice;
mod plan;
mod proposal;

pub struct PricingStore {
    conn: Connection,
    path: Option<String>, // None for :memory:
}

impl PricingStore {
    pub fn open(path: &str) -> PricingResult<Self> {
        let conn = Connection::open_with_flags(
            path,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_URI,
        )?;
        // WAL mode only for real files (:memory: ignores it).
        let _ = conn.execute_batch("PRAGMA journal_mode=WAL;");
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self {
            conn,
            path: Some(path.to_string()),
        })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> PricingResult<Self> {
        let conn = Connection::open(":memory:")?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn, path: None })
    }

    /// A second connection to the same file. In-memory stores get a
    /// fresh, isolated database.
    pub fn reopen(&self) -> PricingResult<Self> {
        match &self.path {
            Some(p) => Self::open(p),
            None => Self::in_memory(),
        }
    }

    pub fn migrate(&self) -> PricingResult<()> {
        self.conn
            .execute_batch(include_str!("../../../migrations/001_pricing.sql"))?;
        Ok(())
    }
}

/// Decode a JSON payload column inside a row mapper.
fn decode<T: DeserializeOwned>(payload: &str, col: usize) -> rusqlite::Result<T> {
    serde_json::from_str(payload).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(col, rusqlite::types::Type::Text, Box::new(e))
    })
}

impl PricingRepository for PricingStore {
    fn facility_bundle(&self, facility_id: &str) -> PricingResult<Option<FacilityBundle>> {
        self.load_facility_bundle(facility_id)
    }

    fn account(&self, account_id: &str) -> PricingResult<Option<Account>> {
        self.load_account(account_id)
    }

    fn pricing_plan(&self, plan_id: &str) -> PricingResult<Option<PricingSettings>> {
        self.load_plan(plan_id)
    }

    fn default_pricing_plan_id(&self) -> PricingResult<Option<EntityId>> {
        self.load_default_plan_id()
    }

    fn proposal(&self, proposal_id: &str) -> PricingResult<Option<Proposal>> {
        self.load_proposal(proposal_id)
    }

    fn save_proposal(&self, proposal: &Proposal) -> PricingResult<()> {
        self.upsert_proposal(proposal)
    }

    fn lock_proposal(&self, proposal: &Proposal, locked: &LockedQuote) -> PricingResult<()> {
        self.write_lock(proposal, locked)
    }

    fn latest_locked_quote(&self, proposal_id: &str) -> PricingResult<Option<LockedQuote>> {
        self.load_latest_lock(proposal_id)
    }
}

impl InvoiceRepository for PricingStore {
    fn invoice_exists(&self, contract_id: &str, period: &str) -> PricingResult<bool> {
        self.has_invoice(contract_id, period)
    }

    fn insert_invoice(&self, invoice: &Invoice) -> PricingResult<()> {
        self.write_invoice(invoice)
    }

    fn invoices_for_period(&self, period: &str) -> PricingResult<Vec<Invoice>> {
        self.load_invoices(period)
    }
}
