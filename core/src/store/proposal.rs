use super::{decode, PricingStore};
use crate::{
    error::PricingResult,
    proposal::{LockedQuote, Proposal},
};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

fn put_proposal(conn: &Connection, proposal: &Proposal) -> PricingResult<()> {
    conn.execute(
        "INSERT INTO proposal (proposal_id, facility_id, status, pricing_locked, payload)
         VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT(proposal_id) DO UPDATE SET
            facility_id = excluded.facility_id,
            status = excluded.status,
            pricing_locked = excluded.pricing_locked,
            payload = excluded.payload",
        params![
            proposal.proposal_id,
            proposal.facility_id,
            proposal.status.as_str(),
            proposal.pricing_locked as i32,
            serde_json::to_string(proposal)?
        ],
    )?;
    Ok(())
}

impl PricingStore {
    // ── Proposals ───────────────────────────────────────────────

    pub(super) fn upsert_proposal(&self, proposal: &Proposal) -> PricingResult<()> {
        put_proposal(&self.conn, proposal)
    }

    pub(super) fn load_proposal(&self, proposal_id: &str) -> PricingResult<Option<Proposal>> {
        self.conn
            .query_row(
                "SELECT payload FROM proposal WHERE proposal_id = ?1",
                params![proposal_id],
                |row| decode(&row.get::<_, String>(0)?, 0),
            )
            .optional()
            .map_err(Into::into)
    }

    // ── Locked quotes ───────────────────────────────────────────

    /// Proposal update and lock record commit together or not at all.
    pub(super) fn write_lock(&self, proposal: &Proposal, locked: &LockedQuote) -> PricingResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        put_proposal(&tx, proposal)?;
        tx.execute(
            "INSERT INTO locked_quote
                (lock_id, proposal_id, locked_at, monthly_total, quote_json, snapshot_json)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                locked.lock_id.to_string(),
                locked.proposal_id,
                locked.locked_at.to_rfc3339(),
                locked.monthly_total,
                locked.quote_json,
                locked.snapshot_json
            ],
        )?;
        tx.commit()?;
        Ok(())
    }

    pub(super) fn load_latest_lock(&self, proposal_id: &str) -> PricingResult<Option<LockedQuote>> {
        let row = self
            .conn
            .query_row(
                "SELECT lock_id, locked_at, monthly_total, quote_json, snapshot_json
                 FROM locked_quote WHERE proposal_id = ?1
                 ORDER BY locked_at DESC, rowid DESC LIMIT 1",
                params![proposal_id],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, f64>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, String>(4)?,
                    ))
                },
            )
            .optional()?;

        let Some((lock_id, locked_at, monthly_total, quote_json, snapshot_json)) = row else {
            return Ok(None);
        };
        let lock_id = Uuid::parse_str(&lock_id).map_err(anyhow::Error::from)?;
        let locked_at = DateTime::parse_from_rfc3339(&locked_at)
            .map_err(anyhow::Error::from)?
            .with_timezone(&Utc);
        Ok(Some(LockedQuote {
            lock_id,
            proposal_id: proposal_id.to_string(),
            locked_at,
            monthly_total,
            quote_json,
            snapshot_json,
        }))
    }

    pub fn locked_quote_count(&self, proposal_id: &str) -> PricingResult<i64> {
        let n = self.conn.query_row(
            "SELECT COUNT(*) FROM locked_quote WHERE proposal_id = ?1",
            params![proposal_id],
            |row| row.get(0),
        )?;
        Ok(n)
    }
}
