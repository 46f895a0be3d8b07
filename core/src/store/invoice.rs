use super::{decode, PricingStore};
use crate::{
    batch::Invoice,
    error::{PricingError, PricingResult},
};
use rusqlite::{params, ErrorCode};

impl PricingStore {
    // ── Invoices ────────────────────────────────────────────────

    pub(super) fn has_invoice(&self, contract_id: &str, period: &str) -> PricingResult<bool> {
        let n: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM invoice WHERE contract_id = ?1 AND period = ?2",
            params![contract_id, period],
            |row| row.get(0),
        )?;
        Ok(n > 0)
    }

    /// UNIQUE(contract_id, period) rejects a second invoice for the same
    /// month; that surfaces as `DuplicateInvoice`.
    pub(super) fn write_invoice(&self, invoice: &Invoice) -> PricingResult<()> {
        let inserted = self.conn.execute(
            "INSERT INTO invoice
                (invoice_id, contract_id, period, billing_start, billing_end,
                 amount, prorated, batch_run_id, created_at, payload)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                invoice.invoice_id.to_string(),
                invoice.contract_id,
                invoice.period,
                invoice.billing_start.to_string(),
                invoice.billing_end.to_string(),
                invoice.amount,
                invoice.prorated as i32,
                invoice.batch_run_id.to_string(),
                invoice.created_at.to_rfc3339(),
                serde_json::to_string(invoice)?
            ],
        );
        match inserted {
            Ok(_) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(e, _)) if e.code == ErrorCode::ConstraintViolation => {
                Err(PricingError::DuplicateInvoice {
                    contract_id: invoice.contract_id.clone(),
                    period: invoice.period.clone(),
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    pub(super) fn load_invoices(&self, period: &str) -> PricingResult<Vec<Invoice>> {
        let mut stmt = self
            .conn
            .prepare("SELECT payload FROM invoice WHERE period = ?1 ORDER BY contract_id")?;
        let rows = stmt.query_map(params![period], |row| decode(&row.get::<_, String>(0)?, 0))?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }
}
