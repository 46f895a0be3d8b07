use super::{decode, PricingStore};
use crate::{error::PricingResult, settings::PricingSettings, types::EntityId};
use rusqlite::{params, OptionalExtension};

impl PricingStore {
    // ── Pricing plans ───────────────────────────────────────────

    /// Insert or replace a plan. At most one plan carries the default flag.
    pub fn upsert_plan(&self, plan: &PricingSettings, is_default: bool) -> PricingResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        if is_default {
            tx.execute("UPDATE pricing_plan SET is_default = 0", [])?;
        }
        tx.execute(
            "INSERT OR REPLACE INTO pricing_plan (plan_id, pricing_type, is_default, payload)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                plan.plan_id,
                plan.pricing_type.as_str(),
                is_default as i32,
                serde_json::to_string(plan)?
            ],
        )?;
        tx.commit()?;
        Ok(())
    }

    pub(super) fn load_plan(&self, plan_id: &str) -> PricingResult<Option<PricingSettings>> {
        self.conn
            .query_row(
                "SELECT payload FROM pricing_plan WHERE plan_id = ?1",
                params![plan_id],
                |row| decode(&row.get::<_, String>(0)?, 0),
            )
            .optional()
            .map_err(Into::into)
    }

    pub(super) fn load_default_plan_id(&self) -> PricingResult<Option<EntityId>> {
        self.conn
            .query_row(
                "SELECT plan_id FROM pricing_plan WHERE is_default = 1 LIMIT 1",
                [],
                |row| row.get(0),
            )
            .optional()
            .map_err(Into::into)
    }

    pub fn plan_ids(&self) -> PricingResult<Vec<EntityId>> {
        let mut stmt = self.conn.prepare("SELECT plan_id FROM pricing_plan ORDER BY plan_id")?;
        let rows = stmt.query_map([], |row| row.get(0))?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }
}
