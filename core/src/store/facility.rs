use super::{decode, PricingStore};
use crate::{
    error::PricingResult,
    facility::{Account, Area, Facility, FacilityBundle, FacilityTask},
};
use rusqlite::{params, OptionalExtension};

impl PricingStore {
    // ── Account ─────────────────────────────────────────────────

    pub fn insert_account(&self, account: &Account) -> PricingResult<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO account (account_id, payload) VALUES (?1, ?2)",
            params![account.account_id, serde_json::to_string(account)?],
        )?;
        Ok(())
    }

    pub(super) fn load_account(&self, account_id: &str) -> PricingResult<Option<Account>> {
        self.conn
            .query_row(
                "SELECT payload FROM account WHERE account_id = ?1",
                params![account_id],
                |row| decode(&row.get::<_, String>(0)?, 0),
            )
            .optional()
            .map_err(Into::into)
    }

    // ── Facility ────────────────────────────────────────────────

    /// Replace a facility and all of its areas and tasks.
    pub fn insert_facility_bundle(&self, bundle: &FacilityBundle) -> PricingResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        let facility_id = &bundle.facility.facility_id;

        tx.execute("DELETE FROM facility_task WHERE facility_id = ?1", params![facility_id])?;
        tx.execute("DELETE FROM area WHERE facility_id = ?1", params![facility_id])?;
        tx.execute(
            "INSERT INTO facility (facility_id, account_id, payload) VALUES (?1, ?2, ?3)
             ON CONFLICT(facility_id) DO UPDATE SET
                account_id = excluded.account_id,
                payload = excluded.payload",
            params![
                facility_id,
                bundle.facility.account_id,
                serde_json::to_string(&bundle.facility)?
            ],
        )?;
        for area in &bundle.areas {
            tx.execute(
                "INSERT INTO area (area_id, facility_id, payload) VALUES (?1, ?2, ?3)",
                params![area.area_id, facility_id, serde_json::to_string(area)?],
            )?;
        }
        for task in &bundle.tasks {
            tx.execute(
                "INSERT INTO facility_task (task_id, facility_id, area_id, payload)
                 VALUES (?1, ?2, ?3, ?4)",
                params![task.task_id, facility_id, task.area_id, serde_json::to_string(task)?],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    pub(super) fn load_facility_bundle(&self, facility_id: &str) -> PricingResult<Option<FacilityBundle>> {
        let facility: Option<Facility> = self
            .conn
            .query_row(
                "SELECT payload FROM facility WHERE facility_id = ?1",
                params![facility_id],
                |row| decode(&row.get::<_, String>(0)?, 0),
            )
            .optional()?;
        let Some(facility) = facility else {
            return Ok(None);
        };

        // rowid keeps insertion order so area rows come back stable.
        let mut stmt = self
            .conn
            .prepare("SELECT payload FROM area WHERE facility_id = ?1 ORDER BY rowid")?;
        let areas = stmt
            .query_map(params![facility_id], |row| decode::<Area>(&row.get::<_, String>(0)?, 0))?
            .collect::<Result<Vec<_>, _>>()?;

        let mut stmt = self
            .conn
            .prepare("SELECT payload FROM facility_task WHERE facility_id = ?1 ORDER BY rowid")?;
        let tasks = stmt
            .query_map(params![facility_id], |row| {
                decode::<FacilityTask>(&row.get::<_, String>(0)?, 0)
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Some(FacilityBundle { facility, areas, tasks }))
    }
}
