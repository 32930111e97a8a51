//! GameNote schema steps: notes with their tags, then local accounts.
//!
//! # Invariants
//! - Step versions are strictly increasing from 1.
//! - Pending steps run in one transaction; `PRAGMA user_version` moves with
//!   each step so a failure leaves the previous version intact.
//! - Every table a step creates must exist once the database reports that
//!   step's version.

use super::{DbError, DbResult};
use log::{debug, info};
use rusqlite::{Connection, OptionalExtension};

struct SchemaStep {
    version: u32,
    label: &'static str,
    sql: &'static str,
    tables: &'static [&'static str],
}

const STEPS: &[SchemaStep] = &[
    SchemaStep {
        version: 1,
        label: "notes",
        sql: include_str!("0001_notes.sql"),
        tables: &["notes", "note_tags"],
    },
    SchemaStep {
        version: 2,
        label: "accounts",
        sql: include_str!("0002_accounts.sql"),
        tables: &["accounts"],
    },
];

/// Schema version written by this build.
pub fn latest_version() -> u32 {
    STEPS.last().map_or(0, |step| step.version)
}

/// Tables present at `version`, in creation order.
pub fn tables_at(version: u32) -> Vec<&'static str> {
    STEPS
        .iter()
        .take_while(|step| step.version <= version)
        .flat_map(|step| step.tables.iter().copied())
        .collect()
}

/// Runs pending steps and returns the resulting schema version.
pub(super) fn upgrade(conn: &mut Connection) -> DbResult<u32> {
    let from = conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?;
    let latest = latest_version();
    if from > latest {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: from,
            latest_supported: latest,
        });
    }

    let pending = STEPS.iter().filter(|step| step.version > from);
    let tx = conn.transaction()?;
    let mut applied = 0;
    for step in pending {
        debug!(
            "event=db_schema_step module=db status=start version={} step={}",
            step.version, step.label
        );
        tx.execute_batch(step.sql)?;
        tx.pragma_update(None, "user_version", step.version)?;
        applied += 1;
    }
    tx.commit()?;

    if applied > 0 {
        info!("event=db_schema_upgrade module=db status=ok from={from} to={latest} steps={applied}");
    }
    Ok(latest)
}

/// Confirms every table expected at `version` exists.
pub(super) fn verify_tables(conn: &Connection, version: u32) -> DbResult<()> {
    for table in tables_at(version) {
        let found = conn
            .query_row(
                "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1;",
                [table],
                |_| Ok(()),
            )
            .optional()?;
        if found.is_none() {
            return Err(DbError::MissingTable { version, table });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{latest_version, tables_at, STEPS};

    #[test]
    fn step_versions_increase_from_one() {
        for (index, step) in STEPS.iter().enumerate() {
            assert_eq!(step.version as usize, index + 1);
        }
        assert_eq!(latest_version(), 2);
    }

    #[test]
    fn tables_accumulate_by_version() {
        assert!(tables_at(0).is_empty());
        assert_eq!(tables_at(1), vec!["notes", "note_tags"]);
        assert_eq!(tables_at(2), vec!["notes", "note_tags", "accounts"]);
    }
}
