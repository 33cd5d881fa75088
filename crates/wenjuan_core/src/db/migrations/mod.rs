//! Survey schema migrations.
//!
//! # Responsibility
//! - Own the ordered list of schema steps for the survey tables.
//! - Bring a database from any older `user_version` up to [`latest_version`].
//!
//! # Invariants
//! - Versions start at 1 and increase by exactly one per step.
//! - All pending steps run in one transaction; a failing step leaves the
//!   database at its previous `user_version`.
//! - `PRAGMA user_version` always names the last applied step.

use crate::db::{DbError, DbResult};
use log::{error, info};
use rusqlite::{Connection, Transaction};

#[derive(Debug, Clone, Copy)]
struct SchemaStep {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

const SCHEMA_STEPS: &[SchemaStep] = &[
    SchemaStep {
        version: 1,
        name: "questionnaires",
        sql: include_str!("0001_questionnaires.sql"),
    },
    SchemaStep {
        version: 2,
        name: "categories",
        sql: include_str!("0002_categories.sql"),
    },
    SchemaStep {
        version: 3,
        name: "answers",
        sql: include_str!("0003_answers.sql"),
    },
    SchemaStep {
        version: 4,
        name: "pin_order_index",
        sql: include_str!("0004_pin_order_index.sql"),
    },
];

/// Schema version written by the newest step.
pub fn latest_version() -> u32 {
    SCHEMA_STEPS.last().map_or(0, |step| step.version)
}

/// Runs every step newer than the database's `user_version`.
///
/// Returns the versions applied, oldest first; empty when already current.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<Vec<u32>> {
    let from = schema_version(conn)?;
    let latest = latest_version();
    if from > latest {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: from,
            latest_supported: latest,
        });
    }

    let pending: Vec<&SchemaStep> = SCHEMA_STEPS
        .iter()
        .filter(|step| step.version > from)
        .collect();
    if pending.is_empty() {
        return Ok(Vec::new());
    }

    let tx = conn.transaction()?;
    for step in &pending {
        if let Err(err) = run_step(&tx, step) {
            error!(
                "event=db_migrate module=db status=error version={} name={} error={}",
                step.version, step.name, err
            );
            return Err(err);
        }
        info!(
            "event=db_migrate module=db status=ok version={} name={}",
            step.version, step.name
        );
    }
    tx.commit()?;

    info!("event=db_migrate module=db status=done from={from} to={latest}");
    Ok(pending.iter().map(|step| step.version).collect())
}

fn run_step(tx: &Transaction<'_>, step: &SchemaStep) -> DbResult<()> {
    tx.execute_batch(step.sql)?;
    tx.pragma_update(None, "user_version", step.version)?;
    Ok(())
}

fn schema_version(conn: &Connection) -> DbResult<u32> {
    let version = conn.pragma_query_value(None, "user_version", |row| row.get::<_, u32>(0))?;
    Ok(version)
}

#[cfg(test)]
mod tests {
    use super::{latest_version, SCHEMA_STEPS};

    #[test]
    fn steps_are_numbered_consecutively_from_one() {
        for (index, step) in SCHEMA_STEPS.iter().enumerate() {
            assert_eq!(step.version as usize, index + 1, "step {}", step.name);
        }
        assert_eq!(latest_version() as usize, SCHEMA_STEPS.len());
    }
}
