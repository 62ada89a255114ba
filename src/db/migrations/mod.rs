//! Schema migrations for the expense store.
//!
//! Each migration lives next to this file as a pair of SQL scripts:
//! - `migration_NN_up.sql` takes the schema from version `NN-1` to `NN`
//! - `migration_NN_down.sql` takes it from `NN` back to `NN-1`

use anyhow::{bail, Context};
use sqlx::{Executor, SqlitePool};
use tracing::debug;

use crate::Result;

struct Migration {
    version: i32,
    up: &'static str,
    down: &'static str,
}

const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    up: include_str!("migration_01_up.sql"),
    down: include_str!("migration_01_down.sql"),
}];

/// One script to execute and the version the schema is at afterwards.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
struct Step {
    sql: &'static str,
    version_after: i32,
}

/// Moves the schema from version `from` to version `to`, upgrading or downgrading as needed.
///
/// The whole plan is worked out before anything runs, so a missing migration fails without touching
/// the database. Each step commits together with its `schema_version` update.
pub(crate) async fn run(pool: &SqlitePool, from: i32, to: i32) -> Result<()> {
    let steps = plan(from, to)?;
    if steps.is_empty() {
        debug!("Schema is already at version {to}");
        return Ok(());
    }
    for step in steps {
        debug!("Migrating schema to version {:02}", step.version_after);
        apply(pool, step).await?;
    }
    debug!("Schema is now at version {to}");
    Ok(())
}

fn find(version: i32) -> Result<&'static Migration> {
    MIGRATIONS
        .iter()
        .find(|m| m.version == version)
        .with_context(|| format!("Migration {version} does not exist"))
}

fn plan(from: i32, to: i32) -> Result<Vec<Step>> {
    if from < 0 || to < 0 {
        bail!("Schema versions cannot be negative (from {from} to {to})");
    }
    let mut steps = Vec::new();
    if from < to {
        for version in from + 1..=to {
            steps.push(Step {
                sql: find(version)?.up,
                version_after: version,
            });
        }
    } else {
        for version in (to + 1..=from).rev() {
            steps.push(Step {
                sql: find(version)?.down,
                version_after: version - 1,
            });
        }
    }
    Ok(steps)
}

async fn apply(pool: &SqlitePool, step: Step) -> Result<()> {
    let mut tx = pool
        .begin()
        .await
        .context("Unable to begin a migration transaction")?;

    tx.execute(step.sql).await.with_context(|| {
        format!(
            "Migration to schema version {} failed",
            step.version_after
        )
    })?;

    sqlx::query("DELETE FROM schema_version")
        .execute(&mut *tx)
        .await
        .context("Unable to clear schema_version")?;
    sqlx::query("INSERT INTO schema_version (version) VALUES (?)")
        .bind(step.version_after)
        .execute(&mut *tx)
        .await
        .context("Unable to record the schema version")?;

    tx.commit()
        .await
        .context("Unable to commit a migration transaction")?;
    Ok(())
}
