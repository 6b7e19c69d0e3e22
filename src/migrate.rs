use anyhow::{anyhow, bail};
use futures::FutureExt;
use serde::Serialize;
use sha2::{Digest, Sha256};
use sqlx::{Row, SqlitePool};
use std::collections::HashMap;
use tracing::{error, info};

use crate::db::run_in_tx;
use crate::repo::Container;
use crate::time::now_ms;

/// Schema version this build expects, persisted as `PRAGMA user_version`.
pub const SCHEMA_VERSION: i64 = 2;

static MIGRATIONS: &[(&str, &str)] = &[
    (
        "0001_containers.sql",
        include_str!("../migrations/0001_containers.sql"),
    ),
    (
        "0002_goals_created_at_idx.sql",
        include_str!("../migrations/0002_goals_created_at_idx.sql"),
    ),
];

fn preview(sql: &str) -> String {
    let one_line = sql.replace(['\n', '\t'], " ");
    let trimmed = one_line.trim();
    if trimmed.len() > 160 {
        format!("{}…", &trimmed[..160])
    } else {
        trimmed.to_string()
    }
}

fn strip_comments(raw_sql: &str) -> String {
    raw_sql
        .lines()
        .filter(|line| {
            let t = line.trim_start();
            !(t.is_empty() || t.starts_with("--"))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn checksum(cleaned: &str) -> String {
    format!("{:x}", Sha256::digest(cleaned.as_bytes()))
}

/// Outcome of opening a database against this build's schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciliation {
    pub from_version: i64,
    pub to_version: i64,
    /// Migration files run during this open; empty when already current.
    pub ran: Vec<&'static str>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AppliedMigration {
    pub version: String,
    pub applied_at: i64,
    pub checksum: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct MigrationStatus {
    pub schema_version: i64,
    pub expected_version: i64,
    pub applied: Vec<AppliedMigration>,
    pub pending: Vec<String>,
}

pub async fn schema_version(pool: &SqlitePool) -> anyhow::Result<i64> {
    let version: i64 = sqlx::query_scalar("PRAGMA user_version;")
        .fetch_one(pool)
        .await?;
    Ok(version)
}

/// Bring the on-disk schema up to [`SCHEMA_VERSION`].
///
/// Runs only when the stored version is older. Every statement is
/// `IF NOT EXISTS`, so reconciling a database that already has some or all
/// containers creates what is missing and leaves existing rows alone. The
/// whole step is one transaction together with the version bump.
pub async fn reconcile_schema(pool: &SqlitePool) -> anyhow::Result<Reconciliation> {
    let on_disk = schema_version(pool).await?;
    if on_disk > SCHEMA_VERSION {
        error!(
            target: "fitpro",
            event = "schema_too_new",
            on_disk,
            expected = SCHEMA_VERSION
        );
        bail!(
            "database schema version {on_disk} is newer than this build supports ({SCHEMA_VERSION})"
        );
    }
    if on_disk == SCHEMA_VERSION {
        info!(target: "fitpro", event = "schema_current", version = on_disk);
        verify_containers(pool).await?;
        return Ok(Reconciliation {
            from_version: on_disk,
            to_version: on_disk,
            ran: Vec::new(),
        });
    }

    info!(
        target: "fitpro",
        event = "schema_reconcile_start",
        from = on_disk,
        to = SCHEMA_VERSION
    );

    let ran = run_in_tx(pool, |tx| {
        async move {
            sqlx::query(
                "CREATE TABLE IF NOT EXISTS schema_migrations (\
                   version    TEXT PRIMARY KEY,\
                   applied_at INTEGER NOT NULL,\
                   checksum   TEXT NOT NULL\
                 )",
            )
            .execute(&mut **tx)
            .await?;

            let rows = sqlx::query("SELECT version, checksum FROM schema_migrations")
                .fetch_all(&mut **tx)
                .await?;
            let mut recorded: HashMap<String, String> = HashMap::new();
            for r in rows {
                recorded.insert(r.try_get("version")?, r.try_get("checksum")?);
            }

            let mut ran = Vec::with_capacity(MIGRATIONS.len());
            for (filename, raw_sql) in MIGRATIONS {
                let cleaned = strip_comments(raw_sql);
                let sum = checksum(&cleaned);
                let already = recorded.get(*filename);
                if let Some(stored) = already {
                    if stored != &sum {
                        return Err(anyhow!("migration {filename} edited after application"));
                    }
                }

                for stmt in cleaned.split(';') {
                    let s = stmt.trim();
                    if s.is_empty() {
                        continue;
                    }
                    info!(target: "fitpro", event = "migration_stmt", file = %filename, sql = %preview(s));
                    if let Err(e) = sqlx::query(s).execute(&mut **tx).await {
                        error!(
                            target: "fitpro",
                            event = "migration_stmt_error",
                            file = %filename,
                            sql = %preview(s),
                            error = %e
                        );
                        return Err(e.into());
                    }
                }

                if already.is_none() {
                    sqlx::query(
                        "INSERT INTO schema_migrations (version, applied_at, checksum) VALUES (?, ?, ?)",
                    )
                    .bind(*filename)
                    .bind(now_ms())
                    .bind(&sum)
                    .execute(&mut **tx)
                    .await?;
                    info!(target: "fitpro", event = "migration_file_applied", file = %filename);
                } else {
                    info!(target: "fitpro", event = "migration_file_reconciled", file = %filename);
                }
                ran.push(*filename);
            }

            // PRAGMA arguments cannot be bound.
            sqlx::query(&format!("PRAGMA user_version = {SCHEMA_VERSION}"))
                .execute(&mut **tx)
                .await?;
            Ok::<_, anyhow::Error>(ran)
        }
        .boxed()
    })
    .await?;

    verify_containers(pool).await?;
    info!(
        target: "fitpro",
        event = "schema_reconciled",
        from = on_disk,
        to = SCHEMA_VERSION,
        files = ran.len()
    );

    Ok(Reconciliation {
        from_version: on_disk,
        to_version: SCHEMA_VERSION,
        ran,
    })
}

async fn object_exists(pool: &SqlitePool, kind: &str, name: &str) -> anyhow::Result<bool> {
    let found: Option<i64> =
        sqlx::query_scalar("SELECT 1 FROM sqlite_master WHERE type = ? AND name = ?")
            .bind(kind)
            .bind(name)
            .fetch_optional(pool)
            .await?;
    Ok(found.is_some())
}

/// Fail unless every container and its indexes are present.
pub async fn verify_containers(pool: &SqlitePool) -> anyhow::Result<()> {
    let mut missing = Vec::new();
    for container in Container::ALL {
        if !object_exists(pool, "table", container.table_name()).await? {
            missing.push(container.table_name().to_string());
        }
        for index in container.indexes() {
            if !object_exists(pool, "index", index).await? {
                missing.push(index.to_string());
            }
        }
    }
    if missing.is_empty() {
        Ok(())
    } else {
        error!(
            target: "fitpro",
            event = "schema_objects_missing",
            missing = %missing.join(", ")
        );
        bail!("schema is missing: {}", missing.join(", "))
    }
}

pub async fn migration_status(pool: &SqlitePool) -> anyhow::Result<MigrationStatus> {
    let schema_version = schema_version(pool).await?;
    let mut applied = Vec::new();
    if object_exists(pool, "table", "schema_migrations").await? {
        let rows = sqlx::query(
            "SELECT version, applied_at, checksum FROM schema_migrations ORDER BY version",
        )
        .fetch_all(pool)
        .await?;
        for row in rows {
            applied.push(AppliedMigration {
                version: row.try_get("version")?,
                applied_at: row.try_get("applied_at")?,
                checksum: row.try_get("checksum")?,
            });
        }
    }
    let pending = MIGRATIONS
        .iter()
        .map(|(name, _)| *name)
        .filter(|name| !applied.iter().any(|a| a.version == *name))
        .map(str::to_string)
        .collect();
    Ok(MigrationStatus {
        schema_version,
        expected_version: SCHEMA_VERSION,
        applied,
        pending,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checksum_ignores_comments_and_blank_lines() {
        let a = strip_comments("-- note\nCREATE TABLE x (id INTEGER);\n\n");
        let b = strip_comments("CREATE TABLE x (id INTEGER);");
        assert_eq!(checksum(&a), checksum(&b));
    }

    #[test]
    fn embedded_migrations_have_no_transaction_control() {
        for (name, raw) in MIGRATIONS {
            let upper = strip_comments(raw).to_ascii_uppercase();
            assert!(!upper.contains("BEGIN"), "{name} must not open a transaction");
            assert!(!upper.contains("COMMIT"), "{name} must not commit");
        }
    }

    #[test]
    fn preview_truncates_long_sql() {
        let long = "SELECT 1, ".repeat(40);
        assert!(preview(&long).ends_with('…'));
        assert_eq!(preview("SELECT\n\t1"), "SELECT  1");
    }
}
