use serde::Serialize;
use sqlx::SqlitePool;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::db::{open_memory_pool, open_sqlite_pool};
use crate::error::StoreError;
use crate::insights::daily_water_total;
use crate::migrate::{self, MigrationStatus};
use crate::model::{Activity, DietEntry, Goal, Profile, RecordId, WaterLog};
use crate::repo::{self, Container, DatedRecord, Record};

/// Handle to an opened, schema-reconciled database.
///
/// Cloning is cheap and shares the underlying pool.
#[derive(Debug, Clone)]
pub struct RecordStore {
    pool: SqlitePool,
    schema_version: i64,
}

/// Point-in-time copy of everything the dashboard shows.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub activities: Vec<Activity>,
    pub diet_entries: Vec<DietEntry>,
    pub goals: Vec<Goal>,
    /// `None` until a profile has been saved.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<Profile>,
    pub today_water_total: i64,
}

impl RecordStore {
    pub async fn open(db_path: &Path) -> Result<Self, StoreError> {
        let pool = open_sqlite_pool(db_path).await.map_err(StoreError::open)?;
        Self::from_pool(pool).await
    }

    pub async fn open_in_memory() -> Result<Self, StoreError> {
        let pool = open_memory_pool().await.map_err(StoreError::open)?;
        Self::from_pool(pool).await
    }

    /// Reconcile the schema on `pool` and wrap it. The pool is closed again
    /// when reconciliation fails.
    pub async fn from_pool(pool: SqlitePool) -> Result<Self, StoreError> {
        match migrate::reconcile_schema(&pool).await {
            Ok(outcome) => {
                info!(
                    target: "fitpro",
                    event = "store_ready",
                    from_version = outcome.from_version,
                    schema_version = outcome.to_version,
                    migrations_run = outcome.ran.len()
                );
                Ok(RecordStore {
                    pool,
                    schema_version: outcome.to_version,
                })
            }
            Err(err) => {
                warn!(target: "fitpro", event = "store_open_failed", error = %format!("{err:#}"));
                pool.close().await;
                Err(StoreError::open(err))
            }
        }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn schema_version(&self) -> i64 {
        self.schema_version
    }

    pub async fn insert<R: Record>(&self, record: &R) -> Result<RecordId, StoreError> {
        let container = R::CONTAINER.table_name();
        let id = repo::insert(&self.pool, record)
            .await
            .map_err(StoreError::storage(container, "insert"))?;
        debug!(target: "fitpro", event = "record_insert", container, id);
        Ok(id)
    }

    pub async fn list_all<R: Record>(&self) -> Result<Vec<R>, StoreError> {
        repo::list_all(&self.pool)
            .await
            .map_err(StoreError::storage(R::CONTAINER.table_name(), "list"))
    }

    pub async fn list_by_date<R: DatedRecord>(&self, date: &str) -> Result<Vec<R>, StoreError> {
        repo::list_by_date(&self.pool, date)
            .await
            .map_err(StoreError::storage(R::CONTAINER.table_name(), "list_by_date"))
    }

    pub async fn get<R: Record>(&self, id: RecordId) -> Result<Option<R>, StoreError> {
        repo::get(&self.pool, id)
            .await
            .map_err(StoreError::storage(R::CONTAINER.table_name(), "get"))
    }

    /// Replace the record stored under `id`. Unlike `insert`, this never
    /// creates a row: an absent id is [`StoreError::NotFound`].
    pub async fn update<R: Record>(&self, id: RecordId, record: &R) -> Result<(), StoreError> {
        let container = R::CONTAINER.table_name();
        let found = repo::update(&self.pool, id, record)
            .await
            .map_err(StoreError::storage(container, "update"))?;
        if !found {
            return Err(StoreError::NotFound { container, id });
        }
        debug!(target: "fitpro", event = "record_update", container, id);
        Ok(())
    }

    /// Remove `id` if present. Deleting an absent id succeeds.
    pub async fn delete<R: Record>(&self, id: RecordId) -> Result<(), StoreError> {
        let container = R::CONTAINER.table_name();
        let removed = repo::delete::<R>(&self.pool, id)
            .await
            .map_err(StoreError::storage(container, "delete"))?;
        debug!(target: "fitpro", event = "record_delete", container, id, removed);
        Ok(())
    }

    pub async fn get_profile(&self) -> Result<Option<Profile>, StoreError> {
        repo::get_profile(&self.pool)
            .await
            .map_err(StoreError::storage(Container::Profile.table_name(), "get"))
    }

    pub async fn put_profile(&self, profile: &Profile) -> Result<(), StoreError> {
        repo::put_profile(&self.pool, profile)
            .await
            .map_err(StoreError::storage(Container::Profile.table_name(), "put"))?;
        debug!(target: "fitpro", event = "profile_put");
        Ok(())
    }

    /// Read all five containers concurrently. Water is limited to `today`.
    pub async fn snapshot(&self, today: &str) -> Result<Snapshot, StoreError> {
        let (activities, diet_entries, goals, profile, water) = futures::try_join!(
            self.list_all::<Activity>(),
            self.list_all::<DietEntry>(),
            self.list_all::<Goal>(),
            self.get_profile(),
            self.list_by_date::<WaterLog>(today),
        )?;
        debug!(
            target: "fitpro",
            event = "store_snapshot",
            today,
            activities = activities.len(),
            diet_entries = diet_entries.len(),
            goals = goals.len()
        );
        Ok(Snapshot {
            activities,
            diet_entries,
            goals,
            profile,
            today_water_total: daily_water_total(&water),
        })
    }

    pub async fn migration_status(&self) -> anyhow::Result<MigrationStatus> {
        migrate::migration_status(&self.pool).await
    }

    pub async fn close(self) {
        self.pool.close().await;
        info!(target: "fitpro", event = "store_closed");
    }
}
