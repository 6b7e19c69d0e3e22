//! Row mapping and SQL for the record containers.
//!
//! Each record type names its container and its data columns once; the
//! generic functions below build every statement from that list. Table and
//! column names come only from these constants, never from callers.

use sqlx::query::Query;
use sqlx::sqlite::{SqliteArguments, SqliteRow};
use sqlx::{Row, Sqlite, SqlitePool};

use crate::model::{
    Activity, DietEntry, Goal, GoalStatus, GoalUnit, Intensity, MealType, Profile, RecordId,
    WaterLog,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Container {
    Activities,
    Diet,
    Goals,
    Water,
    Profile,
}

impl Container {
    pub const ALL: [Container; 5] = [
        Container::Activities,
        Container::Diet,
        Container::Goals,
        Container::Water,
        Container::Profile,
    ];

    pub const fn table_name(self) -> &'static str {
        match self {
            Container::Activities => "activities",
            Container::Diet => "diet",
            Container::Goals => "goals",
            Container::Water => "water",
            Container::Profile => "profile",
        }
    }

    pub const fn indexes(self) -> &'static [&'static str] {
        match self {
            Container::Activities => &["activities_date_idx"],
            Container::Diet => &["diet_date_idx"],
            Container::Goals => &["goals_created_at_idx"],
            Container::Water => &["water_date_idx"],
            Container::Profile => &[],
        }
    }
}

pub(crate) type SqliteQuery<'q> = Query<'q, Sqlite, SqliteArguments<'q>>;

/// A list-type record stored one row per value under a store-assigned id.
pub trait Record: Sized + Send + Unpin {
    const CONTAINER: Container;
    /// Data columns in bind order; `id` is implicit.
    const COLUMNS: &'static [&'static str];

    fn with_id(self, id: RecordId) -> Self;
    fn bind<'q>(&'q self, query: SqliteQuery<'q>) -> SqliteQuery<'q>;
    fn from_row(row: &SqliteRow) -> Result<Self, sqlx::Error>;
}

/// Records carrying a calendar `date` key that can be listed per day.
pub trait DatedRecord: Record {
    fn date(&self) -> &str;
}

fn nan_to_null(value: f64) -> Option<f64> {
    (!value.is_nan()).then_some(value)
}

fn column_list<R: Record>() -> String {
    R::COLUMNS.join(", ")
}

fn select_sql<R: Record>(filter: &str) -> String {
    format!(
        "SELECT id, {} FROM {} {filter} ORDER BY id",
        column_list::<R>(),
        R::CONTAINER.table_name()
    )
}

pub async fn insert<R: Record>(pool: &SqlitePool, record: &R) -> sqlx::Result<RecordId> {
    let placeholders = vec!["?"; R::COLUMNS.len()].join(", ");
    let sql = format!(
        "INSERT INTO {} ({}) VALUES ({placeholders})",
        R::CONTAINER.table_name(),
        column_list::<R>()
    );
    let res = record.bind(sqlx::query(&sql)).execute(pool).await?;
    Ok(res.last_insert_rowid())
}

pub async fn list_all<R: Record>(pool: &SqlitePool) -> sqlx::Result<Vec<R>> {
    let sql = select_sql::<R>("");
    let rows = sqlx::query(&sql).fetch_all(pool).await?;
    rows.iter().map(R::from_row).collect()
}

pub async fn list_by_date<R: DatedRecord>(pool: &SqlitePool, date: &str) -> sqlx::Result<Vec<R>> {
    let sql = select_sql::<R>("WHERE date = ?");
    let rows = sqlx::query(&sql).bind(date).fetch_all(pool).await?;
    rows.iter().map(R::from_row).collect()
}

pub async fn get<R: Record>(pool: &SqlitePool, id: RecordId) -> sqlx::Result<Option<R>> {
    let sql = select_sql::<R>("WHERE id = ?");
    let row = sqlx::query(&sql).bind(id).fetch_optional(pool).await?;
    row.as_ref().map(R::from_row).transpose()
}

/// Overwrite every data column of `id`. Returns `false` when no row matched.
pub async fn update<R: Record>(pool: &SqlitePool, id: RecordId, record: &R) -> sqlx::Result<bool> {
    let assignments = R::COLUMNS
        .iter()
        .map(|c| format!("{c} = ?"))
        .collect::<Vec<_>>()
        .join(", ");
    let sql = format!(
        "UPDATE {} SET {assignments} WHERE id = ?",
        R::CONTAINER.table_name()
    );
    let res = record.bind(sqlx::query(&sql)).bind(id).execute(pool).await?;
    Ok(res.rows_affected() > 0)
}

pub async fn delete<R: Record>(pool: &SqlitePool, id: RecordId) -> sqlx::Result<u64> {
    let sql = format!("DELETE FROM {} WHERE id = ?", R::CONTAINER.table_name());
    let res = sqlx::query(&sql).bind(id).execute(pool).await?;
    Ok(res.rows_affected())
}

const PROFILE_KEY: &str = "user";

pub async fn get_profile(pool: &SqlitePool) -> sqlx::Result<Option<Profile>> {
    let row = sqlx::query("SELECT name, weight, feet FROM profile WHERE id = ?")
        .bind(PROFILE_KEY)
        .fetch_optional(pool)
        .await?;
    row.map(|r| {
        Ok(Profile {
            name: r.try_get("name")?,
            weight: r.try_get("weight")?,
            feet: r.try_get("feet")?,
        })
    })
    .transpose()
}

pub async fn put_profile(pool: &SqlitePool, profile: &Profile) -> sqlx::Result<()> {
    sqlx::query(
        "INSERT INTO profile (id, name, weight, feet) VALUES (?, ?, ?, ?) \
         ON CONFLICT(id) DO UPDATE SET \
           name = excluded.name, weight = excluded.weight, feet = excluded.feet",
    )
    .bind(PROFILE_KEY)
    .bind(profile.name.as_str())
    .bind(profile.weight.as_str())
    .bind(profile.feet.as_str())
    .execute(pool)
    .await?;
    Ok(())
}

impl Record for Activity {
    const CONTAINER: Container = Container::Activities;
    const COLUMNS: &'static [&'static str] = &[
        "exercise",
        "duration",
        "calories",
        "intensity",
        "notes",
        "date",
        "timestamp",
    ];

    fn with_id(mut self, id: RecordId) -> Self {
        self.id = Some(id);
        self
    }

    fn bind<'q>(&'q self, query: SqliteQuery<'q>) -> SqliteQuery<'q> {
        query
            .bind(self.exercise.as_str())
            .bind(self.duration)
            .bind(self.calories)
            .bind(self.intensity.as_str())
            .bind(self.notes.as_deref())
            .bind(self.date.as_str())
            .bind(self.timestamp)
    }

    fn from_row(row: &SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Activity {
            id: Some(row.try_get("id")?),
            exercise: row.try_get("exercise")?,
            duration: row.try_get("duration")?,
            calories: row.try_get("calories")?,
            intensity: Intensity::parse_lossy(&row.try_get::<String, _>("intensity")?),
            notes: row.try_get("notes")?,
            date: row.try_get("date")?,
            timestamp: row.try_get("timestamp")?,
        })
    }
}

impl DatedRecord for Activity {
    fn date(&self) -> &str {
        &self.date
    }
}

impl Record for DietEntry {
    const CONTAINER: Container = Container::Diet;
    const COLUMNS: &'static [&'static str] = &[
        "meal_type",
        "meal_name",
        "calories",
        "protein",
        "carbs",
        "fat",
        "notes",
        "date",
        "timestamp",
    ];

    fn with_id(mut self, id: RecordId) -> Self {
        self.id = Some(id);
        self
    }

    fn bind<'q>(&'q self, query: SqliteQuery<'q>) -> SqliteQuery<'q> {
        query
            .bind(self.meal_type.as_str())
            .bind(self.meal_name.as_str())
            .bind(self.calories)
            .bind(self.protein)
            .bind(self.carbs)
            .bind(self.fat)
            .bind(self.notes.as_deref())
            .bind(self.date.as_str())
            .bind(self.timestamp)
    }

    fn from_row(row: &SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(DietEntry {
            id: Some(row.try_get("id")?),
            meal_type: MealType::parse_lossy(&row.try_get::<String, _>("meal_type")?),
            meal_name: row.try_get("meal_name")?,
            calories: row.try_get("calories")?,
            protein: row.try_get("protein")?,
            carbs: row.try_get("carbs")?,
            fat: row.try_get("fat")?,
            notes: row.try_get("notes")?,
            date: row.try_get("date")?,
            timestamp: row.try_get("timestamp")?,
        })
    }
}

impl DatedRecord for DietEntry {
    fn date(&self) -> &str {
        &self.date
    }
}

impl Record for Goal {
    const CONTAINER: Container = Container::Goals;
    const COLUMNS: &'static [&'static str] = &[
        "goal_type",
        "goal_name",
        "target_value",
        "current_value",
        "unit",
        "deadline",
        "created_at",
        "status",
    ];

    fn with_id(mut self, id: RecordId) -> Self {
        self.id = Some(id);
        self
    }

    fn bind<'q>(&'q self, query: SqliteQuery<'q>) -> SqliteQuery<'q> {
        // SQLite has no NaN; an empty value is stored as NULL.
        query
            .bind(self.goal_type.as_str())
            .bind(self.goal_name.as_str())
            .bind(nan_to_null(self.target_value))
            .bind(nan_to_null(self.current_value))
            .bind(self.unit.as_str())
            .bind(self.deadline.as_deref())
            .bind(self.created_at)
            .bind(self.status.as_str())
    }

    fn from_row(row: &SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Goal {
            id: Some(row.try_get("id")?),
            goal_type: row.try_get("goal_type")?,
            goal_name: row.try_get("goal_name")?,
            target_value: row
                .try_get::<Option<f64>, _>("target_value")?
                .unwrap_or(f64::NAN),
            current_value: row
                .try_get::<Option<f64>, _>("current_value")?
                .unwrap_or(f64::NAN),
            unit: GoalUnit::parse_lossy(&row.try_get::<String, _>("unit")?),
            deadline: row.try_get("deadline")?,
            created_at: row.try_get("created_at")?,
            status: GoalStatus::parse_lossy(&row.try_get::<String, _>("status")?),
        })
    }
}

impl Record for WaterLog {
    const CONTAINER: Container = Container::Water;
    const COLUMNS: &'static [&'static str] = &["amount", "date", "timestamp"];

    fn with_id(mut self, id: RecordId) -> Self {
        self.id = Some(id);
        self
    }

    fn bind<'q>(&'q self, query: SqliteQuery<'q>) -> SqliteQuery<'q> {
        query
            .bind(self.amount)
            .bind(self.date.as_str())
            .bind(self.timestamp)
    }

    fn from_row(row: &SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(WaterLog {
            id: Some(row.try_get("id")?),
            amount: row.try_get("amount")?,
            date: row.try_get("date")?,
            timestamp: row.try_get("timestamp")?,
        })
    }
}

impl DatedRecord for WaterLog {
    fn date(&self) -> &str {
        &self.date
    }
}
