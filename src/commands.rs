//! Operations offered to the UI and the CLI.
//!
//! Every command runs behind the panic fence, resolves the store through
//! [`AppState`], and returns [`AppResult`].

use serde::Serialize;
use tracing::info;
use ts_rs::TS;

use crate::coerce::coerce_numeric;
use crate::error::StoreError;
use crate::insights::{self, Bmi, Dashboard, Hydration};
use crate::migrate::MigrationStatus;
use crate::model::{
    Activity, ActivityInput, DietEntry, DietInput, Goal, GoalInput, Profile, RecordId, WaterLog,
};
use crate::repo::{Container, Record};
use crate::state::AppState;
use crate::time::{day_key, now_ms, today, today_key};
use crate::util::dispatch_async_app_result;
use crate::AppResult;

#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct GoalView {
    #[serde(flatten)]
    #[ts(flatten)]
    pub goal: Goal,
    pub progress: f64,
    pub reached: bool,
}

impl From<Goal> for GoalView {
    fn from(goal: Goal) -> Self {
        GoalView {
            progress: insights::goal_progress(&goal),
            reached: insights::goal_reached(&goal),
            goal,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ProfileView {
    pub profile: Profile,
    #[ts(optional)]
    pub bmi: Option<Bmi>,
}

impl From<Profile> for ProfileView {
    fn from(profile: Profile) -> Self {
        ProfileView {
            bmi: insights::profile_bmi(&profile),
            profile,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct WaterToday {
    pub date: String,
    pub logs: Vec<WaterLog>,
    pub hydration: Hydration,
}

pub async fn activities_create(state: &AppState, input: ActivityInput) -> AppResult<Activity> {
    dispatch_async_app_result(|| async move {
        let store = state.store()?;
        let record = input.into_record(today_key(), now_ms());
        let id = store.insert(&record).await?;
        info!(
            target: "fitpro",
            event = "activity_created",
            id,
            calories = record.calories,
            date = %record.date
        );
        Ok(record.with_id(id))
    })
    .await
}

pub async fn activities_list(state: &AppState, date: Option<String>) -> AppResult<Vec<Activity>> {
    dispatch_async_app_result(|| async move {
        let store = state.store()?;
        let rows: Vec<Activity> = match date.as_deref() {
            Some(day) => store.list_by_date(day).await?,
            None => store.list_all().await?,
        };
        Ok(rows)
    })
    .await
}

pub async fn diet_create(state: &AppState, input: DietInput) -> AppResult<DietEntry> {
    dispatch_async_app_result(|| async move {
        let store = state.store()?;
        let record = input.into_record(today_key(), now_ms());
        let id = store.insert(&record).await?;
        info!(
            target: "fitpro",
            event = "meal_logged",
            id,
            meal_type = %record.meal_type,
            calories = record.calories
        );
        Ok(record.with_id(id))
    })
    .await
}

pub async fn diet_list(state: &AppState, date: Option<String>) -> AppResult<Vec<DietEntry>> {
    dispatch_async_app_result(|| async move {
        let store = state.store()?;
        let rows: Vec<DietEntry> = match date.as_deref() {
            Some(day) => store.list_by_date(day).await?,
            None => store.list_all().await?,
        };
        Ok(rows)
    })
    .await
}

/// Log a drink of `amount_ml`. The amount is stored as given.
pub async fn water_add(state: &AppState, amount_ml: i64) -> AppResult<WaterLog> {
    dispatch_async_app_result(|| async move {
        let store = state.store()?;
        let record = WaterLog {
            id: None,
            amount: amount_ml,
            date: today_key(),
            timestamp: now_ms(),
        };
        let id = store.insert(&record).await?;
        info!(target: "fitpro", event = "water_logged", id, amount_ml);
        Ok(record.with_id(id))
    })
    .await
}

pub async fn water_today(state: &AppState) -> AppResult<WaterToday> {
    dispatch_async_app_result(|| async move {
        let store = state.store()?;
        let date = today_key();
        let logs: Vec<WaterLog> = store.list_by_date(&date).await?;
        let hydration = insights::hydration(insights::daily_water_total(&logs));
        Ok(WaterToday {
            date,
            logs,
            hydration,
        })
    })
    .await
}

pub async fn goals_create(state: &AppState, input: GoalInput) -> AppResult<GoalView> {
    dispatch_async_app_result(|| async move {
        let store = state.store()?;
        let record = input.into_record(now_ms());
        let id = store.insert(&record).await?;
        info!(target: "fitpro", event = "goal_created", id, unit = %record.unit);
        Ok(GoalView::from(record.with_id(id)))
    })
    .await
}

pub async fn goals_list(state: &AppState) -> AppResult<Vec<GoalView>> {
    dispatch_async_app_result(|| async move {
        let store = state.store()?;
        let goals: Vec<Goal> = store.list_all().await?;
        Ok(goals.into_iter().map(GoalView::from).collect())
    })
    .await
}

/// Replace the current value of goal `id` with the number typed in `raw`.
/// Text without a number stores an empty value.
pub async fn goals_update_progress(
    state: &AppState,
    id: RecordId,
    raw: String,
) -> AppResult<GoalView> {
    dispatch_async_app_result(|| async move {
        let store = state.store()?;
        let mut goal: Goal = store
            .get(id)
            .await?
            .ok_or(StoreError::NotFound {
                container: Goal::CONTAINER.table_name(),
                id,
            })?;
        goal.current_value = coerce_numeric(&raw, f64::NAN);
        store.update(id, &goal).await?;
        let view = GoalView::from(goal);
        info!(
            target: "fitpro",
            event = "goal_progress_updated",
            id,
            progress = view.progress,
            reached = view.reached
        );
        Ok(view)
    })
    .await
}

pub async fn goals_delete(state: &AppState, id: RecordId) -> AppResult<()> {
    dispatch_async_app_result(|| async move {
        let store = state.store()?;
        store.delete::<Goal>(id).await?;
        info!(target: "fitpro", event = "goal_deleted", id);
        Ok(())
    })
    .await
}

pub async fn profile_get(state: &AppState) -> AppResult<ProfileView> {
    dispatch_async_app_result(|| async move {
        let store = state.store()?;
        let profile = store.get_profile().await?.unwrap_or_default();
        Ok(ProfileView::from(profile))
    })
    .await
}

pub async fn profile_save(state: &AppState, profile: Profile) -> AppResult<ProfileView> {
    dispatch_async_app_result(|| async move {
        let store = state.store()?;
        store.put_profile(&profile).await?;
        info!(target: "fitpro", event = "profile_saved", container = Container::Profile.table_name());
        Ok(ProfileView::from(profile))
    })
    .await
}

/// Reload every container and recompute the dashboard figures.
pub async fn dashboard_reload(state: &AppState) -> AppResult<Dashboard> {
    dispatch_async_app_result(|| async move {
        let store = state.store()?;
        let day = today();
        let snapshot = store.snapshot(&day_key(day)).await?;
        let dashboard = Dashboard::from_snapshot(snapshot, day);
        info!(
            target: "fitpro",
            event = "dashboard_reloaded",
            notifications = dashboard.notifications.len(),
            water_ml = dashboard.hydration.total_ml
        );
        Ok(dashboard)
    })
    .await
}

pub async fn db_status(state: &AppState) -> AppResult<MigrationStatus> {
    dispatch_async_app_result(|| async move {
        let store = state.store()?;
        Ok(store.migration_status().await?)
    })
    .await
}
