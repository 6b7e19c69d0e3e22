//! Derived figures over in-memory records: totals, the weekly window, goal
//! progress, BMI and dashboard notifications. Nothing here touches storage.

use chrono::{Duration, NaiveDate};
use serde::Serialize;
use ts_rs::TS;

use crate::coerce::coerce_numeric;
use crate::model::{Activity, DietEntry, Goal, Profile, WaterLog};
use crate::store::Snapshot;
use crate::time::day_key;

pub const HYDRATION_GOAL_ML: i64 = 2500;
/// Below this total a hydration warning is raised.
pub const HYDRATION_ALERT_ML: i64 = 2000;
pub const RECENT_LIMIT: usize = 4;

const FEET_TO_METRES: f64 = 0.3048;

/// Sums saturate at the `i64` bounds.
fn saturating_sum(values: impl Iterator<Item = i64>) -> i64 {
    values.fold(0i64, i64::saturating_add)
}

pub fn daily_water_total(logs: &[WaterLog]) -> i64 {
    saturating_sum(logs.iter().map(|l| l.amount))
}

/// All-time sum, not limited to any day.
pub fn total_calories_burned(activities: &[Activity]) -> i64 {
    saturating_sum(activities.iter().map(|a| a.calories))
}

/// All-time sum, not limited to any day.
pub fn total_calories_consumed(entries: &[DietEntry]) -> i64 {
    saturating_sum(entries.iter().map(|e| e.calories))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export, rename_all = "lowercase")]
pub enum Balance {
    Deficit,
    Surplus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct WeeklyInsight {
    pub workout_count: u32,
    #[ts(type = "number")]
    pub burned: i64,
    #[ts(type = "number")]
    pub consumed: i64,
}

impl WeeklyInsight {
    pub fn balance(&self) -> Balance {
        if self.burned > self.consumed {
            Balance::Deficit
        } else {
            Balance::Surplus
        }
    }
}

/// Records dated within seven days before `reference`, inclusive of the
/// cutoff day. Dates compare as `YYYY-MM-DD` strings, so malformed dates
/// fall wherever they sort.
pub fn weekly_insight(
    activities: &[Activity],
    entries: &[DietEntry],
    reference: NaiveDate,
) -> WeeklyInsight {
    let cutoff = day_key(reference - Duration::days(7));
    let in_window = |date: &str| date >= cutoff.as_str();

    let recent: Vec<&Activity> = activities.iter().filter(|a| in_window(&a.date)).collect();
    WeeklyInsight {
        workout_count: recent.len() as u32,
        burned: saturating_sum(recent.iter().map(|a| a.calories)),
        consumed: saturating_sum(
            entries
                .iter()
                .filter(|e| in_window(&e.date))
                .map(|e| e.calories),
        ),
    }
}

/// Percentage of `target` reached, clamped to `0..=100`.
pub fn progress_percent(current: f64, target: f64) -> f64 {
    if target == 0.0 || current.is_nan() || target.is_nan() {
        return 0.0;
    }
    let pct = current / target * 100.0;
    if pct.is_nan() {
        0.0
    } else {
        pct.clamp(0.0, 100.0)
    }
}

pub fn goal_progress(goal: &Goal) -> f64 {
    progress_percent(goal.current_value, goal.target_value)
}

pub fn goal_reached(goal: &Goal) -> bool {
    goal_progress(goal) >= 100.0
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
pub enum BmiCategory {
    Underweight,
    Normal,
    Overweight,
    Obese,
}

impl BmiCategory {
    fn classify(bmi: f64) -> Self {
        if bmi < 18.5 {
            BmiCategory::Underweight
        } else if bmi < 25.0 {
            BmiCategory::Normal
        } else if bmi < 30.0 {
            BmiCategory::Overweight
        } else {
            BmiCategory::Obese
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, TS)]
#[ts(export)]
pub struct Bmi {
    /// Rounded to one decimal.
    pub value: f64,
    pub category: BmiCategory,
}

/// BMI from kilograms and height in feet. `None` unless both are positive.
pub fn compute_bmi(weight_kg: f64, height_feet: f64) -> Option<Bmi> {
    if !(weight_kg > 0.0 && height_feet > 0.0) {
        return None;
    }
    let height_m = height_feet * FEET_TO_METRES;
    let raw = weight_kg / (height_m * height_m);
    if !raw.is_finite() {
        return None;
    }
    Some(Bmi {
        value: (raw * 10.0).round() / 10.0,
        category: BmiCategory::classify(raw),
    })
}

pub fn profile_bmi(profile: &Profile) -> Option<Bmi> {
    compute_bmi(
        coerce_numeric(&profile.weight, f64::NAN),
        coerce_numeric(&profile.feet, 0.0),
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Hydration {
    #[ts(type = "number")]
    pub total_ml: i64,
    #[ts(type = "number")]
    pub goal_ml: i64,
    pub progress: f64,
}

pub fn hydration(total_ml: i64) -> Hydration {
    Hydration {
        total_ml,
        goal_ml: HYDRATION_GOAL_ML,
        progress: (total_ml as f64 / HYDRATION_GOAL_ML as f64 * 100.0).min(100.0),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export, rename_all = "lowercase")]
pub enum NotificationKind {
    Warning,
    Success,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
pub struct Notification {
    pub id: String,
    pub title: String,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub time: String,
    pub read: bool,
}

fn most_recent<'a, T, K: Ord>(items: &'a [T], key: impl Fn(&T) -> K) -> Option<&'a T> {
    items.iter().max_by_key(|item| key(item))
}

/// Dashboard alerts: a hydration warning first when today's water is short,
/// then a note about the most recent workout.
pub fn build_notifications(activities: &[Activity], daily_water_total: i64) -> Vec<Notification> {
    let mut out = Vec::with_capacity(2);
    if daily_water_total < HYDRATION_ALERT_ML {
        out.push(Notification {
            id: "h2o".into(),
            title: "Hydration Alert".into(),
            message: format!(
                "You've only had {}L of water today. Reach for 2L!",
                daily_water_total as f64 / 1000.0
            ),
            kind: NotificationKind::Warning,
            time: "Just now".into(),
            read: false,
        });
    }
    if let Some(last) = most_recent(activities, |a| (a.timestamp, a.id)) {
        out.push(Notification {
            id: "act".into(),
            title: "Great Workout!".into(),
            message: format!(
                "You burned {} kcal doing {}. Keep it up!",
                last.calories, last.exercise
            ),
            kind: NotificationKind::Success,
            time: "Achievement".into(),
            read: false,
        });
    }
    out
}

fn newest_first<T: Clone>(items: &[T], n: usize, key: impl Fn(&T) -> (i64, Option<i64>)) -> Vec<T> {
    let mut sorted: Vec<&T> = items.iter().collect();
    sorted.sort_by_key(|item| std::cmp::Reverse(key(item)));
    sorted.into_iter().take(n).cloned().collect()
}

pub fn recent_activities(activities: &[Activity], n: usize) -> Vec<Activity> {
    newest_first(activities, n, |a| (a.timestamp, a.id))
}

pub fn recent_meals(entries: &[DietEntry], n: usize) -> Vec<DietEntry> {
    newest_first(entries, n, |e| (e.timestamp, e.id))
}

/// Everything the home screen renders after a reload.
#[derive(Debug, Clone, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Dashboard {
    pub today: String,
    #[ts(optional)]
    pub first_name: Option<String>,
    pub profile: Profile,
    #[ts(optional)]
    pub bmi: Option<Bmi>,
    #[ts(type = "number")]
    pub calories_burned: i64,
    #[ts(type = "number")]
    pub calories_consumed: i64,
    pub hydration: Hydration,
    pub weekly: WeeklyInsight,
    pub weekly_balance: Balance,
    pub notifications: Vec<Notification>,
    pub recent_activities: Vec<Activity>,
    pub recent_meals: Vec<DietEntry>,
    pub goals: Vec<Goal>,
}

impl Dashboard {
    pub fn from_snapshot(snapshot: Snapshot, today: NaiveDate) -> Self {
        let weekly = weekly_insight(&snapshot.activities, &snapshot.diet_entries, today);
        let profile = snapshot.profile.unwrap_or_default();
        Dashboard {
            today: day_key(today),
            first_name: profile.first_name().map(str::to_string),
            bmi: profile_bmi(&profile),
            calories_burned: total_calories_burned(&snapshot.activities),
            calories_consumed: total_calories_consumed(&snapshot.diet_entries),
            hydration: hydration(snapshot.today_water_total),
            weekly,
            weekly_balance: weekly.balance(),
            notifications: build_notifications(&snapshot.activities, snapshot.today_water_total),
            recent_activities: recent_activities(&snapshot.activities, RECENT_LIMIT),
            recent_meals: recent_meals(&snapshot.diet_entries, RECENT_LIMIT),
            goals: snapshot.goals,
            profile,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{GoalStatus, GoalUnit, Intensity, MealType};

    fn activity(id: i64, exercise: &str, calories: i64, date: &str, timestamp: i64) -> Activity {
        Activity {
            id: Some(id),
            exercise: exercise.into(),
            duration: 30,
            calories,
            intensity: Intensity::Moderate,
            notes: None,
            date: date.into(),
            timestamp,
        }
    }

    fn meal(calories: i64, date: &str, timestamp: i64) -> DietEntry {
        DietEntry {
            id: None,
            meal_type: MealType::Lunch,
            meal_name: "Salad".into(),
            calories,
            protein: 0,
            carbs: 0,
            fat: 0,
            notes: None,
            date: date.into(),
            timestamp,
        }
    }

    fn goal(current: f64, target: f64) -> Goal {
        Goal {
            id: Some(1),
            goal_type: "distance".into(),
            goal_name: "Run".into(),
            target_value: target,
            current_value: current,
            unit: GoalUnit::Km,
            deadline: None,
            created_at: 0,
            status: GoalStatus::Active,
        }
    }

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").expect("valid date")
    }

    #[test]
    fn water_total_sums_amounts() {
        let logs = [250, 500].map(|amount| WaterLog {
            id: None,
            amount,
            date: "2024-06-10".into(),
            timestamp: 0,
        });
        assert_eq!(daily_water_total(&logs), 750);
        assert_eq!(daily_water_total(&[]), 0);
    }

    #[test]
    fn huge_amounts_saturate_instead_of_overflowing() {
        let logs = [i64::MAX, i64::MAX].map(|amount| WaterLog {
            id: None,
            amount,
            date: "2024-06-10".into(),
            timestamp: 0,
        });
        assert_eq!(daily_water_total(&logs), i64::MAX);
        assert_eq!(hydration(daily_water_total(&logs)).progress, 100.0);

        let acts = [
            activity(1, "Run", i64::MAX, "2024-06-09", 1),
            activity(2, "Swim", i64::MAX, "2024-06-10", 2),
        ];
        let meals = [meal(i64::MAX, "2024-06-09", 1), meal(i64::MAX, "2024-06-10", 2)];
        assert_eq!(total_calories_burned(&acts), i64::MAX);
        assert_eq!(total_calories_consumed(&meals), i64::MAX);
        let weekly = weekly_insight(&acts, &meals, day("2024-06-10"));
        assert_eq!(weekly.burned, i64::MAX);
        assert_eq!(weekly.consumed, i64::MAX);
    }

    #[test]
    fn weekly_window_starts_seven_days_back() {
        let acts = [
            activity(1, "Run", 300, "2024-06-02", 1),
            activity(2, "Swim", 200, "2024-06-03", 2),
            activity(3, "Bike", 400, "2024-06-04", 3),
        ];
        let meals = [meal(500, "2024-06-01", 1), meal(150, "2024-06-09", 2)];
        let weekly = weekly_insight(&acts, &meals, day("2024-06-10"));
        assert_eq!(weekly.workout_count, 2);
        assert_eq!(weekly.burned, 600);
        assert_eq!(weekly.consumed, 150);
        assert_eq!(weekly.balance(), Balance::Deficit);
    }

    #[test]
    fn equal_burned_and_consumed_is_surplus() {
        let weekly = WeeklyInsight {
            workout_count: 0,
            burned: 0,
            consumed: 0,
        };
        assert_eq!(weekly.balance(), Balance::Surplus);
    }

    #[test]
    fn calorie_totals_ignore_dates() {
        let acts = [
            activity(1, "Run", 300, "2020-01-01", 1),
            activity(2, "Swim", 200, "2024-06-10", 2),
        ];
        assert_eq!(total_calories_burned(&acts), 500);
        assert_eq!(total_calories_consumed(&[meal(700, "1999-12-31", 0)]), 700);
    }

    #[test]
    fn progress_is_clamped_and_safe() {
        assert_eq!(goal_progress(&goal(5.0, 10.0)), 50.0);
        assert_eq!(goal_progress(&goal(15.0, 10.0)), 100.0);
        assert_eq!(goal_progress(&goal(-3.0, 10.0)), 0.0);
        assert_eq!(goal_progress(&goal(5.0, 0.0)), 0.0);
        assert_eq!(goal_progress(&goal(f64::NAN, 10.0)), 0.0);
        assert_eq!(goal_progress(&goal(5.0, f64::NAN)), 0.0);
        assert!(goal_reached(&goal(10.0, 10.0)));
        assert!(!goal_reached(&goal(9.9, 10.0)));
    }

    #[test]
    fn bmi_rounds_value_and_classifies() {
        let bmi = compute_bmi(70.0, 5.9).expect("bmi");
        assert_eq!(bmi.value, 21.6);
        assert_eq!(bmi.category, BmiCategory::Normal);
        assert_eq!(compute_bmi(0.0, 5.9), None);
        assert_eq!(compute_bmi(70.0, 0.0), None);
        assert_eq!(compute_bmi(f64::NAN, 5.9), None);
        assert_eq!(
            compute_bmi(50.0, 5.9).map(|b| b.category),
            Some(BmiCategory::Underweight)
        );
        assert_eq!(
            compute_bmi(120.0, 5.9).map(|b| b.category),
            Some(BmiCategory::Obese)
        );
    }

    #[test]
    fn profile_bmi_coerces_text() {
        let profile = Profile {
            name: "Ada".into(),
            weight: "70kg".into(),
            feet: "5.9".into(),
        };
        assert_eq!(profile_bmi(&profile).map(|b| b.value), Some(21.6));
        assert_eq!(profile_bmi(&Profile::default()), None);
    }

    #[test]
    fn hydration_progress_caps_at_full() {
        assert_eq!(hydration(1250).progress, 50.0);
        assert_eq!(hydration(4000).progress, 100.0);
        assert_eq!(hydration(0).goal_ml, HYDRATION_GOAL_ML);
    }

    #[test]
    fn notification_kind_serializes_as_type() {
        let notes = build_notifications(&[], 0);
        let json = serde_json::to_value(&notes[0]).expect("serialize");
        assert_eq!(json["type"], "warning");
        assert!(json.get("kind").is_none());
    }

    #[test]
    fn notifications_put_hydration_first() {
        let acts = [activity(1, "Running", 320, "2024-06-10", 10)];
        let notes = build_notifications(&acts, 1500);
        assert_eq!(notes.len(), 2);
        assert_eq!(notes[0].id, "h2o");
        assert_eq!(notes[0].kind, NotificationKind::Warning);
        assert_eq!(
            notes[0].message,
            "You've only had 1.5L of water today. Reach for 2L!"
        );
        assert_eq!(notes[1].id, "act");
        assert_eq!(
            notes[1].message,
            "You burned 320 kcal doing Running. Keep it up!"
        );
    }

    #[test]
    fn notifications_pick_latest_timestamp_not_list_order() {
        let acts = [
            activity(1, "Yoga", 100, "2024-06-10", 50),
            activity(2, "Rowing", 250, "2024-06-10", 10),
        ];
        let notes = build_notifications(&acts, 2500);
        assert_eq!(notes.len(), 1);
        assert!(notes[0].message.contains("Yoga"));
        assert!(build_notifications(&[], 2000).is_empty());
    }

    #[test]
    fn recent_lists_are_newest_first() {
        let acts: Vec<Activity> = (1..=6)
            .map(|i| activity(i, "Walk", i * 10, "2024-06-10", 100 - i))
            .collect();
        let recent = recent_activities(&acts, RECENT_LIMIT);
        let ids: Vec<_> = recent.iter().filter_map(|a| a.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4]);
        let meals = [meal(1, "2024-06-10", 5), meal(2, "2024-06-10", 9)];
        assert_eq!(recent_meals(&meals, 4)[0].calories, 2);
    }

    #[test]
    fn dashboard_bundles_snapshot() {
        let snapshot = Snapshot {
            activities: vec![activity(1, "Run", 300, "2024-06-09", 1)],
            diet_entries: vec![meal(450, "2024-06-09", 2)],
            goals: vec![goal(2.0, 4.0)],
            profile: Some(Profile {
                name: "Ada Lovelace".into(),
                weight: "70".into(),
                feet: "5.9".into(),
            }),
            today_water_total: 2250,
        };
        let dash = Dashboard::from_snapshot(snapshot, day("2024-06-10"));
        assert_eq!(dash.today, "2024-06-10");
        assert_eq!(dash.first_name.as_deref(), Some("Ada"));
        assert_eq!(dash.bmi.map(|b| b.value), Some(21.6));
        assert_eq!(dash.calories_burned, 300);
        assert_eq!(dash.calories_consumed, 450);
        assert_eq!(dash.weekly_balance, Balance::Surplus);
        assert_eq!(dash.hydration.progress, 90.0);
        assert_eq!(dash.notifications.len(), 1);
        assert_eq!(dash.goals.len(), 1);
    }
}
