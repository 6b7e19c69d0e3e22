#![allow(clippy::unwrap_used, clippy::expect_used)]

use fitpro_lib::model::{
    Activity, ActivityInput, DietEntry, DietInput, Goal, GoalInput, GoalStatus, Intensity,
    MealType, Profile, WaterLog,
};
use fitpro_lib::repo::Record;
use fitpro_lib::StoreError;

mod util;

fn run(exercise: &str, date: &str, timestamp: i64) -> Activity {
    ActivityInput {
        exercise: exercise.into(),
        duration: "30".into(),
        calories: "250".into(),
        intensity: "high".into(),
        notes: String::new(),
    }
    .into_record(date.into(), timestamp)
}

fn lunch(date: &str) -> DietEntry {
    DietInput {
        meal_type: "lunch".into(),
        meal_name: "Chicken salad".into(),
        calories: "450".into(),
        protein: "35".into(),
        carbs: "20".into(),
        fat: "18".into(),
        notes: "extra dressing".into(),
    }
    .into_record(date.into(), 1_718_000_000_000)
}

#[tokio::test]
async fn inserted_activity_reads_back_with_its_id() {
    let store = util::memory_store().await;
    let activity = run("Running", "2024-06-10", 1_718_000_000_000);
    let id = store.insert(&activity).await.unwrap();

    let all: Vec<Activity> = store.list_all().await.unwrap();
    assert_eq!(all, vec![activity.clone().with_id(id)]);
    assert_eq!(all[0].intensity, Intensity::High);
    assert_eq!(all[0].calories, 250);
}

#[tokio::test]
async fn ids_are_never_reused_after_delete() {
    let store = util::memory_store().await;
    let first = store.insert(&run("Yoga", "2024-06-10", 1)).await.unwrap();
    store.delete::<Activity>(first).await.unwrap();
    let second = store.insert(&run("Yoga", "2024-06-10", 2)).await.unwrap();
    assert!(second > first);
}

#[tokio::test]
async fn list_by_date_matches_only_that_day() {
    let store = util::memory_store().await;
    store.insert(&lunch("2024-06-09")).await.unwrap();
    store.insert(&lunch("2024-06-10")).await.unwrap();
    store.insert(&lunch("2024-06-10")).await.unwrap();

    let day: Vec<DietEntry> = store.list_by_date("2024-06-10").await.unwrap();
    assert_eq!(day.len(), 2);
    assert!(day.iter().all(|e| e.date == "2024-06-10"));
    assert_eq!(day[0].meal_type, MealType::Lunch);
    assert_eq!(day[0].notes.as_deref(), Some("extra dressing"));

    let all: Vec<DietEntry> = store.list_all().await.unwrap();
    let filtered: Vec<_> = all.into_iter().filter(|e| e.date == "2024-06-10").collect();
    assert_eq!(filtered, day);

    let empty: Vec<DietEntry> = store.list_by_date("2030-01-01").await.unwrap();
    assert!(empty.is_empty());
}

#[tokio::test]
async fn update_replaces_whole_record() {
    let store = util::memory_store().await;
    let goal = GoalInput {
        goal_name: "Run 10k".into(),
        goal_type: "distance".into(),
        target_value: "10".into(),
        current_value: "2".into(),
        unit: "km".into(),
        deadline: "2024-12-31".into(),
    }
    .into_record(100);
    let id = store.insert(&goal).await.unwrap();

    let mut changed = goal.clone();
    changed.current_value = 7.5;
    changed.status = GoalStatus::Completed;
    store.update(id, &changed).await.unwrap();

    let back: Goal = store.get(id).await.unwrap().expect("goal present");
    assert_eq!(back.current_value, 7.5);
    assert_eq!(back.status, GoalStatus::Completed);
    assert_eq!(back.deadline.as_deref(), Some("2024-12-31"));
}

#[tokio::test]
async fn update_of_absent_id_is_not_found_and_creates_nothing() {
    let store = util::memory_store().await;
    let log = WaterLog {
        id: None,
        amount: 250,
        date: "2024-06-10".into(),
        timestamp: 1,
    };
    let err = store.update(404, &log).await.unwrap_err();
    assert!(matches!(
        err,
        StoreError::NotFound {
            container: "water",
            id: 404
        }
    ));
    let all: Vec<WaterLog> = store.list_all().await.unwrap();
    assert!(all.is_empty());
}

#[tokio::test]
async fn delete_is_idempotent() {
    let store = util::memory_store().await;
    let id = store.insert(&run("Swim", "2024-06-10", 1)).await.unwrap();
    store.delete::<Activity>(id).await.unwrap();
    store.delete::<Activity>(id).await.unwrap();
    store.delete::<Activity>(9_999).await.unwrap();
    assert_eq!(store.get::<Activity>(id).await.unwrap(), None);
}

#[tokio::test]
async fn profile_is_a_singleton() {
    let store = util::memory_store().await;
    assert_eq!(store.get_profile().await.unwrap(), None);

    let first = Profile {
        name: "Sam Rivera".into(),
        weight: "82".into(),
        feet: "6.1".into(),
    };
    store.put_profile(&first).await.unwrap();
    let second = Profile {
        weight: "80".into(),
        ..first.clone()
    };
    store.put_profile(&second).await.unwrap();

    assert_eq!(store.get_profile().await.unwrap(), Some(second));
}

#[tokio::test]
async fn snapshot_reads_every_container() {
    let store = util::memory_store().await;
    store.insert(&run("Row", "2024-06-10", 5)).await.unwrap();
    store.insert(&lunch("2024-06-10")).await.unwrap();
    store
        .insert(&GoalInput {
            goal_name: "Lose weight".into(),
            ..GoalInput::default()
        }
        .into_record(1))
        .await
        .unwrap();
    for (amount, date) in [(250, "2024-06-10"), (500, "2024-06-10"), (1000, "2024-06-09")] {
        store
            .insert(&WaterLog {
                id: None,
                amount,
                date: date.into(),
                timestamp: 0,
            })
            .await
            .unwrap();
    }

    let snapshot = store.snapshot("2024-06-10").await.unwrap();
    assert_eq!(snapshot.activities.len(), 1);
    assert_eq!(snapshot.diet_entries.len(), 1);
    assert_eq!(snapshot.goals.len(), 1);
    assert!(snapshot.goals[0].target_value.is_nan());
    assert_eq!(snapshot.today_water_total, 750);
    assert_eq!(snapshot.profile, None);

    store.put_profile(&Profile::default()).await.unwrap();
    let snapshot = store.snapshot("2024-06-10").await.unwrap();
    assert_eq!(snapshot.profile, Some(Profile::default()));
}

#[tokio::test]
async fn file_store_persists_across_reopen() {
    let (_dir, path) = util::temp_db();
    let store = util::file_store(&path).await;
    let id = store.insert(&run("Hike", "2024-06-08", 9)).await.unwrap();
    store.close().await;

    let reopened = util::file_store(&path).await;
    let back: Option<Activity> = reopened.get(id).await.unwrap();
    assert_eq!(back.map(|a| a.exercise), Some("Hike".to_string()));
    reopened.close().await;
}
