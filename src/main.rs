use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;

use fitpro_lib::commands;
use fitpro_lib::insights::{Balance, Dashboard};
use fitpro_lib::model::{ActivityInput, DietInput, GoalInput, Profile, RecordId};
use fitpro_lib::time::{parse_day_key, to_date};
use fitpro_lib::{AppState, Config};

#[derive(Debug, Parser)]
#[command(name = "fitpro", about = "Track workouts, meals, water and goals", version)]
struct Cli {
    /// Use this database file instead of the one in the data directory.
    #[arg(long, global = true, value_name = "PATH")]
    db: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Log and list workouts.
    #[command(subcommand)]
    Activity(ActivityCommand),
    /// Log and list meals.
    #[command(subcommand)]
    Meal(MealCommand),
    /// Log water and show today's intake.
    #[command(subcommand)]
    Water(WaterCommand),
    /// Manage goals.
    #[command(subcommand)]
    Goal(GoalCommand),
    /// Show or edit the user profile.
    #[command(subcommand)]
    Profile(ProfileCommand),
    /// Reload everything and print the dashboard.
    Dashboard(JsonFlag),
    /// Database inspection commands.
    #[command(subcommand)]
    Db(DbCommand),
}

#[derive(Debug, Args)]
struct JsonFlag {
    /// Emit JSON instead of the text view.
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Args)]
struct ListArgs {
    /// Only records for this calendar day (YYYY-MM-DD).
    #[arg(long)]
    date: Option<String>,
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Subcommand)]
enum ActivityCommand {
    Add {
        #[arg(long)]
        exercise: String,
        /// Minutes.
        #[arg(long, default_value = "")]
        duration: String,
        #[arg(long, default_value = "")]
        calories: String,
        /// low, moderate or high.
        #[arg(long, default_value = "moderate")]
        intensity: String,
        #[arg(long, default_value = "")]
        notes: String,
    },
    List(ListArgs),
}

#[derive(Debug, Subcommand)]
enum MealCommand {
    Add {
        #[arg(long)]
        name: String,
        /// breakfast, lunch, dinner or snack.
        #[arg(long = "type", default_value = "breakfast")]
        meal_type: String,
        #[arg(long, default_value = "")]
        calories: String,
        #[arg(long, default_value = "")]
        protein: String,
        #[arg(long, default_value = "")]
        carbs: String,
        #[arg(long, default_value = "")]
        fat: String,
        #[arg(long, default_value = "")]
        notes: String,
    },
    List(ListArgs),
}

#[derive(Debug, Subcommand)]
enum WaterCommand {
    /// Add a drink, in millilitres.
    Add { amount: i64 },
    Today(JsonFlag),
}

#[derive(Debug, Subcommand)]
enum GoalCommand {
    Add {
        #[arg(long)]
        name: String,
        #[arg(long = "type", default_value = "weight")]
        goal_type: String,
        #[arg(long, default_value = "")]
        target: String,
        #[arg(long, default_value = "")]
        current: String,
        /// km, kg, steps, kcal or mins.
        #[arg(long, default_value = "kg")]
        unit: String,
        #[arg(long, default_value = "")]
        deadline: String,
    },
    List(JsonFlag),
    /// Set the current value of a goal.
    Progress { id: RecordId, value: String },
    Delete { id: RecordId },
}

#[derive(Debug, Subcommand)]
enum ProfileCommand {
    /// Update the given fields; others keep their stored value.
    Set {
        #[arg(long)]
        name: Option<String>,
        /// Kilograms.
        #[arg(long)]
        weight: Option<String>,
        /// Height in feet.
        #[arg(long)]
        feet: Option<String>,
    },
    Show(JsonFlag),
}

#[derive(Debug, Subcommand)]
enum DbCommand {
    /// Report the schema version and applied migrations.
    Status(JsonFlag),
}

fn main() {
    let cli = Cli::parse();
    if let Err(err) = run(cli) {
        eprintln!("Error: {err:#}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let Cli { db, command } = cli;
    let mut config = Config::from_env().context("load configuration")?;
    if let Some(db) = db {
        config = config.with_db_path(db);
    }
    let _logging = fitpro_lib::logging::init(&config)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("start async runtime")?;

    runtime.block_on(async {
        let state = AppState::open(&config).await;
        if let Some(err) = state.open_error() {
            return Err(anyhow::Error::from(err));
        }
        let result = handle(&state, command).await;
        state.close().await;
        result
    })
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let out = serde_json::to_string_pretty(value).context("serialize output")?;
    println!("{out}");
    Ok(())
}

fn checked_day(date: Option<String>) -> Result<Option<String>> {
    match date {
        Some(day) if parse_day_key(&day).is_none() => {
            anyhow::bail!("invalid date {day:?}, expected YYYY-MM-DD")
        }
        other => Ok(other),
    }
}

fn clock(timestamp: i64) -> String {
    to_date(timestamp).format("%H:%M").to_string()
}

async fn handle(state: &AppState, command: Commands) -> Result<()> {
    match command {
        Commands::Activity(cmd) => handle_activity(state, cmd).await,
        Commands::Meal(cmd) => handle_meal(state, cmd).await,
        Commands::Water(cmd) => handle_water(state, cmd).await,
        Commands::Goal(cmd) => handle_goal(state, cmd).await,
        Commands::Profile(cmd) => handle_profile(state, cmd).await,
        Commands::Dashboard(JsonFlag { json }) => {
            let dashboard = commands::dashboard_reload(state).await?;
            if json {
                print_json(&dashboard)
            } else {
                print_dashboard(&dashboard);
                Ok(())
            }
        }
        Commands::Db(DbCommand::Status(JsonFlag { json })) => {
            let status = commands::db_status(state).await?;
            if json {
                return print_json(&status);
            }
            println!(
                "schema version {} (expected {})",
                status.schema_version, status.expected_version
            );
            for applied in &status.applied {
                let short = applied.checksum.get(..12).unwrap_or(&applied.checksum);
                println!("  applied  {}  {short}", applied.version);
            }
            for pending in &status.pending {
                println!("  pending  {pending}");
            }
            Ok(())
        }
    }
}

async fn handle_activity(state: &AppState, command: ActivityCommand) -> Result<()> {
    match command {
        ActivityCommand::Add {
            exercise,
            duration,
            calories,
            intensity,
            notes,
        } => {
            let input = ActivityInput {
                exercise,
                duration,
                calories,
                intensity,
                notes,
            };
            let activity = commands::activities_create(state, input).await?;
            println!(
                "Logged activity #{}: {} ({} min, {} kcal)",
                activity.id.unwrap_or_default(),
                activity.exercise,
                activity.duration,
                activity.calories
            );
            Ok(())
        }
        ActivityCommand::List(ListArgs { date, json }) => {
            let activities = commands::activities_list(state, checked_day(date)?).await?;
            if json {
                return print_json(&activities);
            }
            for a in &activities {
                println!(
                    "#{:<4} {} {}  {:<20} {:>4} min {:>5} kcal  {}",
                    a.id.unwrap_or_default(),
                    a.date,
                    clock(a.timestamp),
                    a.exercise,
                    a.duration,
                    a.calories,
                    a.intensity
                );
            }
            Ok(())
        }
    }
}

async fn handle_meal(state: &AppState, command: MealCommand) -> Result<()> {
    match command {
        MealCommand::Add {
            name,
            meal_type,
            calories,
            protein,
            carbs,
            fat,
            notes,
        } => {
            let input = DietInput {
                meal_type,
                meal_name: name,
                calories,
                protein,
                carbs,
                fat,
                notes,
            };
            let entry = commands::diet_create(state, input).await?;
            println!(
                "Logged {} #{}: {} ({} kcal)",
                entry.meal_type,
                entry.id.unwrap_or_default(),
                entry.meal_name,
                entry.calories
            );
            Ok(())
        }
        MealCommand::List(ListArgs { date, json }) => {
            let entries = commands::diet_list(state, checked_day(date)?).await?;
            if json {
                return print_json(&entries);
            }
            for e in &entries {
                println!(
                    "#{:<4} {} {}  {:<9} {:<20} {:>5} kcal  P{} C{} F{}",
                    e.id.unwrap_or_default(),
                    e.date,
                    clock(e.timestamp),
                    e.meal_type,
                    e.meal_name,
                    e.calories,
                    e.protein,
                    e.carbs,
                    e.fat
                );
            }
            Ok(())
        }
    }
}

async fn handle_water(state: &AppState, command: WaterCommand) -> Result<()> {
    match command {
        WaterCommand::Add { amount } => {
            let log = commands::water_add(state, amount).await?;
            println!("Logged {} ml of water", log.amount);
            Ok(())
        }
        WaterCommand::Today(JsonFlag { json }) => {
            let today = commands::water_today(state).await?;
            if json {
                return print_json(&today);
            }
            println!(
                "{}: {} / {} ml ({:.0}%)",
                today.date,
                today.hydration.total_ml,
                today.hydration.goal_ml,
                today.hydration.progress
            );
            Ok(())
        }
    }
}

async fn handle_goal(state: &AppState, command: GoalCommand) -> Result<()> {
    match command {
        GoalCommand::Add {
            name,
            goal_type,
            target,
            current,
            unit,
            deadline,
        } => {
            let input = GoalInput {
                goal_type,
                goal_name: name,
                target_value: target,
                current_value: current,
                unit,
                deadline,
            };
            let view = commands::goals_create(state, input).await?;
            println!(
                "Created goal #{}: {}",
                view.goal.id.unwrap_or_default(),
                view.goal.goal_name
            );
            Ok(())
        }
        GoalCommand::List(JsonFlag { json }) => {
            let goals = commands::goals_list(state).await?;
            if json {
                return print_json(&goals);
            }
            for view in &goals {
                let g = &view.goal;
                println!(
                    "#{:<4} {:<24} {} / {} {}  {:>5.1}%  {}{}",
                    g.id.unwrap_or_default(),
                    g.goal_name,
                    g.current_value,
                    g.target_value,
                    g.unit,
                    view.progress,
                    g.status,
                    if view.reached { "  reached" } else { "" }
                );
            }
            Ok(())
        }
        GoalCommand::Progress { id, value } => {
            let view = commands::goals_update_progress(state, id, value).await?;
            println!(
                "Goal #{id} is at {:.1}% ({} / {} {})",
                view.progress, view.goal.current_value, view.goal.target_value, view.goal.unit
            );
            Ok(())
        }
        GoalCommand::Delete { id } => {
            commands::goals_delete(state, id).await?;
            println!("Deleted goal #{id}");
            Ok(())
        }
    }
}

async fn handle_profile(state: &AppState, command: ProfileCommand) -> Result<()> {
    match command {
        ProfileCommand::Set { name, weight, feet } => {
            let current = commands::profile_get(state).await?.profile;
            let profile = Profile {
                name: name.unwrap_or(current.name),
                weight: weight.unwrap_or(current.weight),
                feet: feet.unwrap_or(current.feet),
            };
            let view = commands::profile_save(state, profile).await?;
            println!("Saved profile for {}", view.profile.first_name().unwrap_or("you"));
            Ok(())
        }
        ProfileCommand::Show(JsonFlag { json }) => {
            let view = commands::profile_get(state).await?;
            if json {
                return print_json(&view);
            }
            println!("name:   {}", view.profile.name);
            println!("weight: {} kg", view.profile.weight);
            println!("height: {} ft", view.profile.feet);
            match view.bmi {
                Some(bmi) => println!("bmi:    {} ({:?})", bmi.value, bmi.category),
                None => println!("bmi:    -"),
            }
            Ok(())
        }
    }
}

fn print_dashboard(d: &Dashboard) {
    println!("Hello, {}! Today is {}.", d.first_name.as_deref().unwrap_or("there"), d.today);
    println!(
        "Calories burned {} / consumed {} (all time)",
        d.calories_burned, d.calories_consumed
    );
    println!(
        "Water {} / {} ml ({:.0}%)",
        d.hydration.total_ml, d.hydration.goal_ml, d.hydration.progress
    );
    let balance = match d.weekly_balance {
        Balance::Deficit => "deficit",
        Balance::Surplus => "surplus",
    };
    println!(
        "This week: {} workouts, {} kcal burned, {} kcal eaten ({balance})",
        d.weekly.workout_count, d.weekly.burned, d.weekly.consumed
    );
    if let Some(bmi) = d.bmi {
        println!("BMI {} ({:?})", bmi.value, bmi.category);
    }
    for n in &d.notifications {
        println!("[{}] {}", n.title, n.message);
    }
    for a in &d.recent_activities {
        println!("  {} {} kcal ({})", a.exercise, a.calories, a.date);
    }
    for m in &d.recent_meals {
        println!("  {} {} kcal ({})", m.meal_name, m.calories, m.date);
    }
}
