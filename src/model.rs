use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use ts_rs::TS;

use crate::coerce::{coerce_numeric, coerce_whole};

/// Store-assigned identifier of list-type records.
pub type RecordId = i64;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid {kind} value: {value}")]
pub struct ParseEnumError {
    kind: &'static str,
    value: String,
}

impl ParseEnumError {
    pub fn value(&self) -> &str {
        &self.value
    }
}

/// Closed vocabularies that decode leniently: strict `FromStr`, plus
/// `parse_lossy` which falls back to the form default.
macro_rules! record_enum {
    (
        $(#[$meta:meta])*
        $name:ident ($kind:literal, default = $default:ident) {
            $( $variant:ident => $text:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
        #[serde(rename_all = "lowercase")]
        #[ts(export, rename_all = "lowercase")]
        pub enum $name {
            $( $variant ),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$( $name::$variant ),+];

            pub const fn as_str(self) -> &'static str {
                match self {
                    $( $name::$variant => $text ),+
                }
            }

            pub fn parse_lossy(value: &str) -> Self {
                value.trim().to_ascii_lowercase().parse().unwrap_or_default()
            }
        }

        impl Default for $name {
            fn default() -> Self {
                $name::$default
            }
        }

        impl FromStr for $name {
            type Err = ParseEnumError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $( $text => Ok($name::$variant), )+
                    other => Err(ParseEnumError {
                        kind: $kind,
                        value: other.to_string(),
                    }),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

record_enum! {
    /// Perceived effort of a workout.
    Intensity ("intensity", default = Moderate) {
        Low => "low",
        Moderate => "moderate",
        High => "high",
    }
}

record_enum! {
    MealType ("meal type", default = Breakfast) {
        Breakfast => "breakfast",
        Lunch => "lunch",
        Dinner => "dinner",
        Snack => "snack",
    }
}

record_enum! {
    GoalUnit ("goal unit", default = Kg) {
        Km => "km",
        Kg => "kg",
        Steps => "steps",
        Kcal => "kcal",
        Mins => "mins",
    }
}

record_enum! {
    /// Set by the user only; nothing transitions a goal automatically.
    GoalStatus ("goal status", default = Active) {
        Active => "active",
        Completed => "completed",
        Failed => "failed",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Activity {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional, type = "number")]
    pub id: Option<RecordId>,
    pub exercise: String,
    /// Minutes.
    #[ts(type = "number")]
    pub duration: i64,
    #[ts(type = "number")]
    pub calories: i64,
    pub intensity: Intensity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub notes: Option<String>,
    pub date: String,
    #[ts(type = "number")]
    pub timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct DietEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional, type = "number")]
    pub id: Option<RecordId>,
    pub meal_type: MealType,
    pub meal_name: String,
    #[ts(type = "number")]
    pub calories: i64,
    #[ts(type = "number")]
    pub protein: i64,
    #[ts(type = "number")]
    pub carbs: i64,
    #[ts(type = "number")]
    pub fat: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub notes: Option<String>,
    pub date: String,
    #[ts(type = "number")]
    pub timestamp: i64,
}

/// A target the user tracks by hand. Either value may be NaN when the
/// form field was left empty; NaN travels as `null` on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Goal {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional, type = "number")]
    pub id: Option<RecordId>,
    pub goal_type: String,
    pub goal_name: String,
    #[serde(with = "nan_as_null")]
    #[ts(type = "number | null")]
    pub target_value: f64,
    #[serde(with = "nan_as_null")]
    #[ts(type = "number | null")]
    pub current_value: f64,
    pub unit: GoalUnit,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub deadline: Option<String>,
    #[ts(type = "number")]
    pub created_at: i64,
    pub status: GoalStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct WaterLog {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional, type = "number")]
    pub id: Option<RecordId>,
    /// Millilitres.
    #[ts(type = "number")]
    pub amount: i64,
    pub date: String,
    #[ts(type = "number")]
    pub timestamp: i64,
}

/// The singleton user profile. Weight (kg) and height (feet) stay text,
/// exactly as typed; BMI is derived on read.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(default)]
#[ts(export)]
pub struct Profile {
    pub name: String,
    pub weight: String,
    pub feet: String,
}

impl Profile {
    /// First word of the name, used for greetings.
    pub fn first_name(&self) -> Option<&str> {
        self.name.split_whitespace().next()
    }
}

fn blank_to_none(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

/// Raw workout form fields.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ActivityInput {
    pub exercise: String,
    pub duration: String,
    pub calories: String,
    pub intensity: String,
    pub notes: String,
}

impl ActivityInput {
    pub fn into_record(self, date: String, timestamp: i64) -> Activity {
        Activity {
            id: None,
            exercise: self.exercise,
            duration: coerce_whole(&self.duration, 0),
            calories: coerce_whole(&self.calories, 0),
            intensity: Intensity::parse_lossy(&self.intensity),
            notes: blank_to_none(self.notes),
            date,
            timestamp,
        }
    }
}

/// Raw meal form fields.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DietInput {
    pub meal_type: String,
    pub meal_name: String,
    pub calories: String,
    pub protein: String,
    pub carbs: String,
    pub fat: String,
    pub notes: String,
}

impl DietInput {
    pub fn into_record(self, date: String, timestamp: i64) -> DietEntry {
        DietEntry {
            id: None,
            meal_type: MealType::parse_lossy(&self.meal_type),
            meal_name: self.meal_name,
            calories: coerce_whole(&self.calories, 0),
            protein: coerce_whole(&self.protein, 0),
            carbs: coerce_whole(&self.carbs, 0),
            fat: coerce_whole(&self.fat, 0),
            notes: blank_to_none(self.notes),
            date,
            timestamp,
        }
    }
}

/// Raw goal form fields.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GoalInput {
    pub goal_type: String,
    pub goal_name: String,
    pub target_value: String,
    pub current_value: String,
    pub unit: String,
    pub deadline: String,
}

impl Default for GoalInput {
    fn default() -> Self {
        Self {
            goal_type: "weight".to_string(),
            goal_name: String::new(),
            target_value: String::new(),
            current_value: String::new(),
            unit: GoalUnit::Kg.as_str().to_string(),
            deadline: String::new(),
        }
    }
}

impl GoalInput {
    pub fn into_record(self, created_at: i64) -> Goal {
        let goal_type = if self.goal_type.trim().is_empty() {
            "weight".to_string()
        } else {
            self.goal_type
        };
        Goal {
            id: None,
            goal_type,
            goal_name: self.goal_name,
            target_value: coerce_numeric(&self.target_value, f64::NAN),
            current_value: coerce_numeric(&self.current_value, f64::NAN),
            unit: GoalUnit::parse_lossy(&self.unit),
            deadline: blank_to_none(self.deadline),
            created_at,
            status: GoalStatus::Active,
        }
    }
}

pub(crate) mod nan_as_null {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if value.is_nan() {
            serializer.serialize_none()
        } else {
            serializer.serialize_some(value)
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::NAN))
    }
}
