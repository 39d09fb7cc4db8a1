use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_VOLUME_METRIC: &str = "reps";
pub const DEFAULT_INTENSITY_METRIC: &str = "rpe";

/// A multi-week workout plan. `created_at` doubles as the publish marker:
/// `None` means the program is still a draft.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Program {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    pub tags: Vec<String>,
    pub total_weeks: u32,
    pub last_workout_number: u32,
    pub public: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl Program {
    pub fn is_published(&self) -> bool {
        self.created_at.is_some()
    }

    pub fn validate(&self) -> Result<(), String> {
        validate_non_empty(&self.id, "program.id")?;
        validate_non_empty(&self.name, "program.name")?;
        if self.total_weeks == 0 {
            return Err("program.total_weeks must be > 0".to_string());
        }
        for tag in &self.tags {
            validate_non_empty(tag, "program.tags[]")?;
        }
        Ok(())
    }
}

/// One prescribed unit of work within an exercise. Both bounds of an axis are
/// populated for "range" metrics; otherwise only the upper value is used.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ExerciseSet {
    pub number: u32,
    #[serde(default)]
    pub volume_lower: Option<f64>,
    #[serde(default)]
    pub volume_upper: Option<f64>,
    #[serde(default)]
    pub intensity_lower: Option<f64>,
    #[serde(default)]
    pub intensity_upper: Option<f64>,
}

impl ExerciseSet {
    pub fn new(number: u32) -> Self {
        Self {
            number,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.number == 0 {
            return Err("set.number must be >= 1".to_string());
        }
        if let (Some(lower), Some(upper)) = (self.volume_lower, self.volume_upper) {
            if lower > upper {
                return Err("set.volume_lower must be <= set.volume_upper".to_string());
            }
        }
        if let (Some(lower), Some(upper)) = (self.intensity_lower, self.intensity_upper) {
            if lower > upper {
                return Err("set.intensity_lower must be <= set.intensity_upper".to_string());
            }
        }
        Ok(())
    }

    pub fn apply_update(&mut self, update: &SetUpdate) {
        if let Some(value) = update.volume_lower {
            self.volume_lower = Some(value);
        }
        if let Some(value) = update.volume_upper {
            self.volume_upper = Some(value);
        }
        if let Some(value) = update.intensity_lower {
            self.intensity_lower = Some(value);
        }
        if let Some(value) = update.intensity_upper {
            self.intensity_upper = Some(value);
        }
    }
}

/// Partial update for one set; absent fields keep their current value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SetUpdate {
    pub volume_lower: Option<f64>,
    pub volume_upper: Option<f64>,
    pub intensity_lower: Option<f64>,
    pub intensity_upper: Option<f64>,
}

/// Stable list-rendering identity for a set. Never persisted: the remote
/// store keys sets on owning exercise id plus `number`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SetKey {
    pub exercise_id: String,
    pub number: u32,
}

/// One catalog movement placed into a workout.
///
/// `order` is 1-based and dense within the owning workout; `workout_number`
/// is globally unique within the program and never reused.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkoutExercise {
    pub id: String,
    pub program_id: String,
    pub week: u32,
    pub workout_number: u32,
    pub order: u32,
    pub exercise_id: String,
    #[serde(default)]
    pub volume_metric: Option<String>,
    #[serde(default)]
    pub intensity_metric: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    pub sets: Vec<ExerciseSet>,
}

impl WorkoutExercise {
    /// A fresh exercise with the default metric selectors and a single
    /// empty set, the shape every creation path starts from.
    pub fn with_default_set(
        id: impl Into<String>,
        program_id: impl Into<String>,
        week: u32,
        workout_number: u32,
        order: u32,
        exercise_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            program_id: program_id.into(),
            week,
            workout_number,
            order,
            exercise_id: exercise_id.into(),
            volume_metric: Some(DEFAULT_VOLUME_METRIC.to_string()),
            intensity_metric: Some(DEFAULT_INTENSITY_METRIC.to_string()),
            notes: None,
            sets: vec![ExerciseSet::new(1)],
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        validate_non_empty(&self.id, "exercise.id")?;
        validate_non_empty(&self.exercise_id, "exercise.exercise_id")?;
        if self.week == 0 {
            return Err("exercise.week must be >= 1".to_string());
        }
        if self.order == 0 {
            return Err("exercise.order must be >= 1".to_string());
        }
        for (index, set) in self.sets.iter().enumerate() {
            set.validate()?;
            if set.number != index as u32 + 1 {
                return Err(format!(
                    "exercise.sets must be numbered 1..{} without gaps",
                    self.sets.len()
                ));
            }
        }
        Ok(())
    }

    pub fn apply_update(&mut self, update: &ExerciseUpdate) {
        if let Some(exercise_id) = &update.exercise_id {
            self.exercise_id = exercise_id.clone();
        }
        if let Some(metric) = &update.volume_metric {
            self.volume_metric = normalize_optional(metric);
        }
        if let Some(metric) = &update.intensity_metric {
            self.intensity_metric = normalize_optional(metric);
        }
        if let Some(notes) = &update.notes {
            self.notes = normalize_optional(notes);
        }
    }

    pub fn set_keys(&self) -> Vec<SetKey> {
        self.sets
            .iter()
            .map(|set| SetKey {
                exercise_id: self.id.clone(),
                number: set.number,
            })
            .collect()
    }
}

/// Partial update for one exercise; absent fields keep their current value.
/// Optional text set to a blank string clears the field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExerciseUpdate {
    pub exercise_id: Option<String>,
    pub volume_metric: Option<String>,
    pub intensity_metric: Option<String>,
    pub notes: Option<String>,
}

/// A numbered workout within a week. Display order within the week is list
/// position, independent of `workout_number`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Workout {
    pub workout_number: u32,
    pub exercises: Vec<WorkoutExercise>,
}

impl Workout {
    pub fn validate(&self) -> Result<(), String> {
        if self.workout_number == 0 {
            return Err("workout.workout_number must be >= 1".to_string());
        }
        for (index, exercise) in self.exercises.iter().enumerate() {
            exercise.validate()?;
            if exercise.order != index as u32 + 1 {
                return Err(format!(
                    "workout.exercises must be ordered 1..{} without gaps",
                    self.exercises.len()
                ));
            }
        }
        Ok(())
    }
}

/// The bearer credential pair held by the gateway.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuthTokens {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

fn validate_non_empty(value: &str, field_name: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("{field_name} must not be empty"));
    }
    Ok(())
}

fn normalize_optional(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
