//src/form.rs
use thiserror::Error;

use crate::workout::{Workout, WorkoutType};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormError {
    #[error("Inputs have to be positive numbers")]
    NotPositiveNumbers,
    #[error("Unknown workout type: '{0}'. Expected 'running' or 'cycling'.")]
    UnknownType(String),
}

/// Raw entry form values, exactly as typed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkoutForm {
    pub workout_type: String,
    pub distance: String,
    pub duration: String,
    pub cadence: String,
    pub elevation: String,
}

/// Validated form input for one variant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WorkoutInput {
    Running {
        distance_km: f64,
        duration_min: f64,
        cadence: f64,
    },
    Cycling {
        distance_km: f64,
        duration_min: f64,
        elevation_gain_m: f64,
    },
}

impl WorkoutInput {
    pub const fn workout_type(&self) -> WorkoutType {
        match self {
            Self::Running { .. } => WorkoutType::Running,
            Self::Cycling { .. } => WorkoutType::Cycling,
        }
    }

    pub const fn distance_km(&self) -> f64 {
        match *self {
            Self::Running { distance_km, .. } | Self::Cycling { distance_km, .. } => distance_km,
        }
    }

    pub const fn duration_min(&self) -> f64 {
        match *self {
            Self::Running { duration_min, .. } | Self::Cycling { duration_min, .. } => {
                duration_min
            }
        }
    }
}

/// Number coercion as a browser does it: blank is 0, garbage is NaN.
/// Unsigned `0x`/`0o`/`0b` literals are read in their radix.
pub fn coerce_number(raw: &str) -> f64 {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return 0.0;
    }
    if let Some(value) = parse_radix_literal(trimmed) {
        return value;
    }
    trimmed.parse::<f64>().unwrap_or(f64::NAN)
}

#[allow(clippy::cast_precision_loss)]
fn parse_radix_literal(s: &str) -> Option<f64> {
    let prefix = s.get(..2)?;
    let digits = s.get(2..)?;
    let radix = match prefix.to_ascii_lowercase().as_str() {
        "0x" => 16,
        "0o" => 8,
        "0b" => 2,
        _ => return None,
    };
    // Signs and empty digit runs are invalid after a prefix
    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
        return Some(f64::NAN);
    }
    Some(u128::from_str_radix(digits, radix).map_or(f64::INFINITY, |n| n as f64))
}

fn all_finite(values: &[f64]) -> bool {
    values.iter().all(|v| v.is_finite())
}

fn all_positive(values: &[f64]) -> bool {
    values.iter().all(|v| *v > 0.0)
}

impl WorkoutForm {
    /// Empty form with the type selector set.
    pub fn new(workout_type: WorkoutType) -> Self {
        Self {
            workout_type: workout_type.to_string(),
            ..Default::default()
        }
    }

    /// Form pre-filled with a workout's current values (edit flow).
    pub fn from_workout(workout: &Workout) -> Self {
        Self {
            workout_type: workout.workout_type().to_string(),
            distance: workout.distance_km.to_string(),
            duration: workout.duration_min.to_string(),
            cadence: workout.cadence().map(|c| c.to_string()).unwrap_or_default(),
            elevation: workout
                .elevation_gain_m()
                .map(|e| e.to_string())
                .unwrap_or_default(),
        }
    }

    /// Coerces and validates the fields used by the selected type.
    ///
    /// Distance and duration must be positive, and so must cadence for a run.
    /// Elevation gain only has to be finite (zero and negative are accepted).
    ///
    /// # Errors
    /// - `FormError::UnknownType` if the type selector is not running/cycling.
    /// - `FormError::NotPositiveNumbers` if a used field fails the checks.
    pub fn validate(&self) -> Result<WorkoutInput, FormError> {
        let workout_type: WorkoutType = self
            .workout_type
            .trim()
            .parse()
            .map_err(|_| FormError::UnknownType(self.workout_type.clone()))?;

        let distance_km = coerce_number(&self.distance);
        let duration_min = coerce_number(&self.duration);

        match workout_type {
            WorkoutType::Running => {
                let cadence = coerce_number(&self.cadence);
                let fields = [distance_km, duration_min, cadence];
                if !all_finite(&fields) || !all_positive(&fields) {
                    return Err(FormError::NotPositiveNumbers);
                }
                Ok(WorkoutInput::Running {
                    distance_km,
                    duration_min,
                    cadence,
                })
            }
            WorkoutType::Cycling => {
                let elevation_gain_m = coerce_number(&self.elevation);
                if !all_finite(&[distance_km, duration_min, elevation_gain_m])
                    || !all_positive(&[distance_km, duration_min])
                {
                    return Err(FormError::NotPositiveNumbers);
                }
                Ok(WorkoutInput::Cycling {
                    distance_km,
                    duration_min,
                    elevation_gain_m,
                })
            }
        }
    }
}
