//src/workout.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use strum_macros::{Display, EnumIter, EnumString};
use thiserror::Error;

use crate::form::WorkoutInput;

/// Number of trailing timestamp digits used for a workout id.
const ID_DIGITS: usize = 10;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum WorkoutError {
    #[error("Cannot change a {from} workout into a {to} workout. Delete it and log a new one instead.")]
    TypeChange { from: WorkoutType, to: WorkoutType },
}

/// A (latitude, longitude) pair. Stored on the wire as `[lat, lng]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// True when both parts are finite and inside the WGS84 range.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }
}

impl From<[f64; 2]> for Coordinates {
    fn from([lat, lng]: [f64; 2]) -> Self {
        Self { lat, lng }
    }
}

impl From<Coordinates> for [f64; 2] {
    fn from(value: Coordinates) -> Self {
        [value.lat, value.lng]
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:.5}, {:.5}]", self.lat, self.lng)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum WorkoutType {
    Running,
    Cycling,
}

impl WorkoutType {
    /// Capitalised name used in descriptions.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Running => "Running",
            Self::Cycling => "Cycling",
        }
    }

    pub const fn icon(self) -> &'static str {
        match self {
            Self::Running => "🏃‍♂️",
            Self::Cycling => "🚴‍♀️",
        }
    }
}

/// Variant-specific attributes and the metric derived for that variant.
/// The `type` tag selects the variant when a stored record is read back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum WorkoutKind {
    Running {
        cadence: f64,
        #[serde(rename = "paceMinPerKm")]
        pace_min_per_km: f64,
    },
    Cycling {
        #[serde(rename = "elevationGainM")]
        elevation_gain_m: f64,
        #[serde(rename = "speedKmPerH")]
        speed_km_per_h: f64,
    },
}

impl WorkoutKind {
    pub const fn workout_type(&self) -> WorkoutType {
        match self {
            Self::Running { .. } => WorkoutType::Running,
            Self::Cycling { .. } => WorkoutType::Cycling,
        }
    }
}

/// One logged session. Derived fields (`description`, pace, speed) are set by
/// the constructors and only change again through [`Workout::apply_edit`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workout {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub coordinates: Coordinates,
    pub distance_km: f64,
    pub duration_min: f64,
    pub description: String,
    #[serde(default)]
    pub interaction_count: u32,
    #[serde(flatten)]
    pub kind: WorkoutKind,
}

/// Minutes per kilometre.
pub fn pace_min_per_km(distance_km: f64, duration_min: f64) -> f64 {
    duration_min / distance_km
}

/// Kilometres per hour.
pub fn speed_km_per_h(distance_km: f64, duration_min: f64) -> f64 {
    distance_km / (duration_min / 60.0)
}

/// Builds an id from the last ten digits of the millisecond timestamp.
pub fn id_from_timestamp(created_at: DateTime<Utc>) -> String {
    let millis = created_at.timestamp_millis().to_string();
    let start = millis.len().saturating_sub(ID_DIGITS);
    millis[start..].to_string()
}

/// "Running on April 14"
pub fn describe(workout_type: WorkoutType, created_at: DateTime<Utc>) -> String {
    format!("{} on {}", workout_type.label(), created_at.format("%B %-d"))
}

impl Workout {
    pub fn running(
        created_at: DateTime<Utc>,
        coordinates: Coordinates,
        distance_km: f64,
        duration_min: f64,
        cadence: f64,
    ) -> Self {
        let kind = WorkoutKind::Running {
            cadence,
            pace_min_per_km: pace_min_per_km(distance_km, duration_min),
        };
        Self::build(created_at, coordinates, distance_km, duration_min, kind)
    }

    pub fn cycling(
        created_at: DateTime<Utc>,
        coordinates: Coordinates,
        distance_km: f64,
        duration_min: f64,
        elevation_gain_m: f64,
    ) -> Self {
        let kind = WorkoutKind::Cycling {
            elevation_gain_m,
            speed_km_per_h: speed_km_per_h(distance_km, duration_min),
        };
        Self::build(created_at, coordinates, distance_km, duration_min, kind)
    }

    /// Constructs the variant matching an already validated form input.
    pub fn from_input(
        created_at: DateTime<Utc>,
        coordinates: Coordinates,
        input: &WorkoutInput,
    ) -> Self {
        match *input {
            WorkoutInput::Running {
                distance_km,
                duration_min,
                cadence,
            } => Self::running(created_at, coordinates, distance_km, duration_min, cadence),
            WorkoutInput::Cycling {
                distance_km,
                duration_min,
                elevation_gain_m,
            } => Self::cycling(
                created_at,
                coordinates,
                distance_km,
                duration_min,
                elevation_gain_m,
            ),
        }
    }

    fn build(
        created_at: DateTime<Utc>,
        coordinates: Coordinates,
        distance_km: f64,
        duration_min: f64,
        kind: WorkoutKind,
    ) -> Self {
        Self {
            id: id_from_timestamp(created_at),
            created_at,
            coordinates,
            distance_km,
            duration_min,
            description: describe(kind.workout_type(), created_at),
            interaction_count: 0,
            kind,
        }
    }

    pub const fn workout_type(&self) -> WorkoutType {
        self.kind.workout_type()
    }

    pub const fn cadence(&self) -> Option<f64> {
        match self.kind {
            WorkoutKind::Running { cadence, .. } => Some(cadence),
            WorkoutKind::Cycling { .. } => None,
        }
    }

    pub const fn elevation_gain_m(&self) -> Option<f64> {
        match self.kind {
            WorkoutKind::Cycling {
                elevation_gain_m, ..
            } => Some(elevation_gain_m),
            WorkoutKind::Running { .. } => None,
        }
    }

    pub const fn pace_min_per_km(&self) -> Option<f64> {
        match self.kind {
            WorkoutKind::Running {
                pace_min_per_km, ..
            } => Some(pace_min_per_km),
            WorkoutKind::Cycling { .. } => None,
        }
    }

    pub const fn speed_km_per_h(&self) -> Option<f64> {
        match self.kind {
            WorkoutKind::Cycling { speed_km_per_h, .. } => Some(speed_km_per_h),
            WorkoutKind::Running { .. } => None,
        }
    }

    pub fn click(&mut self) {
        self.interaction_count += 1;
    }

    /// Overwrites distance, duration and the variant attribute, then rebuilds
    /// every derived field. `id`, `created_at`, coordinates and the
    /// interaction count are kept.
    ///
    /// # Errors
    /// Returns `WorkoutError::TypeChange` if `input` is for the other variant.
    pub fn apply_edit(&mut self, input: &WorkoutInput) -> Result<(), WorkoutError> {
        let current = self.workout_type();
        if input.workout_type() != current {
            return Err(WorkoutError::TypeChange {
                from: current,
                to: input.workout_type(),
            });
        }

        let rebuilt = Self::from_input(self.created_at, self.coordinates, input);
        self.distance_km = rebuilt.distance_km;
        self.duration_min = rebuilt.duration_min;
        self.description = rebuilt.description;
        self.kind = rebuilt.kind;
        Ok(())
    }

    /// Popup text shown on the map marker.
    pub fn marker_label(&self) -> String {
        format!("{} {}", self.workout_type().icon(), self.description)
    }

    /// CSS-style class name for the marker popup, e.g. `running-popup`.
    pub fn popup_class(&self) -> String {
        format!("{}-popup", self.workout_type())
    }
}
