use std::{fmt, str::FromStr};

use chrono::{DateTime, Local};
use serde_derive::{Deserialize, Serialize};

use crate::{errors::PersistenceError, util::DateTimeUtils};

use super::common::{Identifiable, LatLng, WorkoutId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkoutType {
    Running,
    Cycling,
}

impl WorkoutType {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkoutType::Running => "running",
            WorkoutType::Cycling => "cycling",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            WorkoutType::Running => "Running",
            WorkoutType::Cycling => "Cycling",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            WorkoutType::Running => "🏃‍♂️",
            WorkoutType::Cycling => "🚴‍♀️",
        }
    }
}

impl fmt::Display for WorkoutType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for WorkoutType {
    type Err = PersistenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "running" => Ok(WorkoutType::Running),
            "cycling" => Ok(WorkoutType::Cycling),
            other => Err(PersistenceError::UnknownWorkoutType(other.to_string())),
        }
    }
}

/// Variant data plus the derived metric of each workout type.
#[derive(Debug, Clone, PartialEq)]
pub enum WorkoutKind {
    /// `pace` in min/km
    Running { cadence: f64, pace: f64 },
    /// `speed` in km/h
    Cycling { elevation_gain: f64, speed: f64 },
}

/// Reverse geocoding result. Absent parts are left out when formatted.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct Address {
    pub road: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<&str> = [&self.road, &self.city, &self.country]
            .into_iter()
            .filter_map(|part| part.as_deref())
            .filter(|part| !part.is_empty())
            .collect();

        write!(f, "{}", parts.join(", "))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherSnapshot {
    pub temperature_c: f64,
    pub wind_speed: f64,
    pub humidity_pct: f64,
}

impl WeatherSnapshot {
    pub fn summary(&self) -> String {
        format!(
            "{} ℃, {} m/s, {}%",
            self.temperature_c, self.wind_speed, self.humidity_pct
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Workout {
    pub id: WorkoutId,
    pub coords: LatLng,
    /// km
    pub distance: f64,
    /// min
    pub duration: f64,
    pub created_at: DateTime<Local>,
    pub description: String,
    pub kind: WorkoutKind,

    pub address: Option<String>,
    pub weather: Option<WeatherSnapshot>,
}

impl Workout {
    pub const ADDRESS_PLACEHOLDER: &'static str = "loading...";

    pub fn running(
        id: WorkoutId,
        coords: LatLng,
        distance: f64,
        duration: f64,
        cadence: f64,
        created_at: DateTime<Local>,
    ) -> Self {
        let kind = WorkoutKind::Running {
            cadence,
            pace: Workout::pace(distance, duration),
        };

        Workout::build(id, coords, distance, duration, created_at, kind)
    }

    pub fn cycling(
        id: WorkoutId,
        coords: LatLng,
        distance: f64,
        duration: f64,
        elevation_gain: f64,
        created_at: DateTime<Local>,
    ) -> Self {
        let kind = WorkoutKind::Cycling {
            elevation_gain,
            speed: Workout::speed(distance, duration),
        };

        Workout::build(id, coords, distance, duration, created_at, kind)
    }

    /// Dispatches on the type discriminator; `extra` is the cadence or the elevation gain.
    pub fn of_type(
        workout_type: WorkoutType,
        id: WorkoutId,
        coords: LatLng,
        distance: f64,
        duration: f64,
        extra: f64,
        created_at: DateTime<Local>,
    ) -> Self {
        match workout_type {
            WorkoutType::Running => {
                Workout::running(id, coords, distance, duration, extra, created_at)
            }
            WorkoutType::Cycling => {
                Workout::cycling(id, coords, distance, duration, extra, created_at)
            }
        }
    }

    fn build(
        id: WorkoutId,
        coords: LatLng,
        distance: f64,
        duration: f64,
        created_at: DateTime<Local>,
        kind: WorkoutKind,
    ) -> Self {
        let workout_type = match kind {
            WorkoutKind::Running { .. } => WorkoutType::Running,
            WorkoutKind::Cycling { .. } => WorkoutType::Cycling,
        };

        Self {
            id,
            coords,
            distance,
            duration,
            description: DateTimeUtils::describe(workout_type, &created_at),
            created_at,
            kind,
            address: None,
            weather: None,
        }
    }

    /// Last ten digits of the millisecond timestamp.
    pub fn id_from_timestamp(timestamp_millis: i64) -> WorkoutId {
        format!("{:010}", timestamp_millis.rem_euclid(10_000_000_000))
    }

    pub fn pace(distance: f64, duration: f64) -> f64 {
        duration / distance
    }

    pub fn speed(distance: f64, duration: f64) -> f64 {
        distance / (duration / 60.0)
    }

    pub fn workout_type(&self) -> WorkoutType {
        match self.kind {
            WorkoutKind::Running { .. } => WorkoutType::Running,
            WorkoutKind::Cycling { .. } => WorkoutType::Cycling,
        }
    }

    /// Pace for running, speed for cycling.
    pub fn primary_metric(&self) -> f64 {
        match self.kind {
            WorkoutKind::Running { pace, .. } => pace,
            WorkoutKind::Cycling { speed, .. } => speed,
        }
    }

    /// Cadence for running, elevation gain for cycling.
    pub fn extra_value(&self) -> f64 {
        match self.kind {
            WorkoutKind::Running { cadence, .. } => cadence,
            WorkoutKind::Cycling { elevation_gain, .. } => elevation_gain,
        }
    }

    /// Overwrites the measured values in place. Identity, date, description and
    /// type stay untouched.
    pub fn update(&mut self, distance: f64, duration: f64, extra: f64) {
        self.distance = distance;
        self.duration = duration;

        match &mut self.kind {
            WorkoutKind::Running { cadence, .. } => *cadence = extra,
            WorkoutKind::Cycling { elevation_gain, .. } => *elevation_gain = extra,
        }

        self.recompute_metric();
    }

    pub fn recompute_metric(&mut self) {
        let (distance, duration) = (self.distance, self.duration);

        match &mut self.kind {
            WorkoutKind::Running { pace, .. } => *pace = Workout::pace(distance, duration),
            WorkoutKind::Cycling { speed, .. } => *speed = Workout::speed(distance, duration),
        }
    }

    pub fn needs_address(&self) -> bool {
        self.address.is_none()
    }

    pub fn needs_weather(&self) -> bool {
        self.weather.is_none()
    }

    pub fn popup_content(&self) -> &str {
        self.address
            .as_deref()
            .unwrap_or(Workout::ADDRESS_PLACEHOLDER)
    }

    pub fn weather_summary(&self) -> Option<String> {
        self.weather.as_ref().map(WeatherSnapshot::summary)
    }

    /// Rebuilds a workout from its stored form. The `type` field selects the
    /// constructor; derived values are recomputed rather than trusted.
    pub fn from_record(record: WorkoutRecord) -> Result<Self, PersistenceError> {
        let workout_type: WorkoutType = record.r#type.parse()?;

        let extra = match workout_type {
            WorkoutType::Running => record
                .cadence
                .ok_or(PersistenceError::MissingField("cadence"))?,
            WorkoutType::Cycling => record
                .elevation_gain
                .ok_or(PersistenceError::MissingField("elevationGain"))?,
        };

        let mut workout = Workout::of_type(
            workout_type,
            record.id,
            record.coords,
            record.distance,
            record.duration,
            extra,
            record.date,
        );
        workout.address = record.address;
        workout.weather = record.weather;

        Ok(workout)
    }
}

impl Identifiable for Workout {
    fn id(&self) -> &WorkoutId {
        &self.id
    }
}

/// Flat, JSON friendly shape of a workout as kept in storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutRecord {
    pub id: WorkoutId,
    pub r#type: String,
    pub coords: LatLng,
    pub distance: f64,
    pub duration: f64,
    pub date: DateTime<Local>,

    #[serde(default)]
    pub description: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cadence: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pace: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elevation_gain: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed: Option<f64>,

    /// Older stores spell the key `adress`.
    #[serde(default, alias = "adress", skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weather: Option<WeatherSnapshot>,
}

impl From<&Workout> for WorkoutRecord {
    fn from(workout: &Workout) -> Self {
        let (cadence, pace, elevation_gain, speed) = match workout.kind {
            WorkoutKind::Running { cadence, pace } => (Some(cadence), Some(pace), None, None),
            WorkoutKind::Cycling {
                elevation_gain,
                speed,
            } => (None, None, Some(elevation_gain), Some(speed)),
        };

        Self {
            id: workout.id.clone(),
            r#type: workout.workout_type().to_string(),
            coords: workout.coords,
            distance: workout.distance,
            duration: workout.duration,
            date: workout.created_at,
            description: workout.description.clone(),
            cadence,
            pace,
            elevation_gain,
            speed,
            address: workout.address.clone(),
            weather: workout.weather,
        }
    }
}
