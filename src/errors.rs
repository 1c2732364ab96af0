use std::fmt;

use thiserror::Error;

use crate::data_types::common::WorkoutId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Distance,
    Duration,
    Cadence,
    ElevationGain,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Field::Distance => "distance",
            Field::Duration => "duration",
            Field::Cadence => "cadence",
            Field::ElevationGain => "elevation gain",
        };

        write!(f, "{}", name)
    }
}

/// Rejected form input. Surfaced to the user; never mutates state.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("{field} must be a finite number")]
    NotFinite { field: Field },

    #[error("{field} must be at least {minimum}")]
    BelowMinimum { field: Field, minimum: f64 },

    #[error("draw a route and press Enter before submitting")]
    MissingRoute,
}

#[derive(Debug, Error)]
pub enum TrackerError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("no workout at list position {position}")]
    NotFound { position: usize },

    #[error("workout {0} no longer exists")]
    UnknownWorkout(WorkoutId),

    #[error("missing facility: {0}")]
    MissingFacility(&'static str),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("storage i/o failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("stored data could not be (de)serialized: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("stored collections disagree: {workouts} workouts, {drawings} drawings")]
    Corrupted { workouts: usize, drawings: usize },

    #[error("unknown workout type `{0}`")]
    UnknownWorkoutType(String),

    #[error("stored workout is missing `{0}`")]
    MissingField(&'static str),
}

#[derive(Debug, Error)]
pub enum EnrichmentError {
    #[error("http request failed: {0}")]
    Http(#[from] curl::Error),

    #[error("lookup answered with status {0}")]
    Status(u32),

    #[error("lookup response could not be decoded: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("lookup response is missing `{0}`")]
    Incomplete(&'static str),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read settings: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid settings: {0}")]
    Toml(#[from] toml::de::Error),
}

/// A line the terminal driver could not turn into an event.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CommandError {
    #[error("unknown command `{0}`")]
    Unknown(String),

    #[error("`{command}` expects {expected}")]
    Arguments {
        command: &'static str,
        expected: &'static str,
    },
}
