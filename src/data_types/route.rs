use serde_derive::{Deserialize, Serialize};

use super::{common::LatLng, workout::WorkoutType};

/// A user-drawn path. Once built from a drawing session it is never mutated.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Route {
    points: Vec<LatLng>,
}

impl Route {
    pub fn new(points: Vec<LatLng>) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &[LatLng] {
        &self.points
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn last_point(&self) -> Option<LatLng> {
        self.points.last().copied()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RouteStyle {
    pub color: &'static str,
    pub opacity: f32,
}

impl RouteStyle {
    pub const RUNNING_COLOR: &'static str = "#00c46a";
    pub const CYCLING_COLOR: &'static str = "#ffb545";
    pub const DRAFT_COLOR: &'static str = "red";

    /// Live overlay following the clicks of the current drawing session.
    pub fn preview() -> Self {
        Self {
            color: Self::DRAFT_COLOR,
            opacity: 0.4,
        }
    }

    /// Route closed with the commit key but not yet claimed by a workout.
    pub fn pending() -> Self {
        Self {
            color: Self::DRAFT_COLOR,
            opacity: 0.5,
        }
    }

    pub fn for_workout(workout_type: WorkoutType) -> Self {
        let color = match workout_type {
            WorkoutType::Running => Self::RUNNING_COLOR,
            WorkoutType::Cycling => Self::CYCLING_COLOR,
        };

        Self {
            color,
            opacity: 1.0,
        }
    }
}
