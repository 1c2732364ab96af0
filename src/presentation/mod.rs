//! The boundary towards the map widget and the sidebar DOM.
//!
//! The core never touches either directly: user input arrives as [`UiEvent`]s
//! and everything to be shown leaves through the [`Presentation`] trait.

use geo_types::Rect;

use crate::{
    data_types::{
        common::LatLng,
        route::RouteStyle,
        workout::{Workout, WorkoutType},
    },
    engine::collection::SortCriterion,
};

pub mod headless;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MarkerHandle(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RouteHandle(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListPosition {
    Prepend,
    Append,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Success,
    Error,
    Editing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryMark {
    Editing,
    Selected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeolocationDenied;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListAction {
    Focus,
    Edit,
    Delete,
}

/// Raw numbers read from the workout form. Empty or unparsable inputs are NaN.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FormInput {
    pub workout_type: WorkoutType,
    pub distance: f64,
    pub duration: f64,
    pub cadence: f64,
    pub elevation_gain: f64,
}

impl FormInput {
    pub fn running(distance: f64, duration: f64, cadence: f64) -> Self {
        Self {
            workout_type: WorkoutType::Running,
            distance,
            duration,
            cadence,
            elevation_gain: f64::NAN,
        }
    }

    pub fn cycling(distance: f64, duration: f64, elevation_gain: f64) -> Self {
        Self {
            workout_type: WorkoutType::Cycling,
            distance,
            duration,
            cadence: f64::NAN,
            elevation_gain,
        }
    }

    pub fn from_workout(workout: &Workout) -> Self {
        match workout.workout_type() {
            WorkoutType::Running => {
                FormInput::running(workout.distance, workout.duration, workout.extra_value())
            }
            WorkoutType::Cycling => {
                FormInput::cycling(workout.distance, workout.duration, workout.extra_value())
            }
        }
    }

    pub fn parse_number(raw: &str) -> f64 {
        raw.trim().parse().unwrap_or(f64::NAN)
    }

    /// The field shown for the selected type: cadence or elevation gain.
    pub fn extra(&self) -> f64 {
        match self.workout_type {
            WorkoutType::Running => self.cadence,
            WorkoutType::Cycling => self.elevation_gain,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
    Located(Result<LatLng, GeolocationDenied>),
    MapClick(LatLng),
    CommitKey,
    FormSubmit(FormInput),
    ListItemClick { position: usize, action: ListAction },
    SortButtonClick(SortCriterion),
    ClearAllClick,
    ZoomAllClick,
}

/// Commands the core issues to the widgets. Positions are visual, top first.
pub trait Presentation {
    fn load_map(&mut self, center: LatLng, zoom: u8);
    fn notify(&mut self, notice: &str);

    fn render_marker(&mut self, workout: &Workout) -> MarkerHandle;
    fn update_marker(&mut self, handle: MarkerHandle, workout: &Workout);
    fn remove_marker(&mut self, handle: MarkerHandle);

    fn render_list_entry(&mut self, markup: &str, position: ListPosition);
    fn clear_list(&mut self);

    fn draw_route(&mut self, points: &[LatLng], style: RouteStyle) -> RouteHandle;
    fn restyle_route(&mut self, handle: RouteHandle, style: RouteStyle);
    fn remove_route(&mut self, handle: RouteHandle);
    /// An empty slice clears the live preview.
    fn update_preview(&mut self, points: &[LatLng]);

    fn show_form(&mut self);
    fn hide_form(&mut self);
    fn fill_form(&mut self, values: &FormInput);
    fn set_type_selector_enabled(&mut self, enabled: bool);

    fn mark_entry(&mut self, position: usize, mark: EntryMark);
    fn clear_marks(&mut self);
    fn show_message(&mut self, kind: MessageKind);
    fn show_controls(&mut self, visible: bool);

    fn set_view(&mut self, center: LatLng, zoom: u8);
    fn fit_bounds(&mut self, bounds: Rect);
}
