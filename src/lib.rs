use data_types::common::WorkoutId;
use engine::{
    collection::{RestoreReport, SortCriterion, SortDirection, WorkoutCollection},
    drawing::DrawingTracker,
};
use enrichment::EnrichmentOutcome;
use errors::TrackerError;
use presentation::{
    EntryMark, FormInput, GeolocationDenied, ListAction, MessageKind, UiEvent,
};
use util::{facilities::Facilities, geo::GeoUtils, settings::Settings};

use crate::data_types::common::LatLng;

pub mod data_types;
pub mod database;
pub mod engine;
pub mod enrichment;
pub mod errors;
pub mod presentation;
pub mod util;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditMode {
    Viewing,
    /// The shared form edits this workout instead of creating a new one.
    Editing(WorkoutId),
}

/// One tracking session. Every user event and every enrichment outcome goes
/// through here, one at a time and to completion.
pub struct App {
    settings: Settings,
    facilities: Facilities,
    collection: WorkoutCollection,
    drawing: DrawingTracker,
    mode: EditMode,
    active_sort: Option<SortCriterion>,
    map_ready: bool,
    location_notice_shown: bool,
}

impl App {
    const CC: &'static str = "App";
    pub const LOCATION_NOTICE: &'static str = "Cannot access your position!";

    pub fn new(settings: Settings, facilities: Facilities) -> Self {
        Self {
            settings,
            facilities,
            collection: WorkoutCollection::new(),
            drawing: DrawingTracker::new(),
            mode: EditMode::Viewing,
            active_sort: None,
            map_ready: false,
            location_notice_shown: false,
        }
    }

    /// Brings back the workouts of earlier sessions.
    pub fn start(&mut self) -> RestoreReport {
        let report = self.collection.restore(&mut self.facilities);

        if report.routes_discarded {
            logwarn!("Stored routes did not match the workouts and were dropped");
        }

        report
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn collection(&self) -> &WorkoutCollection {
        &self.collection
    }

    pub fn drawing(&self) -> &DrawingTracker {
        &self.drawing
    }

    pub fn mode(&self) -> &EditMode {
        &self.mode
    }

    pub fn active_sort(&self) -> Option<SortCriterion> {
        self.active_sort
    }

    pub fn map_ready(&self) -> bool {
        self.map_ready
    }

    pub fn handle(&mut self, event: UiEvent) {
        logvbln!("Event: {:?}", event);

        match event {
            UiEvent::Located(position) => self.on_located(position),
            UiEvent::MapClick(at) => self.on_map_click(at),
            UiEvent::CommitKey => self.on_commit_key(),
            UiEvent::FormSubmit(form) => self.on_form_submit(form),
            UiEvent::ListItemClick { position, action } => match action {
                ListAction::Focus => self.on_focus(position),
                ListAction::Edit => self.on_edit(position),
                ListAction::Delete => self.on_delete(position),
            },
            UiEvent::SortButtonClick(criterion) => self.on_sort(criterion),
            UiEvent::ClearAllClick => self.on_clear_all(),
            UiEvent::ZoomAllClick => self.on_zoom_all(),
        }
    }

    pub fn apply_enrichment(&mut self, outcome: EnrichmentOutcome) -> bool {
        self.collection.apply_enrichment(outcome, &mut self.facilities)
    }

    fn on_located(&mut self, position: Result<LatLng, GeolocationDenied>) {
        match position {
            Ok(coords) => {
                self.facilities
                    .presentation()
                    .load_map(coords, self.settings.map.zoom_level);
                self.map_ready = true;
            }
            Err(GeolocationDenied) => {
                if !self.location_notice_shown {
                    self.facilities.presentation().notify(App::LOCATION_NOTICE);
                    self.location_notice_shown = true;
                }
                logwarn!("Position unavailable, map clicks stay disabled");
            }
        }
    }

    fn on_map_click(&mut self, at: LatLng) {
        if !self.map_ready {
            logvbln!("Map not loaded, ignoring click");
            return;
        }

        self.leave_editing();
        self.drawing.click(at, self.facilities.presentation());
    }

    fn on_commit_key(&mut self) {
        if !self.drawing.commit(self.facilities.presentation()) {
            logvbln!("Nothing to commit");
        }
    }

    /// One form, two meanings: the current mode decides between create and edit.
    fn on_form_submit(&mut self, form: FormInput) {
        match self.mode.clone() {
            EditMode::Editing(id) => {
                match self.collection.edit_workout(&id, &form, &mut self.facilities) {
                    Ok(()) => {
                        self.facilities.presentation().show_message(MessageKind::Editing);
                        self.facilities.presentation().hide_form();
                        self.leave_editing();
                    }
                    Err(err) => self.report(err),
                }
            }
            EditMode::Viewing => {
                match self
                    .collection
                    .create(&form, &mut self.drawing, &mut self.facilities)
                {
                    Ok(id) => {
                        logvbln!("Workout {} recorded", id);
                        self.facilities.presentation().show_message(MessageKind::Success);
                        self.facilities.presentation().hide_form();
                    }
                    Err(err) => self.report(err),
                }
            }
        }
    }

    fn on_focus(&mut self, position: usize) {
        let coords = match self.collection.resolve(position) {
            Ok(index) => self.collection.get(index).map(|workout| workout.coords),
            Err(err) => return self.report(err),
        };

        let Some(coords) = coords else {
            return;
        };

        self.leave_editing();

        let zoom = self.settings.map.zoom_level;
        let presentation = self.facilities.presentation();
        presentation.set_view(coords, zoom);
        presentation.hide_form();
        presentation.clear_marks();
        presentation.mark_entry(position, EntryMark::Selected);
    }

    fn on_edit(&mut self, position: usize) {
        let workout = match self.collection.resolve(position) {
            Ok(index) => self.collection.get(index),
            Err(err) => return self.report(err),
        };

        let Some(workout) = workout else {
            return;
        };
        let id = workout.id.clone();
        let values = FormInput::from_workout(workout);

        // The form is shared, so a route waiting for it is given up.
        self.drawing.cancel(self.facilities.presentation());

        let presentation = self.facilities.presentation();
        presentation.clear_marks();
        presentation.mark_entry(position, EntryMark::Editing);
        presentation.set_type_selector_enabled(false);
        presentation.fill_form(&values);
        presentation.show_form();

        logln!("Editing workout {}", id);
        self.mode = EditMode::Editing(id);
    }

    fn on_delete(&mut self, position: usize) {
        match self.collection.delete(position, &mut self.facilities) {
            Ok(removed) => {
                if self.mode == EditMode::Editing(removed.id.clone()) {
                    self.facilities.presentation().hide_form();
                    self.leave_editing();
                }
                self.refresh_marks();
            }
            Err(err) => self.report(err),
        }
    }

    /// Sort buttons toggle. Only one criterion is active at a time.
    fn on_sort(&mut self, criterion: SortCriterion) {
        if self.active_sort == Some(criterion) {
            self.active_sort = None;
            self.collection.reset_view(&mut self.facilities);
        } else {
            self.active_sort = Some(criterion);
            let shown = self
                .collection
                .sort(criterion, SortDirection::Descending, &mut self.facilities)
                .len();
            logvbln!("Sorted {} workouts by {:?}", shown, criterion);
        }

        self.refresh_marks();
    }

    fn on_clear_all(&mut self) {
        self.drawing.cancel(self.facilities.presentation());
        self.collection.clear_all(&mut self.facilities);

        self.active_sort = None;
        self.facilities.presentation().hide_form();
        self.leave_editing();
        self.facilities.presentation().clear_marks();
    }

    fn on_zoom_all(&mut self) {
        let zoom = self.settings.map.zoom_level;

        match GeoUtils::get_bounding_box(&self.collection.coordinates()) {
            // A single spot has no extent to fit.
            Some(bounds) if bounds.width() == 0.0 && bounds.height() == 0.0 => self
                .facilities
                .presentation()
                .set_view(GeoUtils::get_center_of_bbox(&bounds), zoom),
            Some(bounds) => self.facilities.presentation().fit_bounds(bounds),
            None => logvbln!("No workouts to zoom to"),
        }
    }

    fn leave_editing(&mut self) {
        if self.mode == EditMode::Viewing {
            return;
        }

        self.mode = EditMode::Viewing;
        let presentation = self.facilities.presentation();
        presentation.set_type_selector_enabled(true);
        presentation.clear_marks();
    }

    /// Positions move after structural changes; the edited entry keeps its mark.
    fn refresh_marks(&mut self) {
        let position = match &self.mode {
            EditMode::Editing(id) => self
                .collection
                .index_of(id)
                .and_then(|index| self.collection.visual_position_of(index)),
            EditMode::Viewing => None,
        };

        let presentation = self.facilities.presentation();
        presentation.clear_marks();
        if let Some(position) = position {
            presentation.mark_entry(position, EntryMark::Editing);
        }
    }

    fn report(&mut self, err: TrackerError) {
        match err {
            TrackerError::Validation(err) => {
                logln!("Rejected form: {}", err);
                self.facilities.presentation().show_message(MessageKind::Error);
            }
            err => logwarn!("{}", err),
        }
    }
}
