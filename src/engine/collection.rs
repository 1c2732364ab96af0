use std::collections::{HashMap, HashSet};

use chrono::Local;

use crate::{
    data_types::{
        common::{Identifiable, LatLng, WorkoutId},
        route::{Route, RouteStyle},
        workout::{Workout, WorkoutRecord, WorkoutType},
    },
    enrichment::{EnrichmentOutcome, EnrichmentRequest, LookupKind, LookupResult},
    errors::{Field, TrackerError, ValidationError},
    logln, logvbln, logwarn,
    presentation::{FormInput, ListPosition, MarkerHandle, RouteHandle},
    util::facilities::Facilities,
};

use super::{drawing::DrawingTracker, markup::Markup};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortCriterion {
    Distance,
    Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// How the list is currently shown. The default view is newest first; a sorted
/// view keeps the storage indices in display order.
#[derive(Debug, Clone, PartialEq)]
enum ListView {
    Default,
    Sorted {
        criterion: SortCriterion,
        direction: SortDirection,
        order: Vec<usize>,
    },
}

/// A route that belongs to a workout, with its overlay on the map.
#[derive(Debug, Clone, PartialEq)]
pub struct PairedRoute {
    pub route: Route,
    pub handle: RouteHandle,
}

/// Everything shown for one workout. Keeping the four parts in one record is
/// what keeps workouts, markup, markers and routes co-indexed.
#[derive(Debug, Clone)]
struct Entry {
    workout: Workout,
    markup: String,
    marker: MarkerHandle,
    route: Option<PairedRoute>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RestoreReport {
    pub restored: usize,
    pub skipped: usize,
    pub routes_discarded: bool,
}

/// `storage = (count - 1) - visual`. The mapping is its own inverse.
pub fn invert_position(count: usize, position: usize) -> Option<usize> {
    (position < count).then(|| count - 1 - position)
}

/// The authoritative, creation-ordered list of workouts and everything
/// rendered for them. Only its own operations mutate it.
pub struct WorkoutCollection {
    entries: Vec<Entry>,
    positions: HashMap<WorkoutId, usize>,
    in_flight: HashSet<(WorkoutId, LookupKind)>,
    view: ListView,
    last_issued: Option<i64>,
}

impl Default for WorkoutCollection {
    fn default() -> Self {
        WorkoutCollection::new()
    }
}

impl WorkoutCollection {
    const CC: &'static str = "Collection";

    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            positions: HashMap::new(),
            in_flight: HashSet::new(),
            view: ListView::Default,
            last_issued: None,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn workouts(&self) -> impl Iterator<Item = &Workout> + '_ {
        self.entries.iter().map(|entry| &entry.workout)
    }

    pub fn markup(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.iter().map(|entry| entry.markup.as_str())
    }

    pub fn markers(&self) -> impl Iterator<Item = MarkerHandle> + '_ {
        self.entries.iter().map(|entry| entry.marker)
    }

    pub fn routes(&self) -> impl Iterator<Item = Option<&PairedRoute>> + '_ {
        self.entries.iter().map(|entry| entry.route.as_ref())
    }

    pub fn get(&self, index: usize) -> Option<&Workout> {
        self.entries.get(index).map(|entry| &entry.workout)
    }

    pub fn route_of(&self, index: usize) -> Option<&PairedRoute> {
        self.entries.get(index)?.route.as_ref()
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.positions.get(id).copied()
    }

    pub fn find(&self, id: &str) -> Option<&Workout> {
        self.get(self.index_of(id)?)
    }

    pub fn coordinates(&self) -> Vec<LatLng> {
        self.workouts().map(|workout| workout.coords).collect()
    }

    pub fn is_enriching(&self, id: &str, kind: LookupKind) -> bool {
        self.in_flight.contains(&(id.to_string(), kind))
    }

    /// Storage index of the entry shown at `position` in the current view.
    pub fn resolve(&self, position: usize) -> Result<usize, TrackerError> {
        let index = match &self.view {
            ListView::Default => invert_position(self.len(), position),
            ListView::Sorted { order, .. } => order.get(position).copied(),
        };

        index.ok_or(TrackerError::NotFound { position })
    }

    /// Where the entry at storage `index` is shown in the current view.
    pub fn visual_position_of(&self, index: usize) -> Option<usize> {
        match &self.view {
            ListView::Default => invert_position(self.len(), index),
            ListView::Sorted { order, .. } => order.iter().position(|&i| i == index),
        }
    }

    pub fn sort_state(&self) -> Option<(SortCriterion, SortDirection)> {
        match &self.view {
            ListView::Default => None,
            ListView::Sorted {
                criterion,
                direction,
                ..
            } => Some((*criterion, *direction)),
        }
    }

    /// Checks form values for a workout of `workout_type`. `extra` is the
    /// cadence or the elevation gain.
    pub fn validate(
        workout_type: WorkoutType,
        distance: f64,
        duration: f64,
        extra: f64,
    ) -> Result<(), ValidationError> {
        let (extra_field, extra_minimum) = match workout_type {
            WorkoutType::Running => (Field::Cadence, 1.0),
            WorkoutType::Cycling => (Field::ElevationGain, 0.0),
        };

        let checks = [
            (Field::Distance, distance, 1.0),
            (Field::Duration, duration, 1.0),
            (extra_field, extra, extra_minimum),
        ];

        if let Some((field, _, _)) = checks.iter().find(|(_, value, _)| !value.is_finite()) {
            return Err(ValidationError::NotFinite { field: *field });
        }

        if let Some((field, _, minimum)) = checks.iter().find(|(_, value, min)| value < min) {
            return Err(ValidationError::BelowMinimum {
                field: *field,
                minimum: *minimum,
            });
        }

        Ok(())
    }

    /// Records a new workout on the route pending in `drawing`, placed at the
    /// route's last point. Nothing changes when validation fails.
    pub fn create(
        &mut self,
        form: &FormInput,
        drawing: &mut DrawingTracker,
        fac: &mut Facilities,
    ) -> Result<WorkoutId, TrackerError> {
        WorkoutCollection::validate(form.workout_type, form.distance, form.duration, form.extra())?;

        let coords = drawing
            .pending()
            .and_then(Route::last_point)
            .ok_or(ValidationError::MissingRoute)?;
        let pending = drawing.claim().ok_or(ValidationError::MissingRoute)?;

        let created_at = Local::now();
        let id = self.next_id(created_at.timestamp_millis());
        let workout = Workout::of_type(
            form.workout_type,
            id.clone(),
            coords,
            form.distance,
            form.duration,
            form.extra(),
            created_at,
        );

        let presentation = fac.presentation();
        presentation.restyle_route(pending.handle, RouteStyle::for_workout(form.workout_type));
        let marker = presentation.render_marker(&workout);
        let markup = Markup::workout_entry(&workout);

        self.entries.push(Entry {
            workout,
            markup,
            marker,
            route: Some(PairedRoute {
                route: pending.route,
                handle: pending.handle,
            }),
        });
        let index = self.entries.len() - 1;
        self.positions.insert(id.clone(), index);

        if self.view == ListView::Default {
            fac.presentation()
                .render_list_entry(&self.entries[index].markup, ListPosition::Prepend);
            fac.presentation().show_controls(true);
        } else {
            self.refresh_view(fac);
        }

        logln!("Created {} workout {}", form.workout_type, id);

        self.request_enrichment(index, fac);
        self.flush(fac);

        Ok(id)
    }

    /// Edits the entry shown at `position`.
    pub fn edit(
        &mut self,
        position: usize,
        form: &FormInput,
        fac: &mut Facilities,
    ) -> Result<(), TrackerError> {
        let index = self.resolve(position)?;
        self.edit_at(index, form, fac)
    }

    pub fn edit_workout(
        &mut self,
        id: &str,
        form: &FormInput,
        fac: &mut Facilities,
    ) -> Result<(), TrackerError> {
        let index = self
            .index_of(id)
            .ok_or_else(|| TrackerError::UnknownWorkout(id.to_string()))?;
        self.edit_at(index, form, fac)
    }

    /// Type, id, date and route are fixed; only the measured values change.
    fn edit_at(
        &mut self,
        index: usize,
        form: &FormInput,
        fac: &mut Facilities,
    ) -> Result<(), TrackerError> {
        let workout_type = self.entries[index].workout.workout_type();
        let extra = match workout_type {
            WorkoutType::Running => form.cadence,
            WorkoutType::Cycling => form.elevation_gain,
        };

        WorkoutCollection::validate(workout_type, form.distance, form.duration, extra)?;

        let entry = &mut self.entries[index];
        entry.workout.update(form.distance, form.duration, extra);
        entry.markup = Markup::workout_entry(&entry.workout);
        fac.presentation().update_marker(entry.marker, &entry.workout);

        logln!("Edited workout {}", entry.workout.id);

        self.refresh_view(fac);
        self.flush(fac);

        Ok(())
    }

    /// Removes the entry shown at `position` together with its marker and route.
    pub fn delete(&mut self, position: usize, fac: &mut Facilities) -> Result<Workout, TrackerError> {
        let index = self.resolve(position)?;
        Ok(self.remove_at(index, fac))
    }

    fn remove_at(&mut self, index: usize, fac: &mut Facilities) -> Workout {
        let entry = self.entries.remove(index);
        self.rebuild_positions();
        self.in_flight.retain(|(id, _)| *id != entry.workout.id);

        let presentation = fac.presentation();
        presentation.remove_marker(entry.marker);
        if let Some(route) = &entry.route {
            presentation.remove_route(route.handle);
        }

        logln!("Deleted workout {}", entry.workout.id);

        self.refresh_view(fac);
        self.flush(fac);

        entry.workout
    }

    /// Storage indices in display order for the given sort. Pure: neither the
    /// storage order nor the current view changes.
    pub fn sorted_view(&self, criterion: SortCriterion, direction: SortDirection) -> Vec<usize> {
        let key = |index: &usize| {
            let workout = &self.entries[*index].workout;
            match criterion {
                SortCriterion::Distance => workout.distance,
                SortCriterion::Duration => workout.duration,
            }
        };

        // Ties keep the newest first, like the default view.
        let mut order: Vec<usize> = (0..self.len()).rev().collect();
        order.sort_by(|a, b| {
            let ordering = key(a).total_cmp(&key(b));
            match direction {
                SortDirection::Ascending => ordering,
                SortDirection::Descending => ordering.reverse(),
            }
        });

        order
    }

    /// Shows the list sorted and returns the workouts in display order.
    pub fn sort(
        &mut self,
        criterion: SortCriterion,
        direction: SortDirection,
        fac: &mut Facilities,
    ) -> Vec<&Workout> {
        self.view = ListView::Sorted {
            criterion,
            direction,
            order: self.sorted_view(criterion, direction),
        };
        self.render_list(fac);

        self.display_order()
            .into_iter()
            .map(|index| &self.entries[index].workout)
            .collect()
    }

    /// Back to newest first.
    pub fn reset_view(&mut self, fac: &mut Facilities) {
        self.view = ListView::Default;
        self.render_list(fac);
    }

    pub fn display_order(&self) -> Vec<usize> {
        match &self.view {
            ListView::Default => (0..self.len()).rev().collect(),
            ListView::Sorted { order, .. } => order.clone(),
        }
    }

    /// Rebuilds the collection from storage, replacing whatever is shown.
    pub fn restore(&mut self, fac: &mut Facilities) -> RestoreReport {
        self.clear_rendered(fac);

        let stored = fac.persistance().load();
        let report = RestoreReport {
            restored: stored.entries.len(),
            skipped: stored.skipped,
            routes_discarded: stored.routes_discarded,
        };

        for stored_entry in stored.entries {
            let mut workout = stored_entry.workout;

            if self.positions.contains_key(&workout.id) {
                let fresh = self.next_id(Local::now().timestamp_millis());
                logwarn!("Duplicate stored id {}, renamed to {}", workout.id, fresh);
                workout.id = fresh;
            }

            let presentation = fac.presentation();
            let marker = presentation.render_marker(&workout);
            let route = stored_entry.route.map(|route| {
                let handle =
                    presentation.draw_route(route.points(), RouteStyle::for_workout(workout.workout_type()));
                PairedRoute { route, handle }
            });

            self.positions.insert(workout.id.clone(), self.entries.len());
            self.entries.push(Entry {
                markup: Markup::workout_entry(&workout),
                workout,
                marker,
                route,
            });
        }

        self.render_list(fac);

        for index in 0..self.entries.len() {
            self.request_enrichment(index, fac);
        }

        if report.routes_discarded || report.skipped > 0 {
            // Rewrite so the next load lines up again.
            self.flush(fac);
        }

        logln!("Restored {} workouts", report.restored);

        report
    }

    /// Removes every workout, its overlays and the stored data.
    pub fn clear_all(&mut self, fac: &mut Facilities) {
        self.clear_rendered(fac);
        self.render_list(fac);

        if let Err(err) = fac.persistance().clear() {
            logwarn!("Clearing storage failed: {}", err);
        }

        logln!("Cleared all workouts");
    }

    fn clear_rendered(&mut self, fac: &mut Facilities) {
        let presentation = fac.presentation();
        for entry in self.entries.drain(..) {
            presentation.remove_marker(entry.marker);
            if let Some(route) = entry.route {
                presentation.remove_route(route.handle);
            }
        }

        self.positions.clear();
        self.in_flight.clear();
        self.view = ListView::Default;
    }

    /// Asks for whatever the entry at `index` still lacks, skipping lookups
    /// already on their way.
    fn request_enrichment(&mut self, index: usize, fac: &mut Facilities) {
        let workout = &self.entries[index].workout;

        let lookups: Vec<LookupKind> = [
            (LookupKind::Address, workout.needs_address()),
            (LookupKind::Weather, workout.needs_weather()),
        ]
        .into_iter()
        .filter(|(kind, needed)| {
            *needed && !self.in_flight.contains(&(workout.id.clone(), *kind))
        })
        .map(|(kind, _)| kind)
        .collect();

        if lookups.is_empty() {
            return;
        }

        for kind in &lookups {
            self.in_flight.insert((workout.id.clone(), *kind));
        }

        fac.enricher().dispatch(EnrichmentRequest {
            id: workout.id.clone(),
            coords: workout.coords,
            lookups,
        });
    }

    /// Applies a finished lookup to the workout it was requested for, found by
    /// id. Returns `false` when the result was dropped: the workout is gone,
    /// the lookup failed or the field is already filled.
    pub fn apply_enrichment(&mut self, outcome: EnrichmentOutcome, fac: &mut Facilities) -> bool {
        let kind = outcome.result.kind();
        self.in_flight.remove(&(outcome.id.clone(), kind));

        let Some(index) = self.index_of(&outcome.id) else {
            logvbln!("Dropping {:?} for deleted workout {}", kind, outcome.id);
            return false;
        };

        let entry = &mut self.entries[index];
        let applied = match outcome.result {
            LookupResult::Address(Ok(address)) => {
                let formatted = address.to_string();
                if entry.workout.address.is_some() || formatted.is_empty() {
                    false
                } else {
                    entry.workout.address = Some(formatted);
                    true
                }
            }
            LookupResult::Weather(Ok(weather)) => {
                if entry.workout.weather.is_some() {
                    false
                } else {
                    entry.workout.weather = Some(weather);
                    true
                }
            }
            LookupResult::Address(Err(err)) | LookupResult::Weather(Err(err)) => {
                logwarn!("{:?} lookup for {} failed: {}", kind, outcome.id, err);
                false
            }
        };

        if applied {
            fac.presentation().update_marker(entry.marker, &entry.workout);
            self.flush(fac);
        }

        applied
    }

    fn refresh_view(&mut self, fac: &mut Facilities) {
        if let ListView::Sorted {
            criterion,
            direction,
            ..
        } = self.view
        {
            self.view = ListView::Sorted {
                criterion,
                direction,
                order: self.sorted_view(criterion, direction),
            };
        }

        self.render_list(fac);
    }

    fn render_list(&self, fac: &mut Facilities) {
        let presentation = fac.presentation();
        presentation.clear_list();

        for index in self.display_order().into_iter().rev() {
            presentation.render_list_entry(&self.entries[index].markup, ListPosition::Prepend);
        }

        presentation.show_controls(!self.is_empty());
    }

    /// Writes workouts and routes in one go. A failure is logged; the session
    /// keeps running on its in-memory state.
    fn flush(&self, fac: &mut Facilities) {
        let records: Vec<WorkoutRecord> = self.workouts().map(WorkoutRecord::from).collect();
        let drawings: Vec<Route> = self
            .entries
            .iter()
            .map(|entry| {
                entry
                    .route
                    .as_ref()
                    .map(|paired| paired.route.clone())
                    .unwrap_or_default()
            })
            .collect();

        if let Err(err) = fac.persistance().save(&records, &drawings) {
            logwarn!("Saving workouts failed: {}", err);
        }
    }

    fn rebuild_positions(&mut self) {
        self.positions = self
            .entries
            .iter()
            .enumerate()
            .map(|(index, entry)| (entry.workout.id().clone(), index))
            .collect();
    }

    /// Id for a workout created at `timestamp_millis`. A timestamp is issued at
    /// most once per session and ids held by live workouts are skipped.
    fn next_id(&mut self, timestamp_millis: i64) -> WorkoutId {
        let mut candidate = match self.last_issued {
            Some(last) if last >= timestamp_millis => last + 1,
            _ => timestamp_millis,
        };

        loop {
            let id = Workout::id_from_timestamp(candidate);
            if !self.positions.contains_key(&id) {
                self.last_issued = Some(candidate);
                return id;
            }
            candidate += 1;
        }
    }
}
