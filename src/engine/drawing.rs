use crate::{
    data_types::{
        common::LatLng,
        route::{Route, RouteStyle},
    },
    logvbln, logwarn,
    presentation::{Presentation, RouteHandle},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawingState {
    Idle,
    Drawing,
    /// A route was closed with the commit key and waits for the form.
    Pending,
}

/// A closed route together with its overlay on the map.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingRoute {
    pub route: Route,
    pub handle: RouteHandle,
}

/// Turns map clicks into routes. At most one route is pending at any time; the
/// collection claims it when a workout is created.
#[derive(Debug)]
pub struct DrawingTracker {
    state: DrawingState,
    points: Vec<LatLng>,
    pending: Option<PendingRoute>,
}

impl Default for DrawingTracker {
    fn default() -> Self {
        DrawingTracker::new()
    }
}

impl DrawingTracker {
    const CC: &'static str = "Drawing";

    pub fn new() -> Self {
        Self {
            state: DrawingState::Idle,
            points: Vec::new(),
            pending: None,
        }
    }

    pub fn state(&self) -> DrawingState {
        self.state
    }

    pub fn points(&self) -> &[LatLng] {
        &self.points
    }

    pub fn pending(&self) -> Option<&Route> {
        self.pending.as_ref().map(|pending| &pending.route)
    }

    /// Appends `at` to the current path. Outside of a drawing session the click
    /// opens a new one, throwing away the stale buffer and any unclaimed route.
    pub fn click(&mut self, at: LatLng, presentation: &mut dyn Presentation) {
        if self.state != DrawingState::Drawing {
            self.discard_pending(presentation);
            self.points.clear();
            self.state = DrawingState::Drawing;
            presentation.hide_form();
        }

        self.points.push(at);
        presentation.update_preview(&self.points);
    }

    /// Closes the current path into a pending route and opens the form.
    /// Returns `false` when no drawing session is running.
    pub fn commit(&mut self, presentation: &mut dyn Presentation) -> bool {
        if self.state != DrawingState::Drawing || self.points.is_empty() {
            return false;
        }

        let route = Route::new(std::mem::take(&mut self.points));
        presentation.update_preview(&[]);
        let handle = presentation.draw_route(route.points(), RouteStyle::pending());

        logvbln!("Route with {} points pending", route.points().len());

        self.pending = Some(PendingRoute { route, handle });
        self.state = DrawingState::Pending;
        presentation.show_form();

        true
    }

    /// Hands the pending route over; the tracker goes back to idle.
    pub fn claim(&mut self) -> Option<PendingRoute> {
        if self.state != DrawingState::Pending {
            return None;
        }

        self.state = DrawingState::Idle;
        self.pending.take()
    }

    /// Drops everything in progress, preview and pending overlay included.
    pub fn cancel(&mut self, presentation: &mut dyn Presentation) {
        self.discard_pending(presentation);

        if !self.points.is_empty() {
            self.points.clear();
            presentation.update_preview(&[]);
        }

        self.state = DrawingState::Idle;
    }

    fn discard_pending(&mut self, presentation: &mut dyn Presentation) {
        if let Some(pending) = self.pending.take() {
            logwarn!(
                "Discarding unclaimed route with {} points",
                pending.route.points().len()
            );
            presentation.remove_route(pending.handle);
        }
    }
}
