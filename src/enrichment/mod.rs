//! Best-effort annotation of workouts with a place name and the weather.
//!
//! Lookups never touch the collection. Each one produces an
//! [`EnrichmentOutcome`] tagged with the workout id it was requested for; the
//! session applies outcomes one at a time, between user events.

use std::{cell::RefCell, rc::Rc, sync::Arc};

use tokio::{
    runtime::Handle,
    sync::mpsc::{self, UnboundedReceiver, UnboundedSender},
};

use crate::{
    data_types::{
        common::{LatLng, WorkoutId},
        workout::{Address, WeatherSnapshot},
    },
    errors::EnrichmentError,
    logvbln,
};

pub mod api;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LookupKind {
    Address,
    Weather,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnrichmentRequest {
    pub id: WorkoutId,
    pub coords: LatLng,
    pub lookups: Vec<LookupKind>,
}

#[derive(Debug)]
pub enum LookupResult {
    Address(Result<Address, EnrichmentError>),
    Weather(Result<WeatherSnapshot, EnrichmentError>),
}

impl LookupResult {
    pub fn kind(&self) -> LookupKind {
        match self {
            LookupResult::Address(_) => LookupKind::Address,
            LookupResult::Weather(_) => LookupKind::Weather,
        }
    }
}

#[derive(Debug)]
pub struct EnrichmentOutcome {
    pub id: WorkoutId,
    pub result: LookupResult,
}

/// The two remote lookups. Implementations block; callers move them off the
/// event loop.
pub trait GeoLookup: Send + Sync {
    fn reverse_geocode(&self, coords: LatLng) -> Result<Address, EnrichmentError>;
    fn current_weather(&self, coords: LatLng) -> Result<WeatherSnapshot, EnrichmentError>;
}

/// Fire-and-forget: `dispatch` returns immediately and results come back later
/// as outcomes.
pub trait Enricher {
    fn dispatch(&self, request: EnrichmentRequest);
}

pub struct TokioEnricher {
    runtime: Handle,
    lookup: Arc<dyn GeoLookup>,
    outcomes: UnboundedSender<EnrichmentOutcome>,
}

impl TokioEnricher {
    const CC: &'static str = "Enrichment";

    pub fn new(
        runtime: Handle,
        lookup: Arc<dyn GeoLookup>,
    ) -> (Self, UnboundedReceiver<EnrichmentOutcome>) {
        let (outcomes, receiver) = mpsc::unbounded_channel();

        (
            Self {
                runtime,
                lookup,
                outcomes,
            },
            receiver,
        )
    }
}

impl Enricher for TokioEnricher {
    fn dispatch(&self, request: EnrichmentRequest) {
        for kind in request.lookups {
            let lookup = Arc::clone(&self.lookup);
            let outcomes = self.outcomes.clone();
            let id = request.id.clone();
            let coords = request.coords;

            logvbln!("Looking up {:?} for workout {}", kind, id);

            self.runtime.spawn_blocking(move || {
                let result = match kind {
                    LookupKind::Address => LookupResult::Address(lookup.reverse_geocode(coords)),
                    LookupKind::Weather => LookupResult::Weather(lookup.current_weather(coords)),
                };

                // A closed receiver only means the session is gone.
                let _ = outcomes.send(EnrichmentOutcome { id, result });
            });
        }
    }
}

/// Keeps requests for the caller to resolve by hand, in any order.
#[derive(Debug, Clone, Default)]
pub struct RecordingEnricher {
    requests: Rc<RefCell<Vec<EnrichmentRequest>>>,
}

impl RecordingEnricher {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn requests(&self) -> Vec<EnrichmentRequest> {
        self.requests.borrow().clone()
    }

    pub fn take(&self) -> Vec<EnrichmentRequest> {
        std::mem::take(&mut *self.requests.borrow_mut())
    }
}

impl Enricher for RecordingEnricher {
    fn dispatch(&self, request: EnrichmentRequest) {
        self.requests.borrow_mut().push(request);
    }
}

pub struct DisabledEnricher;

impl DisabledEnricher {
    const CC: &'static str = "Enrichment";
}

impl Enricher for DisabledEnricher {
    fn dispatch(&self, request: EnrichmentRequest) {
        logvbln!("Enrichment disabled, dropping request for {}", request.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedLookup;

    impl GeoLookup for FixedLookup {
        fn reverse_geocode(&self, _coords: LatLng) -> Result<Address, EnrichmentError> {
            Ok(Address {
                road: Some("Main".to_string()),
                city: None,
                country: Some("Moldova".to_string()),
            })
        }

        fn current_weather(&self, _coords: LatLng) -> Result<WeatherSnapshot, EnrichmentError> {
            Err(EnrichmentError::Status(503))
        }
    }

    #[tokio::test]
    async fn every_lookup_reports_back_with_the_workout_id() {
        let (enricher, mut outcomes) = TokioEnricher::new(Handle::current(), Arc::new(FixedLookup));

        enricher.dispatch(EnrichmentRequest {
            id: "0000000001".to_string(),
            coords: [47.0, 28.8],
            lookups: vec![LookupKind::Address, LookupKind::Weather],
        });

        let mut kinds = Vec::new();
        for _ in 0..2 {
            let outcome = outcomes.recv().await.unwrap();
            assert_eq!(outcome.id, "0000000001");

            match &outcome.result {
                LookupResult::Address(result) => assert!(result.is_ok()),
                LookupResult::Weather(result) => {
                    assert!(matches!(result, Err(EnrichmentError::Status(503))))
                }
            }
            kinds.push(outcome.result.kind());
        }

        assert!(kinds.contains(&LookupKind::Address));
        assert!(kinds.contains(&LookupKind::Weather));
    }

    #[test]
    fn recording_enricher_hands_requests_back() {
        let enricher = RecordingEnricher::new();
        let observer = enricher.clone();

        enricher.dispatch(EnrichmentRequest {
            id: "1".to_string(),
            coords: [0.0, 0.0],
            lookups: vec![LookupKind::Weather],
        });

        assert_eq!(observer.take().len(), 1);
        assert!(observer.requests().is_empty());
    }
}
