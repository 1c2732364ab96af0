use mapty::{
    database::store::MemoryStore,
    engine::collection::SortCriterion,
    enrichment::{EnrichmentOutcome, LookupResult, RecordingEnricher},
    errors::EnrichmentError,
    presentation::{headless::HeadlessPresentation, FormInput, ListAction, UiEvent},
    util::{facilities::DependenciesBuilder, settings::Settings},
    App,
};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    Create { running: bool, distance: f64, duration: f64, extra: f64 },
    Edit { position: usize, distance: f64 },
    Delete { position: usize },
    Sort(SortCriterion),
    Enrich { pick: usize },
    Reload,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (any::<bool>(), -2.0..50.0f64, -2.0..120.0f64, -2.0..400.0f64).prop_map(
            |(running, distance, duration, extra)| Op::Create { running, distance, duration, extra }
        ),
        2 => (0usize..8, 1.0..50.0f64).prop_map(|(position, distance)| Op::Edit { position, distance }),
        2 => (0usize..8).prop_map(|position| Op::Delete { position }),
        1 => prop_oneof![Just(SortCriterion::Distance), Just(SortCriterion::Duration)].prop_map(Op::Sort),
        1 => (0usize..16).prop_map(|pick| Op::Enrich { pick }),
        1 => Just(Op::Reload),
    ]
}

fn session(store: &MemoryStore) -> (App, std::rc::Rc<std::cell::RefCell<mapty::presentation::headless::Screen>>, RecordingEnricher) {
    let presentation = HeadlessPresentation::new();
    let screen = presentation.screen();
    let enricher = RecordingEnricher::new();
    let facilities = DependenciesBuilder::new()
        .with_presentation(presentation)
        .with_store(store.clone())
        .with_enricher(enricher.clone())
        .build()
        .unwrap();

    let mut app = App::new(Settings::default(), facilities);
    app.start();
    app.handle(UiEvent::Located(Ok([47.0, 28.8])));

    (app, screen, enricher)
}

proptest! {
    #[test]
    fn every_representation_stays_aligned(ops in prop::collection::vec(op(), 1..40)) {
        let store = MemoryStore::new();
        let (mut app, mut screen, mut enricher) = session(&store);
        let mut requested = Vec::new();

        for op in ops {
            match op {
                Op::Create { running, distance, duration, extra } => {
                    app.handle(UiEvent::MapClick([47.0 + distance / 100.0, 28.8]));
                    app.handle(UiEvent::CommitKey);
                    let form = if running {
                        FormInput::running(distance, duration, extra)
                    } else {
                        FormInput::cycling(distance, duration, extra)
                    };
                    app.handle(UiEvent::FormSubmit(form));
                }
                Op::Edit { position, distance } => {
                    app.handle(UiEvent::ListItemClick { position, action: ListAction::Edit });
                    app.handle(UiEvent::FormSubmit(FormInput {
                        distance,
                        ..FormInput::running(1.0, 30.0, 150.0)
                    }));
                    app.handle(UiEvent::MapClick([0.0, 0.0]));
                }
                Op::Delete { position } => {
                    app.handle(UiEvent::ListItemClick { position, action: ListAction::Delete });
                }
                Op::Sort(criterion) => app.handle(UiEvent::SortButtonClick(criterion)),
                Op::Enrich { pick } => {
                    requested.extend(enricher.take().into_iter().map(|request| request.id));
                    if !requested.is_empty() {
                        let id = requested.remove(pick % requested.len());
                        app.apply_enrichment(EnrichmentOutcome {
                            id,
                            result: LookupResult::Weather(Err(EnrichmentError::Status(504))),
                        });
                    }
                }
                Op::Reload => {
                    let (reloaded, reloaded_screen, reloaded_enricher) = session(&store);
                    let before: Vec<String> = app.collection().workouts().map(|w| w.id.clone()).collect();
                    let after: Vec<String> = reloaded.collection().workouts().map(|w| w.id.clone()).collect();
                    prop_assert_eq!(before, after);

                    app = reloaded;
                    screen = reloaded_screen;
                    enricher = reloaded_enricher;
                    requested.clear();
                }
            }

            let collection = app.collection();
            let screen = screen.borrow();
            let count = collection.len();

            prop_assert_eq!(collection.markup().count(), count);
            prop_assert_eq!(collection.markers().count(), count);
            prop_assert_eq!(collection.routes().count(), count);
            prop_assert_eq!(screen.list.len(), count);
            prop_assert_eq!(screen.markers.len(), count);
            prop_assert!(screen.routes.len() <= count + 1);

            let mut ids: Vec<&str> = collection.workouts().map(|w| w.id.as_str()).collect();
            ids.sort_unstable();
            ids.dedup();
            prop_assert_eq!(ids.len(), count);

            for (index, workout) in collection.workouts().enumerate() {
                prop_assert_eq!(collection.index_of(&workout.id), Some(index));
                if let Some(paired) = collection.route_of(index) {
                    prop_assert_eq!(paired.route.last_point(), Some(workout.coords));
                }
            }
        }
    }
}
