use serde::de::DeserializeOwned;

use crate::{
    data_types::{
        route::Route,
        workout::{Workout, WorkoutRecord},
    },
    errors::PersistenceError,
    logln, logvbln, logwarn,
};

use super::store::{KeyValueStore, StorageKey};

/// One restored entry. `route` is `None` when the pairing could not be trusted
/// or the workout was stored without a drawing.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredEntry {
    pub workout: Workout,
    pub route: Option<Route>,
}

#[derive(Debug, Default)]
pub struct StoredCollection {
    pub entries: Vec<StoredEntry>,
    /// Drawings did not line up with workouts and were ignored.
    pub routes_discarded: bool,
    /// Records dropped because their type or fields could not be read.
    pub skipped: usize,
}

pub struct Persistance {
    store: Box<dyn KeyValueStore>,
}

impl Persistance {
    const CC: &'static str = "Persistance";

    pub fn new(store: Box<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Workouts and drawings always travel together: both are serialized before
    /// either is written. An empty drawing marks a workout without route.
    pub fn save(&self, workouts: &[WorkoutRecord], drawings: &[Route]) -> Result<(), PersistenceError> {
        let workouts_json = serde_json::to_string(workouts)?;
        let drawings_json = serde_json::to_string(drawings)?;

        self.store.save(StorageKey::Workouts, &workouts_json)?;
        self.store.save(StorageKey::Drawings, &drawings_json)?;

        logvbln!("Saved {} workouts", workouts.len());

        Ok(())
    }

    pub fn clear(&self) -> Result<(), PersistenceError> {
        self.store.clear()
    }

    /// Reads both keys. Anything absent or unreadable counts as "no prior data";
    /// a drawings list whose length differs from the workouts list is dropped whole.
    pub fn load(&self) -> StoredCollection {
        let Some(raw_workouts) = self.read::<Vec<serde_json::Value>>(StorageKey::Workouts) else {
            return StoredCollection::default();
        };

        let mut collection = StoredCollection::default();

        let drawings = match self.read::<Vec<Route>>(StorageKey::Drawings) {
            Some(drawings) if drawings.len() == raw_workouts.len() => Some(drawings),
            drawings => {
                let corruption = PersistenceError::Corrupted {
                    workouts: raw_workouts.len(),
                    drawings: drawings.map(|d| d.len()).unwrap_or(0),
                };

                if !raw_workouts.is_empty() {
                    logwarn!("{}; discarding routes", corruption);
                    collection.routes_discarded = true;
                }

                None
            }
        };

        for (index, raw) in raw_workouts.into_iter().enumerate() {
            let restored = serde_json::from_value::<WorkoutRecord>(raw)
                .map_err(PersistenceError::from)
                .and_then(Workout::from_record);

            match restored {
                Ok(workout) => {
                    let route = drawings
                        .as_ref()
                        .and_then(|drawings| drawings.get(index))
                        .filter(|route| !route.is_empty())
                        .cloned();

                    collection.entries.push(StoredEntry { workout, route });
                }
                Err(err) => {
                    logwarn!("Skipping stored workout #{}: {}", index, err);
                    collection.skipped += 1;
                }
            }
        }

        logln!(
            "Loaded {} workouts ({} skipped)",
            collection.entries.len(),
            collection.skipped
        );

        collection
    }

    fn read<T: DeserializeOwned>(&self, key: StorageKey) -> Option<T> {
        let content = match self.store.load(key) {
            Ok(content) => content?,
            Err(err) => {
                logwarn!("Reading `{}` failed: {}", key.as_str(), err);
                return None;
            }
        };

        match serde_json::from_str(&content) {
            Ok(value) => Some(value),
            Err(err) => {
                logwarn!("Stored `{}` is malformed: {}", key.as_str(), err);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Local, TimeZone};

    use super::*;
    use crate::database::store::MemoryStore;

    fn workout(id: &str) -> Workout {
        Workout::running(
            id.to_string(),
            [47.0, 28.8],
            5.0,
            30.0,
            150.0,
            Local.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap(),
        )
    }

    fn persistance() -> (Persistance, MemoryStore) {
        let store = MemoryStore::new();
        (Persistance::new(Box::new(store.clone())), store)
    }

    #[test]
    fn absent_data_is_empty() {
        let (persistance, _) = persistance();
        let loaded = persistance.load();

        assert!(loaded.entries.is_empty());
        assert!(!loaded.routes_discarded);
    }

    #[test]
    fn malformed_workouts_are_no_prior_data() {
        let (persistance, store) = persistance();
        store.save(StorageKey::Workouts, "{not json").unwrap();

        assert!(persistance.load().entries.is_empty());
    }

    #[test]
    fn saved_pairs_load_back_aligned() {
        let (persistance, _) = persistance();
        let records = vec![WorkoutRecord::from(&workout("1")), WorkoutRecord::from(&workout("2"))];
        let drawings = vec![Route::new(vec![[1.0, 1.0]]), Route::default()];

        persistance.save(&records, &drawings).unwrap();
        let loaded = persistance.load();

        assert_eq!(loaded.entries.len(), 2);
        assert_eq!(loaded.entries[0].route, Some(Route::new(vec![[1.0, 1.0]])));
        assert_eq!(loaded.entries[1].route, None);
        assert!(!loaded.routes_discarded);
    }

    #[test]
    fn count_mismatch_discards_all_routes() {
        let (persistance, store) = persistance();
        let records: Vec<WorkoutRecord> = ["1", "2", "3"]
            .iter()
            .map(|id| WorkoutRecord::from(&workout(id)))
            .collect();
        store
            .save(StorageKey::Workouts, &serde_json::to_string(&records).unwrap())
            .unwrap();
        store
            .save(StorageKey::Drawings, "[[[1.0,1.0]],[[2.0,2.0]]]")
            .unwrap();

        let loaded = persistance.load();

        assert_eq!(loaded.entries.len(), 3);
        assert!(loaded.routes_discarded);
        assert!(loaded.entries.iter().all(|entry| entry.route.is_none()));
    }

    #[test]
    fn unreadable_record_is_skipped_with_its_drawing() {
        let (persistance, store) = persistance();
        let good = serde_json::to_value(WorkoutRecord::from(&workout("7"))).unwrap();
        let raw = serde_json::json!([{ "type": "swimming" }, good]);
        store.save(StorageKey::Workouts, &raw.to_string()).unwrap();
        store
            .save(StorageKey::Drawings, "[[[9.0,9.0]],[[7.0,7.0]]]")
            .unwrap();

        let loaded = persistance.load();

        assert_eq!(loaded.skipped, 1);
        assert_eq!(loaded.entries.len(), 1);
        assert_eq!(loaded.entries[0].workout.id, "7");
        assert_eq!(loaded.entries[0].route, Some(Route::new(vec![[7.0, 7.0]])));
    }

    #[test]
    fn legacy_records_keep_their_address() {
        let (persistance, store) = persistance();
        store
            .save(
                StorageKey::Workouts,
                r#"[{"date":"2024-05-02T07:00:00.000Z","id":"4633200000","coords":[47.01,28.85],"distance":5,"duration":30,"type":"running","description":"Running on May 2","cadence":150,"pace":6,"adress":"Strada X, Chisinau, Moldova"}]"#,
            )
            .unwrap();
        store.save(StorageKey::Drawings, "[[[47.01,28.85]]]").unwrap();

        let loaded = persistance.load();

        assert_eq!(loaded.skipped, 0);
        let workout = &loaded.entries[0].workout;
        assert_eq!(workout.id, "4633200000");
        assert_eq!(workout.address.as_deref(), Some("Strada X, Chisinau, Moldova"));
        assert!(!workout.needs_address());
        assert_eq!(workout.primary_metric(), 6.0);
    }
}
