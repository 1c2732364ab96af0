/// A `[latitude, longitude]` pair, stored the way the map widget hands it over.
pub type LatLng = [f64; 2];

pub type WorkoutId = String;

pub trait Identifiable {
    fn id(&self) -> &WorkoutId;
}
