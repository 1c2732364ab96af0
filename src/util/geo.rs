use geo_types::{Coord, Rect};

use crate::data_types::common::LatLng;

pub struct GeoUtils;

impl GeoUtils {
    /// `x` carries the latitude, `y` the longitude.
    pub fn to_coord(latlng: LatLng) -> Coord {
        Coord::from((latlng[0], latlng[1]))
    }

    pub fn get_bounding_box(points: &[LatLng]) -> Option<Rect> {
        let first = GeoUtils::to_coord(*points.first()?);

        let (min, max) = points
            .iter()
            .map(|point| GeoUtils::to_coord(*point))
            .fold((first, first), |(min, max), coord| {
                (
                    Coord::from((coord.x.min(min.x), coord.y.min(min.y))),
                    Coord::from((coord.x.max(max.x), coord.y.max(max.y))),
                )
            });

        Some(Rect::new(min, max))
    }

    pub fn get_center_of_bbox(bbox: &Rect) -> LatLng {
        let center = bbox.center();

        [center.x, center.y]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounding_box_spans_all_points() {
        let bbox = GeoUtils::get_bounding_box(&[[47.0, 28.8], [46.5, 29.1], [47.2, 28.9]]).unwrap();

        assert_eq!(bbox.min(), Coord::from((46.5, 28.8)));
        assert_eq!(bbox.max(), Coord::from((47.2, 29.1)));

        let center = GeoUtils::get_center_of_bbox(&bbox);
        assert!((center[0] - 46.85).abs() < 1e-9);
        assert!((center[1] - 28.95).abs() < 1e-9);
    }

    #[test]
    fn no_points_no_box() {
        assert!(GeoUtils::get_bounding_box(&[]).is_none());
    }
}
