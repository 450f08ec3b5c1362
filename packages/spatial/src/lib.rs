#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Spatial primitives shared by the analysis engine.
//!
//! Provides the great-circle distance used for every reported radius, a
//! bounding box over incident coordinates, and an R-tree backed index for
//! fixed-radius neighbor queries in a planar feature space.

use geo::{BoundingRect, MultiPoint, Point};
use geo_incidents_incident_models::Coordinate;
use rstar::RTree;
use rstar::primitives::GeomWithData;

/// Mean Earth radius in kilometers used by [`haversine_km`].
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance between two coordinates in kilometers.
///
/// Haversine formula on a sphere of radius [`EARTH_RADIUS_KM`].
#[must_use]
pub fn haversine_km(a: Coordinate, b: Coordinate) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let dlat = lat2 - lat1;
    let dlon = (b.longitude - a.longitude).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    // Rounding can push h a hair above 1 for antipodal points.
    let c = 2.0 * h.sqrt().min(1.0).asin();

    EARTH_RADIUS_KM * c
}

/// Axis-aligned bounding box in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    /// Smallest latitude.
    pub min_lat: f64,
    /// Smallest longitude.
    pub min_lng: f64,
    /// Largest latitude.
    pub max_lat: f64,
    /// Largest longitude.
    pub max_lng: f64,
}

impl BoundingBox {
    /// Computes the bounding box of a set of coordinates.
    ///
    /// Returns `None` for an empty input.
    #[must_use]
    pub fn of<I>(coordinates: I) -> Option<Self>
    where
        I: IntoIterator<Item = Coordinate>,
    {
        let points: MultiPoint<f64> = coordinates
            .into_iter()
            .map(|c| Point::new(c.longitude, c.latitude))
            .collect();

        points.bounding_rect().map(|rect| Self {
            min_lat: rect.min().y,
            min_lng: rect.min().x,
            max_lat: rect.max().y,
            max_lng: rect.max().x,
        })
    }
}

type IndexedPoint = GeomWithData<[f64; 2], usize>;

/// Fixed-radius neighbor index over 2-D feature vectors.
///
/// Each vector keeps its position in the input slice so callers can map
/// neighbors back to their source records.
pub struct NeighborIndex {
    tree: RTree<IndexedPoint>,
}

impl NeighborIndex {
    /// Bulk-loads an R-tree over `features`.
    #[must_use]
    pub fn build(features: &[[f64; 2]]) -> Self {
        let entries: Vec<IndexedPoint> = features
            .iter()
            .enumerate()
            .map(|(idx, f)| GeomWithData::new(*f, idx))
            .collect();

        let tree = RTree::bulk_load(entries);
        log::trace!("Built neighbor index over {} points", tree.size());

        Self { tree }
    }

    /// Indices of every point whose Euclidean distance to `query` is at
    /// most `radius`, the query point itself included when indexed.
    ///
    /// Returned in ascending index order.
    #[must_use]
    pub fn within(&self, query: [f64; 2], radius: f64) -> Vec<usize> {
        let mut found: Vec<usize> = self
            .tree
            .locate_within_distance(query, radius * radius)
            .map(|entry| entry.data)
            .collect();
        found.sort_unstable();
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn haversine_is_zero_for_identical_points() {
        let p = Coordinate::new(51.5, -0.12);
        assert!(haversine_km(p, p).abs() < f64::EPSILON);
    }

    #[test]
    fn haversine_is_symmetric() {
        let a = Coordinate::new(40.7128, -74.0060);
        let b = Coordinate::new(34.0522, -118.2437);
        assert!((haversine_km(a, b) - haversine_km(b, a)).abs() < 1e-9);
    }

    #[test]
    fn one_degree_of_latitude_is_about_111_km() {
        let a = Coordinate::new(0.0, 0.0);
        let b = Coordinate::new(1.0, 0.0);
        let d = haversine_km(a, b);
        assert!((d - 111.19).abs() < 0.01, "got {d}");
    }

    #[test]
    fn new_york_to_los_angeles() {
        let a = Coordinate::new(40.7128, -74.0060);
        let b = Coordinate::new(34.0522, -118.2437);
        let d = haversine_km(a, b);
        assert!((3935.0..3937.0).contains(&d), "got {d}");
    }

    #[test]
    fn bounding_box_covers_all_points() {
        let bbox = BoundingBox::of([
            Coordinate::new(10.0, 20.0),
            Coordinate::new(12.5, 19.0),
            Coordinate::new(11.0, 21.5),
        ])
        .unwrap();
        assert!((bbox.min_lat - 10.0).abs() < f64::EPSILON);
        assert!((bbox.max_lat - 12.5).abs() < f64::EPSILON);
        assert!((bbox.min_lng - 19.0).abs() < f64::EPSILON);
        assert!((bbox.max_lng - 21.5).abs() < f64::EPSILON);
    }

    #[test]
    fn bounding_box_of_nothing_is_none() {
        assert!(BoundingBox::of(std::iter::empty::<Coordinate>()).is_none());
    }

    #[test]
    fn neighbor_radius_is_inclusive_and_sorted() {
        let index = NeighborIndex::build(&[[0.0, 0.0], [3.0, 4.0], [0.5, 0.0], [10.0, 10.0]]);
        assert_eq!(index.within([0.0, 0.0], 5.0), vec![0, 1, 2]);
        assert_eq!(index.within([0.0, 0.0], 0.4), vec![0]);
    }

    #[test]
    fn neighbor_index_handles_duplicates() {
        let index = NeighborIndex::build(&[[1.0, 1.0]; 5]);
        assert_eq!(index.within([1.0, 1.0], 0.0), vec![0, 1, 2, 3, 4]);
    }
}
