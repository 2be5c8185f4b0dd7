//! Land-cover polygons carrying a surface roughness length, and the pieces needed to put
//! them in an `rstar` R-tree.

use geo::{Area, BoundingRect, Intersects, MultiPolygon, Point};
use rstar::{PointDistance, RTreeObject, AABB};
use serde::{Deserialize, Serialize};

/// One record of a land-cover layer.
///
/// Coordinates are in the layer's own reference system (see
/// [`crate::LayerCrs`]); `x` is easting/longitude and `y` northing/latitude.
#[derive(Debug, Clone)]
pub struct LandCoverPolygon {
    /// Position of the record in the source layer.
    pub record: usize,
    pub geometry: MultiPolygon<f64>,
    /// Roughness length in meters.
    pub roughness: f64,
    envelope: AABB<[f64; 2]>,
}

impl LandCoverPolygon {
    /// Returns `None` for an empty geometry, which has no bounding box and can never match.
    pub fn new(record: usize, geometry: MultiPolygon<f64>, roughness: f64) -> Option<Self> {
        let rect = geometry.bounding_rect()?;
        let envelope = AABB::from_corners(
            [rect.min().x, rect.min().y],
            [rect.max().x, rect.max().y],
        );
        Some(Self {
            record,
            geometry,
            roughness,
            envelope,
        })
    }

    pub fn area(&self) -> f64 {
        self.geometry.unsigned_area()
    }

    /// True if the point lies inside the polygon or on its boundary.
    pub fn intersects(&self, x: f64, y: f64) -> bool {
        self.geometry.intersects(&Point::new(x, y))
    }
}

/// The polygon is indexed by its bounding box.
impl RTreeObject for LandCoverPolygon {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// Point queries against the tree refine the bounding-box hit with an exact
/// geometric test, so `locate_all_at_point` only yields true intersections.
impl PointDistance for LandCoverPolygon {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        self.envelope.distance_2(point)
    }

    fn contains_point(&self, point: &[f64; 2]) -> bool {
        self.intersects(point[0], point[1])
    }
}

/// Which polygon wins when a query point falls into several overlapping ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverlapPolicy {
    /// The match that comes first in the layer's record order.
    #[default]
    FirstMatch,
    /// The match with the smallest area, i.e. the most specific land-cover class.
    SmallestArea,
}
