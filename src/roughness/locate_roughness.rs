use crate::roughness::crs::LayerCrs;
use crate::roughness::error::RoughnessError;
use crate::roughness::layer_reader::{read_land_cover, LandCoverLayer};
use crate::types::land_cover::{LandCoverPolygon, OverlapPolicy};
use log::{debug, warn};
use ordered_float::OrderedFloat;
use rstar::RTree;
use std::path::Path;

/// Resolves the surface roughness at a location from a land-cover polygon layer.
///
/// The layer is indexed once in an R-tree over polygon bounding boxes and shared read-only
/// afterwards. Lookups project the WGS 84 query point into the layer's reference system,
/// collect every polygon intersecting it and pick one according to the [`OverlapPolicy`].
#[derive(Debug, Clone)]
pub struct RoughnessLocator {
    rtree: RTree<LandCoverPolygon>,
    crs: LayerCrs,
    policy: OverlapPolicy,
}

impl RoughnessLocator {
    pub fn new(layer: LandCoverLayer, policy: OverlapPolicy) -> Self {
        let rtree = RTree::bulk_load(layer.polygons);
        RoughnessLocator {
            rtree,
            crs: layer.crs,
            policy,
        }
    }

    /// Reads and indexes the layer at `path` on a blocking task.
    pub async fn from_path(
        path: &Path,
        crs_override: Option<String>,
        policy: OverlapPolicy,
    ) -> Result<Self, RoughnessError> {
        let path = path.to_path_buf();
        let layer =
            tokio::task::spawn_blocking(move || read_land_cover(&path, crs_override.as_deref()))
                .await??;
        Ok(Self::new(layer, policy))
    }

    pub fn crs(&self) -> LayerCrs {
        self.crs
    }

    pub fn policy(&self) -> OverlapPolicy {
        self.policy
    }

    /// Number of indexed polygons.
    pub fn len(&self) -> usize {
        self.rtree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.rtree.size() == 0
    }

    /// All polygons intersecting the point, in layer record order.
    pub fn query(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<Vec<&LandCoverPolygon>, RoughnessError> {
        validate_coordinate(latitude, longitude)?;
        let (x, y) = self.crs.project(longitude, latitude);

        let mut matches: Vec<&LandCoverPolygon> = self.rtree.locate_all_at_point(&[x, y]).collect();
        matches.sort_by_key(|p| p.record);
        Ok(matches)
    }

    /// The roughness length (m) at the point.
    ///
    /// # Errors
    ///
    /// [`RoughnessError::NoMatch`] when the point lies outside every polygon, and
    /// [`RoughnessError::InvalidCoordinate`] for coordinates outside the WGS 84 range.
    pub fn roughness_at(&self, latitude: f64, longitude: f64) -> Result<f64, RoughnessError> {
        let matches = self.query(latitude, longitude)?;

        if matches.len() > 1 {
            warn!(
                "Location ({}, {}) intersects {} land-cover polygons (records {:?}); using {:?}",
                latitude,
                longitude,
                matches.len(),
                matches.iter().map(|p| p.record).collect::<Vec<_>>(),
                self.policy
            );
        }

        let chosen = match self.policy {
            OverlapPolicy::FirstMatch => matches.first().copied(),
            OverlapPolicy::SmallestArea => matches
                .iter()
                .copied()
                .min_by_key(|p| OrderedFloat(p.area())),
        }
        .ok_or(RoughnessError::NoMatch {
            latitude,
            longitude,
        })?;

        debug!(
            "Roughness at ({}, {}) is {} m (record {})",
            latitude, longitude, chosen.roughness, chosen.record
        );
        Ok(chosen.roughness)
    }
}

fn validate_coordinate(latitude: f64, longitude: f64) -> Result<(), RoughnessError> {
    let valid = latitude.is_finite()
        && longitude.is_finite()
        && (-90.0..=90.0).contains(&latitude)
        && (-180.0..=180.0).contains(&longitude);
    if valid {
        Ok(())
    } else {
        Err(RoughnessError::InvalidCoordinate {
            latitude,
            longitude,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{polygon, Centroid, MultiPolygon};

    fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> MultiPolygon<f64> {
        MultiPolygon::new(vec![polygon![
            (x: x0, y: y0),
            (x: x1, y: y0),
            (x: x1, y: y1),
            (x: x0, y: y1),
            (x: x0, y: y0),
        ]])
    }

    fn layer(polygons: Vec<(MultiPolygon<f64>, f64)>, crs: LayerCrs) -> LandCoverLayer {
        LandCoverLayer {
            crs,
            polygons: polygons
                .into_iter()
                .enumerate()
                .filter_map(|(i, (g, r))| LandCoverPolygon::new(i, g, r))
                .collect(),
        }
    }

    fn madison() -> LandCoverLayer {
        layer(
            vec![
                // Large rural block with a smaller urban block inside it.
                (rect(-89.6, 42.9, -89.2, 43.2), 0.1),
                (rect(-89.42, 43.05, -89.36, 43.09), 1.0),
                (rect(-89.2, 42.9, -88.9, 43.2), 0.03),
            ],
            LayerCrs::Geographic,
        )
    }

    #[test]
    fn centroid_resolves_to_its_polygon() {
        let layer = madison();
        let centroid = layer.polygons[2].geometry.centroid().unwrap();
        let locator = RoughnessLocator::new(layer, OverlapPolicy::FirstMatch);

        let roughness = locator.roughness_at(centroid.y(), centroid.x()).unwrap();
        assert_eq!(roughness, 0.03);
    }

    #[test]
    fn outside_every_polygon_is_no_match() {
        let locator = RoughnessLocator::new(madison(), OverlapPolicy::FirstMatch);
        let err = locator.roughness_at(40.0, -89.4).unwrap_err();
        assert!(matches!(err, RoughnessError::NoMatch { .. }));
    }

    #[test]
    fn overlap_policy_decides_between_matches() {
        let first = RoughnessLocator::new(madison(), OverlapPolicy::FirstMatch);
        assert_eq!(first.query(43.07, -89.40).unwrap().len(), 2);
        assert_eq!(first.roughness_at(43.07, -89.40).unwrap(), 0.1);

        let smallest = RoughnessLocator::new(madison(), OverlapPolicy::SmallestArea);
        assert_eq!(smallest.roughness_at(43.07, -89.40).unwrap(), 1.0);
    }

    #[test]
    fn shared_edges_match_both_sides() {
        let locator = RoughnessLocator::new(madison(), OverlapPolicy::FirstMatch);
        let matches = locator.query(43.0, -89.2).unwrap();
        let records: Vec<_> = matches.iter().map(|p| p.record).collect();
        assert_eq!(records, vec![0, 2]);
    }

    #[test]
    fn projected_layers_get_projected_queries() {
        // The same rural block, expressed in UTM zone 16N meters.
        let crs = LayerCrs::Utm {
            zone: 16,
            north: true,
        };
        let (x0, y0) = crs.project(-89.6, 42.9);
        let (x1, y1) = crs.project(-89.2, 43.2);
        let locator = RoughnessLocator::new(
            layer(vec![(rect(x0, y0, x1, y1), 0.25)], crs),
            OverlapPolicy::FirstMatch,
        );

        assert_eq!(locator.roughness_at(43.0731, -89.4012).unwrap(), 0.25);
        // Unprojected degrees would land near the origin of the zone and miss.
        assert!(locator.roughness_at(0.0, -87.0).is_err());
    }

    #[test]
    fn invalid_coordinates_are_rejected() {
        let locator = RoughnessLocator::new(madison(), OverlapPolicy::FirstMatch);
        assert!(matches!(
            locator.roughness_at(91.0, 0.0),
            Err(RoughnessError::InvalidCoordinate { .. })
        ));
        assert!(locator.roughness_at(f64::NAN, 0.0).is_err());
    }
}
