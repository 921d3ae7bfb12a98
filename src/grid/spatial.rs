use crate::geo::{GeoPoint, GeoProjection};
use crate::grid::point::GridPoint;

/// Generic nearest-neighbor finder over the frozen point list.
///
/// Points are projected once at build time onto a plane anchored at the
/// westmost longitude of the set, so lookups are plain Euclidean scans.
/// Results are deterministic: ties break by index order, which follows the
/// frozen set's sorted point order.
#[derive(Debug, Clone)]
pub struct SpatialIndex {
    projection: GeoProjection,
    projected: Vec<(f64, f64)>,
}

impl SpatialIndex {
    pub fn build(points: &[GridPoint]) -> Self {
        let projection = projection_for(points);
        let projected = points
            .iter()
            .map(|p| projection.project(p.location()))
            .collect();
        Self { projection, projected }
    }

    pub fn projection(&self) -> &GeoProjection {
        &self.projection
    }

    pub fn len(&self) -> usize {
        self.projected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.projected.is_empty()
    }

    /// Squared planar distance from an indexed point to a query position.
    pub fn distance_sq_to(&self, idx: usize, query: &GeoPoint) -> f64 {
        let (qx, qy) = self.projection.project(query);
        let (px, py) = self.projected[idx];
        let dx = px - qx;
        let dy = py - qy;
        dx * dx + dy * dy
    }

    /// Up to `k` nearest point indices by projected Euclidean distance.
    /// An empty index yields an empty list.
    pub fn closest(&self, query: &GeoPoint, k: usize) -> Vec<usize> {
        if k == 0 || self.projected.is_empty() {
            return Vec::new();
        }
        let (qx, qy) = self.projection.project(query);
        let mut candidates: Vec<(f64, usize)> = self
            .projected
            .iter()
            .enumerate()
            .map(|(i, &(px, py))| {
                let dx = px - qx;
                let dy = py - qy;
                (dx * dx + dy * dy, i)
            })
            .collect();
        // Stable tie-break on index keeps equal-distance results deterministic.
        candidates.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        candidates.truncate(k);
        candidates.into_iter().map(|(_, i)| i).collect()
    }
}

/// Anchors the projection at the westmost longitude and the latitude midpoint
/// of the point set. An empty set gets a degenerate equatorial projection.
fn projection_for(points: &[GridPoint]) -> GeoProjection {
    if points.is_empty() {
        return GeoProjection::new(0.0, 0.0);
    }
    let mut left = f64::INFINITY;
    let mut lat_min = f64::INFINITY;
    let mut lat_max = f64::NEG_INFINITY;
    for p in points {
        left = left.min(p.location().lng());
        lat_min = lat_min.min(p.location().lat());
        lat_max = lat_max.max(p.location().lat());
    }
    GeoProjection::new(left, (lat_min + lat_max) / 2.0)
}
