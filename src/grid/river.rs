use std::collections::HashMap;

use thiserror::Error;

use crate::geo::GeoPoint;
use crate::grid::point::{GridPoint, Strip};
use crate::grid::spatial::SpatialIndex;

#[derive(Error, Debug)]
pub enum RiverIndexError {
    #[error("grid point {index} at {location} has no river/sequence metadata")]
    MissingMetadata { index: usize, location: String },
}

/// Sequence-aware finder for riverine interpolation.
///
/// Only built when every point in the set carries river/sequence/strip
/// metadata; otherwise construction fails and the owning set falls back to
/// the generic [`SpatialIndex`].
#[derive(Debug, Clone)]
pub struct RiverSequenceIndex {
    /// (river_id, seq) -> point indices per strip.
    slots: HashMap<(i64, i64), StripSlots>,
    /// Anchor candidates: center-strip points, or every point when the
    /// source has no center strip at all.
    anchors: Vec<usize>,
}

#[derive(Debug, Clone, Copy, Default)]
struct StripSlots {
    left: Option<usize>,
    center: Option<usize>,
    right: Option<usize>,
}

impl RiverSequenceIndex {
    pub fn build(points: &[GridPoint]) -> Result<Self, RiverIndexError> {
        let mut slots: HashMap<(i64, i64), StripSlots> = HashMap::new();
        let mut centers = Vec::new();

        for (i, p) in points.iter().enumerate() {
            let meta = p.river().ok_or_else(|| RiverIndexError::MissingMetadata {
                index: i,
                location: p.location().to_string(),
            })?;
            let entry = slots.entry((meta.river_id, meta.seq)).or_default();
            match meta.strip {
                Strip::Left => entry.left = Some(i),
                Strip::Center => {
                    entry.center = Some(i);
                    centers.push(i);
                }
                Strip::Right => entry.right = Some(i),
            }
        }

        let anchors = if centers.is_empty() {
            (0..points.len()).collect()
        } else {
            centers
        };
        Ok(Self { slots, anchors })
    }

    /// Resolves a query position to the strip companions of the nearest
    /// anchor point: the left/center/right points sharing the anchor's river
    /// and sequence. Returns indices in left-center-right order.
    pub fn resolve(
        &self,
        query: &GeoPoint,
        points: &[GridPoint],
        spatial: &SpatialIndex,
    ) -> Vec<usize> {
        let anchor = match self.nearest_anchor(query, spatial) {
            Some(a) => a,
            None => return Vec::new(),
        };
        // build() guarantees metadata on every point.
        let meta = match points[anchor].river() {
            Some(m) => m,
            None => return vec![anchor],
        };
        let slot = match self.slots.get(&(meta.river_id, meta.seq)) {
            Some(s) => s,
            None => return vec![anchor],
        };
        let mut out = Vec::with_capacity(3);
        for idx in [slot.left, slot.center, slot.right].into_iter().flatten() {
            out.push(idx);
        }
        if out.is_empty() {
            out.push(anchor);
        }
        out
    }

    fn nearest_anchor(&self, query: &GeoPoint, spatial: &SpatialIndex) -> Option<usize> {
        self.anchors
            .iter()
            .copied()
            .min_by(|&a, &b| {
                spatial
                    .distance_sq_to(a, query)
                    .total_cmp(&spatial.distance_sq_to(b, query))
                    .then(a.cmp(&b))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::point::RiverSeqLcr;

    fn river_point(lat: f64, lng: f64, river: i64, seq: i64, strip: Strip) -> GridPoint {
        GridPoint::from_series(
            GeoPoint::new(lat, lng),
            vec![0.0],
            vec![0.0],
            None,
            None,
            None,
            None,
            Some(RiverSeqLcr { river_id: river, seq, strip }),
        )
    }

    fn bare_point(lat: f64, lng: f64) -> GridPoint {
        GridPoint::from_series(
            GeoPoint::new(lat, lng),
            vec![0.0],
            vec![0.0],
            None,
            None,
            None,
            None,
            None,
        )
    }

    #[test]
    fn build_fails_without_metadata() {
        let points = vec![
            river_point(0.0, 0.0, 1, 1, Strip::Center),
            bare_point(0.0, 1.0),
        ];
        assert!(RiverSequenceIndex::build(&points).is_err());
    }

    #[test]
    fn resolves_strip_companions() {
        let points = vec![
            river_point(0.0, 0.0, 1, 1, Strip::Left),
            river_point(0.0, 0.01, 1, 1, Strip::Center),
            river_point(0.0, 0.02, 1, 1, Strip::Right),
            river_point(1.0, 0.01, 1, 2, Strip::Center),
        ];
        let spatial = SpatialIndex::build(&points);
        let index = RiverSequenceIndex::build(&points).unwrap();

        let near_seq1 = index.resolve(&GeoPoint::new(0.001, 0.01), &points, &spatial);
        assert_eq!(near_seq1, vec![0, 1, 2]);

        let near_seq2 = index.resolve(&GeoPoint::new(0.99, 0.01), &points, &spatial);
        assert_eq!(near_seq2, vec![3]);
    }
}
