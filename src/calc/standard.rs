use crate::calc::{inverse_distance_weights, weighted_sample};
use crate::geo::GeoPoint;
use crate::grid::point::GridPoint;
use crate::grid::point_set::FrozenSet;
use crate::sample::SampleValue;

/// Distance-weighted nearest-neighbor calculator.
///
/// Built per query position: picks the `k` nearest points from the frozen
/// set's spatial index and fixes their normalized inverse-distance weights.
#[derive(Debug)]
pub struct StandardUvCalculator<'a> {
    points: Vec<&'a GridPoint>,
    weights: Vec<f64>,
}

impl<'a> StandardUvCalculator<'a> {
    pub fn select(frozen: &'a FrozenSet, query: &GeoPoint, k: usize) -> Self {
        let indices = frozen.spatial().closest(query, k);
        let dist_sq: Vec<f64> = indices
            .iter()
            .map(|&i| frozen.spatial().distance_sq_to(i, query))
            .collect();
        let weights = if indices.is_empty() {
            Vec::new()
        } else {
            inverse_distance_weights(&dist_sq)
        };
        let points = indices.iter().map(|&i| &frozen.points()[i]).collect();
        Self { points, weights }
    }

    pub fn value_at(&self, time_idx: usize) -> SampleValue {
        weighted_sample(&self.points, &self.weights, time_idx)
    }

    #[cfg(test)]
    pub(crate) fn weights(&self) -> &[f64] {
        &self.weights
    }
}
