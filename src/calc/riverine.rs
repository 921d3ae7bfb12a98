use crate::calc::{inverse_distance_weights, weighted_sample, InterpolationMode};
use crate::geo::GeoPoint;
use crate::grid::point::{GridPoint, Strip};
use crate::grid::point_set::FrozenSet;
use crate::sample::SampleValue;

/// Sequence-aware calculator for riverine sources.
///
/// Reference points are the left/center/right strip companions of the river
/// sequence nearest the query, not the globally nearest points. Output
/// contract matches the standard calculator: one `SampleValue` per time
/// index, NaN components propagated.
#[derive(Debug)]
pub struct RiverineUvCalculator<'a> {
    points: Vec<&'a GridPoint>,
    weights: Vec<f64>,
}

impl<'a> RiverineUvCalculator<'a> {
    /// `None` when the frozen set has no river index; the caller downgrades
    /// to the standard calculator.
    pub fn select(
        frozen: &'a FrozenSet,
        query: &GeoPoint,
        mode: InterpolationMode,
    ) -> Option<Self> {
        let river = frozen.river()?;
        let indices = river.resolve(query, frozen.points(), frozen.spatial());
        if indices.is_empty() {
            return Some(Self { points: Vec::new(), weights: Vec::new() });
        }

        let dist_sq: Vec<f64> = indices
            .iter()
            .map(|&i| frozen.spatial().distance_sq_to(i, query))
            .collect();
        let mut weights = inverse_distance_weights(&dist_sq);

        if mode == InterpolationMode::CenterDominated {
            // The center strip carries double weight; renormalize after.
            for (w, &i) in weights.iter_mut().zip(&indices) {
                if matches!(frozen.points()[i].river().map(|r| r.strip), Some(Strip::Center)) {
                    *w *= 2.0;
                }
            }
            let total: f64 = weights.iter().sum();
            if total > 0.0 {
                for w in &mut weights {
                    *w /= total;
                }
            }
        }

        let points = indices.iter().map(|&i| &frozen.points()[i]).collect();
        Some(Self { points, weights })
    }

    pub fn value_at(&self, time_idx: usize) -> SampleValue {
        weighted_sample(&self.points, &self.weights, time_idx)
    }

    #[cfg(test)]
    pub(crate) fn weights(&self) -> &[f64] {
        &self.weights
    }
}
