//! Interpolation modes and the two `UvCalculator` strategies.
//!
//! A calculator is built per query position against the frozen point set and
//! answers "spatially-interpolated sample at time index i". The closed set of
//! strategies is a tagged enum: the generic inverse-distance calculator and
//! the sequence-aware riverine calculator.

pub mod riverine;
pub mod standard;

use num_traits::Float;

pub use riverine::RiverineUvCalculator;
pub use standard::StandardUvCalculator;

use crate::grid::point::GridPoint;
use crate::sample::{component, SampleValue};

/// Closed token set selecting the interpolation strategy for a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InterpolationMode {
    TwoClosest,
    ThreeClosest,
    CenterDominated,
    UseAllStrips,
}

impl InterpolationMode {
    /// Parses the wire token (`2-closest`, `3-closest`, `center-dominated`,
    /// `use-all-strips`).
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "2-closest" => Some(Self::TwoClosest),
            "3-closest" => Some(Self::ThreeClosest),
            "center-dominated" => Some(Self::CenterDominated),
            "use-all-strips" => Some(Self::UseAllStrips),
            _ => None,
        }
    }

    pub fn token(&self) -> &'static str {
        match self {
            Self::TwoClosest => "2-closest",
            Self::ThreeClosest => "3-closest",
            Self::CenterDominated => "center-dominated",
            Self::UseAllStrips => "use-all-strips",
        }
    }

    /// Whether the mode asks for sequence-aware riverine interpolation.
    pub fn is_riverine(&self) -> bool {
        matches!(self, Self::CenterDominated | Self::UseAllStrips)
    }

    /// Reference-point count for the standard calculator.
    pub fn neighbor_count(&self) -> usize {
        match self {
            Self::ThreeClosest => 3,
            // Riverine modes downgrade to 2-closest when unsupported.
            _ => 2,
        }
    }
}

impl std::str::FromStr for InterpolationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("unknown interpolation mode: {s:?}"))
    }
}

impl std::fmt::Display for InterpolationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.token())
    }
}

/// The two interpolation strategies, sharing one output contract.
#[derive(Debug)]
pub enum UvCalculator<'a> {
    Standard(StandardUvCalculator<'a>),
    Riverine(RiverineUvCalculator<'a>),
}

impl UvCalculator<'_> {
    /// Spatially-interpolated sample at a time index.
    pub fn value_at(&self, time_idx: usize) -> SampleValue {
        match self {
            Self::Standard(c) => c.value_at(time_idx),
            Self::Riverine(c) => c.value_at(time_idx),
        }
    }
}

/// Generic linear interpolation between two values.
pub fn lin_interp<T: Float>(v0: T, v1: T, fac: T) -> T {
    v0 + (v1 - v0) * fac
}

/// Linear time interpolation of one component.
///
/// Endpoints are returned exactly. The degenerate `t0 == t1` bracket returns
/// `y0` when both ends agree and `NaN` otherwise: an ambiguous bracket is
/// flagged, never silently resolved.
pub fn interp_component(t0: i64, t1: i64, y0: f64, y1: f64, t: i64) -> f64 {
    if t0 == t1 {
        return if y0 == y1 { y0 } else { f64::NAN };
    }
    if t == t0 {
        return y0;
    }
    if t == t1 {
        return y1;
    }
    let fac = (t - t0) as f64 / (t1 - t0) as f64;
    lin_interp(y0, y1, fac)
}

/// Normalized inverse-distance weights over squared planar distances:
/// `w_i = 1/sqrt(d_i^2)` scaled to sum 1. A reference point exactly
/// coincident with the query short-circuits to weight 1.0 on the first such
/// point and 0.0 everywhere else.
pub fn inverse_distance_weights(dist_sq: &[f64]) -> Vec<f64> {
    if let Some(hit) = dist_sq.iter().position(|&d| d == 0.0) {
        let mut w = vec![0.0; dist_sq.len()];
        w[hit] = 1.0;
        return w;
    }
    let raw: Vec<f64> = dist_sq.iter().map(|&d| 1.0 / d.sqrt()).collect();
    let total: f64 = raw.iter().sum();
    raw.into_iter().map(|w| w / total).collect()
}

/// Weighted average of the reference points' samples at one time index.
///
/// Each of the six components is averaged independently; a `NaN` at any
/// contributing (non-zero-weight) point makes that component `NaN`. No
/// partial averaging.
pub fn weighted_sample(points: &[&GridPoint], weights: &[f64], time_idx: usize) -> SampleValue {
    debug_assert_eq!(points.len(), weights.len());
    let mut out = [0.0f64; component::COUNT];
    for (point, &w) in points.iter().zip(weights) {
        if w == 0.0 {
            continue;
        }
        let c = point.sample_at(time_idx).components();
        for (acc, v) in out.iter_mut().zip(c) {
            *acc += w * v; // NaN * w propagates into the accumulator
        }
    }
    SampleValue::from_components(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::GeoPoint;

    #[test]
    fn mode_tokens_round_trip() {
        for token in ["2-closest", "3-closest", "center-dominated", "use-all-strips"] {
            let mode = InterpolationMode::parse(token).unwrap();
            assert_eq!(mode.token(), token);
        }
        assert!(InterpolationMode::parse("4-closest").is_none());
    }

    #[test]
    fn interp_endpoints_exact() {
        assert_eq!(interp_component(0, 100, 1.0, 3.0, 0), 1.0);
        assert_eq!(interp_component(0, 100, 1.0, 3.0, 100), 3.0);
        assert_eq!(interp_component(0, 100, 1.0, 3.0, 50), 2.0);
    }

    #[test]
    fn degenerate_bracket_rules() {
        assert_eq!(interp_component(5, 5, 2.0, 2.0, 5), 2.0);
        assert!(interp_component(5, 5, 2.0, 3.0, 5).is_nan());
    }

    #[test]
    fn nan_endpoint_propagates() {
        assert!(interp_component(0, 100, f64::NAN, 3.0, 50).is_nan());
        assert!(interp_component(0, 100, 1.0, f64::NAN, 50).is_nan());
    }

    #[test]
    fn weights_sum_to_one() {
        let w = inverse_distance_weights(&[1.0, 4.0, 9.0]);
        assert!((w.iter().sum::<f64>() - 1.0).abs() < 1e-12);
        assert!(w[0] > w[1] && w[1] > w[2]);
    }

    #[test]
    fn coincident_point_takes_all_weight() {
        let w = inverse_distance_weights(&[4.0, 0.0, 1.0]);
        assert_eq!(w, vec![0.0, 1.0, 0.0]);
    }

    #[test]
    fn weighted_sample_propagates_nan_per_component() {
        let a = GridPoint::from_series(
            GeoPoint::new(0.0, 0.0),
            vec![1.0],
            vec![f64::NAN],
            Some(vec![0.1]),
            None,
            None,
            None,
            None,
        );
        let b = GridPoint::from_series(
            GeoPoint::new(0.0, 1.0),
            vec![3.0],
            vec![2.0],
            Some(vec![0.3]),
            None,
            None,
            None,
            None,
        );
        let s = weighted_sample(&[&a, &b], &[0.5, 0.5], 0);
        assert_eq!(s.u, 2.0);
        assert!(s.v.is_nan());
        assert!((s.du - 0.2).abs() < 1e-12);
        assert!(s.dv.is_nan());
    }

    #[test]
    fn zero_weight_point_does_not_poison() {
        let good = GridPoint::from_series(
            GeoPoint::new(0.0, 0.0),
            vec![1.0],
            vec![2.0],
            None,
            None,
            None,
            None,
            None,
        );
        let nan = GridPoint::from_series(
            GeoPoint::new(0.0, 1.0),
            vec![f64::NAN],
            vec![f64::NAN],
            None,
            None,
            None,
            None,
            None,
        );
        let s = weighted_sample(&[&good, &nan], &[1.0, 0.0], 0);
        assert_eq!(s.u, 1.0);
        assert_eq!(s.v, 2.0);
    }
}
