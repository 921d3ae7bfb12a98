use crate::geo::GeoPoint;
use crate::sample::SampleValue;

/// Which strip of a river channel a grid point sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strip {
    Left,
    Center,
    Right,
}

/// Classification table mapping raw source strip codes to [`Strip`].
/// Codes outside the table leave the point without riverine metadata, which
/// in turn disables the river index for the whole set.
pub fn classify_strip(code: i64) -> Option<Strip> {
    match code {
        1 => Some(Strip::Left),
        2 => Some(Strip::Center),
        3 => Some(Strip::Right),
        _ => None,
    }
}

/// River/sequence/strip metadata attached to a grid point when the source
/// encodes channel topology.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RiverSeqLcr {
    pub river_id: i64,
    pub seq: i64,
    pub strip: Strip,
}

/// One fixed geographic location's full recorded time series.
///
/// Built once during ingestion from finished per-component arrays and
/// read-only afterwards. Components the source did not provide are `None`;
/// provided components have one value per time-axis step (sentinel gaps were
/// already filled during ingestion, so stored values are real readings).
#[derive(Debug, Clone)]
pub struct GridPoint {
    location: GeoPoint,
    u: Vec<f64>,
    v: Vec<f64>,
    du: Option<Vec<f64>>,
    dv: Option<Vec<f64>>,
    alt_du: Option<Vec<f64>>,
    alt_dv: Option<Vec<f64>>,
    river: Option<RiverSeqLcr>,
}

impl GridPoint {
    #[allow(clippy::too_many_arguments)]
    pub fn from_series(
        location: GeoPoint,
        u: Vec<f64>,
        v: Vec<f64>,
        du: Option<Vec<f64>>,
        dv: Option<Vec<f64>>,
        alt_du: Option<Vec<f64>>,
        alt_dv: Option<Vec<f64>>,
        river: Option<RiverSeqLcr>,
    ) -> Self {
        debug_assert_eq!(u.len(), v.len());
        Self { location, u, v, du, dv, alt_du, alt_dv, river }
    }

    pub fn location(&self) -> &GeoPoint {
        &self.location
    }

    pub fn river(&self) -> Option<&RiverSeqLcr> {
        self.river.as_ref()
    }

    /// Number of timesteps recorded at this point.
    pub fn steps(&self) -> usize {
        self.u.len()
    }

    /// Clamps an index into the valid range instead of erroring; callers that
    /// overshoot the axis get the nearest recorded value.
    fn clamp_index(&self, idx: usize) -> usize {
        idx.min(self.u.len().saturating_sub(1))
    }

    /// The full sample at a (clamped) time index. Absent components are `NaN`.
    pub fn sample_at(&self, idx: usize) -> SampleValue {
        let i = self.clamp_index(idx);
        let pick = |c: &Option<Vec<f64>>| c.as_ref().map_or(f64::NAN, |v| v[i]);
        SampleValue {
            u: self.u[i],
            v: self.v[i],
            du: pick(&self.du),
            dv: pick(&self.dv),
            alt_du: pick(&self.alt_du),
            alt_dv: pick(&self.alt_dv),
        }
    }

    pub fn u_at(&self, idx: usize) -> f64 {
        self.u[self.clamp_index(idx)]
    }

    pub fn v_at(&self, idx: usize) -> f64 {
        self.v[self.clamp_index(idx)]
    }
}
