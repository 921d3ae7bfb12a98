//! Public façades consumed by the drift simulator.
//!
//! Two field families exist with identical shapes: currents (water motion)
//! and winds (reported as the downwind vector). Constant variants answer a
//! fixed sample for every query.

pub mod currents;
pub mod winds;

use rayon::prelude::*;

pub use currents::{ConstantCurrentsField, CurrentsField};
pub use winds::{ConstantWindsField, WindsField};

use crate::calc::InterpolationMode;
use crate::geo::GeoPoint;
use crate::sample::SampleValue;

/// One environmental field as the simulator sees it.
pub trait EnvField: Sync {
    /// Interpolated sample at `(time, location)` under the given mode.
    fn sample(&self, time: i64, location: &GeoPoint, mode: InterpolationMode) -> SampleValue;

    /// Decorrelation half-life of this field's forcing, seconds.
    fn half_life_seconds(&self) -> f64;

    /// Half-life applied to drift before the distress time, seconds.
    fn pre_distress_half_life_seconds(&self) -> f64;

    fn is_empty(&self) -> bool;

    /// Releases retained point data; idempotent.
    fn free_memory(&self);

    /// Source variable names backing this field, for diagnostics.
    fn view_names(&self) -> Vec<String>;
}

/// Samples one time across many positions in parallel. Query paths are
/// lock-free after the first freeze, so particle batches scale with cores.
pub fn sample_batch(
    field: &dyn EnvField,
    time: i64,
    locations: &[GeoPoint],
    mode: InterpolationMode,
) -> Vec<SampleValue> {
    locations
        .par_iter()
        .map(|loc| field.sample(time, loc, mode))
        .collect()
}
