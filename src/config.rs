/// Sampler-wide constants and per-run tunables.
///
/// These mirror the run configuration the surrounding simulator hands to each
/// field: the uncertainty defaults used when a source has no data, the decay
/// half-lives the drift physics reads back through the field facades, and the
/// sentinel default ingestion relies on.
#[derive(Clone, Debug)]
pub struct SamplerConfig {
    /// East-component uncertainty (knots) reported for an empty field.
    pub default_du: f64,
    /// North-component uncertainty (knots) reported for an empty field.
    pub default_dv: f64,
    /// Current-field uncertainty half-life (seconds).
    pub current_half_life_seconds: f64,
    /// Wind-field uncertainty half-life (seconds).
    pub wind_half_life_seconds: f64,
    /// Half-life applied to drift before the distress time (seconds).
    pub pre_distress_half_life_seconds: f64,
    /// Missing-value sentinel used when a source declares none.
    pub default_sentinel: f64,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            default_du: 0.5,
            default_dv: 0.5,
            current_half_life_seconds: 6.0 * 3600.0,
            wind_half_life_seconds: 3.0 * 3600.0,
            pre_distress_half_life_seconds: 12.0 * 3600.0,
            default_sentinel: -9999.0,
        }
    }
}
