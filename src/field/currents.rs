//! Current-field façades: water motion, reported in the direction of flow.

use std::sync::OnceLock;

use log::info;

use crate::calc::InterpolationMode;
use crate::config::SamplerConfig;
use crate::error::FieldError;
use crate::field::EnvField;
use crate::geo::GeoPoint;
use crate::reader::source::GridSource;
use crate::reader::{FieldAliases, FieldReader};
use crate::sample::SampleValue;

/// Sampled current field over one ingested source.
pub struct CurrentsField {
    reader: FieldReader,
    half_life: f64,
    pre_distress_half_life: f64,
}

impl CurrentsField {
    /// Ingests a current source. Current components point downstream, so no
    /// sign flip is applied.
    pub fn ingest(source: &dyn GridSource, config: &SamplerConfig) -> Result<Self, FieldError> {
        let reader = FieldReader::ingest(source, &FieldAliases::currents(), true, config)?;
        Ok(Self {
            reader,
            half_life: config.current_half_life_seconds,
            pre_distress_half_life: config.pre_distress_half_life_seconds,
        })
    }

    pub fn reader(&self) -> &FieldReader {
        &self.reader
    }
}

impl EnvField for CurrentsField {
    fn sample(&self, time: i64, location: &GeoPoint, mode: InterpolationMode) -> SampleValue {
        self.reader.sample(time, location, mode)
    }

    fn half_life_seconds(&self) -> f64 {
        self.half_life
    }

    fn pre_distress_half_life_seconds(&self) -> f64 {
        self.pre_distress_half_life
    }

    fn is_empty(&self) -> bool {
        self.reader.is_empty()
    }

    fn free_memory(&self) {
        self.reader.free_memory();
    }

    fn view_names(&self) -> Vec<String> {
        self.reader.view_names().to_vec()
    }
}

/// A current field answering the same sample everywhere.
pub struct ConstantCurrentsField {
    value: SampleValue,
    half_life: f64,
    pre_distress_half_life: f64,
    summary: OnceLock<String>,
}

impl ConstantCurrentsField {
    pub fn new(value: SampleValue, config: &SamplerConfig) -> Self {
        Self {
            value,
            half_life: config.current_half_life_seconds,
            pre_distress_half_life: config.pre_distress_half_life_seconds,
            summary: OnceLock::new(),
        }
    }

    /// Diagnostic one-liner, built once on first request.
    pub fn summary(&self) -> &str {
        self.summary.get_or_init(|| {
            let s = format!(
                "constant current u={:.3} v={:.3} kn",
                self.value.u, self.value.v
            );
            info!("{s}");
            s
        })
    }
}

impl EnvField for ConstantCurrentsField {
    fn sample(&self, _time: i64, _location: &GeoPoint, _mode: InterpolationMode) -> SampleValue {
        self.value
    }

    fn half_life_seconds(&self) -> f64 {
        self.half_life
    }

    fn pre_distress_half_life_seconds(&self) -> f64 {
        self.pre_distress_half_life
    }

    fn is_empty(&self) -> bool {
        false
    }

    fn free_memory(&self) {}

    fn view_names(&self) -> Vec<String> {
        vec!["constant".to_string()]
    }
}
