//! Wind-field façades. Winds are reported as the downwind vector; sources
//! using the meteorological "coming-from" convention flip sign at ingestion.

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

/// Sampled wind field over one ingested source.
pub struct WindsField {
    reader: FieldReader,
    half_life: f64,
    pre_distress_half_life: f64,
}

impl WindsField {
    /// Ingests a wind source. `downwind` is false for sources that report
    /// the direction the wind comes from.
    pub fn ingest(
        source: &dyn GridSource,
        downwind: bool,
        config: &SamplerConfig,
    ) -> Result<Self, FieldError> {
        let reader = FieldReader::ingest(source, &FieldAliases::winds(), downwind, config)?;
        Ok(Self {
            reader,
            half_life: config.wind_half_life_seconds,
            pre_distress_half_life: config.pre_distress_half_life_seconds,
        })
    }

    pub fn reader(&self) -> &FieldReader {
        &self.reader
    }
}

impl EnvField for WindsField {
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

/// A wind field answering the same sample everywhere.
pub struct ConstantWindsField {
    value: SampleValue,
    half_life: f64,
    pre_distress_half_life: f64,
    summary: OnceLock<String>,
}

impl ConstantWindsField {
    pub fn new(value: SampleValue, config: &SamplerConfig) -> Self {
        Self {
            value,
            half_life: config.wind_half_life_seconds,
            pre_distress_half_life: config.pre_distress_half_life_seconds,
            summary: OnceLock::new(),
        }
    }

    pub fn summary(&self) -> &str {
        self.summary.get_or_init(|| {
            let s = format!(
                "constant wind u={:.3} v={:.3} kn",
                self.value.u, self.value.v
            );
            info!("{s}");
            s
        })
    }
}

impl EnvField for ConstantWindsField {
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
