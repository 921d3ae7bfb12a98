pub mod calc;
pub mod config;
pub mod error;
pub mod fetch;
pub mod field;
pub mod geo;
pub mod grid;
pub mod reader;
pub mod sample;

pub use calc::InterpolationMode;
pub use config::SamplerConfig;
pub use error::FieldError;
pub use fetch::{FetchWindow, RequiredBuffers};
pub use field::{
    sample_batch, ConstantCurrentsField, ConstantWindsField, CurrentsField, EnvField, WindsField,
};
pub use geo::{GeoExtent, GeoPoint};
pub use reader::{FieldAliases, FieldReader};
pub use sample::SampleValue;
