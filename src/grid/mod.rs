//! Grid-point storage and the spatial/riverine indices built at freeze time.

pub mod point;
pub mod point_set;
pub mod river;
pub mod spatial;

pub use point::{classify_strip, GridPoint, RiverSeqLcr, Strip};
pub use point_set::{FrozenSet, GridPointSet};
pub use river::RiverSequenceIndex;
pub use spatial::SpatialIndex;
