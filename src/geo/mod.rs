//! Geographic primitives: lattice-keyed points, bounding extents, and the
//! local projection used for nearest-neighbor search.

mod projection;

pub use projection::GeoProjection;

/// Rounding lattice for point identity (degrees). Two raw coordinates that
/// round to the same lattice cell are the same grid location.
pub const COORD_LATTICE_DEG: f64 = 1.0e-5;

// Rounding goes through the inverse multiplier: 1e5 is exactly representable
// where 1e-5 is not, so coordinates already on the lattice survive unchanged.
const LATTICE_CELLS_PER_DEG: f64 = 1.0e5;

/// A geographic point keyed to the coordinate lattice.
///
/// Equality and hashing go through the rounded lattice coordinates, so points
/// ingested from slightly noisy sources compare equal when they describe the
/// same grid location.
#[derive(Debug, Clone, Copy)]
pub struct GeoPoint {
    lat: f64,
    lng: f64,
}

impl GeoPoint {
    /// Creates a point, rounding both coordinates to the lattice.
    pub fn new(lat: f64, lng: f64) -> Self {
        Self {
            lat: round_to_lattice(lat),
            lng: round_to_lattice(lng),
        }
    }

    pub fn lat(&self) -> f64 {
        self.lat
    }

    pub fn lng(&self) -> f64 {
        self.lng
    }

    fn lattice_key(&self) -> (i64, i64) {
        (
            (self.lat * LATTICE_CELLS_PER_DEG).round() as i64,
            (self.lng * LATTICE_CELLS_PER_DEG).round() as i64,
        )
    }
}

impl PartialEq for GeoPoint {
    fn eq(&self, other: &Self) -> bool {
        self.lattice_key() == other.lattice_key()
    }
}

impl Eq for GeoPoint {}

impl std::hash::Hash for GeoPoint {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.lattice_key().hash(state);
    }
}

impl std::fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.5}, {:.5})", self.lat, self.lng)
    }
}

fn round_to_lattice(deg: f64) -> f64 {
    (deg * LATTICE_CELLS_PER_DEG).round() / LATTICE_CELLS_PER_DEG
}

/// Axis-aligned geographic bounding box. `left`/`right` are longitudes,
/// `bottom`/`top` latitudes, all bounds inclusive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoExtent {
    pub left: f64,
    pub bottom: f64,
    pub right: f64,
    pub top: f64,
}

impl GeoExtent {
    pub fn new(left: f64, bottom: f64, right: f64, top: f64) -> Self {
        Self { left, bottom, right, top }
    }

    /// Degenerate extent covering a single point.
    pub fn around(point: &GeoPoint) -> Self {
        Self {
            left: point.lng(),
            bottom: point.lat(),
            right: point.lng(),
            top: point.lat(),
        }
    }

    pub fn lng_range(&self) -> f64 {
        self.right - self.left
    }

    pub fn lat_range(&self) -> f64 {
        self.top - self.bottom
    }

    /// Planar "volume" used by the fetch-merge heuristic.
    pub fn volume(&self) -> f64 {
        self.lng_range() * self.lat_range()
    }

    /// Bounding union; never shrinks either input.
    pub fn union(&self, other: &GeoExtent) -> GeoExtent {
        GeoExtent {
            left: self.left.min(other.left),
            bottom: self.bottom.min(other.bottom),
            right: self.right.max(other.right),
            top: self.top.max(other.top),
        }
    }

    pub fn contains_point(&self, point: &GeoPoint) -> bool {
        point.lng() >= self.left
            && point.lng() <= self.right
            && point.lat() >= self.bottom
            && point.lat() <= self.top
    }

    pub fn contains_extent(&self, other: &GeoExtent) -> bool {
        other.left >= self.left
            && other.right <= self.right
            && other.bottom >= self.bottom
            && other.top <= self.top
    }

}
