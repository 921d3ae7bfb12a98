use super::GeoPoint;

/// Maps geographic points onto a locally flat plane for nearest-neighbor
/// search.
///
/// Longitudes are measured as degrees going east from a reference meridian,
/// always in `[0, 360)`, so distance ordering is unaffected by where the point
/// cluster sits relative to the antimeridian. The east axis is scaled by
/// `cos(mid_latitude)` to keep east/north degrees comparable.
#[derive(Debug, Clone, Copy)]
pub struct GeoProjection {
    left_lng: f64,
    cos_mid_lat: f64,
}

impl GeoProjection {
    pub fn new(left_lng: f64, mid_lat: f64) -> Self {
        Self {
            left_lng,
            cos_mid_lat: mid_lat.to_radians().cos(),
        }
    }

    /// Degrees going east from `left_lng` to `lng`, in `[0, 360)`.
    pub fn eastward_degrees(left_lng: f64, lng: f64) -> f64 {
        let mut d = (lng - left_lng) % 360.0;
        if d < 0.0 {
            d += 360.0;
        }
        d
    }

    /// Projects to `(x, y)` plane coordinates in scaled degrees.
    pub fn project(&self, point: &GeoPoint) -> (f64, f64) {
        let x = Self::eastward_degrees(self.left_lng, point.lng()) * self.cos_mid_lat;
        (x, point.lat())
    }

    /// Squared planar distance between two points.
    pub fn distance_sq(&self, a: &GeoPoint, b: &GeoPoint) -> f64 {
        let (ax, ay) = self.project(a);
        let (bx, by) = self.project(b);
        let dx = ax - bx;
        let dy = ay - by;
        dx * dx + dy * dy
    }
}
