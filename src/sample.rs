/// Component order for positional construction: `[U, V, DU, DV, ALT_DU, ALT_DV]`.
pub mod component {
    pub const U: usize = 0;
    pub const V: usize = 1;
    pub const DU: usize = 2;
    pub const DV: usize = 3;
    pub const ALT_DU: usize = 4;
    pub const ALT_DV: usize = 5;
    pub const COUNT: usize = 6;
}

/// One fully-resolved vector estimate: east/north speed plus two pairs of
/// uncertainties, all in knots. Immutable once constructed; components that a
/// source does not provide are `NaN`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleValue {
    /// East speed.
    pub u: f64,
    /// North speed.
    pub v: f64,
    /// East-component uncertainty.
    pub du: f64,
    /// North-component uncertainty.
    pub dv: f64,
    /// Alternate east-component uncertainty.
    pub alt_du: f64,
    /// Alternate north-component uncertainty.
    pub alt_dv: f64,
}

impl SampleValue {
    pub fn new(u: f64, v: f64, du: f64, dv: f64, alt_du: f64, alt_dv: f64) -> Self {
        Self { u, v, du, dv, alt_du, alt_dv }
    }

    /// Builds from a positional array ordered `[U, V, DU, DV, ALT_DU, ALT_DV]`.
    pub fn from_components(c: [f64; component::COUNT]) -> Self {
        Self {
            u: c[component::U],
            v: c[component::V],
            du: c[component::DU],
            dv: c[component::DV],
            alt_du: c[component::ALT_DU],
            alt_dv: c[component::ALT_DV],
        }
    }

    /// Positional view in the same order accepted by [`from_components`](Self::from_components).
    pub fn components(&self) -> [f64; component::COUNT] {
        [self.u, self.v, self.du, self.dv, self.alt_du, self.alt_dv]
    }

    /// Zero-motion value carrying the configured default uncertainties.
    /// Returned for queries against an empty field.
    pub fn zero_with_uncertainty(du: f64, dv: f64) -> Self {
        Self { u: 0.0, v: 0.0, du, dv, alt_du: du, alt_dv: dv }
    }

    /// A usable estimate has finite speeds and non-negative uncertainties.
    /// `NaN` uncertainties pass: they mean "not provided", not "bad".
    pub fn is_valid(&self) -> bool {
        self.u.is_finite()
            && self.v.is_finite()
            && !(self.du < 0.0)
            && !(self.dv < 0.0)
            && !(self.alt_du < 0.0)
            && !(self.alt_dv < 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positional_round_trip() {
        let s = SampleValue::from_components([1.0, 2.0, 0.1, 0.2, 0.3, 0.4]);
        assert_eq!(s.u, 1.0);
        assert_eq!(s.v, 2.0);
        assert_eq!(s.components(), [1.0, 2.0, 0.1, 0.2, 0.3, 0.4]);
    }

    #[test]
    fn validity_predicate() {
        assert!(SampleValue::new(1.0, -2.0, 0.0, 0.5, 0.5, 0.5).is_valid());
        assert!(!SampleValue::new(f64::NAN, 0.0, 0.5, 0.5, 0.5, 0.5).is_valid());
        assert!(!SampleValue::new(f64::INFINITY, 0.0, 0.5, 0.5, 0.5, 0.5).is_valid());
        assert!(!SampleValue::new(1.0, 0.0, -0.5, 0.5, 0.5, 0.5).is_valid());
        // Absent uncertainties are NaN and still count as valid.
        assert!(SampleValue::new(1.0, 0.0, f64::NAN, f64::NAN, f64::NAN, f64::NAN).is_valid());
    }

    #[test]
    fn zero_value_carries_defaults() {
        let z = SampleValue::zero_with_uncertainty(0.4, 0.6);
        assert_eq!(z.u, 0.0);
        assert_eq!(z.v, 0.0);
        assert_eq!(z.du, 0.4);
        assert_eq!(z.dv, 0.6);
        assert!(z.is_valid());
    }
}
