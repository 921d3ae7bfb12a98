//! Fetch scoping: the time+space window one retrieval attempt covers, its
//! growth/merge arithmetic, and decoding of remote payloads.

pub mod payload;

use log::warn;

use crate::error::FieldError;
use crate::geo::{GeoExtent, GeoPoint};

/// Soft ceiling on a single fetch's time span; exceeding it is a warning,
/// not an error.
pub const SPAN_WARN_SECONDS: i64 = 96 * 3600;

/// Outward growth amounts for the six window bounds, in axis units
/// (seconds for time, degrees for the geographic sides). Produced by
/// `FieldReader::required_buffers` and consumed by [`FetchWindow::grown_by`].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RequiredBuffers {
    pub low_time: f64,
    pub high_time: f64,
    pub left: f64,
    pub bottom: f64,
    pub right: f64,
    pub top: f64,
}

impl RequiredBuffers {
    /// Positional order: low/high time, then left/bottom/right/top.
    pub fn from_array(b: [f64; 6]) -> Self {
        Self {
            low_time: b[0],
            high_time: b[1],
            left: b[2],
            bottom: b[3],
            right: b[4],
            top: b[5],
        }
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::default()
    }
}

/// The time interval and geographic extent of one data fetch attempt.
///
/// Carries an append-only history of escalated retry attempts for
/// diagnostics; the retry log has no bearing on query correctness.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchWindow {
    low_time: i64,
    high_time: i64,
    extent: GeoExtent,
    retries: Vec<FetchWindow>,
    last_url: Option<String>,
}

impl FetchWindow {
    pub fn new(low_time: i64, high_time: i64, extent: GeoExtent) -> Result<Self, FieldError> {
        if low_time > high_time {
            return Err(FieldError::InvalidWindow { low: low_time, high: high_time });
        }
        warn_long_span(low_time, high_time);
        Ok(Self { low_time, high_time, extent, retries: Vec::new(), last_url: None })
    }

    pub fn low_time(&self) -> i64 {
        self.low_time
    }

    pub fn high_time(&self) -> i64 {
        self.high_time
    }

    pub fn extent(&self) -> &GeoExtent {
        &self.extent
    }

    /// Planar volume of the geographic extent.
    pub fn volume(&self) -> f64 {
        self.extent.volume()
    }

    /// Covering union of two windows: time span and geographic bounding
    /// union. Never shrinks either input's coverage. The result starts with
    /// an empty retry history and fires the same advisory-span warning as
    /// direct construction.
    pub fn union(&self, other: &FetchWindow) -> FetchWindow {
        let low_time = self.low_time.min(other.low_time);
        let high_time = self.high_time.max(other.high_time);
        warn_long_span(low_time, high_time);
        FetchWindow {
            low_time,
            high_time,
            extent: self.extent.union(&other.extent),
            retries: Vec::new(),
            last_url: None,
        }
    }

    /// Merge heuristic input: `union.volume / (self.volume + other.volume)`.
    /// Lower means higher overlap. The merge decision itself belongs to the
    /// caller.
    pub fn overlap_ratio(&self, other: &FetchWindow) -> f64 {
        self.union(other).volume() / (self.volume() + other.volume())
    }

    pub fn contains_time(&self, time: i64) -> bool {
        time >= self.low_time && time <= self.high_time
    }

    pub fn contains_extent(&self, extent: &GeoExtent) -> bool {
        self.extent.contains_extent(extent)
    }

    pub fn contains(&self, time: i64, point: &GeoPoint) -> bool {
        self.contains_time(time) && self.extent.contains_point(point)
    }

    /// Whether this window fully covers another (time and extent).
    pub fn contains_window(&self, other: &FetchWindow) -> bool {
        self.low_time <= other.low_time
            && self.high_time >= other.high_time
            && self.contains_extent(&other.extent)
    }

    /// Grows the window outward by the per-bound buffers, rounding each moved
    /// bound outward to the grid increment the buffer implies. Zero buffers
    /// leave the bound untouched.
    pub fn grown_by(&self, buffers: &RequiredBuffers) -> Result<FetchWindow, FieldError> {
        let low = round_out_low(self.low_time as f64 - buffers.low_time, buffers.low_time);
        let high = round_out_high(self.high_time as f64 + buffers.high_time, buffers.high_time);
        let extent = GeoExtent::new(
            round_out_low(self.extent.left - buffers.left, buffers.left),
            round_out_low(self.extent.bottom - buffers.bottom, buffers.bottom),
            round_out_high(self.extent.right + buffers.right, buffers.right),
            round_out_high(self.extent.top + buffers.top, buffers.top),
        );
        FetchWindow::new(low.floor() as i64, high.ceil() as i64, extent)
    }

    /// Pushes an escalated retry attempt onto the history.
    pub fn add_try(&mut self, attempt: FetchWindow) {
        self.retries.push(attempt);
    }

    /// The most recent attempt, or this window itself before any retries.
    pub fn last_try(&self) -> &FetchWindow {
        self.retries.last().unwrap_or(self)
    }

    /// Discards retry history, keeping only the original window. Called on
    /// success so later diagnostics see the attempt that worked.
    pub fn clear_extra_tries(&mut self) {
        self.retries.clear();
    }

    pub fn tries(&self) -> &[FetchWindow] {
        &self.retries
    }

    pub fn set_last_url(&mut self, url: impl Into<String>) {
        self.last_url = Some(url.into());
    }

    pub fn last_url(&self) -> Option<&str> {
        self.last_url.as_deref()
    }
}

fn warn_long_span(low_time: i64, high_time: i64) {
    if high_time - low_time > SPAN_WARN_SECONDS {
        warn!(
            "fetch window spans {:.1} h, more than the {} h advisory limit",
            (high_time - low_time) as f64 / 3600.0,
            SPAN_WARN_SECONDS / 3600
        );
    }
}

fn round_out_low(value: f64, increment: f64) -> f64 {
    if increment > 0.0 {
        (value / increment).floor() * increment
    } else {
        value
    }
}

fn round_out_high(value: f64, increment: f64) -> f64 {
    if increment > 0.0 {
        (value / increment).ceil() * increment
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window(low: i64, high: i64, extent: GeoExtent) -> FetchWindow {
        FetchWindow::new(low, high, extent).unwrap()
    }

    #[test]
    fn rejects_inverted_time() {
        let e = GeoExtent::new(0.0, 0.0, 1.0, 1.0);
        assert!(FetchWindow::new(10, 5, e).is_err());
    }

    #[test]
    fn union_contains_both_inputs() {
        let a = window(0, 100, GeoExtent::new(-1.0, 50.0, 2.0, 52.0));
        let b = window(50, 300, GeoExtent::new(0.5, 49.0, 4.0, 51.0));
        let u = a.union(&b);
        assert!(u.contains_window(&a));
        assert!(u.contains_window(&b));
        assert_eq!(u.low_time(), 0);
        assert_eq!(u.high_time(), 300);
    }

    #[test]
    fn overlap_ratio_orders_merge_candidates() {
        let base = window(0, 100, GeoExtent::new(0.0, 0.0, 2.0, 2.0));
        let near = window(0, 100, GeoExtent::new(0.5, 0.5, 2.5, 2.5));
        let far = window(0, 100, GeoExtent::new(10.0, 10.0, 12.0, 12.0));
        assert!(base.overlap_ratio(&near) < base.overlap_ratio(&far));
    }

    #[test]
    fn union_past_advisory_span_still_covers() {
        // Each input is short; their union crosses the 96 h advisory limit
        // and goes through the same span check as direct construction.
        let e = GeoExtent::new(0.0, 0.0, 1.0, 1.0);
        let a = window(0, 3600, e);
        let b = window(SPAN_WARN_SECONDS + 7200, SPAN_WARN_SECONDS + 10_800, e);
        let u = a.union(&b);
        assert!(u.contains_window(&a));
        assert!(u.contains_window(&b));
        assert!(u.high_time() - u.low_time() > SPAN_WARN_SECONDS);
    }

    #[test]
    fn contains_checks_are_inclusive() {
        let w = window(0, 100, GeoExtent::new(0.0, 0.0, 2.0, 2.0));
        assert!(w.contains_time(0));
        assert!(w.contains_time(100));
        assert!(!w.contains_time(101));
        assert!(w.contains(50, &GeoPoint::new(1.0, 1.0)));
        assert!(!w.contains(50, &GeoPoint::new(3.0, 1.0)));
    }

    #[test]
    fn retry_stack_lifecycle() {
        let mut w = window(0, 100, GeoExtent::new(0.0, 0.0, 1.0, 1.0));
        assert_eq!(w.last_try().low_time(), 0);

        let bigger = window(-100, 200, GeoExtent::new(-1.0, -1.0, 2.0, 2.0));
        w.add_try(bigger.clone());
        assert_eq!(w.last_try(), &bigger);
        assert_eq!(w.tries().len(), 1);

        w.clear_extra_tries();
        assert!(w.tries().is_empty());
        assert_eq!(w.last_try().low_time(), 0);
    }

    #[test]
    fn grown_by_rounds_outward() {
        let w = window(95, 100, GeoExtent::new(0.05, 0.05, 0.95, 0.95));
        let buffers = RequiredBuffers {
            low_time: 60.0,
            high_time: 60.0,
            left: 0.1,
            bottom: 0.1,
            right: 0.1,
            top: 0.1,
        };
        let g = w.grown_by(&buffers).unwrap();
        // 95 - 60 = 35, floored to the 60 s increment -> 0.
        assert_eq!(g.low_time(), 0);
        // 100 + 60 = 160, ceiled to the 60 s increment -> 180.
        assert_eq!(g.high_time(), 180);
        assert!(g.extent().left <= -0.05);
        assert!(g.extent().right >= 1.05);
        assert!(g.contains_window(&w));
    }

    #[test]
    fn grown_by_zero_buffers_is_identity() {
        let w = window(0, 100, GeoExtent::new(0.0, 0.0, 1.0, 1.0));
        let g = w.grown_by(&RequiredBuffers::default()).unwrap();
        assert_eq!(g.low_time(), 0);
        assert_eq!(g.high_time(), 100);
        assert_eq!(g.extent(), w.extent());
    }
}
