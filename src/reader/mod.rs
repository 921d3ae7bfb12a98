//! `FieldReader`: ingestion of one gridded source into a queryable point set,
//! and the public time-then-space interpolation query.

pub mod memory;
#[cfg(feature = "netcdf")]
pub mod netcdf_source;
pub mod source;
pub mod units;

use std::sync::atomic::{AtomicBool, Ordering};

use chrono::NaiveDateTime;
use log::warn;

use crate::calc::{
    interp_component, InterpolationMode, RiverineUvCalculator, StandardUvCalculator, UvCalculator,
};
use crate::config::SamplerConfig;
use crate::error::FieldError;
use crate::fetch::{FetchWindow, RequiredBuffers};
use crate::geo::GeoPoint;
use crate::grid::point::{classify_strip, GridPoint, RiverSeqLcr};
use crate::grid::point_set::{FrozenSet, GridPointSet};
use crate::reader::source::GridSource;
use crate::reader::units::speed_unit_factor;
use crate::sample::SampleValue;

const TIME_DIM_CANDIDATES: &[&str] = &["time", "t", "ntime", "record"];
const CELL_DIM_CANDIDATES: &[&str] = &["cell", "point", "node", "station", "ncells", "npoints"];
const LAT_CANDIDATES: &[&str] = &["lat", "latitude", "y"];
const LNG_CANDIDATES: &[&str] = &["lon", "lng", "longitude", "x"];
const RIVER_ID_CANDIDATES: &[&str] = &["river_id", "riverid", "river"];
const RIVER_SEQ_CANDIDATES: &[&str] = &["river_seq", "seq", "sequence"];
const RIVER_LCR_CANDIDATES: &[&str] = &["river_lcr", "lcr", "strip"];

/// Ordered variable-name alias lists for each semantic field. First name
/// present in the source wins.
#[derive(Debug, Clone)]
pub struct FieldAliases {
    pub east: Vec<String>,
    pub north: Vec<String>,
    pub speed: Vec<String>,
    pub direction: Vec<String>,
    pub du: Vec<String>,
    pub dv: Vec<String>,
    pub alt_du: Vec<String>,
    pub alt_dv: Vec<String>,
}

impl FieldAliases {
    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    /// Alias table for ocean-current sources.
    pub fn currents() -> Self {
        Self {
            east: Self::names(&["u", "ucur", "water_u", "eastward_velocity"]),
            north: Self::names(&["v", "vcur", "water_v", "northward_velocity"]),
            speed: Self::names(&["speed", "current_speed", "spd"]),
            direction: Self::names(&["direction", "current_direction", "dir"]),
            du: Self::names(&["du", "u_error", "u_uncertainty"]),
            dv: Self::names(&["dv", "v_error", "v_uncertainty"]),
            alt_du: Self::names(&["alt_du", "u_error_alt"]),
            alt_dv: Self::names(&["alt_dv", "v_error_alt"]),
        }
    }

    /// Alias table for wind sources.
    pub fn winds() -> Self {
        Self {
            east: Self::names(&["u", "uwnd", "wind_u", "eastward_wind"]),
            north: Self::names(&["v", "vwnd", "wind_v", "northward_wind"]),
            speed: Self::names(&["speed", "wind_speed", "spd"]),
            direction: Self::names(&["direction", "wind_direction", "dir"]),
            du: Self::names(&["du", "u_error", "u_uncertainty"]),
            dv: Self::names(&["dv", "v_error", "v_uncertainty"]),
            alt_du: Self::names(&["alt_du", "u_error_alt"]),
            alt_dv: Self::names(&["alt_dv", "v_error_alt"]),
        }
    }
}

/// One ingested source: the shared time axis plus the frozen-on-first-query
/// point set. Immutable after construction; queries are lock-free once the
/// set has frozen.
pub struct FieldReader {
    time_axis: Vec<i64>,
    points: GridPointSet,
    view_names: Vec<String>,
    default_du: f64,
    default_dv: f64,
    time_step: i64,
    lat_step: f64,
    lng_step: f64,
    warned_before: AtomicBool,
    warned_after: AtomicBool,
    warned_riverine: AtomicBool,
}

impl FieldReader {
    /// Ingests one source per the construction contract: time axis, unique
    /// lattice-rounded locations, direct or polar velocity resolution, unit
    /// conversion, sentinel fill, and no-data point removal. Any structural
    /// problem fails the whole construction.
    pub fn ingest(
        source: &dyn GridSource,
        aliases: &FieldAliases,
        downstream: bool,
        config: &SamplerConfig,
    ) -> Result<Self, FieldError> {
        let time_axis = read_time_axis(source)?;

        let _cell_dim = resolve_dimension(source, CELL_DIM_CANDIDATES).ok_or_else(|| {
            FieldError::MissingCellDimension(to_strings(CELL_DIM_CANDIDATES))
        })?;

        let lat_var = resolve_candidate(source, LAT_CANDIDATES).ok_or_else(|| {
            FieldError::MissingVariable { role: "latitude", tried: to_strings(LAT_CANDIDATES) }
        })?;
        let lng_var = resolve_candidate(source, LNG_CANDIDATES).ok_or_else(|| {
            FieldError::MissingVariable { role: "longitude", tried: to_strings(LNG_CANDIDATES) }
        })?;
        let lats = source.read_1d(&lat_var)?;
        let lngs = source.read_1d(&lng_var)?;
        let npoints = lats.len().min(lngs.len());

        let river_meta = read_river_metadata(source, npoints)?;

        let mut view_names = vec![lat_var, lng_var];

        // Velocity components: direct east/north, else polar speed+direction.
        let (u_cols, v_cols) = read_velocity(source, aliases, downstream, config, &mut view_names)?;

        let du_cols = read_optional(source, &aliases.du, config, &mut view_names)?;
        let dv_cols = read_optional(source, &aliases.dv, config, &mut view_names)?;
        let alt_du_cols = read_optional(source, &aliases.alt_du, config, &mut view_names)?;
        let alt_dv_cols = read_optional(source, &aliases.alt_dv, config, &mut view_names)?;

        let points = GridPointSet::new();
        let mut dropped = 0usize;
        let npoints = npoints.min(u_cols.len()).min(v_cols.len());
        for i in 0..npoints {
            let location = GeoPoint::new(lats[i], lngs[i]);
            // A point with no valid velocity reading at all carries no data.
            let (u, v) = match (fill_series(&u_cols[i]), fill_series(&v_cols[i])) {
                (Some(u), Some(v)) => (u, v),
                _ => {
                    dropped += 1;
                    continue;
                }
            };
            let river = river_meta.as_ref().and_then(|m| m[i]);
            points.add(GridPoint::from_series(
                location,
                u,
                v,
                fill_optional(&du_cols, i),
                fill_optional(&dv_cols, i),
                fill_optional(&alt_du_cols, i),
                fill_optional(&alt_dv_cols, i),
                river,
            ));
        }
        if dropped > 0 {
            warn!(
                "{}: dropped {dropped} of {npoints} points with no valid data",
                source.description()
            );
        }

        let (time_step, lat_step, lng_step) = grid_spacing(&time_axis, &lats, &lngs);

        Ok(Self {
            time_axis,
            points,
            view_names,
            default_du: config.default_du,
            default_dv: config.default_dv,
            time_step,
            lat_step,
            lng_step,
            warned_before: AtomicBool::new(false),
            warned_after: AtomicBool::new(false),
            warned_riverine: AtomicBool::new(false),
        })
    }

    /// Interpolated sample at `(time, location)` under the given mode.
    ///
    /// Time is interpolated between the two bracketing axis entries after the
    /// spatial interpolation at each; out-of-range times clamp to the axis
    /// with a once-per-direction warning. An empty set answers a zero vector
    /// with the configured default uncertainties, never an error.
    pub fn sample(
        &self,
        time: i64,
        location: &GeoPoint,
        mode: InterpolationMode,
    ) -> SampleValue {
        let frozen = match self.points.frozen() {
            Some(f) if !f.is_empty() => f,
            _ => return SampleValue::zero_with_uncertainty(self.default_du, self.default_dv),
        };

        let time = self.clamp_time(time);
        let calc = self.select_calculator(&frozen, location, mode);

        match self.time_axis.binary_search(&time) {
            Ok(idx) => calc.value_at(idx),
            Err(pos) => {
                let i1 = pos.clamp(1, self.time_axis.len() - 1);
                let i0 = i1 - 1;
                let (t0, t1) = (self.time_axis[i0], self.time_axis[i1]);
                let s0 = calc.value_at(i0).components();
                let s1 = calc.value_at(i1).components();
                let mut out = [0.0f64; 6];
                for (o, (&y0, &y1)) in out.iter_mut().zip(s0.iter().zip(&s1)) {
                    *o = interp_component(t0, t1, y0, y1, time);
                }
                SampleValue::from_components(out)
            }
        }
    }

    fn clamp_time(&self, time: i64) -> i64 {
        let first = match self.time_axis.first() {
            Some(&t) => t,
            None => return time,
        };
        let last = self.time_axis[self.time_axis.len() - 1];
        if time < first {
            if !self.warned_before.swap(true, Ordering::Relaxed) {
                warn!("query time {time} before available window, clamping to {first}");
            }
            first
        } else if time > last {
            if !self.warned_after.swap(true, Ordering::Relaxed) {
                warn!("query time {time} after available window, clamping to {last}");
            }
            last
        } else {
            time
        }
    }

    fn select_calculator<'a>(
        &self,
        frozen: &'a FrozenSet,
        location: &GeoPoint,
        mode: InterpolationMode,
    ) -> UvCalculator<'a> {
        if mode.is_riverine() {
            if let Some(calc) = RiverineUvCalculator::select(frozen, location, mode) {
                return UvCalculator::Riverine(calc);
            }
            if !self.warned_riverine.swap(true, Ordering::Relaxed) {
                warn!(
                    "{} requested without river sequence metadata, using 2-closest",
                    mode.token()
                );
            }
        }
        UvCalculator::Standard(StandardUvCalculator::select(
            frozen,
            location,
            mode.neighbor_count(),
        ))
    }

    /// Minimal outward growth per window bound so that this reader's grid
    /// covers the need past its second gridline, guarding against
    /// edge-of-grid interpolation artifacts. Axes with no usable spacing
    /// contribute zero.
    pub fn required_buffers(&self, need: &FetchWindow) -> RequiredBuffers {
        let (t_min, t_max) = match (self.time_axis.first(), self.time_axis.last()) {
            (Some(&a), Some(&b)) => (a as f64, b as f64),
            _ => return RequiredBuffers::default(),
        };
        let frozen = self.points.frozen();
        let (lng_min, lng_max, lat_min, lat_max) = match frozen.as_deref() {
            Some(f) if !f.is_empty() => coverage(f),
            _ => return RequiredBuffers::default(),
        };
        let ts = self.time_step as f64;
        let extent = need.extent();
        RequiredBuffers {
            low_time: axis_buffer_low(need.low_time() as f64, t_min, ts),
            high_time: axis_buffer_high(need.high_time() as f64, t_max, ts),
            left: axis_buffer_low(extent.left, lng_min, self.lng_step),
            bottom: axis_buffer_low(extent.bottom, lat_min, self.lat_step),
            right: axis_buffer_high(extent.right, lng_max, self.lng_step),
            top: axis_buffer_high(extent.top, lat_max, self.lat_step),
        }
    }

    pub fn time_axis(&self) -> &[i64] {
        &self.time_axis
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Number of retained grid points (after duplicate and no-data drops).
    pub fn point_count(&self) -> usize {
        self.points.len()
    }

    pub fn view_names(&self) -> &[String] {
        &self.view_names
    }

    /// Drops the point set and its indices. Idempotent; later queries answer
    /// the empty-set zero vector.
    pub fn free_memory(&self) {
        self.points.free_memory();
    }
}

fn to_strings(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

fn resolve_dimension(source: &dyn GridSource, candidates: &[&str]) -> Option<String> {
    candidates
        .iter()
        .find(|name| source.has_dimension(name))
        .map(|s| s.to_string())
}

fn resolve_candidate(source: &dyn GridSource, candidates: &[&str]) -> Option<String> {
    candidates
        .iter()
        .find(|name| source.has_variable(name))
        .map(|s| s.to_string())
}

fn resolve_alias(source: &dyn GridSource, aliases: &[String]) -> Option<String> {
    aliases
        .iter()
        .find(|name| source.has_variable(name))
        .cloned()
}

/// Resolves and reads the time axis as epoch seconds.
///
/// The axis variable may carry a CF-style `"<unit> since <datetime>"` units
/// attribute; without one the values are taken as epoch seconds directly.
fn read_time_axis(source: &dyn GridSource) -> Result<Vec<i64>, FieldError> {
    resolve_dimension(source, TIME_DIM_CANDIDATES)
        .ok_or_else(|| FieldError::MissingTimeDimension(to_strings(TIME_DIM_CANDIDATES)))?;
    let time_var = resolve_candidate(source, TIME_DIM_CANDIDATES)
        .ok_or_else(|| FieldError::MissingTimeDimension(to_strings(TIME_DIM_CANDIDATES)))?;
    let raw = source.read_1d(&time_var)?;

    let (scale, epoch) = match source.variable_attr(&time_var, "units")? {
        Some(attr) => match attr.as_str() {
            Some(units) => parse_time_units(units)?,
            None => (1.0, 0),
        },
        None => (1.0, 0),
    };

    let axis: Vec<i64> = raw
        .iter()
        .map(|&v| epoch + (v * scale).round() as i64)
        .collect();
    if axis.is_empty() {
        return Err(FieldError::EmptyTimeAxis);
    }
    for i in 1..axis.len() {
        if axis[i] <= axis[i - 1] {
            return Err(FieldError::NonAscendingTime(i));
        }
    }
    Ok(axis)
}

/// Parses `"<unit> since <datetime>"` into (seconds per unit, epoch offset).
fn parse_time_units(units: &str) -> Result<(f64, i64), FieldError> {
    let mut parts = units.splitn(2, " since ");
    let unit = parts.next().unwrap_or("").trim().to_ascii_lowercase();
    let origin = parts
        .next()
        .ok_or_else(|| FieldError::BadTimeUnits(units.to_string()))?
        .trim();

    let scale = match unit.as_str() {
        "second" | "seconds" | "s" => 1.0,
        "minute" | "minutes" | "min" => 60.0,
        "hour" | "hours" | "h" => 3600.0,
        "day" | "days" | "d" => 86_400.0,
        _ => return Err(FieldError::BadTimeUnits(units.to_string())),
    };

    let origin = origin.trim_end_matches(" UTC").trim_end_matches('Z');
    let parsed = NaiveDateTime::parse_from_str(origin, "%Y-%m-%d %H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(origin, "%Y-%m-%dT%H:%M:%S"))
        .or_else(|_| NaiveDateTime::parse_from_str(origin, "%Y-%m-%d %H:%M"))
        .or_else(|_| {
            NaiveDateTime::parse_from_str(&format!("{origin} 00:00:00"), "%Y-%m-%d %H:%M:%S")
        })
        .map_err(|_| FieldError::BadTimeUnits(units.to_string()))?;
    Ok((scale, parsed.and_utc().timestamp()))
}

/// Per-point river metadata, if the source carries all three variables and
/// the strip code is recognized.
fn read_river_metadata(
    source: &dyn GridSource,
    npoints: usize,
) -> Result<Option<Vec<Option<RiverSeqLcr>>>, FieldError> {
    let id_var = resolve_candidate(source, RIVER_ID_CANDIDATES);
    let seq_var = resolve_candidate(source, RIVER_SEQ_CANDIDATES);
    let lcr_var = resolve_candidate(source, RIVER_LCR_CANDIDATES);
    let (id_var, seq_var, lcr_var) = match (id_var, seq_var, lcr_var) {
        (Some(a), Some(b), Some(c)) => (a, b, c),
        _ => return Ok(None),
    };
    let ids = source.read_1d(&id_var)?;
    let seqs = source.read_1d(&seq_var)?;
    let lcrs = source.read_1d(&lcr_var)?;

    let meta = (0..npoints)
        .map(|i| {
            let strip = classify_strip(*lcrs.get(i)? as i64)?;
            Some(RiverSeqLcr {
                river_id: *ids.get(i)? as i64,
                seq: *seqs.get(i)? as i64,
                strip,
            })
        })
        .collect();
    Ok(Some(meta))
}

type Columns = Vec<Vec<f64>>;

/// Reads one data variable into per-point raw columns, applying unit
/// conversion and mapping the variable's sentinel to NaN.
fn read_columns(
    source: &dyn GridSource,
    var: &str,
    config: &SamplerConfig,
    convert_units: bool,
) -> Result<Columns, FieldError> {
    let sentinel = match source.variable_attr(var, "missing_value")? {
        Some(attr) => attr.as_f64().unwrap_or(config.default_sentinel),
        None => config.default_sentinel,
    };
    let factor = if convert_units {
        match source.variable_attr(var, "units")? {
            Some(attr) => match attr.as_str() {
                Some(units) => speed_unit_factor(units)?,
                None => 1.0,
            },
            None => 1.0,
        }
    } else {
        1.0
    };

    let data = source.read_2d(var)?;
    let (ntimes, npoints) = data.dim();
    let mut cols = vec![Vec::with_capacity(ntimes); npoints];
    for t in 0..ntimes {
        for (p, col) in cols.iter_mut().enumerate() {
            let raw = data[[t, p]];
            if raw == sentinel || !raw.is_finite() {
                col.push(f64::NAN);
            } else {
                col.push(raw * factor);
            }
        }
    }
    Ok(cols)
}

/// East/north velocity columns: direct component variables when present,
/// otherwise derived from polar speed+direction. `downstream` false means the
/// source reports the "coming-from" convention and both components flip sign.
fn read_velocity(
    source: &dyn GridSource,
    aliases: &FieldAliases,
    downstream: bool,
    config: &SamplerConfig,
    view_names: &mut Vec<String>,
) -> Result<(Columns, Columns), FieldError> {
    let sign = if downstream { 1.0 } else { -1.0 };

    if let (Some(u_var), Some(v_var)) = (
        resolve_alias(source, &aliases.east),
        resolve_alias(source, &aliases.north),
    ) {
        let mut u = read_columns(source, &u_var, config, true)?;
        let mut v = read_columns(source, &v_var, config, true)?;
        if sign < 0.0 {
            for col in u.iter_mut().chain(v.iter_mut()) {
                for x in col {
                    *x = -*x;
                }
            }
        }
        view_names.push(u_var);
        view_names.push(v_var);
        return Ok((u, v));
    }

    let speed_var = resolve_alias(source, &aliases.speed).ok_or_else(|| {
        FieldError::MissingVariable { role: "east component or speed", tried: aliases.east.clone() }
    })?;
    let dir_var = resolve_alias(source, &aliases.direction).ok_or_else(|| {
        FieldError::MissingVariable { role: "direction", tried: aliases.direction.clone() }
    })?;
    let speeds = read_columns(source, &speed_var, config, true)?;
    let dirs = read_columns(source, &dir_var, config, false)?;

    let mut u = Vec::with_capacity(speeds.len());
    let mut v = Vec::with_capacity(speeds.len());
    for (s_col, d_col) in speeds.iter().zip(&dirs) {
        let mut u_col = Vec::with_capacity(s_col.len());
        let mut v_col = Vec::with_capacity(s_col.len());
        for (&s, &d) in s_col.iter().zip(d_col) {
            if s.is_nan() || d.is_nan() {
                u_col.push(f64::NAN);
                v_col.push(f64::NAN);
            } else {
                let theta = (90.0 - d).to_radians();
                u_col.push(sign * s * theta.cos());
                v_col.push(sign * s * theta.sin());
            }
        }
        u.push(u_col);
        v.push(v_col);
    }
    view_names.push(speed_var);
    view_names.push(dir_var);
    Ok((u, v))
}

fn read_optional(
    source: &dyn GridSource,
    aliases: &[String],
    config: &SamplerConfig,
    view_names: &mut Vec<String>,
) -> Result<Option<Columns>, FieldError> {
    match resolve_alias(source, aliases) {
        Some(var) => {
            let cols = read_columns(source, &var, config, true)?;
            view_names.push(var);
            Ok(Some(cols))
        }
        None => Ok(None),
    }
}

/// Forward/backward fill over a raw column with sentinels already mapped to
/// NaN. The first valid reading back-fills to time zero; later gaps repeat
/// the previous valid reading. A column with no valid reading returns `None`.
fn fill_series(raw: &[f64]) -> Option<Vec<f64>> {
    let first_valid = raw.iter().position(|v| !v.is_nan())?;
    let mut out = Vec::with_capacity(raw.len());
    let mut last = raw[first_valid];
    for (i, &v) in raw.iter().enumerate() {
        if i < first_valid || v.is_nan() {
            out.push(last);
        } else {
            last = v;
            out.push(v);
        }
    }
    Some(out)
}

/// Fill for optional uncertainty components: a point with no valid reading
/// keeps the component as all-NaN rather than being dropped.
fn fill_optional(cols: &Option<Columns>, point: usize) -> Option<Vec<f64>> {
    let col = &cols.as_ref()?[point];
    Some(fill_series(col).unwrap_or_else(|| vec![f64::NAN; col.len()]))
}

fn grid_spacing(time_axis: &[i64], lats: &[f64], lngs: &[f64]) -> (i64, f64, f64) {
    let time_step = if time_axis.len() >= 2 {
        time_axis[1] - time_axis[0]
    } else {
        0
    };
    (time_step, min_positive_gap(lats), min_positive_gap(lngs))
}

fn min_positive_gap(values: &[f64]) -> f64 {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    sorted.sort_by(f64::total_cmp);
    let gap = sorted
        .windows(2)
        .map(|w| w[1] - w[0])
        .filter(|&gap| gap > 1e-12)
        .fold(f64::INFINITY, f64::min);
    if gap.is_finite() {
        gap
    } else {
        0.0
    }
}

fn coverage(frozen: &FrozenSet) -> (f64, f64, f64, f64) {
    let mut lng_min = f64::INFINITY;
    let mut lng_max = f64::NEG_INFINITY;
    let mut lat_min = f64::INFINITY;
    let mut lat_max = f64::NEG_INFINITY;
    for p in frozen.points() {
        let loc = p.location();
        lng_min = lng_min.min(loc.lng());
        lng_max = lng_max.max(loc.lng());
        lat_min = lat_min.min(loc.lat());
        lat_max = lat_max.max(loc.lat());
    }
    (lng_min, lng_max, lat_min, lat_max)
}

/// Buffer for the low side of one axis: zero once the need sits past the
/// first interior gridline, one spacing inside the first gap, and a
/// rounded-up multiple of the spacing beyond the grid edge.
fn axis_buffer_low(need: f64, axis_min: f64, step: f64) -> f64 {
    if step <= 0.0 {
        return 0.0;
    }
    if need >= axis_min + step {
        0.0
    } else if need >= axis_min {
        step
    } else {
        (((axis_min - need) / step).ceil() + 1.0) * step
    }
}

fn axis_buffer_high(need: f64, axis_max: f64, step: f64) -> f64 {
    if step <= 0.0 {
        return 0.0;
    }
    if need <= axis_max - step {
        0.0
    } else if need <= axis_max {
        step
    } else {
        (((need - axis_max) / step).ceil() + 1.0) * step
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::GeoExtent;
    use crate::reader::memory::MemorySource;
    use crate::reader::source::AttrValue;

    fn single_point_source(u: Vec<f64>, v: Vec<f64>) -> MemorySource {
        let n = u.len();
        MemorySource::new("single")
            .with_dimension("time", n)
            .with_dimension("cell", 1)
            .with_1d("time", (0..n).map(|i| (i * 100) as f64).collect())
            .with_1d("lat", vec![60.0])
            .with_1d("lon", vec![5.0])
            .with_2d("u", u.into_iter().map(|x| vec![x]).collect())
            .with_2d("v", v.into_iter().map(|x| vec![x]).collect())
    }

    fn reader(source: &MemorySource) -> FieldReader {
        FieldReader::ingest(source, &FieldAliases::currents(), true, &SamplerConfig::default())
            .unwrap()
    }

    #[test]
    fn midpoint_time_interpolation() {
        let src = single_point_source(vec![1.0, 3.0, 5.0], vec![0.0, 0.0, 0.0]);
        let r = reader(&src);
        assert_eq!(r.time_axis(), &[0, 100, 200]);
        let s = r.sample(50, &GeoPoint::new(60.0, 5.0), InterpolationMode::TwoClosest);
        assert!((s.u - 2.0).abs() < 1e-12);
    }

    #[test]
    fn exact_hit_skips_interpolation() {
        let src = single_point_source(vec![1.0, 3.0, 5.0], vec![0.0, 0.0, 0.0]);
        let r = reader(&src);
        let s = r.sample(100, &GeoPoint::new(60.0, 5.0), InterpolationMode::TwoClosest);
        assert_eq!(s.u, 3.0);
    }

    #[test]
    fn out_of_range_time_clamps() {
        let src = single_point_source(vec![1.0, 3.0, 5.0], vec![0.0, 0.0, 0.0]);
        let r = reader(&src);
        let q = GeoPoint::new(60.0, 5.0);
        assert_eq!(r.sample(-10, &q, InterpolationMode::TwoClosest).u, 1.0);
        assert_eq!(r.sample(999, &q, InterpolationMode::TwoClosest).u, 5.0);
        // Latches are set after the first clamp in each direction.
        assert!(r.warned_before.load(Ordering::Relaxed));
        assert!(r.warned_after.load(Ordering::Relaxed));
    }

    #[test]
    fn missing_time_dimension_fails() {
        let src = MemorySource::new("no-time")
            .with_dimension("cell", 1)
            .with_1d("lat", vec![60.0])
            .with_1d("lon", vec![5.0]);
        let err = FieldReader::ingest(
            &src,
            &FieldAliases::currents(),
            true,
            &SamplerConfig::default(),
        );
        assert!(matches!(err, Err(FieldError::MissingTimeDimension(_))));
    }

    #[test]
    fn empty_time_axis_fails() {
        let src = MemorySource::new("empty-time")
            .with_dimension("time", 0)
            .with_dimension("cell", 1)
            .with_1d("time", vec![])
            .with_1d("lat", vec![60.0])
            .with_1d("lon", vec![5.0])
            .with_2d("u", vec![vec![1.0]])
            .with_2d("v", vec![vec![0.0]]);
        let err = FieldReader::ingest(
            &src,
            &FieldAliases::currents(),
            true,
            &SamplerConfig::default(),
        );
        assert!(matches!(err, Err(FieldError::EmptyTimeAxis)));
    }

    #[test]
    fn non_ascending_time_fails() {
        let src = MemorySource::new("bad-time")
            .with_dimension("time", 2)
            .with_dimension("cell", 1)
            .with_1d("time", vec![100.0, 100.0])
            .with_1d("lat", vec![60.0])
            .with_1d("lon", vec![5.0])
            .with_2d("u", vec![vec![1.0], vec![1.0]])
            .with_2d("v", vec![vec![0.0], vec![0.0]]);
        let err = FieldReader::ingest(
            &src,
            &FieldAliases::currents(),
            true,
            &SamplerConfig::default(),
        );
        assert!(matches!(err, Err(FieldError::NonAscendingTime(1))));
    }

    #[test]
    fn cf_time_units_are_resolved() {
        let src = MemorySource::new("cf")
            .with_dimension("time", 2)
            .with_dimension("cell", 1)
            .with_1d("time", vec![0.0, 1.0])
            .with_attr("time", "units", AttrValue::Text("hours since 1970-01-01 00:00:00".into()))
            .with_1d("lat", vec![60.0])
            .with_1d("lon", vec![5.0])
            .with_2d("u", vec![vec![1.0], vec![2.0]])
            .with_2d("v", vec![vec![0.0], vec![0.0]]);
        let r = reader(&src);
        assert_eq!(r.time_axis(), &[0, 3600]);
    }

    #[test]
    fn sentinel_fill_holds_last_valid() {
        let src = single_point_source(vec![-9999.0, 3.0, -9999.0], vec![0.0, 0.0, 0.0]);
        let r = reader(&src);
        let q = GeoPoint::new(60.0, 5.0);
        // Back-filled to time 0, held at time 200.
        assert_eq!(r.sample(0, &q, InterpolationMode::TwoClosest).u, 3.0);
        assert_eq!(r.sample(200, &q, InterpolationMode::TwoClosest).u, 3.0);
    }

    #[test]
    fn all_sentinel_point_is_dropped() {
        let src = single_point_source(vec![-9999.0, -9999.0, -9999.0], vec![0.0, 0.0, 0.0]);
        let r = reader(&src);
        assert!(r.is_empty());
        let s = r.sample(0, &GeoPoint::new(60.0, 5.0), InterpolationMode::TwoClosest);
        assert_eq!(s.u, 0.0);
        assert_eq!(s.du, SamplerConfig::default().default_du);
    }

    #[test]
    fn polar_source_resolves_components() {
        let src = MemorySource::new("polar")
            .with_dimension("time", 1)
            .with_dimension("cell", 1)
            .with_1d("time", vec![0.0])
            .with_1d("lat", vec![60.0])
            .with_1d("lon", vec![5.0])
            .with_2d("speed", vec![vec![2.0]])
            .with_2d("direction", vec![vec![90.0]]);
        let r = reader(&src);
        let s = r.sample(0, &GeoPoint::new(60.0, 5.0), InterpolationMode::TwoClosest);
        // Direction 90 deg: theta = 0, all speed goes east.
        assert!((s.u - 2.0).abs() < 1e-9);
        assert!(s.v.abs() < 1e-9);
    }

    #[test]
    fn upstream_convention_flips_sign() {
        let src = single_point_source(vec![1.0], vec![2.0]);
        let r = FieldReader::ingest(
            &src,
            &FieldAliases::currents(),
            false,
            &SamplerConfig::default(),
        )
        .unwrap();
        let s = r.sample(0, &GeoPoint::new(60.0, 5.0), InterpolationMode::TwoClosest);
        assert_eq!(s.u, -1.0);
        assert_eq!(s.v, -2.0);
    }

    #[test]
    fn unit_conversion_applies() {
        let src = single_point_source(vec![1.0], vec![0.0])
            .with_attr("u", "units", AttrValue::Text("m/s".into()));
        let r = reader(&src);
        let s = r.sample(0, &GeoPoint::new(60.0, 5.0), InterpolationMode::TwoClosest);
        assert!((s.u - 1.9438).abs() < 1e-12);
    }

    #[test]
    fn unknown_unit_fails_ingestion() {
        let src = single_point_source(vec![1.0], vec![0.0])
            .with_attr("u", "units", AttrValue::Text("parsecs".into()));
        let err = FieldReader::ingest(
            &src,
            &FieldAliases::currents(),
            true,
            &SamplerConfig::default(),
        );
        assert!(matches!(err, Err(FieldError::UnknownUnit(_))));
    }

    #[test]
    fn required_buffers_second_gridline_rule() {
        let src = MemorySource::new("grid")
            .with_dimension("time", 3)
            .with_dimension("cell", 3)
            .with_1d("time", vec![0.0, 100.0, 200.0])
            .with_1d("lat", vec![60.0, 60.5, 61.0])
            .with_1d("lon", vec![5.0, 5.5, 6.0])
            .with_2d("u", vec![vec![1.0; 3]; 3])
            .with_2d("v", vec![vec![0.0; 3]; 3]);
        let r = reader(&src);
        // Freeze so coverage is known.
        let _ = r.sample(0, &GeoPoint::new(60.5, 5.5), InterpolationMode::TwoClosest);
        let mid = GeoExtent::new(5.5, 60.5, 5.5, 60.5);

        // Need at the interior gridlines on both ends: no growth anywhere.
        let interior = FetchWindow::new(100, 100, mid).unwrap();
        assert!(r.required_buffers(&interior).is_zero());

        // Need in the first gap on the low-time side: one time step.
        let edge = FetchWindow::new(50, 100, mid).unwrap();
        let b = r.required_buffers(&edge);
        assert_eq!(b.low_time, 100.0);
        assert_eq!(b.high_time, 0.0);

        // Need in the last gap on the high-time side, symmetrically.
        let late = FetchWindow::new(100, 150, mid).unwrap();
        let b = r.required_buffers(&late);
        assert_eq!(b.low_time, 0.0);
        assert_eq!(b.high_time, 100.0);

        // Need outside the grid: rounded-up multiple of the spacing.
        let outside = FetchWindow::new(-250, 100, mid).unwrap();
        assert_eq!(r.required_buffers(&outside).low_time, 400.0);
    }

    #[test]
    fn axis_buffer_edges() {
        assert_eq!(axis_buffer_low(150.0, 0.0, 100.0), 0.0);
        assert_eq!(axis_buffer_low(100.0, 0.0, 100.0), 0.0);
        assert_eq!(axis_buffer_low(50.0, 0.0, 100.0), 100.0);
        assert_eq!(axis_buffer_low(0.0, 0.0, 100.0), 100.0);
        assert_eq!(axis_buffer_low(-1.0, 0.0, 100.0), 200.0);
        assert_eq!(axis_buffer_low(-150.0, 0.0, 100.0), 300.0);
        assert_eq!(axis_buffer_high(-150.0, 0.0, 100.0), 0.0);
        assert_eq!(axis_buffer_high(-100.0, 0.0, 100.0), 0.0);
        assert_eq!(axis_buffer_high(-50.0, 0.0, 100.0), 100.0);
        assert_eq!(axis_buffer_high(0.0, 0.0, 100.0), 100.0);
        assert_eq!(axis_buffer_high(50.0, 0.0, 100.0), 200.0);
        assert_eq!(axis_buffer_high(150.0, 0.0, 100.0), 300.0);
    }

    #[test]
    fn fill_series_rules() {
        let nan = f64::NAN;
        assert_eq!(fill_series(&[nan, 3.0, nan, 5.0]), Some(vec![3.0, 3.0, 3.0, 5.0]));
        assert_eq!(fill_series(&[1.0, 2.0]), Some(vec![1.0, 2.0]));
        assert_eq!(fill_series(&[nan, nan]), None);
    }

    #[test]
    fn view_names_record_resolved_variables() {
        let src = single_point_source(vec![1.0], vec![0.0]);
        let r = reader(&src);
        let names = r.view_names();
        assert!(names.contains(&"u".to_string()));
        assert!(names.contains(&"v".to_string()));
        assert!(names.contains(&"lat".to_string()));
    }

    #[test]
    fn free_memory_is_idempotent() {
        let src = single_point_source(vec![1.0], vec![0.0]);
        let r = reader(&src);
        r.free_memory();
        r.free_memory();
        let s = r.sample(0, &GeoPoint::new(60.0, 5.0), InterpolationMode::TwoClosest);
        assert_eq!(s.u, 0.0);
    }
}
