//! Speed-unit conversion for ingested velocity components.

use crate::error::FieldError;

/// Multiplier taking a value in the named unit to knots.
///
/// Unit strings are normalized before lookup (case, whitespace, and the
/// `m s-1` spellings CF-style files use). An unrecognized unit fails the
/// whole ingestion; silently misscaled velocities are worse than no data.
pub fn speed_unit_factor(unit: &str) -> Result<f64, FieldError> {
    let normalized: String = unit
        .trim()
        .to_ascii_lowercase()
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '.' && *c != '/')
        .collect();
    match normalized.as_str() {
        "knots" | "knot" | "kts" | "kt" => Ok(1.0),
        "ms" | "ms-1" | "mps" | "meterspersecond" | "metrespersecond" => Ok(1.9438),
        "cms" | "cms-1" | "cmps" => Ok(0.019438),
        _ => Err(FieldError::UnknownUnit(unit.to_string())),
    }
}
