//! Shared value-handling helpers for the snow tracker
//!
//! Sensor feeds encode "no data" in several ways (null, "", "-", "---", "NaN", "M").
//! Everything funnels through [`coerce_measurement`] so the rest of the crate only
//! ever sees `Option<f64>`.
use regex::Regex;
use serde_json::Value;

/// Strings that upstream feeds use to mean "no reading"
const MISSING_MARKERS: &[&str] = &["", "-", "--", "---", "nan", "null", "none", "m", "n/a"];

/// Outcome of coercing one raw measurement value
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Coerced {
    Value(f64),
    /// An explicit "no data" marker
    Missing,
    /// Something that should have been numeric but could not be read
    Malformed,
}

impl Coerced {
    pub fn value(self) -> Option<f64> {
        match self {
            Coerced::Value(v) => Some(v),
            Coerced::Missing | Coerced::Malformed => None,
        }
    }

    pub fn is_malformed(self) -> bool {
        matches!(self, Coerced::Malformed)
    }
}

/// Best-effort conversion of a raw JSON measurement value
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use snow_tracker::utils::{coerce_measurement, Coerced};
///
/// assert_eq!(coerce_measurement(&json!(12.5)), Coerced::Value(12.5));
/// assert_eq!(coerce_measurement(&json!("31.2 in")), Coerced::Value(31.2));
/// assert_eq!(coerce_measurement(&json!("---")), Coerced::Missing);
/// assert_eq!(coerce_measurement(&json!("broken")), Coerced::Malformed);
/// ```
pub fn coerce_measurement(value: &Value) -> Coerced {
    match value {
        Value::Null => Coerced::Missing,
        Value::Number(n) => match n.as_f64() {
            Some(v) if v.is_finite() => Coerced::Value(v),
            _ => Coerced::Malformed,
        },
        Value::String(s) => coerce_str(s),
        Value::Bool(_) | Value::Array(_) | Value::Object(_) => Coerced::Malformed,
    }
}

/// Coerce a textual reading
pub fn coerce_str(value: &str) -> Coerced {
    let trimmed = value.trim();
    if MISSING_MARKERS.contains(&trimmed.to_ascii_lowercase().as_str()) {
        return Coerced::Missing;
    }

    if let Ok(v) = trimmed.parse::<f64>() {
        return if v.is_finite() {
            Coerced::Value(v)
        } else {
            Coerced::Missing
        };
    }

    // Fallback: leading numeric token, e.g. "31.2 in" or "4.0*"
    match leading_number(trimmed) {
        Some(v) => Coerced::Value(v),
        None => Coerced::Malformed,
    }
}

fn leading_number(value: &str) -> Option<f64> {
    let re = Regex::new(r"^[-+]?(\d+(\.\d*)?|\.\d+)").ok()?;
    let token = re.find(value)?;
    token.as_str().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Round to a fixed number of decimal places
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    normalize_zero((value * factor).round() / factor)
}

/// Normalize -0.0 to 0.0 for cleaner output
pub fn normalize_zero(value: f64) -> f64 {
    if value == 0.0 {
        0.0 // Converts both 0.0 and -0.0 to 0.0
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_coerce_number() {
        assert_eq!(coerce_measurement(&json!(0)), Coerced::Value(0.0));
        assert_eq!(coerce_measurement(&json!(-3.5)), Coerced::Value(-3.5));
    }

    #[test]
    fn test_coerce_missing_markers() {
        for marker in ["", " ", "-", "---", "NaN", "null", "M", "N/A"] {
            assert_eq!(coerce_str(marker), Coerced::Missing, "marker {:?}", marker);
        }
        assert_eq!(coerce_measurement(&json!(null)), Coerced::Missing);
    }

    #[test]
    fn test_coerce_numeric_strings() {
        assert_eq!(coerce_str(" 18.25 "), Coerced::Value(18.25));
        assert_eq!(coerce_str("-4"), Coerced::Value(-4.0));
        assert_eq!(coerce_str("4.0*"), Coerced::Value(4.0));
        assert_eq!(coerce_str(".5in"), Coerced::Value(0.5));
    }

    #[test]
    fn test_coerce_infinite_is_missing() {
        assert_eq!(coerce_str("inf"), Coerced::Missing);
    }

    #[test]
    fn test_coerce_malformed() {
        assert_eq!(coerce_str("sensor fault"), Coerced::Malformed);
        assert_eq!(coerce_measurement(&json!(true)), Coerced::Malformed);
        assert_eq!(coerce_measurement(&json!([1, 2])), Coerced::Malformed);
        assert!(coerce_str("??").is_malformed());
        assert_eq!(coerce_str("??").value(), None);
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(1.23456, 2), 1.23);
        assert_eq!(round_to(2.5, 0), 3.0);
        assert_eq!(round_to(-0.04, 1), 0.0);
        assert!(round_to(-0.04, 1).is_sign_positive());
    }

    #[test]
    fn test_normalize_zero() {
        assert!(normalize_zero(-0.0).is_sign_positive());
        assert_eq!(normalize_zero(1.5), 1.5);
    }
}
