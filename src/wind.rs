//! Wind direction averaging
//!
//! Bearings wrap at 360°, so an arithmetic mean of 350° and 10° would point
//! south. Directions are averaged as unit vectors instead.

/// 16-point compass labels, clockwise from north
pub const COMPASS_LABELS: [&str; 16] = [
    "N", "NNE", "NE", "ENE", "E", "ESE", "SE", "SSE", "S", "SSW", "SW", "WSW", "W", "WNW", "NW",
    "NNW",
];

/// Resultant vectors shorter than this have no meaningful direction
const MIN_RESULTANT: f64 = 1e-9;

/// Circular mean of bearings in degrees, normalized to `[0, 360)`.
///
/// Returns `None` for an empty input, and for bearings that cancel out
/// (e.g. 90° and 270°), rather than a misleading 0° (north).
pub fn circular_mean(bearings: &[f64]) -> Option<f64> {
    if bearings.is_empty() {
        return None;
    }

    let (sin_sum, cos_sum) = bearings.iter().fold((0.0, 0.0), |(s, c), bearing| {
        let radians = bearing.to_radians();
        (s + radians.sin(), c + radians.cos())
    });
    let n = bearings.len() as f64;
    let (sin_mean, cos_mean) = (sin_sum / n, cos_sum / n);

    if sin_mean.hypot(cos_mean) < MIN_RESULTANT {
        return None;
    }

    let degrees = sin_mean.atan2(cos_mean).to_degrees().rem_euclid(360.0);
    // rem_euclid can round up to exactly 360.0 for tiny negative angles
    Some(if degrees >= 360.0 { 0.0 } else { degrees })
}

/// Compass label for a bearing in degrees
pub fn compass_label(degrees: f64) -> &'static str {
    let index = (degrees.rem_euclid(360.0) / 22.5).round() as usize % COMPASS_LABELS.len();
    COMPASS_LABELS[index]
}
