//! Tolerant comparisons for snapshot coordinates

/// Two coordinates are equal after rounding, or no whole pixel separates them
pub fn within_fraction(a: f64, b: f64) -> bool {
    let (lower, upper) = if a <= b { (a, b) } else { (b, a) };
    lower.round() == upper.round() || lower.ceil() == upper.floor()
}

/// Edge match used throughout the engine
pub fn touches(a: f64, b: f64, tolerance: f64) -> bool {
    within_fraction(a, b) || (a - b).abs() <= tolerance
}

/// Round to `accuracy` decimal digits
pub fn round_to(value: f64, accuracy: u32) -> f64 {
    let factor = 10f64.powi(accuracy as i32);
    let scaled = value * factor;
    // too large to carry fractional digits anyway
    if !scaled.is_finite() {
        return value;
    }
    // adding zero folds -0.0 into 0.0
    scaled.round() / factor + 0.0
}

/// Equality of values already rounded to `accuracy` digits
pub fn same_at(a: f64, b: f64, accuracy: u32) -> bool {
    (a - b).abs() < 0.5 * 10f64.powi(-(accuracy as i32))
}
