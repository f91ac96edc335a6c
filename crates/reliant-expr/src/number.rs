//! Fixed-precision probability literals.

/// Round to `places` decimal places, halves rounded away from zero.
///
/// Probabilities are non-negative, so this is round-half-up for every value
/// a state model carries.
pub fn round_half_up(value: f64, places: u32) -> f64 {
    let scale = 10f64.powi(places as i32);
    let scaled = value * scale;
    // Binary products such as 0.12345 * 10000 land a hair below the half;
    // treat anything that close as an exact half.
    let nudged = if (scaled - scaled.trunc()).abs() >= 0.5 - 1e-9 {
        scaled.trunc() + scaled.signum()
    } else {
        scaled.round()
    };
    nudged / scale
}

/// Render a number the way probability literals appear in model text:
/// integral values keep one decimal (`1.0`), others use the shortest
/// round-trippable form (`0.05`).
pub fn format_decimal(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 {
        format!("{value:.1}")
    } else {
        format!("{value}")
    }
}
