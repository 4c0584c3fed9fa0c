/// Round `value` to `decimals` places, ties to even.
///
/// Matches the rounding applied by the document format to thresholds,
/// leaf summaries and aggregated predictions.
pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    let scaled = value * scale;
    let rounded = scaled.round_ties_even();
    // Scaling can push large values past exact representability.
    if !rounded.is_finite() {
        return value;
    }
    rounded / scale
}
