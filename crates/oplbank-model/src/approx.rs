//! Relative-epsilon floating point comparison.

/// Scale-aware approximate equality for detune values.
///
/// The tolerance window grows with operand magnitude: values near zero get
/// an absolute window of `100 * f64::EPSILON`, larger values a window
/// proportional to the larger operand. Two detunes closer than this are
/// the same detune for deduplication purposes.
pub fn approx_eq(a: f64, b: f64) -> bool {
    let epsilon = f64::EPSILON * 100.0;
    let scale = 1.0;
    (a - b).abs() < epsilon * (scale + a.abs().max(b.abs()))
}
