use std::f64::consts::PI;

use crate::config::WindowFunction;

/// Periodic window coefficients of length `len`
///
/// Periodic (DFT-even) windows are the variant meant for spectral analysis:
/// the `len`-point window equals the first `len` points of the symmetric
/// `len + 1`-point window. Coefficients are computed in f64 and rounded once.
pub fn window_coefficients(function: WindowFunction, len: usize) -> Vec<f32> {
    let n = len as f64;
    (0..len)
        .map(|i| {
            let phase = 2.0 * PI * i as f64 / n;
            let w = match function {
                WindowFunction::Hann => 0.5 - 0.5 * phase.cos(),
                WindowFunction::Hamming => 0.54 - 0.46 * phase.cos(),
                WindowFunction::Rectangular => 1.0,
            };
            w as f32
        })
        .collect()
}
