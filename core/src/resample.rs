//! Sample clock offset simulation using linear interpolation
//!
//! Emulates a receiver whose ADC clock is `sample_rate_ppm` parts per million
//! away from the transmitter's DAC. Each output sample is taken at input
//! time `t`, which advances by `1 + ppm/1e6` per output.

use rustfft::num_complex::Complex32;

/// Resample `input` with a sample clock offset in parts per million
///
/// # Arguments
/// * `input` - Complex samples at the nominal rate
/// * `sample_rate_ppm` - Clock offset; positive values produce fewer samples
///
/// # Returns
/// The resampled signal. Sampling stops once `t` reaches `n-1`, so for
/// `n >= 2` the output holds `ceil((n-1)/(1+ppm/1e6))` samples; shorter
/// inputs give an empty output.
///
/// Time is accumulated in `f64`.
pub fn fs_offset(input: &[Complex32], sample_rate_ppm: f64) -> Vec<Complex32> {
    let n = input.len();
    if n < 2 {
        return Vec::new();
    }

    let step = 1.0 + sample_rate_ppm / 1e6;
    let capacity = ((n - 1) as f64 / step).floor() as usize + 2;
    let mut out = Vec::with_capacity(capacity);

    let mut tin = 0.0f64;
    while tin < (n - 1) as f64 {
        let t1 = tin.floor() as usize;
        let t2 = tin.ceil() as usize;
        if t2 >= n {
            break;
        }

        let f = tin - t1 as f64;
        let a = input[t1];
        let b = input[t2];
        out.push(Complex32::new(
            ((1.0 - f) * a.re as f64 + f * b.re as f64) as f32,
            ((1.0 - f) * a.im as f64 + f * b.im as f64) as f32,
        ));

        tin += step;
    }

    out
}
