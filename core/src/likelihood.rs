//! Soft-decision metrics for the LDPC decoder
//!
//! Symbol likelihoods are log-domain Gaussian metrics against every
//! constellation point; bit likelihoods marginalise them per bit label.

use crate::error::{Error, Result};
use rustfft::num_complex::Complex32;

/// QPSK constellation, indexed by the 2-bit symbol label (first bit is the
/// MSB of the index). Adjacent points differ in one bit.
pub const QPSK: [Complex32; 4] = [
    Complex32::new(1.0, 0.0),
    Complex32::new(0.0, 1.0),
    Complex32::new(0.0, -1.0),
    Complex32::new(-1.0, 0.0),
];

pub const BPSK: [Complex32; 2] = [Complex32::new(1.0, 0.0), Complex32::new(-1.0, 0.0)];

/// Constellation matching the modem's bit mapping for `bps` bits per symbol.
pub fn constellation(bps: usize) -> Result<&'static [Complex32]> {
    match bps {
        1 => Ok(&BPSK),
        2 => Ok(&QPSK),
        _ => Err(Error::InvalidConfig(format!(
            "no constellation for {} bits per symbol",
            bps
        ))),
    }
}

/// Per-symbol, per-point log likelihoods.
///
/// For symbol `i` and point `j` the metric is
/// `-esno * |r[i]/mean_amp - s[j]*amps[i]/mean_amp|^2`, laid out row-major
/// (`symbols.len()` rows of `constellation.len()`).
pub fn symbol_likelihood(
    symbols: &[Complex32],
    constellation: &[Complex32],
    esno: f32,
    amps: &[f32],
    mean_amp: f32,
) -> Result<Vec<f32>> {
    if amps.len() != symbols.len() {
        return Err(Error::InvalidInputSize {
            expected: symbols.len(),
            actual: amps.len(),
        });
    }

    let mut out = Vec::with_capacity(symbols.len() * constellation.len());
    for (r, &amp) in symbols.iter().zip(amps) {
        for s in constellation {
            let expected = *s * (amp / mean_amp);
            let e = *r / mean_amp - expected;
            out.push(-esno * e.norm_sqr());
        }
    }
    Ok(out)
}

/// Bit log likelihood ratios from symbol likelihoods, `ln P(1) - ln P(0)`.
///
/// `symbol_likelihood` holds `2^bps` metrics per symbol; the output has
/// `bps` values per symbol, first bit first.
pub fn bit_likelihood(symbol_likelihood: &[f32], bps: usize) -> Result<Vec<f32>> {
    let points = 1usize << bps;
    if symbol_likelihood.len() % points != 0 {
        return Err(Error::InvalidInputSize {
            expected: (symbol_likelihood.len() / points + 1) * points,
            actual: symbol_likelihood.len(),
        });
    }

    let mut out = Vec::with_capacity(symbol_likelihood.len() / points * bps);
    let mut num = vec![0.0f32; bps];
    let mut den = vec![0.0f32; bps];

    for metrics in symbol_likelihood.chunks(points) {
        num.iter_mut().for_each(|v| *v = -1e6);
        den.iter_mut().for_each(|v| *v = -1e6);

        for (label, &metric) in metrics.iter().enumerate() {
            for k in 0..bps {
                let mask = 1 << (bps - 1 - k);
                if label & mask != 0 {
                    num[k] = max_star(num[k], metric);
                } else {
                    den[k] = max_star(den[k], metric);
                }
            }
        }

        out.extend(num.iter().zip(&den).map(|(n, d)| n - d));
    }

    Ok(out)
}

/// Jacobian logarithm, `ln(e^a + e^b)`.
fn max_star(a: f32, b: f32) -> f32 {
    let diff = (a - b).abs();
    if diff > 5.0 {
        a.max(b)
    } else {
        a.max(b) + (-diff).exp().ln_1p()
    }
}
