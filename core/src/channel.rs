//! Channel impairments applied to the concatenated transmit signal
//!
//! Sample clock offset (see [`crate::resample`]), a constant carrier
//! frequency offset from a complex NCO, and optional white Gaussian noise.

use crate::error::{Error, Result};
use crate::resample::fs_offset;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};
use rustfft::num_complex::Complex32;
use std::f32::consts::TAU;

/// Complex NCO frequency shifter
///
/// The running phasor is owned by the shifter and carried across calls, so
/// consecutive blocks stay phase continuous. It is renormalised to unit
/// magnitude at the end of every call, as repeated complex multiplication
/// slowly inflates it.
#[derive(Debug, Clone)]
pub struct FreqShifter {
    foff_rect: Complex32,
    phase_rect: Complex32,
}

impl FreqShifter {
    pub fn new(foff_hz: f32, sample_rate_hz: f32) -> Self {
        let w = TAU * foff_hz / sample_rate_hz;
        Self {
            foff_rect: Complex32::new(w.cos(), w.sin()),
            phase_rect: Complex32::new(1.0, 0.0),
        }
    }

    /// Shift `input` into `output`; both must be the same length.
    pub fn process(&mut self, input: &[Complex32], output: &mut [Complex32]) -> Result<()> {
        if input.len() != output.len() {
            return Err(Error::InvalidInputSize {
                expected: input.len(),
                actual: output.len(),
            });
        }

        for (out, &sample) in output.iter_mut().zip(input) {
            self.phase_rect *= self.foff_rect;
            *out = sample * self.phase_rect;
        }
        self.normalise();

        Ok(())
    }

    pub fn process_in_place(&mut self, samples: &mut [Complex32]) {
        for sample in samples.iter_mut() {
            self.phase_rect *= self.foff_rect;
            *sample *= self.phase_rect;
        }
        self.normalise();
    }

    /// Current oscillator phasor.
    pub fn phase(&self) -> Complex32 {
        self.phase_rect
    }

    fn normalise(&mut self) {
        let mag = self.phase_rect.norm();
        if mag > 0.0 {
            self.phase_rect /= mag;
        }
    }
}

/// Additive white Gaussian noise at a given Es/No
///
/// Noise variance is referred to one demodulated symbol: the receiver DFT
/// sums `m` samples, so a unit-amplitude carrier sees `m * sigma^2` noise.
#[derive(Debug, Clone, Copy)]
pub struct Awgn {
    pub esno_db: f32,
    pub seed: u64,
}

impl Awgn {
    /// Total complex noise variance per sample for an `m` point symbol.
    pub fn noise_variance(&self, m: usize) -> f32 {
        let esno = 10f32.powf(self.esno_db / 10.0);
        1.0 / (m as f32 * esno)
    }

    pub fn apply(&self, samples: &mut [Complex32], m: usize) -> Result<()> {
        let std_dev = (self.noise_variance(m) / 2.0).sqrt();
        let normal = Normal::new(0.0f32, std_dev)
            .map_err(|e| Error::InvalidConfig(format!("noise distribution: {}", e)))?;
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);

        for sample in samples.iter_mut() {
            sample.re += normal.sample(&mut rng);
            sample.im += normal.sample(&mut rng);
        }
        Ok(())
    }
}

/// Resampler followed by the frequency shifter (and optional noise), run
/// over a whole transmit buffer in one pass.
#[derive(Debug, Clone, Copy)]
pub struct ChannelSimulator {
    pub clock_offset_ppm: f64,
    pub foff_hz: f32,
    pub awgn: Option<Awgn>,
}

/// Channel output.
#[derive(Debug, Clone)]
pub struct ChannelOutput {
    /// Received signal, zero padded to the transmit length.
    pub samples: Vec<Complex32>,
    /// Samples actually produced by the resampler.
    pub produced: usize,
}

impl ChannelSimulator {
    pub fn new(clock_offset_ppm: f64, foff_hz: f32) -> Self {
        Self {
            clock_offset_ppm,
            foff_hz,
            awgn: None,
        }
    }

    pub fn with_awgn(mut self, awgn: Awgn) -> Self {
        self.awgn = Some(awgn);
        self
    }

    /// Impair `tx`, sampled at `fs`, with an `m` point symbol for noise scaling.
    pub fn apply(&self, tx: &[Complex32], fs: f32, m: usize) -> Result<ChannelOutput> {
        let mut samples = fs_offset(tx, self.clock_offset_ppm);
        let produced = samples.len();

        let mut shifter = FreqShifter::new(self.foff_hz, fs);
        shifter.process_in_place(&mut samples);

        if let Some(awgn) = &self.awgn {
            awgn.apply(&mut samples, m)?;
        }

        if samples.len() < tx.len() {
            samples.resize(tx.len(), Complex32::new(0.0, 0.0));
        }

        log::debug!(
            "channel: {} ppm, {} Hz, {} of {} samples produced",
            self.clock_offset_ppm,
            self.foff_hz,
            produced,
            tx.len()
        );

        Ok(ChannelOutput { samples, produced })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tone(n: usize) -> Vec<Complex32> {
        (0..n)
            .map(|i| Complex32::from_polar(0.7, 0.01 * i as f32))
            .collect()
    }

    #[test]
    fn test_zero_offset_is_transparent() {
        let input = tone(4000);
        let mut output = vec![Complex32::new(0.0, 0.0); input.len()];
        let mut shifter = FreqShifter::new(0.0, 8000.0);
        shifter.process(&input, &mut output).unwrap();

        for (a, b) in input.iter().zip(&output) {
            assert!((a - b).norm() < 1e-6);
        }
    }

    #[test]
    fn test_phasor_stays_unit_magnitude() {
        let mut shifter = FreqShifter::new(123.4, 8000.0);
        let mut block = vec![Complex32::new(1.0, 0.0); 10_000];
        for _ in 0..50 {
            shifter.process_in_place(&mut block);
            block.iter_mut().for_each(|s| *s = Complex32::new(1.0, 0.0));
            assert!((shifter.phase().norm() - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn test_shift_rotates_by_expected_phase() {
        let fs = 8000.0;
        let foff = 10.0;
        let mut shifter = FreqShifter::new(foff, fs);
        let mut block = vec![Complex32::new(1.0, 0.0); 100];
        shifter.process_in_place(&mut block);

        // the first output is already rotated by one step
        for (i, s) in block.iter().enumerate() {
            let expected = Complex32::from_polar(1.0, TAU * foff * (i + 1) as f32 / fs);
            assert!((s - expected).norm() < 1e-4, "sample {}", i);
        }
    }

    #[test]
    fn test_consecutive_calls_are_phase_continuous() {
        let input = tone(2000);
        let mut whole = input.clone();
        FreqShifter::new(3.0, 8000.0).process_in_place(&mut whole);

        let mut split = input.clone();
        let mut shifter = FreqShifter::new(3.0, 8000.0);
        let (head, tail) = split.split_at_mut(777);
        shifter.process_in_place(head);
        shifter.process_in_place(tail);

        for (a, b) in whole.iter().zip(&split) {
            assert!((a - b).norm() < 1e-4);
        }
    }

    #[test]
    fn test_process_rejects_length_mismatch() {
        let mut shifter = FreqShifter::new(1.0, 8000.0);
        let input = tone(10);
        let mut output = vec![Complex32::new(0.0, 0.0); 9];
        assert!(shifter.process(&input, &mut output).is_err());
    }

    #[test]
    fn test_channel_pads_to_tx_length() {
        let tx = tone(12800);
        let channel = ChannelSimulator::new(100.0, 0.5);
        let out = channel.apply(&tx, 8000.0, 144).unwrap();
        assert_eq!(out.samples.len(), tx.len());
        assert!(out.produced < tx.len());
        assert!(out.samples[out.produced..].iter().all(|s| s.norm() == 0.0));
    }

    #[test]
    fn test_awgn_variance() {
        let awgn = Awgn {
            esno_db: 10.0,
            seed: 7,
        };
        let mut samples = vec![Complex32::new(0.0, 0.0); 50_000];
        awgn.apply(&mut samples, 144).unwrap();

        let measured = samples.iter().map(|s| s.norm_sqr()).sum::<f32>() / samples.len() as f32;
        let expected = awgn.noise_variance(144);
        assert!(
            (measured / expected - 1.0).abs() < 0.05,
            "measured {} expected {}",
            measured,
            expected
        );
    }
}
