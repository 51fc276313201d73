use crate::config::OfdmConfig;
use crate::error::{Error, Result};
use crate::likelihood::QPSK;
use crate::modem::{DemodState, Modem};
use rustfft::{num_complex::Complex32, Fft, FftPlanner};
use std::f32::consts::{FRAC_PI_4, TAU};
use std::sync::Arc;

/// BPSK pilot values, one per carrier (including the two edge carriers).
const PILOT_VALUES: [f32; 64] = [
    -1.0, -1.0, 1.0, 1.0, -1.0, -1.0, -1.0, 1.0, -1.0, 1.0, -1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0,
    1.0, 1.0, -1.0, -1.0, 1.0, -1.0, 1.0, -1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, -1.0,
    -1.0, -1.0, -1.0, -1.0, -1.0, 1.0, -1.0, 1.0, -1.0, 1.0, -1.0, -1.0, -1.0, -1.0, 1.0, -1.0, 1.0,
    1.0, 1.0, -1.0, 1.0, -1.0, 1.0, -1.0, -1.0, -1.0, 1.0, 1.0, -1.0,
];

/// Unique word source; a frame uses the first `nuw_bits`.
const UW_PATTERN: [bool; 32] = [
    true, true, false, false, true, false, true, false, true, true, true, false, false, true, false,
    false, true, false, true, true, false, true, true, false, false, false, true, true, true, false,
    true, false,
];

const FOFF_EST_GAIN: f32 = 0.1;

/// Pilot-aided OFDM modem
///
/// Frame layout: one pilot row followed by `ns - 1` data rows, each row an
/// `m` point IDFT with an `ncp` sample cyclic prefix. Data rows carry `nc`
/// symbols on the inner carriers; the pilot row also fills one extra carrier
/// at each edge so every data carrier has pilots on both sides for phase
/// estimation.
///
/// The receiver holds three frames plus margin. A frame is demodulated once
/// the pilot two frames ahead has arrived, giving four pilots (previous,
/// this, next, future) to average over.
pub struct OfdmModem {
    config: OfdmConfig,
    fft: Arc<dyn Fft<f32>>,
    ifft: Arc<dyn Fft<f32>>,
    nlower: usize,
    pilots: Vec<Complex32>,
    pilot_samples: Vec<Complex32>,
    timing_norm: f32,
    tx_uw: Vec<bool>,

    rxbuf: Vec<Complex32>,
    rx_sym: Vec<Complex32>,
    rx_np: Vec<Complex32>,
    rx_amp: Vec<f32>,
    aphase_est_pilot_log: Vec<f32>,

    nin: usize,
    foff_est_hz: f32,
    timing_est: i32,
    sample_point: i32,
    timing_valid: bool,
    timing_mx: f32,
    coarse_foff_est_hz: f32,
    sig_var: f32,
    noise_var: f32,
    mean_amp: f32,

    timing_en: bool,
    foff_est_en: bool,
    phase_est_en: bool,
    verbose: bool,
    frame_count: usize,
}

impl OfdmModem {
    pub fn new(config: OfdmConfig) -> Result<Self> {
        config.validate()?;
        if config.bps != 1 && config.bps != 2 {
            return Err(Error::InvalidConfig(format!(
                "{} bits per symbol not supported (BPSK or QPSK only)",
                config.bps
            )));
        }
        if config.nc + 2 > PILOT_VALUES.len() {
            return Err(Error::InvalidConfig(format!("{} carriers exceed the pilot table", config.nc)));
        }
        if config.nuw_bits > UW_PATTERN.len() {
            return Err(Error::InvalidConfig(format!(
                "{} unique word bits exceed the pattern",
                config.nuw_bits
            )));
        }

        // rs = 1/ts is rarely exact in f32, nudge before flooring
        let alower = config.tx_centre / config.rs - (config.nc / 2) as f32;
        let nlower = (alower + 1e-4).floor();
        if nlower < 1.0 || nlower as usize + config.nc + 2 > config.m / 2 {
            return Err(Error::InvalidConfig(format!(
                "carriers from bin {} do not fit a {} point symbol",
                nlower, config.m
            )));
        }
        let nlower = nlower as usize;

        let mut planner = FftPlanner::<f32>::new();
        let fft = planner.plan_fft_forward(config.m);
        let ifft = planner.plan_fft_inverse(config.m);

        let pilots: Vec<Complex32> = PILOT_VALUES[..config.nc + 2]
            .iter()
            .map(|&p| Complex32::new(p, 0.0))
            .collect();

        let mut modem = Self {
            config,
            fft,
            ifft,
            nlower,
            pilots,
            pilot_samples: Vec::new(),
            timing_norm: 0.0,
            tx_uw: UW_PATTERN[..config.nuw_bits].to_vec(),
            rxbuf: vec![Complex32::new(0.0, 0.0); config.rxbuf_len],
            rx_sym: vec![Complex32::new(0.0, 0.0); (config.ns + 3) * (config.nc + 2)],
            rx_np: vec![Complex32::new(0.0, 0.0); config.data_symbols_per_frame()],
            rx_amp: vec![0.0; config.data_symbols_per_frame()],
            aphase_est_pilot_log: vec![0.0; config.data_symbols_per_frame()],
            nin: config.samples_per_frame,
            foff_est_hz: 0.0,
            timing_est: 0,
            sample_point: 0,
            timing_valid: false,
            timing_mx: 0.0,
            coarse_foff_est_hz: 0.0,
            sig_var: 0.0,
            noise_var: 0.0,
            mean_amp: 0.0,
            timing_en: true,
            foff_est_en: true,
            phase_est_en: true,
            verbose: false,
            frame_count: 0,
        };

        modem.pilot_samples = modem.idft_row(&modem.pilots);
        let energy: f32 = modem.pilot_samples.iter().map(|s| s.norm_sqr()).sum();
        modem.timing_norm = config.symbol_len() as f32 * energy;

        Ok(modem)
    }

    /// One row of carrier values to a time-domain symbol with cyclic prefix.
    fn idft_row(&self, row: &[Complex32]) -> Vec<Complex32> {
        let m = self.config.m;
        let ncp = self.config.ncp;

        let mut buf = vec![Complex32::new(0.0, 0.0); m];
        for (c, &value) in row.iter().enumerate() {
            buf[self.nlower + c] = value;
        }
        self.ifft.process(&mut buf);

        let scale = 1.0 / m as f32;
        let mut out = Vec::with_capacity(m + ncp);
        out.extend(buf[m - ncp..].iter().map(|&s| s * scale));
        out.extend(buf.iter().map(|&s| s * scale));
        out
    }

    /// DFT of `m` receive-buffer samples from `start`, de-rotated by the
    /// current frequency estimate, at the `nc + 2` carrier bins.
    fn dft_at(&self, start: i32, woff: f32) -> Result<Vec<Complex32>> {
        let m = self.config.m;
        if start < 0 || start as usize + m > self.rxbuf.len() {
            return Err(Error::BufferOverrun(format!(
                "symbol window at {} outside receive buffer of {}",
                start,
                self.rxbuf.len()
            )));
        }
        let start = start as usize;

        let mut buf: Vec<Complex32> = (start..start + m)
            .map(|i| self.rxbuf[i] * Complex32::from_polar(1.0, -woff * i as f32))
            .collect();
        self.fft.process(&mut buf);

        Ok(buf[self.nlower..self.nlower + self.config.nc + 2].to_vec())
    }

    /// Correlate the pilot against "this" and "next" pilot positions across
    /// the search window. Returns (best offset, valid, metric, residual Hz).
    fn est_timing(&self, work: &[Complex32]) -> (usize, bool, f32, f32) {
        let sym_len = self.config.symbol_len();
        let spf = self.config.samples_per_frame;
        let ncorr = work.len() + 1 - (spf + sym_len);

        let acc: f32 = work.iter().map(|s| s.norm_sqr()).sum();
        let av_level = 2.0 * (self.timing_norm * acc / work.len() as f32).sqrt() + 1e-12;

        let mut best = 0;
        let mut timing_mx = 0.0f32;
        let mut best_corr = (Complex32::new(0.0, 0.0), Complex32::new(0.0, 0.0));

        for i in 0..ncorr {
            let mut corr_st = Complex32::new(0.0, 0.0);
            let mut corr_en = Complex32::new(0.0, 0.0);
            for (j, p) in self.pilot_samples.iter().enumerate() {
                let csam = p.conj();
                corr_st += work[i + j] * csam;
                corr_en += work[i + j + spf] * csam;
            }
            let corr = (corr_st.norm() + corr_en.norm()) / av_level;
            if corr > timing_mx {
                timing_mx = corr;
                best = i;
                best_corr = (corr_st, corr_en);
            }
        }

        let timing_valid = work[best].norm() > 0.0 && timing_mx > self.config.timing_mx_thresh;
        let coarse_foff_hz =
            (best_corr.0.conj() * best_corr.1).arg() * self.config.fs / (TAU * spf as f32);

        (best, timing_valid, timing_mx, coarse_foff_hz)
    }

    fn update_timing(&mut self, woff: f32) -> Result<()> {
        let sym_len = self.config.symbol_len();
        let spf = self.config.samples_per_frame;
        let half = (self.config.ftwindowwidth / 2) as i32;

        let st = (sym_len + spf) as i32 - half + self.timing_est;
        let len = spf + sym_len + self.config.ftwindowwidth - 1;
        if st < 0 || st as usize + len > self.rxbuf.len() {
            return Err(Error::BufferOverrun(format!(
                "timing window at {} (+{}) outside receive buffer",
                st, len
            )));
        }
        let st = st as usize;

        let work: Vec<Complex32> = (st..st + len)
            .map(|i| self.rxbuf[i] * Complex32::from_polar(1.0, -woff * i as f32))
            .collect();

        let (ft_est, valid, mx, coarse) = self.est_timing(&work);
        self.timing_est += ft_est as i32 - half;
        self.timing_valid = valid;
        self.timing_mx = mx;
        self.coarse_foff_est_hz = coarse;

        // keep the DFT window inside the cyclic prefix
        let ncp = self.config.ncp as i32;
        self.sample_point = self.sample_point.max(self.timing_est + ncp / 4);
        self.sample_point = self.sample_point.min(self.timing_est + ncp);

        Ok(())
    }

    fn hard_decision(&self, symbol: Complex32, bits: &mut Vec<bool>) {
        if self.config.bps == 1 {
            bits.push(symbol.re < 0.0);
        } else {
            let rotated = symbol * Complex32::from_polar(1.0, FRAC_PI_4);
            bits.push(rotated.im < 0.0);
            bits.push(rotated.re < 0.0);
        }
    }

    fn estimate_variances(&mut self) {
        let n = self.rx_np.len();
        if n == 0 {
            return;
        }

        self.sig_var = self.rx_np.iter().map(|s| s.norm_sqr()).sum::<f32>() / n as f32;

        // noise is the component orthogonal to each symbol's nearest axis
        let (sum_x, sum_xx) = self.rx_np.iter().fold((0.0f32, 0.0f32), |(sx, sxx), s| {
            let q = if s.re.abs() >= s.im.abs() { s.im } else { s.re };
            (sx + q, sxx + q * q)
        });
        self.noise_var = if n > 1 {
            let nf = n as f32;
            2.0 * (nf * sum_xx - sum_x * sum_x) / (nf * (nf - 1.0))
        } else {
            0.0
        };
    }

    fn demod_core(&mut self) -> Result<Vec<bool>> {
        let nc = self.config.nc;
        let ns = self.config.ns;
        let nc2 = nc + 2;
        let sym_len = self.config.symbol_len();
        let spf = self.config.samples_per_frame;
        let woff = TAU * self.foff_est_hz / self.config.fs;

        if self.timing_en {
            self.update_timing(woff)?;
        }

        // previous pilot, this pilot, data rows, next pilot, future pilot
        let mut starts = Vec::with_capacity(ns + 3);
        starts.push(sym_len);
        starts.extend((0..=ns).map(|rr| sym_len + spf + rr * sym_len));
        starts.push(sym_len + 3 * spf);

        for (row, &start) in starts.iter().enumerate() {
            let carriers = self.dft_at(start as i32 + self.sample_point, woff)?;
            self.rx_sym[row * nc2..(row + 1) * nc2].copy_from_slice(&carriers);
        }

        if self.foff_est_en {
            let this: Complex32 = self.rx_sym[nc2..2 * nc2].iter().sum();
            let next: Complex32 = self.rx_sym[(ns + 1) * nc2..(ns + 2) * nc2].iter().sum();
            let freq_err_rect = this.conj() * next + Complex32::new(1e-6, 0.0);
            let freq_err_hz = freq_err_rect.arg() * self.config.fs / (TAU * spf as f32);
            self.foff_est_hz += FOFF_EST_GAIN * freq_err_hz;
        }

        // per carrier phase and amplitude over 3 adjacent carriers x 4 pilots
        let mut aphase_est_pilot = vec![0.0f32; nc2];
        let mut aamp_est_pilot = vec![0.0f32; nc2];
        for i in 1..=nc {
            let mut acc = Complex32::new(0.0, 0.0);
            for &row in &[1, ns + 1, 0, ns + 2] {
                for j in i - 1..=i + 1 {
                    acc += self.rx_sym[row * nc2 + j] * self.pilots[j].conj();
                }
            }
            aphase_est_pilot[i] = acc.arg();
            aamp_est_pilot[i] = (acc / 12.0).norm();
        }

        let mut bits = Vec::with_capacity(self.config.bits_per_frame);
        let mut sum_amp = 0.0f32;
        for rr in 0..self.config.rows_per_frame {
            for i in 1..=nc {
                let symbol = self.rx_sym[(rr + 2) * nc2 + i];
                let rx_corr = if self.phase_est_en {
                    symbol * Complex32::from_polar(1.0, -aphase_est_pilot[i])
                } else {
                    symbol
                };

                let idx = rr * nc + i - 1;
                self.rx_np[idx] = rx_corr;
                self.rx_amp[idx] = aamp_est_pilot[i];
                self.aphase_est_pilot_log[idx] = aphase_est_pilot[i];
                sum_amp += aamp_est_pilot[i];

                self.hard_decision(rx_corr, &mut bits);
            }
        }

        self.mean_amp = 0.9 * self.mean_amp + 0.1 * sum_amp / self.rx_np.len() as f32;

        // slip a quarter symbol when timing has drifted far enough
        self.nin = spf;
        if self.timing_en {
            let thresh = (sym_len / 8) as i32;
            let tshift = (sym_len / 4) as i32;
            if self.timing_est > thresh {
                self.nin = spf + tshift as usize;
                self.timing_est -= tshift;
                self.sample_point -= tshift;
            } else if self.timing_est < -thresh {
                self.nin = spf - tshift as usize;
                self.timing_est += tshift;
                self.sample_point += tshift;
            }
        }

        self.estimate_variances();

        if self.verbose {
            log::debug!(
                "demod frame {}: timing_est {} sample_point {} valid {} mx {:.3} foff {:.3} Hz nin {}",
                self.frame_count,
                self.timing_est,
                self.sample_point,
                self.timing_valid,
                self.timing_mx,
                self.foff_est_hz,
                self.nin
            );
        }
        self.frame_count += 1;

        Ok(bits)
    }
}

impl Modem for OfdmModem {
    fn config(&self) -> &OfdmConfig {
        &self.config
    }

    fn set_verbose(&mut self, verbose: bool) {
        self.verbose = verbose;
    }

    fn set_timing_enable(&mut self, enable: bool) {
        self.timing_en = enable;
        if !enable {
            self.timing_est = 0;
            self.sample_point = 0;
            self.nin = self.config.samples_per_frame;
        }
    }

    fn set_foff_est_enable(&mut self, enable: bool) {
        self.foff_est_en = enable;
    }

    fn set_phase_est_enable(&mut self, enable: bool) {
        self.phase_est_en = enable;
    }

    fn tx_uw(&self) -> &[bool] {
        &self.tx_uw
    }

    fn pilot_samples(&self) -> &[Complex32] {
        &self.pilot_samples
    }

    fn modulate(&mut self, bits: &[bool]) -> Result<Vec<Complex32>> {
        let config = self.config;
        if bits.len() != config.bits_per_frame {
            return Err(Error::InvalidInputSize {
                expected: config.bits_per_frame,
                actual: bits.len(),
            });
        }

        let symbols: Vec<Complex32> = bits
            .chunks(config.bps)
            .map(|b| match b {
                [b0, b1] => QPSK[((*b0 as usize) << 1) | *b1 as usize],
                [b0] => Complex32::new(if *b0 { -1.0 } else { 1.0 }, 0.0),
                _ => Complex32::new(0.0, 0.0),
            })
            .collect();

        let mut out = Vec::with_capacity(config.samples_per_frame);
        out.extend(self.pilot_samples.iter().copied());

        let mut row = vec![Complex32::new(0.0, 0.0); config.nc + 2];
        for data in symbols.chunks(config.nc) {
            row[1..=config.nc].copy_from_slice(data);
            out.extend(self.idft_row(&row));
        }

        debug_assert_eq!(out.len(), config.samples_per_frame);
        Ok(out)
    }

    fn nin(&self) -> usize {
        self.nin
    }

    fn prime_rxbuf(&mut self, samples: &[Complex32]) -> Result<()> {
        let len = self.rxbuf.len();
        if samples.len() > len {
            return Err(Error::BufferOverrun(format!(
                "{} priming samples exceed receive buffer of {}",
                samples.len(),
                len
            )));
        }
        self.rxbuf[len - samples.len()..].copy_from_slice(samples);
        Ok(())
    }

    fn set_mean_amp(&mut self, mean_amp: f32) {
        self.mean_amp = mean_amp;
    }

    fn demodulate(&mut self, rxbuf_in: &[Complex32]) -> Result<Vec<bool>> {
        let nin = self.nin;
        if rxbuf_in.len() != nin {
            return Err(Error::InvalidInputSize {
                expected: nin,
                actual: rxbuf_in.len(),
            });
        }

        let len = self.rxbuf.len();
        self.rxbuf.copy_within(nin.., 0);
        self.rxbuf[len - nin..].copy_from_slice(rxbuf_in);

        self.demod_core()
    }

    fn state(&self) -> DemodState<'_> {
        DemodState {
            rxbuf: &self.rxbuf,
            rx_sym: &self.rx_sym,
            rx_np: &self.rx_np,
            rx_amp: &self.rx_amp,
            aphase_est_pilot_log: &self.aphase_est_pilot_log,
            foff_est_hz: self.foff_est_hz,
            timing_est: self.timing_est,
            timing_valid: self.timing_valid,
            timing_mx: self.timing_mx,
            coarse_foff_est_hz: self.coarse_foff_est_hz,
            sample_point: self.sample_point,
            sig_var: self.sig_var,
            noise_var: self.noise_var,
            mean_amp: self.mean_amp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resample::fs_offset;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    fn random_frames(config: &OfdmConfig, frames: usize, seed: u64) -> Vec<Vec<bool>> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        (0..frames)
            .map(|_| (0..config.bits_per_frame).map(|_| rng.gen()).collect())
            .collect()
    }

    fn modulate_all(modem: &mut OfdmModem, frames: &[Vec<bool>]) -> Vec<Complex32> {
        frames
            .iter()
            .flat_map(|bits| modem.modulate(bits).unwrap())
            .collect()
    }

    /// Prime with ideal timing, then demodulate `frames` frames, zero padding
    /// past the end of `rx`. Returns hard bits and the nin used per frame.
    fn receive(modem: &mut OfdmModem, rx: &[Complex32], frames: usize) -> (Vec<Vec<bool>>, Vec<usize>) {
        let config = *modem.config();
        let prime = config.samples_per_frame + 2 * config.symbol_len();
        modem.prime_rxbuf(&rx[..prime]).unwrap();
        modem.set_mean_amp(1.0);

        let mut prx = prime;
        let mut bits = Vec::new();
        let mut nins = Vec::new();
        for _ in 0..frames {
            let nin = modem.nin();
            let mut input = vec![Complex32::new(0.0, 0.0); nin];
            let lnew = nin.min(rx.len() - prx);
            input[..lnew].copy_from_slice(&rx[prx..prx + lnew]);
            prx += lnew;
            bits.push(modem.demodulate(&input).unwrap());
            nins.push(nin);
        }
        (bits, nins)
    }

    #[test]
    fn test_modulate_frame_length() {
        let mut modem = OfdmModem::new(OfdmConfig::mode_700d()).unwrap();
        let bits = vec![false; 238];
        let samples = modem.modulate(&bits).unwrap();
        assert_eq!(samples.len(), 1280);
    }

    #[test]
    fn test_modulate_rejects_wrong_bit_count() {
        let mut modem = OfdmModem::new(OfdmConfig::mode_700d()).unwrap();
        assert!(modem.modulate(&[true; 100]).is_err());
    }

    #[test]
    fn test_pilot_cyclic_prefix() {
        let modem = OfdmModem::new(OfdmConfig::mode_700d()).unwrap();
        let p = modem.pilot_samples();
        assert_eq!(p.len(), 160);
        for i in 0..16 {
            assert!((p[i] - p[144 + i]).norm() < 1e-6, "CP mismatch at {}", i);
        }
    }

    #[test]
    fn test_unique_word_length() {
        let modem = OfdmModem::new(OfdmConfig::mode_700d()).unwrap();
        assert_eq!(modem.tx_uw().len(), 10);
    }

    #[test]
    fn test_clean_loopback() {
        let config = OfdmConfig::mode_700d();
        let mut modem = OfdmModem::new(config).unwrap();
        let frames = random_frames(&config, 5, 11);
        let tx = modulate_all(&mut modem, &frames);

        let mut rx_modem = OfdmModem::new(config).unwrap();
        let (rx_bits, nins) = receive(&mut rx_modem, &tx, 3);

        for f in 0..3 {
            assert_eq!(rx_bits[f], frames[f], "frame {} bit errors", f);
        }
        assert!(nins.iter().all(|&n| n == 1280));

        let state = rx_modem.state();
        assert_eq!(state.timing_est, 0);
        assert!(state.timing_valid);
        assert!(state.foff_est_hz.abs() < 1e-3);
        assert!(state.noise_var < 1e-3);
    }

    #[test]
    fn test_tracks_frequency_offset() {
        let config = OfdmConfig::mode_700d();
        let mut modem = OfdmModem::new(config).unwrap();
        let frames = random_frames(&config, 14, 5);
        let mut tx = modulate_all(&mut modem, &frames);

        let w = TAU * 1.0 / config.fs;
        for (i, s) in tx.iter_mut().enumerate() {
            *s *= Complex32::from_polar(1.0, w * i as f32);
        }

        let mut rx_modem = OfdmModem::new(config).unwrap();
        let (rx_bits, _) = receive(&mut rx_modem, &tx, 12);

        // the estimator converges towards +1 Hz
        let foff = rx_modem.state().foff_est_hz;
        assert!(foff > 0.5 && foff < 1.2, "foff estimate {}", foff);
        for f in 4..12 {
            assert_eq!(rx_bits[f], frames[f], "frame {} bit errors", f);
        }
    }

    #[test]
    fn test_timing_slip_adjusts_nin() {
        let config = OfdmConfig::mode_700d();
        let mut modem = OfdmModem::new(config).unwrap();
        let frames = random_frames(&config, 16, 3);
        let tx = modulate_all(&mut modem, &frames);

        // receiver clock slow: the stream stretches by ~4 samples a frame
        let rx = fs_offset(&tx, -3000.0);
        let mut rx_modem = OfdmModem::new(config).unwrap();
        let (_, nins) = receive(&mut rx_modem, &rx, 12);

        let slip = config.samples_per_frame + config.symbol_len() / 4;
        assert!(nins.contains(&slip), "nin never slipped: {:?}", nins);
        assert!(nins.iter().all(|&n| n <= config.max_samples_per_frame));
    }

    #[test]
    fn test_timing_disabled_keeps_nominal_nin() {
        let config = OfdmConfig::mode_700d();
        let mut modem = OfdmModem::new(config).unwrap();
        let frames = random_frames(&config, 8, 9);
        let tx = modulate_all(&mut modem, &frames);
        let rx = fs_offset(&tx, -3000.0);

        let mut rx_modem = OfdmModem::new(config).unwrap();
        rx_modem.set_timing_enable(false);
        let (_, nins) = receive(&mut rx_modem, &rx, 6);
        assert!(nins.iter().all(|&n| n == config.samples_per_frame));
        assert_eq!(rx_modem.state().timing_est, 0);
    }

    #[test]
    fn test_demodulate_rejects_wrong_input_length() {
        let mut modem = OfdmModem::new(OfdmConfig::mode_700d()).unwrap();
        let input = vec![Complex32::new(0.0, 0.0); 100];
        assert!(modem.demodulate(&input).is_err());
    }

    #[test]
    fn test_silence_is_not_valid_timing() {
        let mut modem = OfdmModem::new(OfdmConfig::mode_700d()).unwrap();
        let input = vec![Complex32::new(0.0, 0.0); modem.nin()];
        let bits = modem.demodulate(&input).unwrap();
        assert_eq!(bits.len(), 238);
        assert!(!modem.state().timing_valid);
    }

    #[test]
    fn test_prime_rejects_oversized_input() {
        let mut modem = OfdmModem::new(OfdmConfig::mode_700d()).unwrap();
        let input = vec![Complex32::new(0.0, 0.0); 5000];
        assert!(modem.prime_rxbuf(&input).is_err());
    }
}
