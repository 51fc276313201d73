//! Per-run signal trace, dumped as one Octave text file for comparison
//! against a reference model.

use crate::config::OfdmConfig;
use crate::decoder::FrameRecord;
use crate::encoder::TxOutput;
use crate::error::{Error, Result};
use crate::octave::OctaveWriter;
use rustfft::num_complex::Complex32;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

pub const TRACE_CREATOR: &str = "ofdmtrace";

/// Accumulates every logged array across a run.
///
/// Integer timing values are stored one-based, matching Octave indexing.
#[derive(Debug, Clone)]
pub struct TraceLog {
    config: OfdmConfig,
    coded_bits: usize,
    frames: usize,

    pilot_samples: Vec<Complex32>,
    tx_bits: Vec<i32>,
    tx: Vec<Complex32>,
    rx: Vec<Complex32>,

    nins: Vec<usize>,
    rxbuf_in: Vec<Complex32>,
    rxbuf: Vec<Complex32>,
    rx_sym: Vec<Complex32>,
    phase_est_pilot: Vec<f32>,
    rx_amp: Vec<f32>,
    foff_hz: Vec<f32>,
    timing_est: Vec<i32>,
    timing_valid: Vec<i32>,
    timing_mx: Vec<f32>,
    coarse_foff_est_hz: Vec<f32>,
    sample_point: Vec<i32>,
    rx_np: Vec<Complex32>,
    rx_bits: Vec<i32>,
    symbol_likelihood: Vec<f32>,
    bit_likelihood: Vec<f32>,
    detected_data: Vec<i32>,
    parity_check_count: Vec<i32>,
    sig_var: Vec<f32>,
    noise_var: Vec<f32>,
    mean_amp: Vec<f32>,
}

fn bits_to_int(bits: &[bool]) -> impl Iterator<Item = i32> + '_ {
    bits.iter().map(|&b| b as i32)
}

impl TraceLog {
    pub fn new(config: OfdmConfig, coded_bits: usize, frames: usize) -> Self {
        let spf = config.samples_per_frame;
        Self {
            config,
            coded_bits,
            frames,
            pilot_samples: Vec::new(),
            tx_bits: Vec::with_capacity(config.bits_per_frame * frames),
            tx: Vec::with_capacity(spf * frames),
            rx: Vec::with_capacity(spf * frames),
            nins: Vec::with_capacity(frames),
            rxbuf_in: Vec::with_capacity(spf * frames),
            rxbuf: Vec::with_capacity(config.rxbuf_len * frames),
            rx_sym: Vec::new(),
            phase_est_pilot: Vec::new(),
            rx_amp: Vec::new(),
            foff_hz: Vec::with_capacity(frames),
            timing_est: Vec::with_capacity(frames),
            timing_valid: Vec::with_capacity(frames),
            timing_mx: Vec::with_capacity(frames),
            coarse_foff_est_hz: Vec::with_capacity(frames),
            sample_point: Vec::with_capacity(frames),
            rx_np: Vec::new(),
            rx_bits: Vec::with_capacity(config.bits_per_frame * frames),
            symbol_likelihood: Vec::new(),
            bit_likelihood: Vec::new(),
            detected_data: Vec::new(),
            parity_check_count: Vec::with_capacity(frames),
            sig_var: Vec::with_capacity(frames),
            noise_var: Vec::with_capacity(frames),
            mean_amp: Vec::with_capacity(frames),
        }
    }

    pub fn set_pilot_samples(&mut self, pilot_samples: &[Complex32]) {
        self.pilot_samples = pilot_samples.to_vec();
    }

    pub fn record_tx(&mut self, tx: &TxOutput) {
        self.tx_bits = bits_to_int(&tx.tx_bits).collect();
        self.tx = tx.tx.clone();
    }

    pub fn record_rx(&mut self, rx: &[Complex32]) {
        self.rx = rx.to_vec();
    }

    /// Append one decoded frame.
    pub fn record_frame(&mut self, record: &FrameRecord) -> Result<()> {
        if self.nins.len() >= self.frames {
            return Err(Error::BufferOverrun(format!(
                "trace sized for {} frames",
                self.frames
            )));
        }
        if self.nin_tot() >= self.config.samples_per_frame * self.frames {
            return Err(Error::BufferOverrun(format!(
                "{} input samples already logged",
                self.nin_tot()
            )));
        }

        self.nins.push(record.nin);
        self.rxbuf_in.extend_from_slice(&record.rxbuf_in);
        self.rxbuf.extend_from_slice(&record.rxbuf);
        self.rx_sym.extend_from_slice(&record.rx_sym);
        self.phase_est_pilot.extend_from_slice(&record.phase_est_pilot);
        self.rx_amp.extend_from_slice(&record.rx_amp);
        self.foff_hz.push(record.foff_est_hz);
        self.timing_est.push(record.timing_est + 1);
        self.timing_valid.push(record.timing_valid as i32);
        self.timing_mx.push(record.timing_mx);
        self.coarse_foff_est_hz.push(record.coarse_foff_est_hz);
        self.sample_point.push(record.sample_point + 1);
        self.rx_np.extend_from_slice(&record.rx_np);
        self.rx_bits.extend(bits_to_int(&record.rx_bits));
        self.symbol_likelihood.extend_from_slice(&record.symbol_likelihood);
        self.bit_likelihood.extend_from_slice(&record.bit_likelihood);
        self.detected_data.extend(bits_to_int(&record.detected));
        self.parity_check_count.push(record.parity_checks as i32);
        self.sig_var.push(record.sig_var);
        self.noise_var.push(record.noise_var);
        self.mean_amp.push(record.mean_amp);
        Ok(())
    }

    pub fn frames_logged(&self) -> usize {
        self.nins.len()
    }

    pub fn nins(&self) -> &[usize] {
        &self.nins
    }

    pub fn nin_tot(&self) -> usize {
        self.rxbuf_in.len()
    }

    pub fn parity_check_counts(&self) -> &[i32] {
        &self.parity_check_count
    }

    /// Write every entry in a fixed order; shapes are checked against the
    /// frame count the log was created with.
    pub fn write_octave<W: Write>(&self, out: W) -> Result<()> {
        let c = &self.config;
        let f = self.frames;
        let sym_len = c.symbol_len();
        let data_syms = c.rows_per_frame * c.nc;
        let coded_syms = self.coded_bits / c.bps;

        let mut w = OctaveWriter::new(out);
        w.header(TRACE_CREATOR)?;
        w.save_complex("pilot_samples_c", &self.pilot_samples, 1, sym_len)?;
        w.save_int("tx_bits_log_c", &self.tx_bits, 1, c.bits_per_frame * f)?;
        w.save_complex("tx_log_c", &self.tx, 1, c.samples_per_frame * f)?;
        w.save_complex("rx_log_c", &self.rx, 1, c.samples_per_frame * f)?;
        w.save_complex("rxbuf_in_log_c", &self.rxbuf_in, 1, self.nin_tot())?;
        w.save_complex("rxbuf_log_c", &self.rxbuf, 1, c.rxbuf_len * f)?;
        w.save_complex("rx_sym_log_c", &self.rx_sym, (c.ns + 3) * f, c.nc + 2)?;
        w.save_float("phase_est_pilot_log_c", &self.phase_est_pilot, c.rows_per_frame * f, c.nc)?;
        w.save_float("rx_amp_log_c", &self.rx_amp, 1, data_syms * f)?;
        w.save_float("foff_hz_log_c", &self.foff_hz, f, 1)?;
        w.save_int("timing_est_log_c", &self.timing_est, f, 1)?;
        w.save_int("timing_valid_log_c", &self.timing_valid, f, 1)?;
        w.save_float("timing_mx_log_c", &self.timing_mx, f, 1)?;
        w.save_float("coarse_foff_est_hz_log_c", &self.coarse_foff_est_hz, f, 1)?;
        w.save_int("sample_point_log_c", &self.sample_point, f, 1)?;
        w.save_complex("rx_np_log_c", &self.rx_np, 1, data_syms * f)?;
        w.save_int("rx_bits_log_c", &self.rx_bits, 1, c.bits_per_frame * f)?;
        w.save_float(
            "symbol_likelihood_log_c",
            &self.symbol_likelihood,
            coded_syms * c.constellation_size() * f,
            1,
        )?;
        w.save_float("bit_likelihood_log_c", &self.bit_likelihood, self.coded_bits * f, 1)?;
        w.save_int("detected_data_log_c", &self.detected_data, 1, self.coded_bits * f)?;
        w.save_int("parity_check_count_log_c", &self.parity_check_count, f, 1)?;
        w.save_float("sig_var_log_c", &self.sig_var, f, 1)?;
        w.save_float("noise_var_log_c", &self.noise_var, f, 1)?;
        w.save_float("mean_amp_log_c", &self.mean_amp, f, 1)?;

        w.into_inner().flush()?;
        Ok(())
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path.as_ref())?;
        self.write_octave(BufWriter::new(file))?;
        log::info!("trace written to {}", path.as_ref().display());
        Ok(())
    }
}
