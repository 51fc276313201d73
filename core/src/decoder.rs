//! Receive side: feeds the channel output through the modem a frame at a
//! time and soft-decodes each frame's coded block.

use crate::config::OfdmConfig;
use crate::error::{Error, Result};
use crate::fec::Fec;
use crate::framing::{FecMode, FrameAssembler};
use crate::likelihood::{bit_likelihood, constellation, symbol_likelihood};
use crate::modem::Modem;
use crate::ASCALE;
use byteorder::{LittleEndian, ReadBytesExt};
use rustfft::num_complex::Complex32;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::PathBuf;

/// Where the demodulator input comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum RxMode {
    /// Prime the receive buffer with the first frame and two symbols of the
    /// channel output, so timing starts locked.
    FrontLoaded,
    /// Start from an empty receive buffer.
    Streaming,
    /// Replace the channel output with a capture of 16-bit little-endian
    /// real samples, `nin` per frame.
    ReferenceFile(PathBuf),
}

#[derive(Debug, Clone)]
pub struct DecoderSettings {
    pub rx_mode: RxMode,
    pub fec_mode: FecMode,
    /// Es/No (linear) assumed by the symbol likelihoods.
    pub esno: f32,
    pub max_iter: usize,
    pub frames: usize,
    pub verbose: bool,
}

/// Everything observed while decoding one frame.
#[derive(Debug, Clone)]
pub struct FrameRecord {
    pub nin: usize,
    pub rxbuf_in: Vec<Complex32>,
    pub rxbuf: Vec<Complex32>,
    pub rx_sym: Vec<Complex32>,
    pub phase_est_pilot: Vec<f32>,
    pub rx_amp: Vec<f32>,
    pub foff_est_hz: f32,
    pub timing_est: i32,
    pub timing_valid: bool,
    pub timing_mx: f32,
    pub coarse_foff_est_hz: f32,
    pub sample_point: i32,
    pub rx_np: Vec<Complex32>,
    pub rx_bits: Vec<bool>,
    pub symbol_likelihood: Vec<f32>,
    pub bit_likelihood: Vec<f32>,
    /// Decoder hard decisions for the whole coded block.
    pub detected: Vec<bool>,
    pub parity_checks: usize,
    pub iterations: usize,
    pub sig_var: f32,
    pub noise_var: f32,
    pub mean_amp: f32,
    /// Uncoded bit errors against the transmitted frame, reference file only.
    pub bit_errors: Option<usize>,
}

pub struct FrameDecoder {
    config: OfdmConfig,
    assembler: FrameAssembler,
    settings: DecoderSettings,
    staging: Vec<Complex32>,
    samples_read: usize,
}

impl FrameDecoder {
    pub fn new(config: OfdmConfig, assembler: FrameAssembler, settings: DecoderSettings) -> Self {
        Self {
            config,
            assembler,
            settings,
            staging: vec![Complex32::new(0.0, 0.0); config.max_samples_per_frame],
            samples_read: 0,
        }
    }

    /// Channel samples consumed by the last `run`, priming included.
    pub fn samples_read(&self) -> usize {
        self.samples_read
    }

    /// Decode `settings.frames` frames from `rx`. `tx_bits` is only read in
    /// reference file mode, to count uncoded bit errors.
    pub fn run(
        &mut self,
        modem: &mut dyn Modem,
        fec: &dyn Fec,
        rx: &[Complex32],
        tx_bits: &[bool],
    ) -> Result<Vec<FrameRecord>> {
        let config = self.config;
        let frames = self.settings.frames;
        self.assembler.check_fec(fec)?;
        let points = constellation(config.bps)?;

        modem.set_verbose(self.settings.verbose);
        modem.set_timing_enable(true);
        modem.set_foff_est_enable(true);
        modem.set_phase_est_enable(true);

        let mut reader = match &self.settings.rx_mode {
            RxMode::ReferenceFile(path) => {
                log::info!("reading receive samples from {}", path.display());
                Some(BufReader::new(File::open(path)?))
            }
            _ => None,
        };

        let mut prx = 0;
        if self.settings.rx_mode == RxMode::FrontLoaded {
            // a short channel output primes with its tail zeroed
            let prime_len = config.samples_per_frame + 2 * config.symbol_len();
            let mut prime = vec![Complex32::new(0.0, 0.0); prime_len];
            let lnew = prime.len().min(rx.len());
            prime[..lnew].copy_from_slice(&rx[..lnew]);
            modem.prime_rxbuf(&prime)?;
            prx = lnew;
        }

        // the first likelihood scaling needs a sensible amplitude
        modem.set_mean_amp(1.0);

        let off = self.assembler.coded_symbol_offset();
        let coded_syms = self.assembler.coded_symbols();
        let mut nin_tot = 0;
        let mut records = Vec::with_capacity(frames);

        for f in 0..frames {
            let nin = modem.nin();
            if nin > config.max_samples_per_frame {
                return Err(Error::BufferOverrun(format!(
                    "frame {} asks for {} samples, at most {}",
                    f, nin, config.max_samples_per_frame
                )));
            }

            // zero pad past the end of the channel output
            let staging = &mut self.staging[..nin];
            staging.fill(Complex32::new(0.0, 0.0));
            let lnew = nin.min(rx.len().saturating_sub(prx));
            staging[..lnew].copy_from_slice(&rx[prx..prx + lnew]);
            prx += lnew;
            if prx > config.max_samples_per_frame * frames {
                return Err(Error::BufferOverrun(format!(
                    "read pointer {} past {} frames",
                    prx, frames
                )));
            }

            if let Some(reader) = reader.as_mut() {
                staging.fill(Complex32::new(0.0, 0.0));
                read_reference(reader, staging)?;
            }

            let rx_bits = modem.demodulate(&self.staging[..nin])?;

            let bit_errors = if reader.is_some() {
                let sent = frame_slice(tx_bits, f, config.bits_per_frame)?;
                let errors = sent.iter().zip(&rx_bits).filter(|(a, b)| a != b).count();
                log::info!("frame {}: {} uncoded bit errors", f, errors);
                Some(errors)
            } else {
                None
            };

            let state = modem.state();
            if off + coded_syms > state.rx_np.len() || off + coded_syms > state.rx_amp.len() {
                return Err(Error::BufferOverrun(format!(
                    "coded block symbols {}..{} outside {} demodulated symbols",
                    off,
                    off + coded_syms,
                    state.rx_np.len()
                )));
            }
            let symbols = &state.rx_np[off..off + coded_syms];
            let amps = &state.rx_amp[off..off + coded_syms];

            let sym_likelihood =
                symbol_likelihood(symbols, points, self.settings.esno, amps, state.mean_amp)?;
            let bit_llr = bit_likelihood(&sym_likelihood, config.bps)?;
            let llr: Vec<f32> = bit_llr.iter().map(|&b| -b).collect();
            let outcome = fec.decode(&llr, self.settings.max_iter)?;

            if nin_tot >= config.samples_per_frame * frames {
                return Err(Error::BufferOverrun(format!(
                    "{} input samples logged before frame {}",
                    nin_tot, f
                )));
            }
            nin_tot += nin;

            if !state.timing_valid {
                log::warn!("frame {}: timing not valid (mx {:.3})", f, state.timing_mx);
            }
            let converged = outcome.converged(fec.parity_bits());
            if !converged && self.settings.fec_mode == FecMode::Ldpc {
                log::warn!(
                    "frame {}: {} of {} parity checks after {} iterations",
                    f,
                    outcome.parity_checks,
                    fec.parity_bits(),
                    outcome.iterations
                );
            }
            log::debug!(
                "frame {}: nin {} prx {} timing {} foff {:.3} Hz parity {}",
                f,
                nin,
                prx,
                state.timing_est,
                state.foff_est_hz,
                outcome.parity_checks
            );

            records.push(FrameRecord {
                nin,
                rxbuf_in: self.staging[..nin].to_vec(),
                rxbuf: state.rxbuf.to_vec(),
                rx_sym: state.rx_sym.to_vec(),
                phase_est_pilot: state.aphase_est_pilot_log.to_vec(),
                rx_amp: state.rx_amp.to_vec(),
                foff_est_hz: state.foff_est_hz,
                timing_est: state.timing_est,
                timing_valid: state.timing_valid,
                timing_mx: state.timing_mx,
                coarse_foff_est_hz: state.coarse_foff_est_hz,
                sample_point: state.sample_point,
                rx_np: state.rx_np.to_vec(),
                rx_bits,
                symbol_likelihood: sym_likelihood,
                bit_likelihood: bit_llr,
                detected: outcome.bits,
                parity_checks: outcome.parity_checks,
                iterations: outcome.iterations,
                sig_var: state.sig_var,
                noise_var: state.noise_var,
                mean_amp: state.mean_amp,
                bit_errors,
            });
        }

        log::info!("decoded {} frames from {} input samples", frames, nin_tot);
        self.samples_read = prx;
        Ok(records)
    }
}

fn frame_slice(bits: &[bool], frame: usize, bits_per_frame: usize) -> Result<&[bool]> {
    let start = frame * bits_per_frame;
    bits.get(start..start + bits_per_frame).ok_or_else(|| {
        Error::BufferOverrun(format!("no transmitted bits for frame {}", frame))
    })
}

/// Fill `staging` from a 16-bit capture; a short read leaves the tail zero.
fn read_reference<R: Read>(reader: &mut R, staging: &mut [Complex32]) -> Result<()> {
    for slot in staging.iter_mut() {
        match reader.read_i16::<LittleEndian>() {
            Ok(v) => *slot = Complex32::new(v as f32 / ASCALE, 0.0),
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => break,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::TxPass;
    use crate::framing::payload_bits;
    use crate::ldpc::{IraLdpc, HRA_112_112_MAX_ITER};
    use crate::ofdm::OfdmModem;
    use std::io::Cursor;

    fn settings(rx_mode: RxMode, frames: usize) -> DecoderSettings {
        DecoderSettings {
            rx_mode,
            fec_mode: FecMode::Ldpc,
            esno: 10.0,
            max_iter: HRA_112_112_MAX_ITER,
            frames,
            verbose: false,
        }
    }

    fn transmit(modem: &mut OfdmModem, code: &IraLdpc, frames: usize) -> (FrameAssembler, Vec<bool>, Vec<bool>, Vec<Complex32>) {
        let assembler = FrameAssembler::new(modem.config(), modem.tx_uw(), 224).unwrap();
        let payload = payload_bits(112, 42);
        let tx = TxPass::new(assembler.clone(), FecMode::Ldpc, frames)
            .run(modem, code, &payload)
            .unwrap();
        (assembler, payload, tx.tx_bits, tx.tx)
    }

    #[test]
    fn test_front_loaded_clean_channel_decodes() {
        let mut modem = OfdmModem::new(OfdmConfig::mode_700d()).unwrap();
        let code = IraLdpc::hra_112_112().unwrap();
        let (assembler, payload, tx_bits, tx) = transmit(&mut modem, &code, 4);

        let mut decoder = FrameDecoder::new(*modem.config(), assembler, settings(RxMode::FrontLoaded, 4));
        let records = decoder.run(&mut modem, &code, &tx, &tx_bits).unwrap();

        assert_eq!(records.len(), 4);
        for (f, r) in records.iter().enumerate() {
            assert_eq!(r.parity_checks, 112, "frame {}", f);
            assert_eq!(&r.detected[..112], &payload[..], "frame {}", f);
            assert_eq!(r.symbol_likelihood.len(), 448);
            assert_eq!(r.bit_likelihood.len(), 224);
            assert_eq!(r.rxbuf_in.len(), r.nin);
            assert!(r.bit_errors.is_none());
        }
    }

    #[test]
    fn test_short_input_zero_pads() {
        let mut modem = OfdmModem::new(OfdmConfig::mode_700d()).unwrap();
        let code = IraLdpc::hra_112_112().unwrap();
        let (assembler, _, tx_bits, tx) = transmit(&mut modem, &code, 3);

        // channel output runs out part way through the second frame read
        let rx = &tx[..2 * 1280 + 700];
        let mut decoder = FrameDecoder::new(*modem.config(), assembler, settings(RxMode::FrontLoaded, 3));
        let records = decoder.run(&mut modem, &code, rx, &tx_bits).unwrap();

        let last = &records[2];
        assert!(last.rxbuf_in.iter().all(|s| s.norm() == 0.0));
        assert!(records[1].rxbuf_in[1279].norm() == 0.0);
        assert!(records[1].rxbuf_in[0].norm() > 0.0);
        let consumed: usize = records.iter().map(|r| r.nin).sum();
        assert_eq!(consumed, 3 * 1280);
        assert_eq!(decoder.samples_read(), rx.len());
    }

    #[test]
    fn test_front_load_short_input_zero_pads() {
        let mut modem = OfdmModem::new(OfdmConfig::mode_700d()).unwrap();
        let code = IraLdpc::hra_112_112().unwrap();
        let (assembler, _, tx_bits, tx) = transmit(&mut modem, &code, 1);

        // less than the 1600 samples front loading wants
        let mut decoder = FrameDecoder::new(*modem.config(), assembler, settings(RxMode::FrontLoaded, 1));
        let records = decoder.run(&mut modem, &code, &tx[..1000], &tx_bits).unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].rx_bits.len(), 238);
        assert!(records[0].rxbuf_in.iter().all(|s| s.norm() == 0.0));
        assert_eq!(decoder.samples_read(), 1000);
    }

    #[test]
    fn test_mismatched_code_rejected() {
        let mut modem = OfdmModem::new(OfdmConfig::mode_700d()).unwrap();
        let code = IraLdpc::hra_112_112().unwrap();
        let (assembler, _, tx_bits, tx) = transmit(&mut modem, &code, 1);

        let small = IraLdpc::new(56, 56, 3).unwrap();
        let mut decoder = FrameDecoder::new(*modem.config(), assembler, settings(RxMode::Streaming, 1));
        let err = decoder.run(&mut modem, &small, &tx, &tx_bits).unwrap_err();
        assert!(matches!(err, Error::ConfigMismatch(_)));
    }

    #[test]
    fn test_read_reference_scales_and_pads() {
        let mut raw = Vec::new();
        for v in [1000i16, -2000, 3000] {
            raw.extend_from_slice(&v.to_le_bytes());
        }
        let mut staging = vec![Complex32::new(0.0, 0.0); 5];
        read_reference(&mut Cursor::new(raw), &mut staging).unwrap();

        assert!((staging[0].re - 1000.0 / ASCALE).abs() < 1e-9);
        assert!((staging[1].re + 2000.0 / ASCALE).abs() < 1e-9);
        assert_eq!(staging[0].im, 0.0);
        assert_eq!(staging[3], Complex32::new(0.0, 0.0));
        assert_eq!(staging[4], Complex32::new(0.0, 0.0));
    }

    #[test]
    fn test_reference_file_counts_bit_errors() {
        let mut modem = OfdmModem::new(OfdmConfig::mode_700d()).unwrap();
        let code = IraLdpc::hra_112_112().unwrap();
        let (assembler, _, tx_bits, tx) = transmit(&mut modem, &code, 2);

        // empty capture: all zero input, every frame still produces a count
        let file = tempfile::NamedTempFile::new().unwrap();
        let mode = RxMode::ReferenceFile(file.path().to_path_buf());
        let mut decoder = FrameDecoder::new(*modem.config(), assembler, settings(mode, 2));
        let records = decoder.run(&mut modem, &code, &tx, &tx_bits).unwrap();

        assert!(records.iter().all(|r| r.bit_errors.is_some()));
        assert!(records.iter().all(|r| r.rxbuf_in.iter().all(|s| s.norm() == 0.0)));
    }
}
