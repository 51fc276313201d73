use crate::channel::{Awgn, ChannelSimulator};
use crate::decoder::{DecoderSettings, FrameDecoder, FrameRecord, RxMode};
use crate::encoder::{TxOutput, TxPass};
use crate::error::Result;
use crate::fec::Fec;
use crate::framing::{payload_bits, FecMode, FrameAssembler};
use crate::ldpc::{IraLdpc, HRA_112_112_MAX_ITER};
use crate::modem::Modem;
use crate::ofdm::OfdmModem;
use crate::trace::TraceLog;
use crate::{OfdmConfig, CODED_BITS_PER_FRAME, ESNO, FOFF_HZ, NFRAMES, SAMPLE_CLOCK_OFFSET_PPM};

pub const DEFAULT_SEED: u64 = 0x700d;

/// Settings for one end-to-end run.
#[derive(Debug, Clone)]
pub struct SimConfig {
    pub frames: usize,
    pub clock_offset_ppm: f64,
    pub foff_hz: f32,
    pub fec: FecMode,
    pub rx_mode: RxMode,
    /// Linear Es/No assumed when computing likelihoods.
    pub esno: f32,
    pub ldpc_max_iter: usize,
    /// Channel noise, off when `None`.
    pub channel_esno_db: Option<f32>,
    pub seed: u64,
    pub verbose: bool,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            frames: NFRAMES,
            clock_offset_ppm: SAMPLE_CLOCK_OFFSET_PPM,
            foff_hz: FOFF_HZ,
            fec: FecMode::Ldpc,
            rx_mode: RxMode::FrontLoaded,
            esno: ESNO,
            ldpc_max_iter: HRA_112_112_MAX_ITER,
            channel_esno_db: None,
            seed: DEFAULT_SEED,
            verbose: false,
        }
    }
}

/// Outcome of a run: the full trace plus the per-frame records it was
/// built from.
#[derive(Debug)]
pub struct SimReport {
    pub payload: Vec<bool>,
    pub tx: TxOutput,
    /// Samples the resampler produced before zero padding.
    pub channel_produced: usize,
    /// Channel samples the decoder read, front load included.
    pub rx_consumed: usize,
    pub frames: Vec<FrameRecord>,
    pub trace: TraceLog,
    pub parity_bits: usize,
}

impl SimReport {
    pub fn converged_frames(&self) -> usize {
        self.frames
            .iter()
            .filter(|r| r.parity_checks == self.parity_bits)
            .count()
    }
}

/// Encode, impair and decode a fixed number of frames.
pub struct Simulation<M: Modem, F: Fec> {
    config: SimConfig,
    modem: M,
    fec: F,
}

impl Simulation<OfdmModem, IraLdpc> {
    /// 700D modem with the (224,112) code.
    pub fn mode_700d(config: SimConfig) -> Result<Self> {
        let modem = OfdmModem::new(OfdmConfig::mode_700d())?;
        let fec = IraLdpc::hra_112_112()?;
        Ok(Self::new(config, modem, fec))
    }
}

impl<M: Modem, F: Fec> Simulation<M, F> {
    pub fn new(config: SimConfig, modem: M, fec: F) -> Self {
        Self { config, modem, fec }
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn run(&mut self) -> Result<SimReport> {
        let ofdm_config = *self.modem.config();
        let frames = self.config.frames;

        let assembler = FrameAssembler::new(&ofdm_config, self.modem.tx_uw(), CODED_BITS_PER_FRAME)?;
        assembler.check_fec(&self.fec)?;

        log::info!(
            "{} frames, {} ppm, {} Hz, {:?}, {:?}",
            frames,
            self.config.clock_offset_ppm,
            self.config.foff_hz,
            self.config.fec,
            self.config.rx_mode
        );

        let payload = payload_bits(assembler.payload_bits(), self.config.seed);
        let tx = TxPass::new(assembler.clone(), self.config.fec, frames).run(
            &mut self.modem,
            &self.fec,
            &payload,
        )?;

        let mut channel = ChannelSimulator::new(self.config.clock_offset_ppm, self.config.foff_hz);
        if let Some(esno_db) = self.config.channel_esno_db {
            channel = channel.with_awgn(Awgn {
                esno_db,
                seed: self.config.seed,
            });
        }
        let rx = channel.apply(&tx.tx, ofdm_config.fs, ofdm_config.m)?;

        let settings = DecoderSettings {
            rx_mode: self.config.rx_mode.clone(),
            fec_mode: self.config.fec,
            esno: self.config.esno,
            max_iter: self.config.ldpc_max_iter,
            frames,
            verbose: self.config.verbose,
        };
        let mut decoder = FrameDecoder::new(ofdm_config, assembler, settings);
        let records = decoder.run(&mut self.modem, &self.fec, &rx.samples, &tx.tx_bits)?;

        let mut trace = TraceLog::new(ofdm_config, self.fec.code_length(), frames);
        trace.set_pilot_samples(self.modem.pilot_samples());
        trace.record_tx(&tx);
        trace.record_rx(&rx.samples);
        for record in &records {
            trace.record_frame(record)?;
        }

        let report = SimReport {
            payload,
            tx,
            channel_produced: rx.produced,
            rx_consumed: decoder.samples_read(),
            frames: records,
            trace,
            parity_bits: self.fec.parity_bits(),
        };
        log::info!(
            "{} of {} frames converged",
            report.converged_frames(),
            frames
        );
        Ok(report)
    }
}
