use crate::config::OfdmConfig;
use crate::error::Result;
use rustfft::num_complex::Complex32;

/// Read-only view of the demodulator after a `demodulate` call.
///
/// Borrowed from the modem; the drivers copy what they need into the trace
/// and never write back.
#[derive(Debug, Clone, Copy)]
pub struct DemodState<'a> {
    pub rxbuf: &'a [Complex32],
    /// `(ns + 3) * (nc + 2)` DFT outputs, row-major: previous pilot, this
    /// pilot, data rows, next pilot, future pilot.
    pub rx_sym: &'a [Complex32],
    /// Phase corrected data symbols, `rows_per_frame * nc`.
    pub rx_np: &'a [Complex32],
    pub rx_amp: &'a [f32],
    pub aphase_est_pilot_log: &'a [f32],
    pub foff_est_hz: f32,
    pub timing_est: i32,
    pub timing_valid: bool,
    pub timing_mx: f32,
    pub coarse_foff_est_hz: f32,
    pub sample_point: i32,
    pub sig_var: f32,
    pub noise_var: f32,
    pub mean_amp: f32,
}

/// Frame based modem with a stateful receiver.
///
/// The receiver keeps its own sample buffer and estimators between frames;
/// callers ask for `nin()` samples, then hand exactly that many to
/// `demodulate`.
pub trait Modem {
    fn config(&self) -> &OfdmConfig;

    fn set_verbose(&mut self, verbose: bool);
    fn set_timing_enable(&mut self, enable: bool);
    fn set_foff_est_enable(&mut self, enable: bool);
    fn set_phase_est_enable(&mut self, enable: bool);

    /// Unique word placed at the start of every frame.
    fn tx_uw(&self) -> &[bool];

    /// One pilot symbol with its cyclic prefix.
    fn pilot_samples(&self) -> &[Complex32];

    /// Modulate one frame of `bits_per_frame` bits into `samples_per_frame`
    /// samples.
    fn modulate(&mut self, bits: &[bool]) -> Result<Vec<Complex32>>;

    /// Input samples wanted by the next `demodulate` call.
    fn nin(&self) -> usize;

    /// Write `samples` into the tail of the receive buffer before the first
    /// frame, as if they had already been received with ideal timing.
    fn prime_rxbuf(&mut self, samples: &[Complex32]) -> Result<()>;

    fn set_mean_amp(&mut self, mean_amp: f32);

    /// Demodulate one frame from exactly `nin()` new samples, returning
    /// `bits_per_frame` hard decisions.
    fn demodulate(&mut self, rxbuf_in: &[Complex32]) -> Result<Vec<bool>>;

    fn state(&self) -> DemodState<'_>;
}
