use crate::error::{Error, Result};

/// Modem configuration, derived once when the modem is created and read
/// back by every driver.
///
/// The 700D waveform: 17 QPSK data carriers plus two edge pilots, one pilot
/// row every 8 symbols, 144 sample symbols with a 16 sample cyclic prefix at
/// 8 kHz.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OfdmConfig {
    pub tx_centre: f32,
    pub rx_centre: f32,
    pub fs: f32,
    pub ts: f32,
    pub rs: f32,
    pub tcp: f32,
    pub timing_mx_thresh: f32,
    pub nc: usize,
    pub ns: usize,
    pub bps: usize,
    pub m: usize,
    pub ncp: usize,
    pub ftwindowwidth: usize,
    pub bits_per_frame: usize,
    pub rows_per_frame: usize,
    pub samples_per_frame: usize,
    pub max_samples_per_frame: usize,
    pub rxbuf_len: usize,
    pub ntxt_bits: usize,
    pub nuw_bits: usize,
}

impl OfdmConfig {
    pub fn mode_700d() -> Self {
        Self::from_params(1500.0, 8000.0, 0.018, 0.002, 0.30, 17, 8, 2, 11, 4)
    }

    /// Build a configuration from the primary parameters; every frame size is
    /// derived from them.
    #[allow(clippy::too_many_arguments)]
    pub fn from_params(
        centre: f32,
        fs: f32,
        ts: f32,
        tcp: f32,
        timing_mx_thresh: f32,
        nc: usize,
        ns: usize,
        bps: usize,
        ftwindowwidth: usize,
        ntxt_bits: usize,
    ) -> Self {
        let m = (fs * ts).round() as usize;
        let ncp = (fs * tcp).round() as usize;
        let bits_per_frame = ns.saturating_sub(1) * nc * bps;
        let samples_per_frame = ns * (m + ncp);

        Self {
            tx_centre: centre,
            rx_centre: centre,
            fs,
            ts,
            rs: 1.0 / ts,
            tcp,
            timing_mx_thresh,
            nc,
            ns,
            bps,
            m,
            ncp,
            ftwindowwidth,
            bits_per_frame,
            rows_per_frame: if nc * bps > 0 { bits_per_frame / (nc * bps) } else { 0 },
            samples_per_frame,
            max_samples_per_frame: samples_per_frame + (m + ncp) / 4,
            rxbuf_len: 3 * samples_per_frame + 3 * (m + ncp),
            ntxt_bits,
            nuw_bits: (ns.saturating_sub(1) * bps).saturating_sub(ntxt_bits),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.nc == 0 || self.ns < 2 || self.bps == 0 || self.m == 0 {
            return Err(Error::InvalidConfig(format!(
                "nc={} ns={} bps={} m={} must all be non-zero (ns >= 2)",
                self.nc, self.ns, self.bps, self.m
            )));
        }
        if self.ncp >= self.m {
            return Err(Error::InvalidConfig(format!(
                "cyclic prefix ({}) must be shorter than the symbol ({})",
                self.ncp, self.m
            )));
        }
        if self.bits_per_frame % (self.nc * self.bps) != 0 {
            return Err(Error::InvalidConfig(format!(
                "bits per frame {} is not a whole number of rows of {} bits",
                self.bits_per_frame,
                self.nc * self.bps
            )));
        }
        if self.ftwindowwidth == 0 {
            return Err(Error::InvalidConfig("timing window width must be non-zero".to_string()));
        }
        if (self.ns - 1) * self.bps < self.ntxt_bits {
            return Err(Error::InvalidConfig(format!(
                "{} text bits do not fit in the first column",
                self.ntxt_bits
            )));
        }
        Ok(())
    }

    /// Samples in one symbol including its cyclic prefix.
    pub fn symbol_len(&self) -> usize {
        self.m + self.ncp
    }

    /// Constellation size, `2^bps`.
    pub fn constellation_size(&self) -> usize {
        1 << self.bps
    }

    /// Data symbols carried by one frame.
    pub fn data_symbols_per_frame(&self) -> usize {
        self.rows_per_frame * self.nc
    }
}

impl Default for OfdmConfig {
    fn default() -> Self {
        Self::mode_700d()
    }
}
