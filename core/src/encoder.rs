use crate::error::{Error, Result};
use crate::fec::Fec;
use crate::framing::{FecMode, FrameAssembler};
use crate::modem::Modem;
use rustfft::num_complex::Complex32;

/// Transmit side of a run: every frame's bits and samples, concatenated.
#[derive(Debug, Clone, Default)]
pub struct TxOutput {
    pub tx_bits: Vec<bool>,
    pub tx: Vec<Complex32>,
}

/// Modulates the same payload into a fixed number of frames.
pub struct TxPass {
    assembler: FrameAssembler,
    mode: FecMode,
    frames: usize,
}

impl TxPass {
    pub fn new(assembler: FrameAssembler, mode: FecMode, frames: usize) -> Self {
        Self {
            assembler,
            mode,
            frames,
        }
    }

    pub fn run(&self, modem: &mut dyn Modem, fec: &dyn Fec, payload: &[bool]) -> Result<TxOutput> {
        let config = *modem.config();
        let mut out = TxOutput {
            tx_bits: Vec::with_capacity(config.bits_per_frame * self.frames),
            tx: Vec::with_capacity(config.samples_per_frame * self.frames),
        };

        let frame_bits = self.assembler.assemble(payload, self.mode, fec)?;
        for f in 0..self.frames {
            let samples = modem.modulate(&frame_bits)?;
            if samples.len() != config.samples_per_frame {
                return Err(Error::ConfigMismatch(format!(
                    "frame {} modulated to {} samples, expected {}",
                    f,
                    samples.len(),
                    config.samples_per_frame
                )));
            }
            out.tx_bits.extend_from_slice(&frame_bits);
            out.tx.extend(samples);
        }

        log::info!(
            "modulated {} frames ({:?}), {} samples",
            self.frames,
            self.mode,
            out.tx.len()
        );
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framing::payload_bits;
    use crate::ldpc::IraLdpc;
    use crate::ofdm::OfdmModem;
    use crate::OfdmConfig;

    #[test]
    fn test_tx_lengths() {
        let mut modem = OfdmModem::new(OfdmConfig::mode_700d()).unwrap();
        let code = IraLdpc::hra_112_112().unwrap();
        let assembler = FrameAssembler::new(modem.config(), modem.tx_uw(), 224).unwrap();
        let pass = TxPass::new(assembler, FecMode::Ldpc, 3);

        let out = pass.run(&mut modem, &code, &payload_bits(112, 1)).unwrap();
        assert_eq!(out.tx_bits.len(), 3 * 238);
        assert_eq!(out.tx.len(), 3 * 1280);
        assert_eq!(&out.tx_bits[..238], &out.tx_bits[238..476]);
    }

    #[test]
    fn test_frames_start_with_unique_word() {
        let mut modem = OfdmModem::new(OfdmConfig::mode_700d()).unwrap();
        let uw = modem.tx_uw().to_vec();
        let code = IraLdpc::hra_112_112().unwrap();
        let assembler = FrameAssembler::new(modem.config(), &uw, 224).unwrap();
        let pass = TxPass::new(assembler, FecMode::Duplicate, 2);

        let out = pass.run(&mut modem, &code, &payload_bits(112, 2)).unwrap();
        for frame in out.tx_bits.chunks(238) {
            assert_eq!(&frame[..uw.len()], &uw[..]);
        }
    }
}
