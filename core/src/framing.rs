//! Modem frame layout: unique word, auxiliary text bits, coded block.

use crate::config::OfdmConfig;
use crate::error::{Error, Result};
use crate::fec::Fec;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// What fills the coded block of each frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FecMode {
    /// Payload followed by its LDPC parity.
    Ldpc,
    /// Payload sent twice; fills the frame with no coding gain.
    Duplicate,
}

/// Offset in symbols of the coded block, `(nuw_bits + ntxt_bits) / bps`.
///
/// The header must end on a symbol boundary, otherwise the coded block
/// cannot be cut out of the demodulated symbols.
pub fn coded_block_offset(nuw_bits: usize, ntxt_bits: usize, bps: usize) -> Result<usize> {
    let header = nuw_bits + ntxt_bits;
    if bps == 0 || header % bps != 0 {
        return Err(Error::ConfigMismatch(format!(
            "{} header bits do not fill whole {} bit symbols",
            header, bps
        )));
    }
    Ok(header / bps)
}

/// Deterministic payload bits from `seed`.
pub fn payload_bits(len: usize, seed: u64) -> Vec<bool> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..len).map(|_| rng.gen()).collect()
}

/// Builds transmit frames and locates the coded block in received ones.
#[derive(Debug, Clone)]
pub struct FrameAssembler {
    uw: Vec<bool>,
    ntxt_bits: usize,
    coded_bits: usize,
    bits_per_frame: usize,
    bps: usize,
    symbol_offset: usize,
}

impl FrameAssembler {
    pub fn new(config: &OfdmConfig, uw: &[bool], coded_bits: usize) -> Result<Self> {
        if uw.len() != config.nuw_bits {
            return Err(Error::ConfigMismatch(format!(
                "unique word has {} bits, frame expects {}",
                uw.len(),
                config.nuw_bits
            )));
        }
        if config.nuw_bits + config.ntxt_bits + coded_bits != config.bits_per_frame {
            return Err(Error::ConfigMismatch(format!(
                "{} uw + {} txt + {} coded bits != {} bits per frame",
                config.nuw_bits, config.ntxt_bits, coded_bits, config.bits_per_frame
            )));
        }
        if coded_bits % 2 != 0 || coded_bits % config.bps != 0 {
            return Err(Error::ConfigMismatch(format!(
                "{} coded bits do not split into halves of whole symbols",
                coded_bits
            )));
        }
        let symbol_offset = coded_block_offset(config.nuw_bits, config.ntxt_bits, config.bps)?;

        Ok(Self {
            uw: uw.to_vec(),
            ntxt_bits: config.ntxt_bits,
            coded_bits,
            bits_per_frame: config.bits_per_frame,
            bps: config.bps,
            symbol_offset,
        })
    }

    /// Payload bits carried per frame, half the coded block.
    pub fn payload_bits(&self) -> usize {
        self.coded_bits / 2
    }

    pub fn coded_bit_offset(&self) -> usize {
        self.uw.len() + self.ntxt_bits
    }

    pub fn coded_symbol_offset(&self) -> usize {
        self.symbol_offset
    }

    pub fn coded_symbols(&self) -> usize {
        self.coded_bits / self.bps
    }

    /// Check that `fec` fits the coded block exactly.
    pub fn check_fec(&self, fec: &dyn Fec) -> Result<()> {
        if fec.data_bits() != self.payload_bits() || fec.code_length() != self.coded_bits {
            return Err(Error::ConfigMismatch(format!(
                "({},{}) code does not fill a {} bit coded block",
                fec.code_length(),
                fec.data_bits(),
                self.coded_bits
            )));
        }
        Ok(())
    }

    /// Lay out one frame: unique word, zeroed text bits, coded block.
    pub fn assemble(&self, payload: &[bool], mode: FecMode, fec: &dyn Fec) -> Result<Vec<bool>> {
        if payload.len() != self.payload_bits() {
            return Err(Error::InvalidInputSize {
                expected: self.payload_bits(),
                actual: payload.len(),
            });
        }

        let mut bits = Vec::with_capacity(self.bits_per_frame);
        bits.extend_from_slice(&self.uw);
        bits.extend(std::iter::repeat(false).take(self.ntxt_bits));
        bits.extend_from_slice(payload);
        match mode {
            FecMode::Ldpc => {
                self.check_fec(fec)?;
                bits.extend(fec.encode(payload)?);
            }
            FecMode::Duplicate => bits.extend_from_slice(payload),
        }

        if bits.len() != self.bits_per_frame {
            return Err(Error::ConfigMismatch(format!(
                "assembled {} bits, frame holds {}",
                bits.len(),
                self.bits_per_frame
            )));
        }
        Ok(bits)
    }

    /// The coded block of a received frame.
    pub fn coded_block<'a>(&self, frame_bits: &'a [bool]) -> Result<&'a [bool]> {
        if frame_bits.len() != self.bits_per_frame {
            return Err(Error::InvalidInputSize {
                expected: self.bits_per_frame,
                actual: frame_bits.len(),
            });
        }
        Ok(&frame_bits[self.coded_bit_offset()..])
    }
}
