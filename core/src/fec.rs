use crate::error::Result;

/// Result of one iterative decode.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodeOutcome {
    /// Hard decisions for the whole codeword, data bits first.
    pub bits: Vec<bool>,
    /// Parity checks satisfied by `bits`.
    pub parity_checks: usize,
    pub iterations: usize,
}

impl DecodeOutcome {
    pub fn converged(&self, parity_bits: usize) -> bool {
        self.parity_checks == parity_bits
    }
}

/// Systematic forward error correction with soft-decision decoding.
///
/// LLRs follow the `ln P(0) - ln P(1)` convention: positive favours 0.
pub trait Fec {
    fn data_bits(&self) -> usize;

    fn parity_bits(&self) -> usize;

    fn code_length(&self) -> usize {
        self.data_bits() + self.parity_bits()
    }

    /// Parity bits for `data` (exactly `data_bits()` long).
    fn encode(&self, data: &[bool]) -> Result<Vec<bool>>;

    fn decode(&self, llr: &[f32], max_iter: usize) -> Result<DecodeOutcome>;
}
