//! OFDM modem trace harness
//!
//! Modulates LDPC coded test frames, passes them through a channel with a
//! sample clock offset and a carrier frequency offset, demodulates and
//! decodes them frame by frame, and records every intermediate signal in an
//! Octave text file.

pub mod channel;
pub mod config;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod fec;
pub mod framing;
pub mod ldpc;
pub mod likelihood;
pub mod modem;
pub mod octave;
pub mod ofdm;
pub mod resample;
pub mod sim;
pub mod trace;

pub use channel::{Awgn, ChannelSimulator, FreqShifter};
pub use config::OfdmConfig;
pub use decoder::{FrameDecoder, FrameRecord, RxMode};
pub use error::{Error, Result};
pub use fec::Fec;
pub use framing::FecMode;
pub use ldpc::IraLdpc;
pub use modem::{DemodState, Modem};
pub use ofdm::OfdmModem;
pub use sim::{SimConfig, SimReport, Simulation};
pub use trace::TraceLog;

// Run configuration
pub const NFRAMES: usize = 10;
pub const SAMPLE_CLOCK_OFFSET_PPM: f64 = 100.0;
pub const FOFF_HZ: f32 = 0.5;

// Coded block: (224,112) LDPC codeword
pub const CODED_BITS_PER_FRAME: usize = 224;
/// Es/No assumed by the soft decoder.
pub const ESNO: f32 = 10.0;

/// Scale from 16-bit capture samples back to modem amplitude.
pub const ASCALE: f32 = 2e5 * 1.1491 / 2.0;

pub const TRACE_FILE: &str = "tofdm_out.txt";
