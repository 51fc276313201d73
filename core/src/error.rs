use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Frame bit bookkeeping mismatch: {0}")]
    ConfigMismatch(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Buffer overrun: {0}")]
    BufferOverrun(String),

    #[error("Invalid input size: expected {expected}, got {actual}")]
    InvalidInputSize { expected: usize, actual: usize },

    #[error("Trace entry {name} expects {expected} elements, got {actual}")]
    TraceShape {
        name: String,
        expected: usize,
        actual: usize,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
