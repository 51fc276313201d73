//! Octave text format writer (`load`-able matrices).

use crate::error::{Error, Result};
use rustfft::num_complex::Complex32;
use std::io::Write;

pub struct OctaveWriter<W: Write> {
    out: W,
}

impl<W: Write> OctaveWriter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// Comment line at the top of the file.
    pub fn header(&mut self, creator: &str) -> Result<()> {
        writeln!(self.out, "# Created by {}", creator)?;
        Ok(())
    }

    pub fn save_int(&mut self, name: &str, data: &[i32], rows: usize, cols: usize) -> Result<()> {
        self.save(name, "matrix", data, rows, cols, |v| v.to_string())
    }

    pub fn save_float(&mut self, name: &str, data: &[f32], rows: usize, cols: usize) -> Result<()> {
        self.save(name, "matrix", data, rows, cols, |v| v.to_string())
    }

    pub fn save_complex(
        &mut self,
        name: &str,
        data: &[Complex32],
        rows: usize,
        cols: usize,
    ) -> Result<()> {
        self.save(name, "complex matrix", data, rows, cols, |v| {
            format!("({},{})", v.re, v.im)
        })
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn save<T, F>(
        &mut self,
        name: &str,
        kind: &str,
        data: &[T],
        rows: usize,
        cols: usize,
        fmt: F,
    ) -> Result<()>
    where
        F: Fn(&T) -> String,
    {
        if data.len() != rows * cols {
            return Err(Error::TraceShape {
                name: name.to_string(),
                expected: rows * cols,
                actual: data.len(),
            });
        }

        writeln!(self.out, "# name: {}", name)?;
        writeln!(self.out, "# type: {}", kind)?;
        writeln!(self.out, "# rows: {}", rows)?;
        writeln!(self.out, "# columns: {}", cols)?;
        if cols > 0 {
            for row in data.chunks(cols) {
                for v in row {
                    write!(self.out, " {}", fmt(v))?;
                }
                writeln!(self.out)?;
            }
        }
        write!(self.out, "\n\n")?;
        Ok(())
    }
}
