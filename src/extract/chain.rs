use crate::time::Timestamp;
use std::io::{self, Write};
use tracing::debug;

/// Header line that opens a block in a consolidated data file.
pub const BLOCK_HEADER: &str = "RUN: ";

/// Writes one block of a consolidated data file.
///
/// Every row spans two consecutive markers, so the timestamp that closes a row
/// is written again as the first field of the next one:
///
/// ```text
/// RUN:
/// +0.000000ns,+1500000000.000000ns
/// +1500000000.000000ns,+3000000000.000000ns
/// ```
///
/// The writer keeps the open row's start as its pending state instead of
/// leaving half-written lines in the output.
pub struct ChainWriter<W: Write> {
    out: W,
    header_written: bool,
    open: Option<Timestamp>,
    rows: usize,
}

impl<W: Write> ChainWriter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            header_written: false,
            open: None,
            rows: 0,
        }
    }

    /// A run-start marker: closes the open row (if any) and opens a new one.
    pub fn run_start(&mut self, ts: Timestamp) -> io::Result<()> {
        if !self.header_written {
            write!(self.out, "\n{}\n", BLOCK_HEADER)?;
            self.header_written = true;
        }
        if let Some(start) = self.open.take() {
            self.write_row(start, ts)?;
        }
        self.open = Some(ts);
        Ok(())
    }

    /// The completion marker: closes the open row without opening another.
    pub fn all_done(&mut self, ts: Timestamp) -> io::Result<()> {
        match self.open.take() {
            Some(start) => self.write_row(start, ts),
            None => {
                debug!("completion marker at {} without an open row, ignored", ts);
                Ok(())
            }
        }
    }

    /// Flush the block and return the number of rows written. A row that was
    /// opened but never closed (truncated run) is dropped.
    pub fn finish(mut self) -> io::Result<usize> {
        if let Some(start) = self.open.take() {
            debug!("dropping unterminated row starting at {}", start);
        }
        self.out.flush()?;
        Ok(self.rows)
    }

    fn write_row(&mut self, start: Timestamp, end: Timestamp) -> io::Result<()> {
        writeln!(self.out, "{},{}", start, end)?;
        self.rows += 1;
        Ok(())
    }
}
