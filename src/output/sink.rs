//! Result sinks
//!
//! The host program consumes the result stream until it closes and hands
//! each record to a [`ResultWriter`].

use crate::crawler::CrawlResult;
use crate::CrawlError;
use std::io::Write;

/// How result records are rendered
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum ResultFormat {
    /// `Result: <url>` per line
    #[default]
    Text,
    /// One JSON object per line
    Json,
}

/// Writes result records to any `Write` destination
pub struct ResultWriter<W: Write> {
    out: W,
    format: ResultFormat,
    written: u64,
}

impl<W: Write> ResultWriter<W> {
    pub fn new(out: W, format: ResultFormat) -> Self {
        Self {
            out,
            format,
            written: 0,
        }
    }

    /// Writes one record and flushes so lines show up as results arrive
    pub fn write(&mut self, result: &CrawlResult) -> Result<(), CrawlError> {
        match self.format {
            ResultFormat::Text => writeln!(self.out, "Result: {}", result.url)?,
            ResultFormat::Json => {
                serde_json::to_writer(&mut self.out, result).map_err(std::io::Error::from)?;
                writeln!(self.out)?;
            }
        }
        self.out.flush()?;
        self.written += 1;
        Ok(())
    }

    /// Number of records written so far
    pub fn written(&self) -> u64 {
        self.written
    }

    /// Returns the underlying writer
    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }
}
