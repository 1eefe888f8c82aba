use std::io::{self, Write};

use crate::errors::ScanError;

/// Receives emitted targets and per-program skips, in discovery order.
pub trait TargetSink {
    /// A failed write means nobody is reading any more; scanners stop on it.
    fn emit(&mut self, target: &str) -> io::Result<()>;

    /// A program was dropped without aborting the scan.
    fn skipped(&mut self, program: &str, reason: &ScanError) {
        tracing::warn!(%program, %reason, "skipping program");
    }
}

/// One target per line, flushed per line so partial runs stay useful.
pub struct LineSink<W: Write> {
    out: W,
}

impl<W: Write> LineSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> TargetSink for LineSink<W> {
    fn emit(&mut self, target: &str) -> io::Result<()> {
        writeln!(self.out, "{}", target)?;
        self.out.flush()
    }
}

pub type StdoutSink = LineSink<io::Stdout>;

impl Default for StdoutSink {
    fn default() -> Self {
        LineSink::new(io::stdout())
    }
}

/// Collects everything in memory.
#[derive(Debug, Default)]
pub struct VecSink {
    pub targets: Vec<String>,
    pub skipped: Vec<(String, String)>,
}

impl TargetSink for VecSink {
    fn emit(&mut self, target: &str) -> io::Result<()> {
        self.targets.push(target.to_string());
        Ok(())
    }

    fn skipped(&mut self, program: &str, reason: &ScanError) {
        self.skipped.push((program.to_string(), reason.to_string()));
    }
}
