pub mod bugcrowd;
pub mod hackerone;

pub use bugcrowd::BugcrowdScanner;
pub use hackerone::HackerOneScanner;

use crate::config::IncludeCap;
use crate::errors::{ScanError, ScanResult};
use crate::output::TargetSink;

/// Result of scanning one program's scope document.
#[derive(Debug)]
pub enum ProgramOutcome {
    Yielded(usize),
    Empty,
    /// The program could not be resolved; the scan moves on.
    Skipped(ScanError),
}

impl ProgramOutcome {
    pub fn from_count(n: usize) -> Self {
        if n > 0 { ProgramOutcome::Yielded(n) } else { ProgramOutcome::Empty }
    }

    pub fn yielded(&self) -> bool {
        matches!(self, ProgramOutcome::Yielded(_))
    }
}

/// `maxPrograms` accounting: only programs that emitted at least one target count.
#[derive(Debug, Clone)]
pub struct ProgramCap {
    max: u32,
    yielded: u32,
}

impl ProgramCap {
    /// `max == 0` never trips.
    pub fn new(max: u32) -> Self {
        Self { max, yielded: 0 }
    }

    pub fn reached(&self) -> bool {
        self.max != 0 && self.yielded >= self.max
    }

    /// Record a finished program; true once the cap is hit.
    pub fn record(&mut self, yielded: bool) -> bool {
        if yielded {
            self.yielded += 1;
        }
        self.reached()
    }

    /// Same as [`record`](Self::record) but for an explicit include list.
    pub fn record_included(&mut self, policy: IncludeCap, yielded: bool) -> bool {
        match policy {
            IncludeCap::Ignore => false,
            IncludeCap::First => self.max != 0 && yielded,
            IncludeCap::Count => self.record(yielded),
        }
    }
}

/// Totals for one platform scan.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ScanSummary {
    pub programs: usize,
    pub programs_yielded: usize,
    pub targets: usize,
    pub skipped: usize,
    pub capped: bool,
}

impl ScanSummary {
    /// Fold one program in, forwarding a skip to the sink.
    pub(crate) fn record(&mut self, program: &str, outcome: ProgramOutcome, sink: &mut dyn TargetSink) -> bool {
        self.programs += 1;
        match outcome {
            ProgramOutcome::Yielded(n) => {
                self.programs_yielded += 1;
                self.targets += n;
                true
            }
            ProgramOutcome::Empty => false,
            ProgramOutcome::Skipped(reason) => {
                self.skipped += 1;
                sink.skipped(program, &reason);
                false
            }
        }
    }
}

/// Emit each target, returning how many went out. Stops at the first failed write.
pub(crate) fn emit_all(sink: &mut dyn TargetSink, targets: Vec<String>) -> ScanResult<usize> {
    let mut n = 0;
    for t in targets {
        sink.emit(&t).map_err(ScanError::Output)?;
        n += 1;
    }
    Ok(n)
}
