//! Harness runs: size gate, stream, session, traversal, teardown
//!
//! A [`Harness`] owns the [`Limits`] for a run and, optionally, a
//! [`ResourceLedger`] that audits every acquisition. Each `run_*` method
//! performs one complete invocation and reports what happened as an
//! [`Outcome`]; the stream and session are released on every path before it
//! returns.

use crate::archive::{self, ArchiveMode};
use crate::error::{Error, Result};
use crate::limits::Limits;
use crate::markup;
use crate::session::ResourceLedger;
use crate::stream::MemoryStream;
use crate::traversal::{Exercise, Exit, TraversalReport, TraversalState, Visitor};

/// Result of one harness invocation
#[derive(Debug)]
pub enum Outcome {
    /// The size gate rejected the input; nothing was acquired
    Rejected(Error),
    /// The stream or session could not be set up; partial acquisitions were released
    SetupFailed(Error),
    /// A traversal ran to one of its terminal conditions
    Completed(TraversalReport),
}

impl Outcome {
    /// The traversal report, when a traversal ran
    pub fn report(&self) -> Option<&TraversalReport> {
        match self {
            Outcome::Completed(report) => Some(report),
            _ => None,
        }
    }

    /// Consume the outcome and return the traversal report, if any
    pub fn into_report(self) -> Option<TraversalReport> {
        match self {
            Outcome::Completed(report) => Some(report),
            _ => None,
        }
    }

    /// True when the size gate rejected the input
    pub fn is_rejected(&self) -> bool {
        matches!(self, Outcome::Rejected(_))
    }

    /// True when setup failed
    pub fn is_setup_failure(&self) -> bool {
        matches!(self, Outcome::SetupFailed(_))
    }

    /// Status code handed back to the fuzzing engine
    ///
    /// Always 0: the engine learns about defects from crashes, never from
    /// the return value.
    pub fn status(&self) -> i32 {
        0
    }
}

/// Configured harness for archive and markup inputs
///
/// # Example
///
/// ```
/// use fuzzbound::{ArchiveMode, Harness, Limits};
///
/// let harness = Harness::new(Limits::new().with_max_units(10));
/// let outcome = harness.run_archive(b"not a zip archive", ArchiveMode::Streaming);
/// let report = outcome.report().expect("input passes the size gate");
/// assert!(report.exit.is_parse_error());
/// assert_eq!(report.units_visited, 0);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Harness<'l> {
    limits: Limits,
    ledger: Option<&'l ResourceLedger>,
}

impl<'l> Harness<'l> {
    /// Create a harness with the given limits and no ledger
    pub fn new(limits: Limits) -> Self {
        Self {
            limits,
            ledger: None,
        }
    }

    /// Record every acquisition and release in `ledger`
    pub fn with_ledger(mut self, ledger: &'l ResourceLedger) -> Self {
        self.ledger = Some(ledger);
        self
    }

    /// Limits applied to each run
    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    /// Run the archive traversal in `mode` over `data`
    pub fn run_archive(&self, data: &[u8], mode: ArchiveMode) -> Outcome {
        self.run_archive_with(data, mode, &mut Exercise)
    }

    /// Run the archive traversal in `mode`, reporting units to `visitor`
    pub fn run_archive_with<V: Visitor>(
        &self,
        data: &[u8],
        mode: ArchiveMode,
        visitor: &mut V,
    ) -> Outcome {
        self.run(data, |stream, state, ledger| {
            archive::traverse(stream, mode, state, ledger, visitor)
        })
    }

    /// Run the markup walk over `data`
    pub fn run_markup(&self, data: &[u8]) -> Outcome {
        self.run_markup_with(data, &mut Exercise)
    }

    /// Run the markup walk, reporting nodes to `visitor`
    pub fn run_markup_with<V: Visitor>(&self, data: &[u8], visitor: &mut V) -> Outcome {
        self.run(data, |stream, state, ledger| {
            markup::traverse(stream, state, ledger, visitor)
        })
    }

    fn run<F>(&self, data: &[u8], drive: F) -> Outcome
    where
        F: FnOnce(&mut MemoryStream<'_>, &mut TraversalState<'_>, Option<&ResourceLedger>) -> Result<Exit>,
    {
        if let Err(e) = self.limits.check_input(data) {
            return Outcome::Rejected(e);
        }

        let mut stream = match MemoryStream::open(data, &self.limits, self.ledger) {
            Ok(stream) => stream,
            Err(e) => {
                log::debug!("stream setup failed: {}", e);
                return Outcome::SetupFailed(e);
            }
        };

        let mut state = TraversalState::new(&self.limits);
        let exit = match drive(&mut stream, &mut state, self.ledger) {
            Ok(exit) => exit,
            Err(e) => {
                log::debug!("session setup failed: {}", e);
                // The stream is released when it goes out of scope here.
                return Outcome::SetupFailed(e);
            }
        };

        match stream.close() {
            Ok(stats) => Outcome::Completed(state.finish(exit, stats)),
            Err(e) => Outcome::SetupFailed(e),
        }
    }
}

/// Fuzz entry point for archive inputs
///
/// Runs the streaming traversal and then the indexed traversal with the
/// reference limits. Always returns 0.
pub fn fuzz_archive(data: &[u8]) -> i32 {
    let harness = Harness::default();
    for mode in ArchiveMode::ALL {
        let _ = harness.run_archive(data, mode);
    }
    0
}

/// Fuzz entry point for markup inputs
///
/// Runs the markup walk with the reference limits. Always returns 0.
pub fn fuzz_markup(data: &[u8]) -> i32 {
    Harness::default().run_markup(data).status()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::ResourceKind;

    #[test]
    fn test_rejected_inputs_acquire_nothing() {
        let ledger = ResourceLedger::new();
        let harness = Harness::default().with_ledger(&ledger);

        assert!(harness.run_markup(&[]).is_rejected());
        assert!(harness.run_markup(b"<a>").is_rejected());
        assert!(
            harness
                .run_archive(&vec![0u8; 1024 * 1024 + 1], ArchiveMode::Streaming)
                .is_rejected()
        );
        assert_eq!(ledger.total_acquired(), 0);
    }

    #[test]
    fn test_invalid_limits_are_setup_failures() {
        let ledger = ResourceLedger::new();
        let harness = Harness::new(Limits::new().with_max_chunk(0)).with_ledger(&ledger);
        let outcome = harness.run_markup(b"<a>hi</a>");
        assert!(outcome.is_setup_failure());
        assert_eq!(outcome.status(), 0);
        assert_eq!(ledger.total_acquired(), 0);
    }

    #[test]
    fn test_refused_session_releases_stream() {
        let ledger = ResourceLedger::failing(ResourceKind::Session);
        let harness = Harness::default().with_ledger(&ledger);
        assert!(harness.run_markup(b"<a>hi</a>").is_setup_failure());
        assert_eq!(ledger.acquired(ResourceKind::Stream), 1);
        assert_eq!(ledger.released(ResourceKind::Stream), 1);
        assert!(ledger.is_balanced());
    }

    #[test]
    fn test_entry_points_return_zero() {
        assert_eq!(fuzz_archive(b""), 0);
        assert_eq!(fuzz_archive(b"PK\x03\x04garbage"), 0);
        assert_eq!(fuzz_markup(b"<<<>>>"), 0);
        assert_eq!(fuzz_markup(b"<a>hi</a>"), 0);
    }
}
