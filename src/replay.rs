//! Standalone replay of saved inputs
//!
//! Outside the fuzzing engine, a crashing input saved by the fuzzer is
//! reproduced by reading the whole file into memory and handing it to the
//! same harness the fuzz target uses. The `fuzzbound-replay` binary is a thin
//! command-line wrapper over this module.

use crate::archive::ArchiveMode;
use crate::error::Result;
use crate::harness::{Harness, Outcome};
use std::fmt;
use std::io::{self, Write};
use std::path::Path;

/// Which harness an input is replayed against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// ZIP archive harness (streaming and indexed)
    Archive,
    /// XML harness
    Markup,
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Archive => write!(f, "archive"),
            Target::Markup => write!(f, "markup"),
        }
    }
}

/// Result of replaying one input
#[derive(Debug)]
pub struct Replay {
    /// Size of the replayed input in bytes
    pub size: usize,
    /// Status the entry point returned
    pub status: i32,
    /// Outcome of each pass, labelled by pass name
    pub passes: Vec<(String, Outcome)>,
}

impl Replay {
    /// Write the replay summary in the format the crash triage scripts expect
    pub fn write_summary<W: Write>(&self, out: &mut W, verbose: bool) -> io::Result<()> {
        writeln!(out, "Testing with input of size {} bytes", self.size)?;
        if verbose {
            for (label, outcome) in &self.passes {
                match outcome {
                    Outcome::Rejected(e) => writeln!(out, "  {}: rejected: {}", label, e)?,
                    Outcome::SetupFailed(e) => writeln!(out, "  {}: setup failed: {}", label, e)?,
                    Outcome::Completed(report) => writeln!(out, "  {}: {}", label, report)?,
                }
            }
        }
        writeln!(out, "Test completed with result: {}", self.status)
    }
}

/// Replay an in-memory input against `target`
pub fn replay_bytes(harness: &Harness<'_>, target: Target, data: &[u8]) -> Replay {
    let passes: Vec<(String, Outcome)> = match target {
        Target::Archive => ArchiveMode::ALL
            .into_iter()
            .map(|mode| (mode.to_string(), harness.run_archive(data, mode)))
            .collect(),
        Target::Markup => vec![("markup".to_string(), harness.run_markup(data))],
    };
    let status = passes
        .iter()
        .map(|(_, outcome)| outcome.status())
        .find(|&status| status != 0)
        .unwrap_or(0);

    Replay {
        size: data.len(),
        status,
        passes,
    }
}

/// Read the file at `path` and replay it against `target`
///
/// Fails only when the file cannot be read; everything the harness
/// encounters is part of the returned [`Replay`].
pub fn replay_file<P: AsRef<Path>>(
    harness: &Harness<'_>,
    target: Target,
    path: P,
) -> Result<Replay> {
    let data = std::fs::read(path)?;
    Ok(replay_bytes(harness, target, &data))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replay_markup_summary() {
        let harness = Harness::default();
        let replay = replay_bytes(&harness, Target::Markup, b"<a>hi</a>");
        assert_eq!(replay.size, 9);
        assert_eq!(replay.status, 0);
        assert_eq!(replay.passes.len(), 1);

        let mut out = Vec::new();
        replay.write_summary(&mut out, false).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            "Testing with input of size 9 bytes\nTest completed with result: 0\n"
        );
    }

    #[test]
    fn test_replay_archive_runs_both_modes() {
        let harness = Harness::default();
        let replay = replay_bytes(&harness, Target::Archive, b"definitely not an archive");
        let labels: Vec<&str> = replay.passes.iter().map(|(l, _)| l.as_str()).collect();
        assert_eq!(labels, vec!["streaming", "indexed"]);

        let mut out = Vec::new();
        replay.write_summary(&mut out, true).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("streaming: 0 units"));
        assert!(text.contains("parse error"));
    }

    #[test]
    fn test_replay_missing_file() {
        let harness = Harness::default();
        let err = replay_file(&harness, Target::Markup, "/nonexistent/fuzzbound/input").unwrap_err();
        assert_eq!(err.code(), "E1001");
    }

    #[test]
    fn test_target_display() {
        assert_eq!(Target::Archive.to_string(), "archive");
        assert_eq!(Target::Markup.to_string(), "markup");
    }
}
