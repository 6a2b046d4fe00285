//! Traversal bookkeeping shared by the archive and markup drivers
//!
//! A traversal repeatedly asks a wrapped parser for its next structural unit
//! (an archive entry or a document node) and stops on the first terminal
//! condition: end of input, a parse error, a self-imposed cap, or a
//! cancellation requested by the [`Visitor`].

use crate::archive::{ArchiveSummary, EntryInfo};
use crate::error::Error;
use crate::limits::Limits;
use crate::markup::Node;
use crate::stream::StreamStats;
use std::fmt;
use std::ops::ControlFlow;

/// Which cap ended a traversal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cap {
    /// Archive entry count reached `max_units`
    Units,
    /// Markup node count reached `max_nodes`
    Nodes,
}

/// Why a traversal stopped
#[derive(Debug)]
pub enum Exit {
    /// The parser reported no further units
    EndOfInput,
    /// The parser reported malformed input
    ParseError(Error),
    /// A self-imposed cap was hit before the input was exhausted
    CapReached(Cap),
    /// A visitor callback asked to stop
    Cancelled,
}

impl Exit {
    /// True for [`Exit::EndOfInput`]
    pub fn is_end_of_input(&self) -> bool {
        matches!(self, Exit::EndOfInput)
    }

    /// True for [`Exit::ParseError`]
    pub fn is_parse_error(&self) -> bool {
        matches!(self, Exit::ParseError(_))
    }

    /// The cap that was reached, if any
    pub fn cap(&self) -> Option<Cap> {
        match self {
            Exit::CapReached(cap) => Some(*cap),
            _ => None,
        }
    }
}

impl fmt::Display for Exit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Exit::EndOfInput => write!(f, "end of input"),
            Exit::ParseError(e) => write!(f, "parse error: {}", e),
            Exit::CapReached(Cap::Units) => write!(f, "unit cap reached"),
            Exit::CapReached(Cap::Nodes) => write!(f, "node cap reached"),
            Exit::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Callbacks invoked during a traversal
///
/// Every callback returns [`ControlFlow`]; the driver checks the result after
/// each call and ends the traversal with [`Exit::Cancelled`] on `Break`,
/// still tearing down the session and stream normally. All methods default
/// to `Continue`, so an implementor only overrides what it observes.
pub trait Visitor {
    /// Called once after an indexed archive's central directory is read
    fn archive(&mut self, _summary: &ArchiveSummary) -> ControlFlow<()> {
        ControlFlow::Continue(())
    }

    /// Called once per archive entry after its metadata has been read
    fn entry(&mut self, _entry: &EntryInfo) -> ControlFlow<()> {
        ControlFlow::Continue(())
    }

    /// Called for each payload chunk pulled from the current entry
    ///
    /// `offset` is the logical offset of the chunk within the entry.
    fn payload(&mut self, _chunk: &[u8], _offset: u64) -> ControlFlow<()> {
        ControlFlow::Continue(())
    }

    /// Called once per markup node in document order
    fn node(&mut self, _node: &Node<'_>) -> ControlFlow<()> {
        ControlFlow::Continue(())
    }
}

/// Visitor that observes nothing; used by the fuzz entry points
#[derive(Debug, Default, Clone, Copy)]
pub struct Exercise;

impl Visitor for Exercise {}

/// Mutable counters for one traversal
#[derive(Debug)]
pub(crate) struct TraversalState<'l> {
    limits: &'l Limits,
    units_visited: usize,
    bytes_read_this_unit: usize,
    payload_bytes: u64,
    max_unit_payload: usize,
    sublist_items: usize,
    payload_errors: usize,
}

impl<'l> TraversalState<'l> {
    pub(crate) fn new(limits: &'l Limits) -> Self {
        Self {
            limits,
            units_visited: 0,
            bytes_read_this_unit: 0,
            payload_bytes: 0,
            max_unit_payload: 0,
            sublist_items: 0,
            payload_errors: 0,
        }
    }

    pub(crate) fn limits(&self) -> &'l Limits {
        self.limits
    }

    /// Count a new unit, or report the cap if counting it would exceed `cap`
    pub(crate) fn enter_unit(&mut self, cap: Option<usize>) -> ControlFlow<()> {
        if let Some(cap) = cap {
            if self.units_visited >= cap {
                return ControlFlow::Break(());
            }
        }
        self.units_visited += 1;
        self.bytes_read_this_unit = 0;
        ControlFlow::Continue(())
    }

    /// Bytes still allowed for the current unit's payload
    pub(crate) fn payload_budget(&self) -> usize {
        self.limits
            .max_bytes_per_unit()
            .saturating_sub(self.bytes_read_this_unit)
    }

    pub(crate) fn record_payload(&mut self, len: usize) {
        self.bytes_read_this_unit += len;
        self.payload_bytes += len as u64;
        self.max_unit_payload = self.max_unit_payload.max(self.bytes_read_this_unit);
    }

    pub(crate) fn record_payload_error(&mut self) {
        self.payload_errors += 1;
    }

    pub(crate) fn record_sublist_item(&mut self) {
        self.sublist_items += 1;
    }

    pub(crate) fn finish(self, exit: Exit, stream: StreamStats) -> TraversalReport {
        log::trace!(
            "traversal finished after {} units: {}",
            self.units_visited,
            exit
        );
        TraversalReport {
            units_visited: self.units_visited,
            payload_bytes: self.payload_bytes,
            max_unit_payload: self.max_unit_payload,
            sublist_items: self.sublist_items,
            payload_errors: self.payload_errors,
            exit,
            stream,
        }
    }
}

/// Summary of one completed traversal
#[derive(Debug)]
pub struct TraversalReport {
    /// Units (entries or nodes) inspected
    pub units_visited: usize,
    /// Payload bytes pulled across all units
    pub payload_bytes: u64,
    /// Largest payload pulled from a single unit
    pub max_unit_payload: usize,
    /// Sub-list items inspected (extra fields, attributes)
    pub sublist_items: usize,
    /// Payload pulls that ended in an error
    pub payload_errors: usize,
    /// Why the traversal stopped
    pub exit: Exit,
    /// How the stream adapter was consumed
    pub stream: StreamStats,
}

impl fmt::Display for TraversalReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} units, {} payload bytes (max {} per unit), {} sub-list items, {} bytes streamed in {} reads: {}",
            self.units_visited,
            self.payload_bytes,
            self.max_unit_payload,
            self.sublist_items,
            self.stream.bytes_served,
            self.stream.reads,
            self.exit
        )
    }
}
