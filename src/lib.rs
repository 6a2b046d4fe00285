//! # fuzzbound
//!
//! Bounded fuzzing harnesses for a ZIP archive reader and an XML reader.
//!
//! Each harness takes an untrusted byte buffer, presents it to the wrapped
//! library through a bounded in-memory stream, and walks whatever structure
//! the library produces under fixed caps, so that a coverage-guided fuzzer
//! can explore the library's parsing paths without a single input causing
//! unbounded work.
//!
//! ## Features
//!
//! - No unsafe code
//! - Chunked in-memory stream adapter (`Read`, `BufRead`, `Seek`)
//! - Archive traversal in streaming and central-directory modes
//! - Pre-order XML node walk with per-kind accessor dispatch
//! - Caps on entries, payload bytes, attributes and extra fields
//! - Resource leases released on every exit path, auditable with a ledger
//!
//! ## Example
//!
//! ```
//! use fuzzbound::{Harness, Limits, NodeKind, Node, Visitor};
//! use std::ops::ControlFlow;
//!
//! struct Kinds(Vec<NodeKind>);
//!
//! impl Visitor for Kinds {
//!     fn node(&mut self, node: &Node<'_>) -> ControlFlow<()> {
//!         self.0.push(node.kind());
//!         ControlFlow::Continue(())
//!     }
//! }
//!
//! let mut kinds = Kinds(Vec::new());
//! let outcome = Harness::new(Limits::new()).run_markup_with(b"<a>hi</a>", &mut kinds);
//!
//! assert!(outcome.report().unwrap().exit.is_end_of_input());
//! assert_eq!(kinds.0, vec![NodeKind::Element, NodeKind::Text]);
//! ```
//!
//! Fuzz targets call the plain entry points instead:
//!
//! ```
//! assert_eq!(fuzzbound::fuzz_archive(b"PK\x05\x06"), 0);
//! assert_eq!(fuzzbound::fuzz_markup(b"<?xml version='1.0'?><r/>"), 0);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod archive;
pub mod error;
pub mod harness;
pub mod limits;
pub mod markup;
pub mod replay;
pub mod session;
pub mod stream;
pub mod traversal;

pub use archive::{ArchiveMode, ArchiveSummary, EntryInfo, EntryKind, Timestamp};
pub use error::{Error, Result};
pub use harness::{Harness, Outcome, fuzz_archive, fuzz_markup};
pub use limits::{
    Limits, MAX_ATTRIBUTES, MAX_BYTES_PER_UNIT, MAX_CHUNK, MAX_EXTRA_FIELDS, MAX_INPUT_LEN,
    MAX_UNITS, MIN_INPUT_LEN,
};
pub use markup::{Attribute, Node, NodeData, NodeKind};
pub use session::{Lease, ResourceKind, ResourceLedger, Session};
pub use stream::{MemoryStream, StreamStats};
pub use traversal::{Cap, Exercise, Exit, TraversalReport, Visitor};
