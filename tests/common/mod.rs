//! Shared fixtures for the integration tests
//!
//! Archives are built in memory with `ZipWriter` so every test states the
//! exact entries it feeds to the harness.

#![allow(dead_code)]

use fuzzbound::{ArchiveSummary, EntryInfo, Node, NodeKind, Visitor};
use std::io::{Cursor, Write};
use std::ops::ControlFlow;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime};

/// Options for uncompressed entries
pub fn stored() -> SimpleFileOptions {
    SimpleFileOptions::default().compression_method(CompressionMethod::Stored)
}

/// Options for deflated entries
pub fn deflated() -> SimpleFileOptions {
    SimpleFileOptions::default().compression_method(CompressionMethod::Deflated)
}

/// Build an archive of stored files from `(name, contents)` pairs
pub fn archive_of(files: &[(&str, &[u8])]) -> Vec<u8> {
    build_archive(|zip| {
        for (name, contents) in files {
            zip.start_file(*name, stored()).unwrap();
            zip.write_all(contents).unwrap();
        }
    })
}

/// Build an archive with `count` empty stored files
pub fn archive_with_entries(count: usize) -> Vec<u8> {
    build_archive(|zip| {
        for i in 0..count {
            zip.start_file(format!("f{}", i), stored()).unwrap();
        }
    })
}

/// Run `fill` against a fresh writer and return the finished archive bytes
pub fn build_archive<F>(fill: F) -> Vec<u8>
where
    F: FnOnce(&mut ZipWriter<Cursor<Vec<u8>>>),
{
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    fill(&mut zip);
    zip.finish().unwrap().into_inner()
}

/// A fixed, writable modification time
pub fn fixed_time() -> DateTime {
    DateTime::from_date_and_time(2020, 5, 17, 10, 30, 0).unwrap()
}

/// Visitor that records everything it is shown
#[derive(Debug, Default)]
pub struct Recorder {
    pub summaries: Vec<ArchiveSummary>,
    pub entries: Vec<EntryInfo>,
    pub payload: Vec<u8>,
    pub chunks: usize,
    pub nodes: Vec<(NodeKind, usize, String)>,
}

impl Visitor for Recorder {
    fn archive(&mut self, summary: &ArchiveSummary) -> ControlFlow<()> {
        self.summaries.push(*summary);
        ControlFlow::Continue(())
    }

    fn entry(&mut self, entry: &EntryInfo) -> ControlFlow<()> {
        self.entries.push(entry.clone());
        ControlFlow::Continue(())
    }

    fn payload(&mut self, chunk: &[u8], _offset: u64) -> ControlFlow<()> {
        self.chunks += 1;
        self.payload.extend_from_slice(chunk);
        ControlFlow::Continue(())
    }

    fn node(&mut self, node: &Node<'_>) -> ControlFlow<()> {
        let label = node
            .element_name()
            .or_else(|| node.text())
            .or_else(|| node.resolved())
            .unwrap_or_default()
            .to_string();
        self.nodes.push((node.kind(), node.depth, label));
        ControlFlow::Continue(())
    }
}

/// Visitor that cancels once it has seen `after` units
#[derive(Debug)]
pub struct CancelAfter {
    pub after: usize,
    pub seen: usize,
}

impl CancelAfter {
    pub fn new(after: usize) -> Self {
        Self { after, seen: 0 }
    }

    fn tick(&mut self) -> ControlFlow<()> {
        self.seen += 1;
        if self.seen >= self.after {
            ControlFlow::Break(())
        } else {
            ControlFlow::Continue(())
        }
    }
}

impl Visitor for CancelAfter {
    fn entry(&mut self, _entry: &EntryInfo) -> ControlFlow<()> {
        self.tick()
    }

    fn node(&mut self, _node: &Node<'_>) -> ControlFlow<()> {
        self.tick()
    }
}
