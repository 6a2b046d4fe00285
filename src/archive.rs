//! Bounded traversal of ZIP archives
//!
//! Two ways of walking an archive are supported, mirroring the two read
//! paths of the `zip` crate:
//!
//! - [`ArchiveMode::Streaming`] pulls local file headers one after another
//!   with `read_zipfile_from_stream`, never seeking backwards.
//! - [`ArchiveMode::Indexed`] parses the central directory through
//!   `ZipArchive` and then opens entries by index.
//!
//! For every entry the driver reads all metadata once, walks the extra-field
//! list under its own cap, pulls at most `max_bytes_per_unit` payload bytes
//! and then discards whatever payload remains so the next header is read in
//! sync.

use crate::error::{Error, Result};
use crate::session::{Lease, ResourceKind, ResourceLedger, Session};
use crate::stream::MemoryStream;
use crate::traversal::{Cap, Exit, TraversalState, Visitor};
use std::fmt;
use std::io::{ErrorKind, Read};
use std::ops::ControlFlow;
use zip::extra_fields::ExtraField;
use zip::read::{ZipFile, read_zipfile_from_stream};
use zip::{CompressionMethod, ZipArchive};

/// Scratch size for a single payload pull
const PAYLOAD_PULL: usize = 4096;

/// Unix file-type mask and the types the driver distinguishes
const S_IFMT: u32 = 0o170_000;
const S_IFREG: u32 = 0o100_000;
const S_IFDIR: u32 = 0o040_000;
const S_IFLNK: u32 = 0o120_000;

/// How the archive is read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArchiveMode {
    /// Sequential local headers, forward-only
    Streaming,
    /// Central directory, entries opened by index
    Indexed,
}

impl ArchiveMode {
    /// Every mode, in the order the fuzz entry point runs them
    pub const ALL: [ArchiveMode; 2] = [ArchiveMode::Streaming, ArchiveMode::Indexed];
}

impl fmt::Display for ArchiveMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArchiveMode::Streaming => write!(f, "streaming"),
            ArchiveMode::Indexed => write!(f, "indexed"),
        }
    }
}

/// File type of an archive entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// Regular file
    Regular,
    /// Directory
    Directory,
    /// Symbolic link (payload is the link target)
    Symlink,
    /// Device, FIFO, socket or unknown
    Other,
}

impl EntryKind {
    fn classify(unix_mode: Option<u32>, is_dir: bool, is_symlink: bool) -> Self {
        match unix_mode.map(|mode| mode & S_IFMT) {
            Some(S_IFREG) => EntryKind::Regular,
            Some(S_IFDIR) => EntryKind::Directory,
            Some(S_IFLNK) => EntryKind::Symlink,
            Some(0) | None if is_symlink => EntryKind::Symlink,
            Some(0) | None if is_dir => EntryKind::Directory,
            Some(0) | None => EntryKind::Regular,
            Some(_) => EntryKind::Other,
        }
    }
}

/// Broken-down DOS timestamp of an entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timestamp {
    /// Calendar year (1980-2107)
    pub year: u16,
    /// Month of the year, 1-based
    pub month: u8,
    /// Day of the month, 1-based
    pub day: u8,
    /// Hour (0-23)
    pub hour: u8,
    /// Minute (0-59)
    pub minute: u8,
    /// Second, even values only
    pub second: u8,
}

impl From<zip::DateTime> for Timestamp {
    fn from(dt: zip::DateTime) -> Self {
        Self {
            year: dt.year(),
            month: dt.month(),
            day: dt.day(),
            hour: dt.hour(),
            minute: dt.minute(),
            second: dt.second(),
        }
    }
}

/// Metadata read from one archive entry
///
/// Every field comes from a distinct accessor on the wrapped entry; absent
/// values are kept as `None` rather than aborting the traversal.
#[derive(Debug, Clone)]
pub struct EntryInfo {
    /// Position of the entry in traversal order
    pub index: usize,
    /// Entry name, lossily decoded
    pub name: String,
    /// Length of the undecoded name
    pub raw_name_len: usize,
    /// Whether the name resolves to a path inside the extraction root
    pub enclosed: bool,
    /// Length of the per-entry comment
    pub comment_len: usize,
    /// File type classification
    pub kind: EntryKind,
    /// Declared uncompressed size
    pub size: u64,
    /// Declared compressed size
    pub compressed_size: u64,
    /// Compression method
    pub compression: CompressionMethod,
    /// DOS last-modified time
    pub modified: Option<Timestamp>,
    /// Unix permission and type bits
    pub unix_mode: Option<u32>,
    /// Declared CRC-32
    pub crc32: u32,
    /// Whether the entry is encrypted
    pub encrypted: bool,
    /// Modification time from an extended-timestamp extra field
    pub extended_mtime: Option<u32>,
    /// Extra fields inspected (capped)
    pub extra_fields: usize,
}

impl EntryInfo {
    fn inspect<R: Read>(index: usize, entry: &ZipFile<'_, R>, state: &mut TraversalState) -> Self {
        let unix_mode = entry.unix_mode();
        let mut extended_mtime = None;
        let mut extra_fields = 0;
        for field in entry
            .extra_data_fields()
            .take(state.limits().max_extra_fields())
        {
            extra_fields += 1;
            state.record_sublist_item();
            if let ExtraField::ExtendedTimestamp(ts) = field {
                extended_mtime = ts.mod_time();
            }
        }

        Self {
            index,
            name: entry.name().to_string(),
            raw_name_len: entry.name_raw().len(),
            enclosed: entry.enclosed_name().is_some(),
            comment_len: entry.comment().len(),
            kind: EntryKind::classify(unix_mode, entry.is_dir(), entry.is_symlink()),
            size: entry.size(),
            compressed_size: entry.compressed_size(),
            compression: entry.compression(),
            modified: entry.last_modified().map(Timestamp::from),
            unix_mode,
            crc32: entry.crc32(),
            encrypted: entry.encrypted(),
            extended_mtime,
            extra_fields,
        }
    }
}

/// Archive-level metadata exposed by the central directory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArchiveSummary {
    /// Entries declared by the central directory
    pub entries_declared: usize,
    /// Length of the archive comment
    pub comment_len: usize,
    /// Bytes preceding the archive (self-extractor stubs and the like)
    pub prefix_offset: u64,
}

/// Walk the archive in `stream` and return why the walk stopped
///
/// `Err` is reserved for setup failures; malformed input is reported as
/// [`Exit::ParseError`].
pub(crate) fn traverse<V: Visitor>(
    stream: &mut MemoryStream<'_>,
    mode: ArchiveMode,
    state: &mut TraversalState,
    ledger: Option<&ResourceLedger>,
    visitor: &mut V,
) -> Result<Exit> {
    match mode {
        ArchiveMode::Streaming => traverse_streaming(stream, state, ledger, visitor),
        ArchiveMode::Indexed => traverse_indexed(stream, state, ledger, visitor),
    }
}

fn traverse_streaming<V: Visitor>(
    stream: &mut MemoryStream<'_>,
    state: &mut TraversalState,
    ledger: Option<&ResourceLedger>,
    visitor: &mut V,
) -> Result<Exit> {
    let mut session = Session::open(stream, ledger)?;
    let max_units = state.limits().max_units();
    let mut index = 0;

    let exit = loop {
        let mut entry = match read_zipfile_from_stream(session.handle_mut()) {
            Ok(Some(entry)) => entry,
            Ok(None) => break Exit::EndOfInput,
            Err(e) => break Exit::ParseError(Error::Zip(e)),
        };
        if state.enter_unit(Some(max_units)).is_break() {
            break Exit::CapReached(Cap::Units);
        }
        if visit_entry(index, &mut entry, state, visitor).is_break() {
            break Exit::Cancelled;
        }
        skip_remainder(entry);
        index += 1;
    };

    session.close();
    Ok(exit)
}

fn traverse_indexed<V: Visitor>(
    stream: &mut MemoryStream<'_>,
    state: &mut TraversalState,
    ledger: Option<&ResourceLedger>,
    visitor: &mut V,
) -> Result<Exit> {
    let lease = Lease::acquire(ResourceKind::Session, ledger)?;
    let archive = match ZipArchive::new(stream) {
        Ok(archive) => archive,
        Err(e) => return Ok(Exit::ParseError(Error::Zip(e))),
    };
    let mut session = Session::bind(archive, lease);
    let max_units = state.limits().max_units();

    let summary = {
        let archive = session.handle();
        ArchiveSummary {
            entries_declared: archive.len(),
            comment_len: archive.comment().len(),
            prefix_offset: archive.offset(),
        }
    };
    if visitor.archive(&summary).is_break() {
        return Ok(Exit::Cancelled);
    }

    let archive = session.handle_mut();
    for index in 0..summary.entries_declared {
        let mut entry = match archive.by_index(index) {
            Ok(entry) => entry,
            Err(e) => return Ok(Exit::ParseError(Error::Zip(e))),
        };
        if state.enter_unit(Some(max_units)).is_break() {
            return Ok(Exit::CapReached(Cap::Units));
        }
        if visit_entry(index, &mut entry, state, visitor).is_break() {
            return Ok(Exit::Cancelled);
        }
        skip_remainder(entry);
    }

    Ok(Exit::EndOfInput)
}

fn visit_entry<R: Read, V: Visitor>(
    index: usize,
    entry: &mut ZipFile<'_, R>,
    state: &mut TraversalState,
    visitor: &mut V,
) -> ControlFlow<()> {
    let info = EntryInfo::inspect(index, entry, state);
    if visitor.entry(&info).is_break() {
        return ControlFlow::Break(());
    }
    if info.size > 0 {
        return pull_payload(entry, state, visitor);
    }
    ControlFlow::Continue(())
}

/// Pull payload until end of data, an error, or the per-entry budget
fn pull_payload<R: Read, V: Visitor>(
    entry: &mut ZipFile<'_, R>,
    state: &mut TraversalState,
    visitor: &mut V,
) -> ControlFlow<()> {
    let mut scratch = [0u8; PAYLOAD_PULL];
    let mut offset = 0u64;

    loop {
        let budget = state.payload_budget();
        if budget == 0 {
            break;
        }
        let want = budget.min(scratch.len());
        match entry.read(&mut scratch[..want]) {
            Ok(0) => break,
            Ok(n) => {
                state.record_payload(n);
                if visitor.payload(&scratch[..n], offset).is_break() {
                    return ControlFlow::Break(());
                }
                offset += n as u64;
            }
            Err(e) if e.kind() == ErrorKind::Interrupted => {}
            Err(_) => {
                state.record_payload_error();
                break;
            }
        }
    }
    ControlFlow::Continue(())
}

/// Discard the rest of an entry's payload
///
/// Dropping a streamed entry drains its remaining compressed bytes from the
/// underlying reader without decompressing them, which leaves the stream
/// positioned at the next local header. Indexed entries hold no such state.
fn skip_remainder<R: Read>(entry: ZipFile<'_, R>) {
    drop(entry);
}
