//! Resource leases and the ledger that audits them
//!
//! Every resource a harness run acquires (the memory stream and the parser
//! session) is represented by a [`Lease`]. A lease is released exactly once:
//! either explicitly through [`Lease::release`] or by `Drop` on any other
//! exit path, including early returns and unwinding.
//!
//! A [`ResourceLedger`] is optional. Production fuzz targets run without one;
//! tests attach one to prove that every acquisition is matched by a release.

use crate::error::{Error, Result};
use std::cell::Cell;

/// Kind of resource held by a lease
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    /// The in-memory stream adapter
    Stream,
    /// A parser session bound to a stream
    Session,
}

impl ResourceKind {
    fn slot(self) -> usize {
        match self {
            ResourceKind::Stream => 0,
            ResourceKind::Session => 1,
        }
    }
}

/// Counts acquisitions and releases per resource kind
///
/// Single-threaded by construction (`Cell` counters). A ledger can also be
/// told to refuse one kind of resource, which is how tests force a setup
/// failure part-way through acquisition.
#[derive(Debug, Default)]
pub struct ResourceLedger {
    acquired: [Cell<usize>; 2],
    released: [Cell<usize>; 2],
    refuse: Option<ResourceKind>,
}

impl ResourceLedger {
    /// Create a ledger that grants every acquisition
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a ledger that refuses to grant `kind`
    pub fn failing(kind: ResourceKind) -> Self {
        Self {
            refuse: Some(kind),
            ..Self::default()
        }
    }

    /// Number of successful acquisitions of `kind`
    pub fn acquired(&self, kind: ResourceKind) -> usize {
        self.acquired[kind.slot()].get()
    }

    /// Number of releases of `kind`
    pub fn released(&self, kind: ResourceKind) -> usize {
        self.released[kind.slot()].get()
    }

    /// Leases of `kind` acquired but not yet released
    pub fn outstanding(&self, kind: ResourceKind) -> usize {
        self.acquired(kind) - self.released(kind)
    }

    /// True when every acquisition of every kind has been released
    pub fn is_balanced(&self) -> bool {
        [ResourceKind::Stream, ResourceKind::Session]
            .into_iter()
            .all(|kind| self.outstanding(kind) == 0)
    }

    /// Total acquisitions across all kinds
    pub fn total_acquired(&self) -> usize {
        self.acquired.iter().map(Cell::get).sum()
    }

    fn grant(&self, kind: ResourceKind) -> Result<()> {
        if self.refuse == Some(kind) {
            return Err(Error::setup(format!("{:?} acquisition refused", kind)));
        }
        let slot = &self.acquired[kind.slot()];
        slot.set(slot.get() + 1);
        Ok(())
    }

    fn give_back(&self, kind: ResourceKind) {
        let slot = &self.released[kind.slot()];
        slot.set(slot.get() + 1);
    }
}

/// Proof of an acquired resource, released exactly once
#[derive(Debug)]
pub struct Lease<'l> {
    kind: ResourceKind,
    ledger: Option<&'l ResourceLedger>,
    live: bool,
}

impl<'l> Lease<'l> {
    /// Acquire a lease, recording it in `ledger` when one is attached
    pub fn acquire(kind: ResourceKind, ledger: Option<&'l ResourceLedger>) -> Result<Self> {
        if let Some(ledger) = ledger {
            ledger.grant(kind)?;
        }
        Ok(Self {
            kind,
            ledger,
            live: true,
        })
    }

    /// Kind of resource this lease covers
    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    /// Release the lease now instead of at drop
    pub fn release(mut self) {
        self.give_back();
    }

    fn give_back(&mut self) {
        if !self.live {
            return;
        }
        self.live = false;
        if let Some(ledger) = self.ledger {
            ledger.give_back(self.kind);
        }
        log::trace!("released {:?}", self.kind);
    }
}

impl Drop for Lease<'_> {
    fn drop(&mut self) {
        self.give_back();
    }
}

/// A library handle bound to its lease
///
/// Fields drop in declaration order, so the handle is torn down before the
/// lease is released and the ledger never records a release early.
pub struct Session<'l, S> {
    handle: S,
    _lease: Lease<'l>,
}

impl<'l, S> Session<'l, S> {
    /// Open a session around `handle`
    ///
    /// On refusal the handle is dropped before the error is returned.
    pub fn open(handle: S, ledger: Option<&'l ResourceLedger>) -> Result<Self> {
        let lease = Lease::acquire(ResourceKind::Session, ledger)?;
        Ok(Self::bind(handle, lease))
    }

    /// Bind a handle to a session lease acquired before the handle existed
    ///
    /// Used when opening the library handle can itself fail on malformed
    /// input. A refused lease is then a setup failure, never a parse error.
    pub fn bind(handle: S, lease: Lease<'l>) -> Self {
        Self {
            handle,
            _lease: lease,
        }
    }

    /// Shared access to the library handle
    pub fn handle(&self) -> &S {
        &self.handle
    }

    /// Mutable access to the library handle
    pub fn handle_mut(&mut self) -> &mut S {
        &mut self.handle
    }

    /// Tear down the handle and release the lease
    pub fn close(self) {
        drop(self);
    }
}
