// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scoped resource accounting for pipeline intermediates.
//
// Every buffer a rectification run creates (frames, grayscale and edge maps,
// contour sets, homographies, the encoded texture) is wrapped in a `Tracked`
// value registered with the run's `ResourceScope`. Dropping a `Tracked` value
// (normally, on an early `?` return, or while unwinding from a panic) records
// its release in the shared `ResourceLedger`; `Tracked::into_inner` records a
// hand-off out of the pipeline. A finished run therefore always leaves the
// ledger balanced.

use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{debug, warn};

/// Allocation/release counters shared by every scope of a session.
#[derive(Debug, Default)]
pub struct ResourceLedger {
    allocated: AtomicU64,
    released: AtomicU64,
}

impl ResourceLedger {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Total resources ever registered.
    pub fn allocated(&self) -> u64 {
        self.allocated.load(Ordering::Acquire)
    }

    /// Total resources released or handed off.
    pub fn released(&self) -> u64 {
        self.released.load(Ordering::Acquire)
    }

    /// Resources currently alive.
    pub fn live(&self) -> u64 {
        self.allocated().saturating_sub(self.released())
    }

    /// Whether every registered resource has been released.
    pub fn is_balanced(&self) -> bool {
        self.allocated() == self.released()
    }

    fn record_allocation(&self) {
        self.allocated.fetch_add(1, Ordering::AcqRel);
    }

    fn record_release(&self) {
        self.released.fetch_add(1, Ordering::AcqRel);
    }
}

/// The acquisition scope of a single pipeline run.
///
/// Resources are registered with [`ResourceScope::track`]. When the scope is
/// dropped it logs a warning if anything it registered is still alive, which
/// can only happen when a `Tracked` value was moved out of the run without
/// `into_inner`.
pub struct ResourceScope {
    ledger: Arc<ResourceLedger>,
    label: String,
    own: Arc<ResourceLedger>,
}

impl ResourceScope {
    /// Open a scope that reports into `ledger`.
    pub fn new(ledger: &Arc<ResourceLedger>, label: impl Into<String>) -> Self {
        Self {
            ledger: Arc::clone(ledger),
            label: label.into(),
            own: ResourceLedger::new(),
        }
    }

    /// Register `value` as a resource owned by this scope.
    pub fn track<T>(&self, value: T) -> Tracked<T> {
        self.ledger.record_allocation();
        self.own.record_allocation();
        Tracked {
            value,
            guard: ReleaseGuard {
                ledgers: [Arc::clone(&self.ledger), Arc::clone(&self.own)],
            },
        }
    }

    /// Resources of this scope that are still alive.
    pub fn live(&self) -> u64 {
        self.own.live()
    }

    /// Resources this scope has registered so far.
    pub fn allocated(&self) -> u64 {
        self.own.allocated()
    }
}

impl Drop for ResourceScope {
    fn drop(&mut self) {
        let live = self.own.live();
        if live == 0 {
            debug!(
                scope = %self.label,
                allocated = self.own.allocated(),
                "resource scope closed balanced"
            );
        } else {
            warn!(scope = %self.label, live, "resource scope closed with live resources");
        }
    }
}

/// Records a release in both the session ledger and the scope's own ledger.
struct ReleaseGuard {
    ledgers: [Arc<ResourceLedger>; 2],
}

impl Drop for ReleaseGuard {
    fn drop(&mut self) {
        for ledger in &self.ledgers {
            ledger.record_release();
        }
    }
}

/// A value whose lifetime is accounted for by a [`ResourceScope`].
pub struct Tracked<T> {
    value: T,
    guard: ReleaseGuard,
}

impl<T> Tracked<T> {
    /// Hand the value out of the pipeline, recording the release.
    pub fn into_inner(self) -> T {
        let Tracked { value, guard } = self;
        drop(guard);
        value
    }
}

impl<T> Deref for Tracked<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.value
    }
}

impl<T> DerefMut for Tracked<T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.value
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Tracked<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Tracked").field(&self.value).finish()
    }
}
