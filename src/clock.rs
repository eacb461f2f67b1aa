//! The ledger clock.
//!
//! Thawing deadlines are measured against the host ledger's monotonic time, which the
//! escrow reads through [`Clock`]. Production deployments use [`SystemClock`]; tests
//! and the simulator drive time explicitly with [`ManualClock`].

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tap_types::timestamp::UnixTimestamp;

pub trait Clock: Send + Sync {
    fn now(&self) -> UnixTimestamp;
}

/// Wall-clock time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> UnixTimestamp {
        UnixTimestamp::now()
    }
}

/// A clock that only moves when told to. Clones share the same time.
#[derive(Debug, Default, Clone)]
pub struct ManualClock {
    secs: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new(start: UnixTimestamp) -> Self {
        Self {
            secs: Arc::new(AtomicU64::new(start.as_secs())),
        }
    }

    /// Moves time forward by `secs`, saturating at `u64::MAX`.
    pub fn advance(&self, secs: u64) -> UnixTimestamp {
        let previous = self
            .secs
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |now| {
                Some(now.saturating_add(secs))
            })
            .unwrap_or_default();
        UnixTimestamp::from_secs(previous.saturating_add(secs))
    }

    /// Moves time to `to`. Time never goes backwards; earlier values are ignored.
    pub fn advance_to(&self, to: UnixTimestamp) -> UnixTimestamp {
        let previous = self.secs.fetch_max(to.as_secs(), Ordering::SeqCst);
        UnixTimestamp::from_secs(previous.max(to.as_secs()))
    }
}

impl Clock for ManualClock {
    fn now(&self) -> UnixTimestamp {
        UnixTimestamp::from_secs(self.secs.load(Ordering::SeqCst))
    }
}

impl<C: Clock> Clock for Arc<C> {
    fn now(&self) -> UnixTimestamp {
        (**self).now()
    }
}
