//! Live numeric-buffer accounting.
//!
//! Device tensors are released when their owner drops them, but a leak (a
//! parameter set or hidden state kept alive past its owner) is invisible
//! without bookkeeping. Every long-lived buffer holds a [`BufferGuard`]
//! registered with a [`BufferLedger`]; the guard deregisters on drop.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Debug, Default)]
struct LedgerInner {
    live_bytes: AtomicUsize,
    live_buffers: AtomicUsize,
}

/// Shared counter of live buffers and their total byte size.
#[derive(Debug, Clone, Default)]
pub struct BufferLedger {
    inner: Arc<LedgerInner>,
}

/// Point-in-time view of a ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LedgerSnapshot {
    pub live_bytes: usize,
    pub live_buffers: usize,
}

impl BufferLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a buffer of `bytes` bytes. Released when the guard drops.
    pub fn register(&self, bytes: usize) -> BufferGuard {
        self.inner.live_bytes.fetch_add(bytes, Ordering::AcqRel);
        self.inner.live_buffers.fetch_add(1, Ordering::AcqRel);
        BufferGuard {
            ledger: Arc::clone(&self.inner),
            bytes,
        }
    }

    pub fn live_bytes(&self) -> usize {
        self.inner.live_bytes.load(Ordering::Acquire)
    }

    pub fn live_buffers(&self) -> usize {
        self.inner.live_buffers.load(Ordering::Acquire)
    }

    pub fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            live_bytes: self.live_bytes(),
            live_buffers: self.live_buffers(),
        }
    }
}

/// Registration of one live buffer.
#[derive(Debug)]
pub struct BufferGuard {
    ledger: Arc<LedgerInner>,
    bytes: usize,
}

impl BufferGuard {
    pub fn bytes(&self) -> usize {
        self.bytes
    }
}

impl Drop for BufferGuard {
    fn drop(&mut self) {
        self.ledger
            .live_bytes
            .fetch_sub(self.bytes, Ordering::AcqRel);
        self.ledger.live_buffers.fetch_sub(1, Ordering::AcqRel);
    }
}
