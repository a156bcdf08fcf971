//! Cooperative cancellation for retrieval cycles.
//!
//! The host signals via the token; the retriever checks it between tiers.
//! A cancelled cycle returns whatever was gathered so far and records no
//! conversation turn.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A cooperative cancellation token. Clones share the same flag, so the
/// host holds one clone and hands the other to the cycle.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// Signal cancellation. Idempotent; cannot be undone.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }
}
