//! Pending-request table: matches one reply to one waiting caller,
//! exactly once.

use std::collections::HashMap;

use parking_lot::Mutex;
use tokio::sync::oneshot;

use sw_protocol::Frame;

/// Maps an in-flight request's `message-id` to the sender that resolves it.
///
/// Entries leave the table only through [`resolve`](Self::resolve),
/// [`forget`](Self::forget), or [`fail_all`](Self::fail_all); the table
/// itself has no TTL — the request path owns the timeout.
#[derive(Default)]
pub struct CorrelationTable {
    pending: Mutex<HashMap<String, oneshot::Sender<Frame>>>,
}

impl CorrelationTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `tx` under `id`. Returns `false` and keeps the existing entry
    /// if the id is already registered — overwriting would resolve the
    /// wrong caller.
    pub fn register(&self, id: &str, tx: oneshot::Sender<Frame>) -> bool {
        let mut pending = self.pending.lock();
        if pending.contains_key(id) {
            tracing::error!(message_id = %id, "correlation id collision, refusing to overwrite");
            return false;
        }
        pending.insert(id.to_string(), tx);
        true
    }

    /// Look up and remove the entry for `id`, delivering `frame` to the
    /// waiting caller. An unmatched id is dropped silently — expected for
    /// late replies that outlived their connection.
    pub fn resolve(&self, id: &str, frame: Frame) -> bool {
        let Some(tx) = self.pending.lock().remove(id) else {
            return false;
        };
        // The receiver may have given up; either way the entry is gone.
        let _ = tx.send(frame);
        true
    }

    /// Remove the entry for `id` without resolving it (request timed out or
    /// the send failed after registration).
    pub fn forget(&self, id: &str) {
        self.pending.lock().remove(id);
    }

    /// Drain every entry so waiting callers observe a closed connection
    /// instead of hanging forever.
    pub fn fail_all(&self) {
        let drained: Vec<_> = {
            let mut pending = self.pending.lock();
            pending.drain().collect()
        };
        if !drained.is_empty() {
            tracing::debug!(count = drained.len(), "failing pending requests on disconnect");
        }
        // Dropping the senders wakes each receiver with a closed-channel error.
    }

    pub fn len(&self) -> usize {
        self.pending.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.lock().is_empty()
    }
}
