//! Get-or-create handle for the single live node connection.

use std::sync::Arc;

use tokio::sync::Mutex;

use sw_domain::NodeConfig;

use crate::connection::NodeConnection;
use crate::error::NodeClientError;

/// Hands out the current connection, creating it on first use and replacing
/// it after a disconnect. Clones share the same underlying slot, so a
/// locator lineage holds at most one live connection — pass clones around
/// instead of reaching for ambient global state.
///
/// The slot is an async mutex held across the connect await: callers racing
/// on first use coalesce onto a single socket instead of each opening their
/// own.
#[derive(Clone)]
pub struct NodeLocator {
    config: NodeConfig,
    slot: Arc<Mutex<Option<Arc<NodeConnection>>>>,
}

impl NodeLocator {
    pub fn new(config: NodeConfig) -> Self {
        Self {
            config,
            slot: Arc::new(Mutex::new(None)),
        }
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    /// Return the live connection, connecting first if there is none.
    /// Never hands out a closed connection: a cached connection that died
    /// is replaced transparently.
    pub async fn find_node(&self) -> Result<Arc<NodeConnection>, NodeClientError> {
        let mut slot = self.slot.lock().await;

        if let Some(conn) = slot.as_ref() {
            if conn.is_open() {
                return Ok(Arc::clone(conn));
            }
            // The disconnect hook has not cleared the slot yet.
            *slot = None;
        }

        let conn = NodeConnection::connect(&self.config).await?;

        // Clear the slot when this connection dies — unless a newer
        // connection already took its place.
        let slot_ref = Arc::clone(&self.slot);
        let this_conn = Arc::downgrade(&conn);
        conn.on_disconnect(move || {
            tokio::spawn(async move {
                let mut slot = slot_ref.lock().await;
                let is_current = match (slot.as_ref(), this_conn.upgrade()) {
                    (Some(current), Some(closed)) => Arc::ptr_eq(current, &closed),
                    _ => false,
                };
                if is_current {
                    *slot = None;
                }
            });
        });

        *slot = Some(Arc::clone(&conn));
        Ok(conn)
    }

    /// Drop and close the cached connection, if any. The next
    /// [`find_node`](Self::find_node) reconnects.
    pub async fn reset(&self) {
        let mut slot = self.slot.lock().await;
        if let Some(conn) = slot.take() {
            conn.close();
        }
    }
}
