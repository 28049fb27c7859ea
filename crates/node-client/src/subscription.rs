//! Event-subscription table: one active handler per event name.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use sw_protocol::Frame;

/// Callback invoked for each frame pushed on a subscribed event.
pub type EventHandler = Arc<dyn Fn(Frame) + Send + Sync>;

/// Last subscriber wins: a later `subscribe` on the same event silently
/// replaces the previous handler. There is no fan-out.
#[derive(Default)]
pub struct SubscriptionTable {
    handlers: Mutex<HashMap<String, EventHandler>>,
}

impl SubscriptionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install `handler` for `event`, replacing any prior handler.
    pub fn subscribe(&self, event: &str, handler: impl Fn(Frame) + Send + Sync + 'static) {
        self.handlers
            .lock()
            .insert(event.to_string(), Arc::new(handler));
    }

    /// Invoke the handler registered for `event`, if any. The handler runs
    /// outside the table lock, so it may itself subscribe or unsubscribe.
    pub fn dispatch(&self, event: &str, frame: Frame) -> bool {
        let handler = self.handlers.lock().get(event).cloned();
        match handler {
            Some(handler) => {
                handler(frame);
                true
            }
            None => false,
        }
    }

    /// Remove the handler for `event`; later dispatches are dropped until a
    /// new subscribe.
    pub fn unsubscribe(&self, event: &str) {
        self.handlers.lock().remove(event);
    }

    pub fn is_subscribed(&self, event: &str) -> bool {
        self.handlers.lock().contains_key(event)
    }
}
