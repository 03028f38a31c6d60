//! Pending-request table: request id → one-shot completion.
//!
//! Each entry leaves the table exactly once, either when its response
//! arrives ([`PendingRequests::resolve`]) or when its waiter gives up
//! ([`PendingRequests::cancel`]). The table belongs to a single call and is
//! only touched from that call's task.

use std::collections::HashMap;

use tokio::sync::oneshot;

use gwb_core::messages::ResponseFrame;

#[derive(Debug, Default)]
pub struct PendingRequests {
    waiters: HashMap<String, oneshot::Sender<ResponseFrame>>,
}

impl PendingRequests {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a waiter for `id`. A second registration under the same id
    /// replaces the first, whose receiver then observes a closed channel.
    pub fn register(&mut self, id: &str) -> oneshot::Receiver<ResponseFrame> {
        let (tx, rx) = oneshot::channel();
        self.waiters.insert(id.to_string(), tx);
        rx
    }

    /// Route a response to its waiter. Returns `false` when the frame has no
    /// id or the id is not pending; such frames are dropped.
    pub fn resolve(&mut self, frame: ResponseFrame) -> bool {
        let Some(id) = frame.id.as_deref() else {
            return false;
        };
        match self.waiters.remove(id) {
            Some(tx) => {
                // The waiter may have been dropped by a timeout race; either way
                // the entry is gone.
                let _ = tx.send(frame);
                true
            }
            None => false,
        }
    }

    /// Remove `id` without completing it. Returns `false` if it was not pending.
    pub fn cancel(&mut self, id: &str) -> bool {
        self.waiters.remove(id).is_some()
    }

    /// Drop every waiter; their receivers observe a closed channel.
    pub fn clear(&mut self) {
        self.waiters.clear();
    }

    pub fn len(&self) -> usize {
        self.waiters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waiters.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn resolve_delivers_once() {
        let mut table = PendingRequests::new();
        let mut rx = table.register("a");
        assert!(table.resolve(ResponseFrame::ok("a", json!(1))));
        assert!(table.is_empty());
        assert_eq!(rx.try_recv().unwrap().payload, Some(json!(1)));

        // Duplicate response for the same id is dropped.
        assert!(!table.resolve(ResponseFrame::ok("a", json!(2))));
    }

    #[test]
    fn unknown_and_missing_ids_are_dropped() {
        let mut table = PendingRequests::new();
        let mut rx = table.register("a");
        assert!(!table.resolve(ResponseFrame::ok("b", json!(null))));
        let mut no_id = ResponseFrame::ok("x", json!(null));
        no_id.id = None;
        assert!(!table.resolve(no_id));
        assert_eq!(table.len(), 1);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn cancel_and_resolve_are_exclusive() {
        let mut table = PendingRequests::new();
        let _rx = table.register("a");
        assert!(table.cancel("a"));
        assert!(!table.resolve(ResponseFrame::ok("a", json!(null))));
        assert!(!table.cancel("a"));
    }

    #[test]
    fn clear_closes_receivers() {
        let mut table = PendingRequests::new();
        let mut rx = table.register("a");
        table.clear();
        assert!(matches!(
            rx.try_recv(),
            Err(oneshot::error::TryRecvError::Closed)
        ));
    }
}
