use crate::connection::{ConnectionId, ConnectionRegistry};
use crate::message::Frame;
use log::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;

/// Owned registration in a [`ConnectionRegistry`].
///
/// The registration is removed by [`Subscription::release`] or when the handle
/// is dropped, whichever happens first. Releasing more than once is a no-op.
pub struct Subscription {
    registry: Arc<ConnectionRegistry>,
    connection_id: ConnectionId,
    released: AtomicBool,
}

impl Subscription {
    pub fn new(registry: Arc<ConnectionRegistry>, sender: UnboundedSender<Frame>) -> Self {
        let connection_id = registry.register(sender);
        Self {
            registry,
            connection_id,
            released: AtomicBool::new(false),
        }
    }

    pub fn connection_id(&self) -> &ConnectionId {
        &self.connection_id
    }

    /// Deregister from the registry. Returns `true` only for the call that
    /// actually released the registration.
    pub fn release(&self) -> bool {
        if self.released.swap(true, Ordering::SeqCst) {
            return false;
        }
        if !self.registry.unregister(&self.connection_id) {
            // Already dropped by the registry after a failed send.
            debug!(
                "Subscription {} was already removed from the registry",
                self.connection_id
            );
        }
        true
    }

    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::SeqCst)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[test]
    fn test_new_subscription_is_registered() {
        let registry = Arc::new(ConnectionRegistry::new());
        let (tx, _rx) = mpsc::unbounded_channel();

        let subscription = Subscription::new(registry.clone(), tx);

        assert!(registry.contains(subscription.connection_id()));
        assert!(!subscription.is_released());
    }

    #[test]
    fn test_release_is_idempotent() {
        let registry = Arc::new(ConnectionRegistry::new());
        let (tx, _rx) = mpsc::unbounded_channel();
        let (other_tx, _other_rx) = mpsc::unbounded_channel();
        let subscription = Subscription::new(registry.clone(), tx);
        let _other = Subscription::new(registry.clone(), other_tx);

        assert!(subscription.release());
        assert!(!subscription.release());
        assert!(subscription.is_released());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_drop_releases_registration() {
        let registry = Arc::new(ConnectionRegistry::new());
        let (tx, _rx) = mpsc::unbounded_channel();

        {
            let _subscription = Subscription::new(registry.clone(), tx);
            assert_eq!(registry.len(), 1);
        }

        assert!(registry.is_empty());
    }

    #[test]
    fn test_release_after_registry_dropped_entry_is_a_no_op() {
        let registry = Arc::new(ConnectionRegistry::new());
        let (tx, rx) = mpsc::unbounded_channel();
        let subscription = Subscription::new(registry.clone(), tx);
        drop(rx);

        registry.broadcast(&Frame::heartbeat("8:00:00 AM"));
        assert!(registry.is_empty());

        assert!(subscription.release());
        assert!(registry.is_empty());
    }
}
