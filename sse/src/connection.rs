use crate::message::Frame;
use dashmap::DashMap;
use log::*;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc::UnboundedSender;

/// Unique identifier for a connection (server-generated)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConnectionId(String);

impl ConnectionId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A registered subscriber's output channel.
#[derive(Debug, Clone)]
pub struct ConnectionInfo {
    /// Registration order, used to deliver broadcasts deterministically.
    pub sequence: u64,
    pub sender: UnboundedSender<Frame>,
}

/// Subscriber registry for login-event fan-out, keyed by connection id.
///
/// Every open stream session holds exactly one entry here for as long as it
/// is open. Entries are removed by [`ConnectionRegistry::unregister`] or,
/// implicitly, when a send to the entry fails because its receiver is gone.
pub struct ConnectionRegistry {
    connections: DashMap<ConnectionId, ConnectionInfo>,
    next_sequence: AtomicU64,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self {
            connections: DashMap::new(),
            next_sequence: AtomicU64::new(0),
        }
    }

    /// Register a new connection - O(1)
    pub fn register(&self, sender: UnboundedSender<Frame>) -> ConnectionId {
        let connection_id = ConnectionId::new();
        let sequence = self.next_sequence.fetch_add(1, Ordering::Relaxed);

        self.connections
            .insert(connection_id.clone(), ConnectionInfo { sequence, sender });

        connection_id
    }

    /// Unregister a connection - O(1). Returns `false` when the connection was
    /// already gone, which callers treat as a no-op.
    pub fn unregister(&self, connection_id: &ConnectionId) -> bool {
        self.connections.remove(connection_id).is_some()
    }

    pub fn contains(&self, connection_id: &ConnectionId) -> bool {
        self.connections.contains_key(connection_id)
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    /// Current connections ordered by registration. Taking a snapshot means
    /// no shard lock is held while sending to or removing a connection.
    fn snapshot(&self) -> Vec<(ConnectionId, ConnectionInfo)> {
        let mut targets: Vec<(ConnectionId, ConnectionInfo)> = self
            .connections
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();
        targets.sort_by_key(|(_, info)| info.sequence);
        targets
    }

    /// Send a frame to every registered connection, in registration order.
    /// Returns the number of connections the frame was delivered to.
    pub fn broadcast(&self, frame: &Frame) -> usize {
        let mut delivered = 0;
        for (conn_id, info) in self.snapshot() {
            match info.sender.send(frame.clone()) {
                Ok(()) => delivered += 1,
                Err(_) => {
                    warn!(
                        "Failed to send broadcast to connection {}, treating it as disconnected",
                        conn_id.as_str()
                    );
                    self.unregister(&conn_id);
                }
            }
        }
        delivered
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use events::LoginEvent;
    use tokio::sync::mpsc;

    fn login(id: &str) -> Frame {
        Frame::Login(LoginEvent {
            id: id.to_string(),
            username: "Alexander".to_string(),
            time: "9:00:00 AM".to_string(),
        })
    }

    #[test]
    fn test_connection_ids_are_unique() {
        assert_ne!(ConnectionId::new(), ConnectionId::new());
    }

    #[test]
    fn test_register_and_unregister_track_len() {
        let registry = ConnectionRegistry::new();
        let (tx, _rx) = mpsc::unbounded_channel();

        let id = registry.register(tx);
        assert_eq!(registry.len(), 1);
        assert!(registry.contains(&id));

        assert!(registry.unregister(&id));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_unregister_twice_is_a_no_op() {
        let registry = ConnectionRegistry::new();
        let (tx, _rx) = mpsc::unbounded_channel();
        let (other_tx, _other_rx) = mpsc::unbounded_channel();
        let id = registry.register(tx);
        registry.register(other_tx);

        assert!(registry.unregister(&id));
        assert!(!registry.unregister(&id));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_broadcast_reaches_every_connection_once() {
        let registry = ConnectionRegistry::new();
        let mut receivers = Vec::new();
        for _ in 0..3 {
            let (tx, rx) = mpsc::unbounded_channel();
            registry.register(tx);
            receivers.push(rx);
        }

        assert_eq!(registry.broadcast(&login("3")), 3);

        for rx in receivers.iter_mut() {
            assert_eq!(rx.try_recv().unwrap(), login("3"));
            assert!(rx.try_recv().is_err());
        }
    }

    #[test]
    fn test_snapshot_follows_registration_order() {
        let registry = ConnectionRegistry::new();
        let mut registered = Vec::new();
        let mut receivers = Vec::new();
        for _ in 0..8 {
            let (tx, rx) = mpsc::unbounded_channel();
            registered.push(registry.register(tx));
            receivers.push(rx);
        }
        registry.unregister(&registered.remove(3));

        let ordered: Vec<ConnectionId> = registry
            .snapshot()
            .into_iter()
            .map(|(id, _)| id)
            .collect();
        assert_eq!(ordered, registered);
    }

    #[test]
    fn test_broadcast_drops_connections_whose_receiver_is_gone() {
        let registry = ConnectionRegistry::new();
        let (live_tx, mut live_rx) = mpsc::unbounded_channel();
        let (dead_tx, dead_rx) = mpsc::unbounded_channel();
        registry.register(live_tx);
        let dead_id = registry.register(dead_tx);
        drop(dead_rx);

        assert_eq!(registry.broadcast(&login("5")), 1);
        assert!(!registry.contains(&dead_id));
        assert_eq!(registry.len(), 1);
        assert_eq!(live_rx.try_recv().unwrap(), login("5"));
    }
}
