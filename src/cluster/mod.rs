use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClusterError {
    Unavailable(String),
    Transport(String),
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Traffic {
    pub bytes_sent: u64,
    pub bytes_received: u64,
}

/// The network layer's contract. Payloads are opaque bytes; whatever the
/// elements are, they were already encoded by the operator layer.
///
/// Every host must issue the same collective calls in the same order, so
/// implementations may assume matching calls on all ranks. `hosts()` is
/// always at least 1 and `rank()` is always below it.
pub trait Collectives: Send + Sync {
    fn rank(&self) -> usize;
    fn hosts(&self) -> usize;
    fn barrier(&self) -> Result<(), ClusterError>;
    /// Distribute `payload` from `root` to every host; returns the root's
    /// payload on all ranks.
    fn broadcast(&self, root: usize, payload: Vec<u8>) -> Result<Vec<u8>, ClusterError>;
    /// Exchange payloads so that every host receives every host's payload,
    /// ordered by rank.
    fn all_gather(&self, payload: Vec<u8>) -> Result<Vec<Vec<u8>>, ClusterError>;
    fn traffic(&self) -> Traffic;
}

/// Single-host cluster. Collectives degenerate to identity; this is what
/// `Context::local()` and the test suite run on.
pub struct LocalCluster {
    sent: AtomicU64,
    received: AtomicU64,
}

impl LocalCluster {
    pub fn new() -> LocalCluster {
        LocalCluster {
            sent: AtomicU64::new(0),
            received: AtomicU64::new(0),
        }
    }
}

impl Default for LocalCluster {
    fn default() -> LocalCluster {
        LocalCluster::new()
    }
}

impl Collectives for LocalCluster {
    fn rank(&self) -> usize {
        0
    }
    fn hosts(&self) -> usize {
        1
    }
    fn barrier(&self) -> Result<(), ClusterError> {
        Ok(())
    }
    fn broadcast(&self, _root: usize, payload: Vec<u8>) -> Result<Vec<u8>, ClusterError> {
        // the root is always ourselves
        self.sent.fetch_add(payload.len() as u64, Ordering::Relaxed);
        self.received.fetch_add(payload.len() as u64, Ordering::Relaxed);
        Ok(payload)
    }
    fn all_gather(&self, payload: Vec<u8>) -> Result<Vec<Vec<u8>>, ClusterError> {
        self.sent.fetch_add(payload.len() as u64, Ordering::Relaxed);
        self.received.fetch_add(payload.len() as u64, Ordering::Relaxed);
        Ok(vec![payload])
    }
    fn traffic(&self) -> Traffic {
        Traffic {
            bytes_sent: self.sent.load(Ordering::Relaxed),
            bytes_received: self.received.load(Ordering::Relaxed),
        }
    }
}
