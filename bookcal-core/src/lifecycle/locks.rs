use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::demand::DemandId;

type LockMap = DashMap<DemandId, Arc<Mutex<()>>>;

/// One async mutex per demand id, created on demand and dropped once no
/// transition holds or waits for it.
#[derive(Default, Clone)]
pub struct DemandLocks {
    locks: Arc<LockMap>,
}

impl DemandLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self, id: DemandId) -> DemandGuard {
        let lock = self.locks.entry(id).or_default().clone();
        let guard = lock.lock_owned().await;

        DemandGuard {
            id,
            locks: self.locks.clone(),
            guard: Some(guard),
        }
    }

    /// Number of demands currently locked or awaited.
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

pub struct DemandGuard {
    id: DemandId,
    locks: Arc<LockMap>,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for DemandGuard {
    fn drop(&mut self) {
        self.guard.take();
        // Only the map's own handle left: nobody is waiting.
        self.locks
            .remove_if(&self.id, |_, lock| Arc::strong_count(lock) == 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_same_demand_waits_for_release() {
        let locks = DemandLocks::new();
        let id = DemandId::new();

        let held = locks.acquire(id).await;
        let blocked = tokio::time::timeout(Duration::from_millis(20), locks.acquire(id)).await;
        assert!(blocked.is_err());

        drop(held);
        let reacquired = tokio::time::timeout(Duration::from_millis(20), locks.acquire(id)).await;
        assert!(reacquired.is_ok());
    }

    #[tokio::test]
    async fn test_different_demands_do_not_contend() {
        let locks = DemandLocks::new();

        let _first = locks.acquire(DemandId::new()).await;
        let second = tokio::time::timeout(Duration::from_millis(20), locks.acquire(DemandId::new())).await;

        assert!(second.is_ok());
        assert_eq!(locks.len(), 2);
    }

    #[tokio::test]
    async fn test_released_locks_are_removed() {
        let locks = DemandLocks::new();
        let id = DemandId::new();

        drop(locks.acquire(id).await);
        assert!(locks.is_empty());
    }
}
