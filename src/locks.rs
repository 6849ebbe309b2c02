//! Per-destination-table write guards.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Mutual exclusion keyed by destination table name.
///
/// Names are folded to lowercase because SQLite resolves table names
/// case-insensitively. Guards for distinct tables never contend. Entries no
/// guard or waiter still references are dropped on the next acquire.
#[derive(Debug, Clone, Default)]
pub struct TableLocks {
    inner: Arc<Mutex<HashMap<String, Arc<Mutex<()>>>>>,
}

impl TableLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `table`.
    pub async fn acquire(&self, table: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut map = self.inner.lock().await;
            map.retain(|_, lock| Arc::strong_count(lock) > 1);
            map.entry(table.to_lowercase())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }

    #[cfg(test)]
    async fn tracked(&self) -> usize {
        self.inner.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_same_table_is_exclusive() {
        let locks = TableLocks::new();
        let guard = locks.acquire("Orders").await;

        let other = locks.clone();
        let waiter = tokio::spawn(async move {
            let _g = other.acquire("orders").await;
        });

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!waiter.is_finished());

        drop(guard);
        tokio::time::timeout(Duration::from_secs(5), waiter)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_released_tables_are_forgotten() {
        let locks = TableLocks::new();
        for i in 0..100 {
            let _g = locks.acquire(&format!("table_{i}")).await;
        }
        let held = locks.acquire("held").await;
        assert_eq!(locks.tracked().await, 1);

        let _other = locks.acquire("other").await;
        assert_eq!(locks.tracked().await, 2);

        // A waiter keeps its entry alive while the guard is held
        let waiting = locks.clone();
        let waiter = tokio::spawn(async move {
            let _g = waiting.acquire("HELD").await;
        });
        tokio::time::sleep(Duration::from_millis(50)).await;
        let _third = locks.acquire("third").await;
        assert_eq!(locks.tracked().await, 3);

        drop(held);
        tokio::time::timeout(Duration::from_secs(5), waiter)
            .await
            .unwrap()
            .unwrap();
        let _fourth = locks.acquire("fourth").await;
        assert_eq!(locks.tracked().await, 3);
    }

    #[tokio::test]
    async fn test_distinct_tables_do_not_contend() {
        let locks = TableLocks::new();
        let _a = locks.acquire("a").await;
        tokio::time::timeout(Duration::from_secs(1), locks.acquire("b"))
            .await
            .unwrap();
    }
}
