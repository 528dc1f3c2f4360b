use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

use super::{CounterStore, Hit, ThrottleError};

/// Request times for one key, oldest first
type RequestLog = VecDeque<Instant>;

/// Process-local sliding-log store.
///
/// Each key's check-and-log runs under that key's map entry, so counts are
/// exact within a single process. Once the map holds `max_entries` keys, keys
/// with nothing left in the period are swept, at most once per period.
pub struct MemoryCounterStore {
    history: DashMap<String, RequestLog>,
    max_entries: usize,
    next_sweep: Mutex<Instant>,
}

impl MemoryCounterStore {
    pub fn new(max_entries: usize) -> Self {
        Self {
            history: DashMap::new(),
            max_entries,
            next_sweep: Mutex::new(Instant::now()),
        }
    }

    fn maybe_sweep(&self, now: Instant, period: Duration) {
        if self.history.len() < self.max_entries {
            return;
        }
        // Another caller is already sweeping
        let Ok(mut next_sweep) = self.next_sweep.try_lock() else {
            return;
        };
        if now < *next_sweep {
            return;
        }
        *next_sweep = now + period;

        let before = self.history.len();
        self.history.retain(|_, log| {
            prune(log, now, period);
            !log.is_empty()
        });
        tracing::debug!("Swept {} idle throttle keys", before - self.history.len());
    }
}

fn prune(log: &mut RequestLog, now: Instant, period: Duration) {
    while log.front().is_some_and(|&at| now.duration_since(at) >= period) {
        log.pop_front();
    }
}

#[async_trait]
impl CounterStore for MemoryCounterStore {
    async fn hit(&self, key: &str, limit: u64, period: Duration) -> Result<Hit, ThrottleError> {
        let now = Instant::now();
        if !self.history.contains_key(key) {
            self.maybe_sweep(now, period);
        }

        let mut log = self.history.entry(key.to_string()).or_default();
        prune(&mut log, now, period);

        let allowed = (log.len() as u64) < limit;
        if allowed {
            log.push_back(now);
        }
        let reset_in = log
            .front()
            .map_or(period, |&oldest| period.saturating_sub(now.duration_since(oldest)));

        Ok(Hit {
            allowed,
            count: log.len() as u64,
            reset_in,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PERIOD: Duration = Duration::from_secs(10);

    #[tokio::test]
    async fn logs_requests_until_limit() {
        let store = MemoryCounterStore::new(10);
        assert_eq!(store.hit("k", 2, PERIOD).await.unwrap().count, 1);

        let hit = store.hit("k", 2, PERIOD).await.unwrap();
        assert!(hit.allowed);
        assert_eq!(hit.count, 2);
        assert!(hit.reset_in <= PERIOD);

        let hit = store.hit("k", 2, PERIOD).await.unwrap();
        assert!(!hit.allowed);
        assert_eq!(hit.count, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn old_requests_slide_out_of_the_period() {
        let store = MemoryCounterStore::new(10);
        store.hit("k", 2, PERIOD).await.unwrap();
        tokio::time::advance(Duration::from_secs(6)).await;
        store.hit("k", 2, PERIOD).await.unwrap();

        tokio::time::advance(Duration::from_secs(5)).await;
        let hit = store.hit("k", 2, PERIOD).await.unwrap();
        assert!(hit.allowed);
        assert_eq!(hit.count, 2);
        // The request from t=6s is now the oldest and leaves at t=16s
        assert_eq!(hit.reset_in, Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn sweeps_idle_keys_at_most_once_per_period() {
        let store = MemoryCounterStore::new(2);
        store.hit("a", 5, PERIOD).await.unwrap();
        tokio::time::advance(Duration::from_secs(5)).await;
        store.hit("b", 5, PERIOD).await.unwrap();

        // Full, but nothing has expired yet; the next sweep is due at t=15s
        store.hit("c", 5, PERIOD).await.unwrap();
        assert_eq!(store.history.len(), 3);

        // "a" is idle at t=12s, but sweeping is still on hold
        tokio::time::advance(Duration::from_secs(7)).await;
        store.hit("d", 5, PERIOD).await.unwrap();
        assert_eq!(store.history.len(), 4);

        tokio::time::advance(Duration::from_secs(4)).await;
        store.hit("e", 5, PERIOD).await.unwrap();
        let mut keys: Vec<String> = store.history.iter().map(|e| e.key().clone()).collect();
        keys.sort();
        assert_eq!(keys, vec!["d", "e"]);
    }
}
