pub mod clock;
pub mod error;
pub mod identity;
pub mod user;

use std::{collections::HashMap, sync::Arc, time::Duration};

use clock::{Clock, SystemClock};
use identity::UserId;
use tokio::{sync::RwLock, task::JoinHandle, time::MissedTickBehavior};
use user::{UserPresence, UserProfile};

/// A user counts as active if their last heartbeat is at most this old.
pub const ACTIVITY_WINDOW_SECS: i64 = 10;
/// Records older than this are dropped by the sweeper.
pub const EXPIRY_SECS: i64 = 30;
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(10);

/// Outcome of a single sweep pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SweepStats {
    pub removed: usize,
    pub remaining: usize,
}

/// In-memory table of the latest heartbeat per user.
///
/// Reads (`active_users`, `get`) share the lock; `upsert` and `sweep` take it
/// exclusively. Nothing in here can fail once an id has been resolved.
#[derive(Debug)]
pub struct PresenceRegistry {
    users: RwLock<HashMap<UserId, UserPresence>>,
    clock: Arc<dyn Clock>,
}

impl PresenceRegistry {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        PresenceRegistry {
            users: RwLock::new(HashMap::new()),
            clock,
        }
    }

    /// Stores a fresh record for `id`, replacing whatever was there.
    pub async fn upsert(&self, id: UserId, profile: UserProfile) -> UserPresence {
        let presence = profile.into_presence(id, self.clock.now());

        self.users.write().await.insert(id, presence.clone());

        tracing::info!(user_id = id, first_name = %presence.first_name, "User heartbeat");
        presence
    }

    /// Records whose last heartbeat is within `window_secs` of now.
    pub async fn active_users(&self, window_secs: i64) -> Vec<UserPresence> {
        let users_guard = self.users.read().await;
        let now = self.clock.now();

        users_guard
            .values()
            .filter(|user| now - user.last_seen <= window_secs)
            .cloned()
            .collect()
    }

    /// Drops every record older than `expiry_secs`.
    pub async fn sweep(&self, expiry_secs: i64) -> SweepStats {
        let stats = {
            let mut users_guard = self.users.write().await;
            let now = self.clock.now();
            let before = users_guard.len();

            users_guard.retain(|_, user| now - user.last_seen <= expiry_secs);

            SweepStats {
                removed: before - users_guard.len(),
                remaining: users_guard.len(),
            }
        };

        if stats.removed > 0 {
            tracing::info!(
                removed = stats.removed,
                remaining = stats.remaining,
                "Removed inactive users"
            );
        }
        stats
    }

    /// Raw lookup, ignoring the activity window.
    pub async fn get(&self, id: UserId) -> Option<UserPresence> {
        self.users.read().await.get(&id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.users.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.users.read().await.is_empty()
    }

    /// Spawns the background task that sweeps every `period`.
    ///
    /// The first pass runs one `period` after the call. The task never exits on
    /// its own; abort the returned handle to stop it.
    pub fn spawn_sweeper(self: &Arc<Self>, period: Duration, expiry_secs: i64) -> JoinHandle<()> {
        let registry = Arc::clone(self);

        tokio::spawn(async move {
            let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                interval.tick().await;
                registry.sweep(expiry_secs).await;
            }
        })
    }
}

impl Default for PresenceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clock::ManualClock;

    const T0: i64 = 1_700_000_000;

    fn registry_at(start: i64) -> (Arc<ManualClock>, PresenceRegistry) {
        let clock = Arc::new(ManualClock::new(start));
        let registry = PresenceRegistry::with_clock(clock.clone());
        (clock, registry)
    }

    fn profile(first: &str, last: &str, username: &str) -> UserProfile {
        UserProfile {
            first_name: Some(first.to_string()),
            last_name: Some(last.to_string()),
            username: Some(username.to_string()),
        }
    }

    #[tokio::test]
    async fn test_upsert_creates_record() {
        let (_clock, registry) = registry_at(T0);

        let stored = registry.upsert(42, profile("Ann", "Lee", "ann")).await;

        assert_eq!(stored.last_seen, T0);
        assert_eq!(registry.len().await, 1);
        assert_eq!(registry.get(42).await, Some(stored));
    }

    #[tokio::test]
    async fn test_upsert_replaces_whole_record() {
        let (clock, registry) = registry_at(T0);

        registry.upsert(1, profile("Ann", "Lee", "ann")).await;
        clock.advance(3);
        registry
            .upsert(
                1,
                UserProfile {
                    first_name: Some("Bea".into()),
                    ..UserProfile::default()
                },
            )
            .await;

        let user = registry.get(1).await.unwrap();
        assert_eq!(user.first_name, "Bea");
        assert_eq!(user.last_name, "");
        assert_eq!(user.username, "");
        assert_eq!(user.last_seen, T0 + 3);
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn test_older_heartbeat_still_wins_if_last() {
        let (clock, registry) = registry_at(T0 + 20);
        registry.upsert(5, UserProfile::default()).await;

        clock.set(T0);
        registry.upsert(5, UserProfile::default()).await;

        assert_eq!(registry.get(5).await.unwrap().last_seen, T0);
    }

    #[tokio::test]
    async fn test_active_window_boundary() {
        let (clock, registry) = registry_at(T0);
        registry.upsert(1, UserProfile::default()).await; // age 11
        clock.advance(1);
        registry.upsert(2, UserProfile::default()).await; // age 10
        clock.advance(10);
        registry.upsert(3, UserProfile::default()).await; // age 0

        let mut ids: Vec<UserId> = registry
            .active_users(ACTIVITY_WINDOW_SECS)
            .await
            .into_iter()
            .map(|u| u.id)
            .collect();
        ids.sort_unstable();

        assert_eq!(ids, vec![2, 3]);
    }

    #[tokio::test]
    async fn test_stale_user_hidden_but_not_evicted() {
        let (clock, registry) = registry_at(T0);
        registry.upsert(7, UserProfile::default()).await;

        clock.advance(15);

        assert!(registry.active_users(ACTIVITY_WINDOW_SECS).await.is_empty());
        assert!(registry.get(7).await.is_some());

        let stats = registry.sweep(EXPIRY_SECS).await;
        assert_eq!(stats, SweepStats { removed: 0, remaining: 1 });
    }

    #[tokio::test]
    async fn test_sweep_expiry_boundary() {
        let (clock, registry) = registry_at(T0);
        registry.upsert(7, UserProfile::default()).await; // age 31
        clock.advance(1);
        registry.upsert(8, UserProfile::default()).await; // age 30
        clock.advance(30);

        let stats = registry.sweep(EXPIRY_SECS).await;

        assert_eq!(stats, SweepStats { removed: 1, remaining: 1 });
        assert!(registry.get(7).await.is_none());
        assert!(registry.get(8).await.is_some());
    }

    #[tokio::test]
    async fn test_sweep_on_empty_registry() {
        let (_clock, registry) = registry_at(T0);
        let stats = registry.sweep(EXPIRY_SECS).await;
        assert_eq!(stats, SweepStats { removed: 0, remaining: 0 });
        assert!(registry.is_empty().await);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_upserts_are_not_lost() {
        let (_clock, registry) = registry_at(T0);
        let registry = Arc::new(registry);

        let tasks = (0..200).map(|id| {
            let registry = Arc::clone(&registry);
            tokio::spawn(async move {
                registry.upsert(id, UserProfile::default()).await;
            })
        });
        for result in futures_util::future::join_all(tasks).await {
            result.unwrap();
        }

        assert_eq!(registry.active_users(ACTIVITY_WINDOW_SECS).await.len(), 200);
    }

    #[tokio::test]
    async fn test_sweeper_task_evicts_expired() {
        let (clock, registry) = registry_at(T0);
        let registry = Arc::new(registry);
        registry.upsert(7, UserProfile::default()).await;
        clock.advance(31);

        let handle = registry.spawn_sweeper(Duration::from_millis(10), EXPIRY_SECS);
        tokio::time::sleep(Duration::from_millis(100)).await;
        handle.abort();

        assert!(registry.is_empty().await);
    }
}
