//! Join requests and the persisted success flag.

use std::sync::Arc;

use crate::api::WaitlistApi;
use crate::cache::CountCache;
use crate::error::{StorageError, SubmitError};
use crate::notify::{Notification, Notifier};
use crate::storage::KeyValueStore;

pub const JOINED_MESSAGE: &str = "You're on the waitlist!";

const FLAG_TRUE: &str = "true";

/// Read the success flag. Anything other than `"true"` counts as unset.
pub fn read_success_flag(store: &dyn KeyValueStore, key: &str) -> bool {
    match store.get(key) {
        Ok(Some(value)) => value == FLAG_TRUE,
        Ok(None) => false,
        Err(err) => {
            log::warn!("failed to read success flag {}: {}", key, err);
            false
        }
    }
}

pub fn write_success_flag(store: &dyn KeyValueStore, key: &str) -> Result<(), StorageError> {
    store.set(key, FLAG_TRUE)
}

/// Submission Coordinator.
///
/// Email shape is the caller's concern; `submit` sends whatever it is given.
pub struct SubmissionCoordinator {
    api: Arc<dyn WaitlistApi>,
    store: Arc<dyn KeyValueStore>,
    cache: Arc<CountCache>,
    notifier: Arc<dyn Notifier>,
    joined_key: String,
    refresh_after_join: bool,
}

impl SubmissionCoordinator {
    pub fn new(
        api: Arc<dyn WaitlistApi>,
        store: Arc<dyn KeyValueStore>,
        cache: Arc<CountCache>,
        notifier: Arc<dyn Notifier>,
        joined_key: impl Into<String>,
    ) -> Self {
        Self {
            api,
            store,
            cache,
            notifier,
            joined_key: joined_key.into(),
            refresh_after_join: false,
        }
    }

    /// Re-fetch the authoritative count after a join instead of
    /// incrementing `known_count`.
    pub fn with_refresh_after_join(mut self, enabled: bool) -> Self {
        self.refresh_after_join = enabled;
        self
    }

    pub fn has_joined(&self) -> bool {
        read_success_flag(self.store.as_ref(), &self.joined_key)
    }

    /// Send a join request for `email`.
    ///
    /// On success the cached count becomes `known_count + 1`, the success
    /// flag is persisted, the celebration fires and the new count is
    /// returned. On failure nothing local changes and an error notification
    /// carries the server's reason when it gave one.
    ///
    /// `known_count` is `None` when the caller never obtained a real count.
    /// The returned count is then `1` for display, but it is not cached.
    pub async fn submit(
        &self,
        email: &str,
        known_count: Option<u64>,
    ) -> Result<u64, SubmitError> {
        log::info!("submitting waitlist join");

        if let Err(err) = self.api.join(email).await {
            log::error!("waitlist join failed: {}", err);
            self.notifier.notify(Notification::error(err.user_message()));
            return Err(err);
        }

        let count = self.settle_count(known_count).await;

        // The server accepted the join; local persistence failures are
        // logged rather than reported as a failed signup.
        if let Err(err) = write_success_flag(self.store.as_ref(), &self.joined_key) {
            log::error!("failed to persist success flag: {}", err);
        }

        self.notifier.celebrate();
        self.notifier.notify(Notification::success(JOINED_MESSAGE));
        log::info!("joined waitlist, count now {}", count);
        Ok(count)
    }

    async fn settle_count(&self, known_count: Option<u64>) -> u64 {
        let optimistic = known_count.unwrap_or(0).saturating_add(1);

        if self.refresh_after_join {
            match self.cache.refresh().await {
                Ok(count) => return count,
                Err(err) => {
                    log::warn!("count refresh after join failed, using {}: {}", optimistic, err)
                }
            }
        }

        if known_count.is_none() {
            log::debug!("count was never loaded, not caching {}", optimistic);
            return optimistic;
        }

        if let Err(err) = self.cache.publish(optimistic) {
            log::error!("failed to cache updated count: {}", err);
        }
        optimistic
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::notify::NotificationKind;
    use crate::storage::MemoryStore;
    use crate::test_support::{ReadOnlyStore, RecordingNotifier, ScriptedApi};
    use std::time::Duration;

    const COUNT_KEY: &str = "waitlist_count";
    const JOINED_KEY: &str = "waitlist_joined";
    const T0: i64 = 1_700_000_000_000;

    struct Fixture {
        store: Arc<MemoryStore>,
        api: Arc<ScriptedApi>,
        notifier: Arc<RecordingNotifier>,
        cache: Arc<CountCache>,
        coordinator: SubmissionCoordinator,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let api = Arc::new(ScriptedApi::new());
        let notifier = Arc::new(RecordingNotifier::new());
        let clock = Arc::new(ManualClock::new(T0));
        let cache = Arc::new(CountCache::new(
            store.clone(),
            api.clone(),
            clock,
            COUNT_KEY,
            Duration::from_secs(7200),
        ));
        let coordinator = SubmissionCoordinator::new(
            api.clone(),
            store.clone(),
            cache.clone(),
            notifier.clone(),
            JOINED_KEY,
        );
        Fixture {
            store,
            api,
            notifier,
            cache,
            coordinator,
        }
    }

    #[test]
    fn flag_reads_only_literal_true() {
        let store = MemoryStore::new();
        assert!(!read_success_flag(&store, JOINED_KEY));
        store.set(JOINED_KEY, "yes").unwrap();
        assert!(!read_success_flag(&store, JOINED_KEY));
        write_success_flag(&store, JOINED_KEY).unwrap();
        assert!(read_success_flag(&store, JOINED_KEY));
    }

    #[tokio::test]
    async fn success_increments_and_sets_flag() {
        let fx = fixture();
        fx.api.push_join(Ok(()));

        let count = fx.coordinator.submit("a@b.com", Some(42)).await.unwrap();

        assert_eq!(count, 43);
        assert_eq!(fx.cache.cached().unwrap().count, 43);
        assert_eq!(fx.cache.cached().unwrap().timestamp, T0);
        assert!(fx.coordinator.has_joined());
        assert_eq!(fx.notifier.celebrations(), 1);
        assert_eq!(
            fx.notifier.notifications(),
            vec![Notification::success(JOINED_MESSAGE)]
        );
        assert_eq!(fx.api.joined_emails(), vec!["a@b.com".to_string()]);
        // optimistic: no refetch
        assert_eq!(fx.api.count_calls(), 0);
    }

    #[tokio::test]
    async fn rejection_surfaces_server_reason_and_changes_nothing() {
        let fx = fixture();
        fx.cache.publish(42).unwrap();
        fx.api.push_join(Err((400, r#"{"error":"already joined"}"#.to_string())));

        let err = fx.coordinator.submit("a@b.com", Some(42)).await.unwrap_err();

        assert!(matches!(err, SubmitError::Rejected { .. }));
        assert_eq!(fx.cache.cached().unwrap().count, 42);
        assert!(!fx.coordinator.has_joined());
        assert_eq!(fx.store.get(JOINED_KEY).unwrap(), None);
        assert_eq!(fx.notifier.celebrations(), 0);
        let notes = fx.notifier.notifications();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].kind, NotificationKind::Error);
        assert_eq!(notes[0].message, "already joined");
    }

    #[tokio::test]
    async fn refresh_mode_uses_server_count() {
        let fx = fixture();
        let coordinator = SubmissionCoordinator::new(
            fx.api.clone(),
            fx.store.clone(),
            fx.cache.clone(),
            fx.notifier.clone(),
            JOINED_KEY,
        )
        .with_refresh_after_join(true);
        fx.api.push_join(Ok(()));
        fx.api.push_count(Ok(100));

        assert_eq!(coordinator.submit("a@b.com", Some(42)).await.unwrap(), 100);
        assert_eq!(fx.api.count_calls(), 1);
        assert_eq!(fx.cache.cached().unwrap().count, 100);
    }

    #[tokio::test]
    async fn refresh_mode_falls_back_to_optimistic_count() {
        let fx = fixture();
        let coordinator = SubmissionCoordinator::new(
            fx.api.clone(),
            fx.store.clone(),
            fx.cache.clone(),
            fx.notifier.clone(),
            JOINED_KEY,
        )
        .with_refresh_after_join(true);
        fx.api.push_join(Ok(()));
        fx.api.push_count(Err(500));

        assert_eq!(coordinator.submit("a@b.com", Some(42)).await.unwrap(), 43);
        assert_eq!(fx.cache.cached().unwrap().count, 43);
        assert!(coordinator.has_joined());
    }

    #[tokio::test]
    async fn accepted_join_survives_unwritable_store() {
        let api = Arc::new(ScriptedApi::new());
        let notifier = Arc::new(RecordingNotifier::new());
        let store = Arc::new(ReadOnlyStore);
        let cache = Arc::new(CountCache::new(
            store.clone(),
            api.clone(),
            Arc::new(ManualClock::new(T0)),
            COUNT_KEY,
            Duration::from_secs(7200),
        ));
        let coordinator =
            SubmissionCoordinator::new(api.clone(), store, cache, notifier.clone(), JOINED_KEY);
        api.push_join(Ok(()));

        assert_eq!(coordinator.submit("a@b.com", Some(42)).await.unwrap(), 43);
        assert!(!coordinator.has_joined());
        assert_eq!(notifier.celebrations(), 1);
        assert_eq!(
            notifier.notifications(),
            vec![Notification::success(JOINED_MESSAGE)]
        );
    }

    #[tokio::test]
    async fn unknown_count_is_shown_but_not_cached() {
        let fx = fixture();
        fx.api.push_join(Ok(()));

        assert_eq!(fx.coordinator.submit("a@b.com", None).await.unwrap(), 1);
        assert!(fx.cache.cached().is_none());
        assert_eq!(fx.store.get(COUNT_KEY).unwrap(), None);
        assert!(fx.coordinator.has_joined());
    }
}
