pub mod api;
pub mod cache;
pub mod clock;
pub mod config;
pub mod error;
pub mod notify;
pub mod signup;
pub mod storage;
pub mod validation;
pub mod widget;

use crate::api::{HttpWaitlistApi, WaitlistApi};
use crate::cache::CountCache;
use crate::clock::{Clock, SystemClock};
use crate::config::WaitlistConfig;
use crate::notify::Notifier;
use crate::signup::SubmissionCoordinator;
use crate::storage::{FileStore, KeyValueStore};
use crate::widget::WaitlistWidget;
use env_logger::Env;
use std::sync::{Arc, Once};

static LOGGER: Once = Once::new();

pub fn init_logger() {
    LOGGER.call_once(|| {
        env_logger::Builder::from_env(Env::default().default_filter_or("info,reqwest=warn"))
            .format_timestamp(None)
            .init();
    });
}

/// Wire a widget from its collaborators.
pub fn assemble_widget(
    config: &WaitlistConfig,
    store: Arc<dyn KeyValueStore>,
    api: Arc<dyn WaitlistApi>,
    clock: Arc<dyn Clock>,
    notifier: Arc<dyn Notifier>,
) -> WaitlistWidget {
    let cache = Arc::new(CountCache::new(
        store.clone(),
        api.clone(),
        clock,
        config.count_key.clone(),
        config.cache_ttl,
    ));
    let coordinator = SubmissionCoordinator::new(
        api,
        store,
        cache.clone(),
        notifier.clone(),
        config.joined_key.clone(),
    )
    .with_refresh_after_join(config.refresh_after_join);

    WaitlistWidget::new(cache, coordinator, notifier)
}

/// Widget backed by the HTTP client, the on-disk store and the system clock.
pub fn build_widget(
    config: &WaitlistConfig,
    notifier: Arc<dyn Notifier>,
) -> Result<WaitlistWidget, reqwest::Error> {
    let api = HttpWaitlistApi::new(config)?;
    log::debug!(
        "waitlist backend {} (store {})",
        config.base_url,
        config.store_path.display()
    );

    Ok(assemble_widget(
        config,
        Arc::new(FileStore::new(config.store_path.clone())),
        Arc::new(api),
        Arc::new(SystemClock),
        notifier,
    ))
}

#[cfg_attr(not(test), allow(dead_code))]
pub mod test_support {
    //! Test doubles for the backend and the presentation layer.

    use std::collections::VecDeque;

    use async_trait::async_trait;
    use parking_lot::Mutex;
    use reqwest::StatusCode;

    use crate::api::{WaitlistApi, join_failure};
    use crate::error::{FetchError, StorageError, SubmitError};
    use crate::notify::{Notification, Notifier};
    use crate::storage::KeyValueStore;

    /// Backend double that replays queued responses and counts calls.
    ///
    /// Count failures are given as an HTTP status; join failures as a
    /// status plus raw body. An empty queue answers with a 500.
    #[derive(Default)]
    pub struct ScriptedApi {
        counts: Mutex<VecDeque<Result<u64, u16>>>,
        joins: Mutex<VecDeque<Result<(), (u16, String)>>>,
        count_calls: Mutex<usize>,
        joined: Mutex<Vec<String>>,
    }

    impl ScriptedApi {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn push_count(&self, response: Result<u64, u16>) {
            self.counts.lock().push_back(response);
        }

        pub fn push_join(&self, response: Result<(), (u16, String)>) {
            self.joins.lock().push_back(response);
        }

        pub fn count_calls(&self) -> usize {
            *self.count_calls.lock()
        }

        pub fn join_calls(&self) -> usize {
            self.joined.lock().len()
        }

        /// Emails passed to `join`, in call order.
        pub fn joined_emails(&self) -> Vec<String> {
            self.joined.lock().clone()
        }
    }

    fn status(code: u16) -> StatusCode {
        StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    #[async_trait]
    impl WaitlistApi for ScriptedApi {
        async fn fetch_count(&self) -> Result<u64, FetchError> {
            *self.count_calls.lock() += 1;
            match self.counts.lock().pop_front() {
                Some(Ok(count)) => Ok(count),
                Some(Err(code)) => Err(FetchError::Status {
                    status: status(code),
                    body: String::new(),
                }),
                None => Err(FetchError::Status {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    body: "no scripted count".to_string(),
                }),
            }
        }

        async fn join(&self, email: &str) -> Result<(), SubmitError> {
            self.joined.lock().push(email.to_string());
            match self.joins.lock().pop_front() {
                Some(Ok(())) => Ok(()),
                Some(Err((code, body))) => Err(join_failure(status(code), &body)),
                None => Err(join_failure(StatusCode::INTERNAL_SERVER_ERROR, "")),
            }
        }
    }

    /// Store that reads as empty and refuses every write.
    #[derive(Debug, Default)]
    pub struct ReadOnlyStore;

    impl KeyValueStore for ReadOnlyStore {
        fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Ok(None)
        }

        fn set(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::Io(std::io::Error::other("read-only")))
        }

        fn delete(&self, _key: &str) -> Result<(), StorageError> {
            Err(StorageError::Io(std::io::Error::other("read-only")))
        }
    }

    /// Notifier that remembers everything it was asked to show.
    #[derive(Default)]
    pub struct RecordingNotifier {
        notifications: Mutex<Vec<Notification>>,
        celebrations: Mutex<usize>,
    }

    impl RecordingNotifier {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn notifications(&self) -> Vec<Notification> {
            self.notifications.lock().clone()
        }

        pub fn celebrations(&self) -> usize {
            *self.celebrations.lock()
        }
    }

    impl Notifier for RecordingNotifier {
        fn notify(&self, notification: Notification) {
            self.notifications.lock().push(notification);
        }

        fn celebrate(&self) {
            *self.celebrations.lock() += 1;
        }
    }
}
