//! Signup session tying the count cache and the coordinator together.

use std::sync::Arc;

use serde::Serialize;

use crate::cache::CountCache;
use crate::error::SubmitError;
use crate::notify::{Notification, Notifier};
use crate::signup::SubmissionCoordinator;
use crate::validation::{is_valid_email, normalize_email};

/// UI-observable signup state. `Submitted` is terminal.
///
/// `Submitting` only holds while `WaitlistWidget::submit` is awaiting the
/// backend, during which the widget is mutably borrowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SignupState {
    NotSubmitted,
    Submitting,
    Submitted,
}

pub struct WaitlistWidget {
    cache: Arc<CountCache>,
    coordinator: SubmissionCoordinator,
    notifier: Arc<dyn Notifier>,
    count: u64,
    // false while `count` is the fallback rather than a fetched or cached value
    count_loaded: bool,
    state: SignupState,
}

impl WaitlistWidget {
    pub fn new(
        cache: Arc<CountCache>,
        coordinator: SubmissionCoordinator,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let state = if coordinator.has_joined() {
            SignupState::Submitted
        } else {
            SignupState::NotSubmitted
        };

        Self {
            cache,
            coordinator,
            notifier,
            count: 0,
            count_loaded: false,
            state,
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn state(&self) -> SignupState {
        self.state
    }

    /// Populate the displayed count. A failed fetch shows 0.
    pub async fn load(&mut self) -> u64 {
        (self.count, self.count_loaded) = match self.cache.get_count().await {
            Ok(count) => (count, true),
            Err(err) => {
                log::warn!("showing default waitlist count: {}", err);
                (0, false)
            }
        };
        self.count
    }

    /// Validate and submit `raw_email`, moving through
    /// `NotSubmitted -> Submitting -> Submitted | NotSubmitted`.
    pub async fn submit(&mut self, raw_email: &str) -> Result<(), SubmitError> {
        if self.state == SignupState::Submitted {
            return Err(self.reject(SubmitError::AlreadyJoined));
        }

        let email = normalize_email(raw_email);
        if !is_valid_email(&email) {
            return Err(self.reject(SubmitError::InvalidEmail(email)));
        }

        self.state = SignupState::Submitting;
        let known_count = self.count_loaded.then_some(self.count);
        match self.coordinator.submit(&email, known_count).await {
            Ok(count) => {
                self.count = count;
                self.state = SignupState::Submitted;
                Ok(())
            }
            Err(err) => {
                self.state = SignupState::NotSubmitted;
                Err(err)
            }
        }
    }

    fn reject(&self, err: SubmitError) -> SubmitError {
        log::debug!("submission rejected locally: {}", err);
        self.notifier.notify(Notification::error(err.user_message()));
        err
    }
}
