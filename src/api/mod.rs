//! Remote waitlist endpoints.

mod client;

pub use client::{HttpWaitlistApi, decode_count, join_failure};

use async_trait::async_trait;

use crate::error::{FetchError, SubmitError};

/// Operations the waitlist backend exposes.
#[async_trait]
pub trait WaitlistApi: Send + Sync {
    /// `GET /api/waitlist/count`
    async fn fetch_count(&self) -> Result<u64, FetchError>;

    /// `POST /api/waitlist/join`
    async fn join(&self, email: &str) -> Result<(), SubmitError>;
}
