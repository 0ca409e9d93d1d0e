use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::WaitlistApi;
use crate::config::WaitlistConfig;
use crate::error::{FetchError, SubmitError};

#[derive(Debug, Serialize)]
struct JoinRequest<'a> {
    email: &'a str,
}

#[derive(Debug, Deserialize)]
struct CountResponse {
    count: u64,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

/// `reqwest`-backed client for the waitlist endpoints.
#[derive(Clone)]
pub struct HttpWaitlistApi {
    http: reqwest::Client,
    count_url: String,
    join_url: String,
}

impl HttpWaitlistApi {
    pub fn new(config: &WaitlistConfig) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(Duration::from_secs(5))
            .user_agent(concat!("waitlist-client/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            count_url: config.count_url(),
            join_url: config.join_url(),
        })
    }
}

#[async_trait]
impl WaitlistApi for HttpWaitlistApi {
    async fn fetch_count(&self) -> Result<u64, FetchError> {
        let response = self.http.get(&self.count_url).send().await?;
        let status = response.status();
        let body = response.bytes().await?;
        decode_count(status, &body)
    }

    async fn join(&self, email: &str) -> Result<(), SubmitError> {
        let response = self
            .http
            .post(&self.join_url)
            .json(&JoinRequest { email })
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(join_failure(status, &body))
    }
}

/// Interpret a count response. Any non-2xx status is a failure.
pub fn decode_count(status: StatusCode, body: &[u8]) -> Result<u64, FetchError> {
    if !status.is_success() {
        return Err(FetchError::Status {
            status,
            body: String::from_utf8_lossy(body).into_owned(),
        });
    }

    let parsed: CountResponse = serde_json::from_slice(body)?;
    Ok(parsed.count)
}

/// Build the error for a non-2xx join response, keeping the server's
/// `error` field when the body carries one.
pub fn join_failure(status: StatusCode, body: &str) -> SubmitError {
    let message = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|parsed| parsed.error)
        .filter(|message| !message.trim().is_empty());

    SubmitError::Rejected { status, message }
}
