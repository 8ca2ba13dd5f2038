//! HTTP client for the manager.
//!
//! # Responsibilities
//! - Fetch the current metrics descriptors (`GET <config_path>`)
//! - Register this sidecar for change notifications (`POST <subscriptions_path>`)

use std::future::Future;
use std::time::Duration;

use axum::body::Bytes;
use reqwest::StatusCode;
use thiserror::Error;

use crate::config::ManagerConfig;
use crate::manager::subscription::{SubscribeError, SubscriptionOutcome, SubscriptionRequest};
use crate::observability::metrics;
use crate::resilience::RetryPolicy;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("descriptor request failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("descriptor request rejected: {0}")]
    Status(StatusCode),

    #[error("descriptor body unreadable: {0}")]
    Body(#[source] reqwest::Error),
}

/// Where the control loop gets descriptors from.
pub trait DescriptorSource {
    fn fetch(&self) -> impl Future<Output = Result<Bytes, FetchError>> + Send;
}

/// Manager client sharing one connection pool across fetches and subscribes.
#[derive(Debug, Clone)]
pub struct ManagerClient {
    client: reqwest::Client,
    config_url: String,
    subscriptions_url: String,
    fetch_timeout: Duration,
    subscribe_timeout: Duration,
    notify_max_retries: u32,
    notify_retry_timer: u32,
}

impl ManagerClient {
    pub fn new(config: &ManagerConfig) -> Result<Self, reqwest::Error> {
        let base = config.base_url.trim_end_matches('/');
        Ok(Self {
            client: reqwest::Client::builder().build()?,
            config_url: format!("{}{}", base, config.config_path),
            subscriptions_url: format!("{}{}", base, config.subscriptions_path),
            fetch_timeout: Duration::from_secs(config.fetch_timeout_secs),
            subscribe_timeout: Duration::from_secs(config.subscribe_timeout_secs),
            notify_max_retries: config.notify_max_retries,
            notify_retry_timer: config.notify_retry_timer,
        })
    }

    pub fn config_url(&self) -> &str {
        &self.config_url
    }

    pub fn subscriptions_url(&self) -> &str {
        &self.subscriptions_url
    }

    /// One descriptor fetch. Anything but 200 is a failure.
    pub async fn fetch_descriptor(&self) -> Result<Bytes, FetchError> {
        tracing::info!(url = %self.config_url, "Fetching descriptors");

        let result = async {
            let response = self
                .client
                .get(&self.config_url)
                .header(reqwest::header::CONTENT_TYPE, "application/json")
                .timeout(self.fetch_timeout)
                .send()
                .await
                .map_err(FetchError::Transport)?;

            if response.status() != StatusCode::OK {
                return Err(FetchError::Status(response.status()));
            }
            response.bytes().await.map_err(FetchError::Body)
        }
        .await;

        match &result {
            Ok(body) => tracing::info!(bytes = body.len(), "Descriptors fetched"),
            Err(e) => tracing::error!(url = %self.config_url, error = %e, "Descriptor fetch failed"),
        }
        metrics::record_descriptor_fetch(result.is_ok());
        result
    }

    /// Subscribe `target_url` for notifications, retrying per `policy`.
    pub async fn subscribe(&self, target_url: &str, policy: RetryPolicy) -> SubscriptionOutcome {
        let body = SubscriptionRequest {
            max_retries: self.notify_max_retries,
            retry_timer: self.notify_retry_timer,
            event_type: "all",
            target_url: target_url.to_string(),
        };

        let mut attempt = 0;
        loop {
            attempt += 1;
            let error = match self.subscribe_once(&body).await {
                Ok(id) => {
                    metrics::record_subscription_attempt("success");
                    tracing::info!(id = %id, attempt, "Subscribed for notifications");
                    return Ok(id);
                }
                Err(e) if !e.is_retryable() => {
                    metrics::record_subscription_attempt("fatal");
                    tracing::error!(error = %e, "Subscription request cannot be built");
                    return Err(e);
                }
                Err(e) => e,
            };

            metrics::record_subscription_attempt("retry");
            match policy.next_delay(attempt) {
                Some(delay) => {
                    tracing::warn!(error = %error, attempt, delay = ?delay, "Subscription attempt failed, retrying");
                    tokio::time::sleep(delay).await;
                }
                None => {
                    tracing::error!(error = %error, attempt, "Subscription attempts exhausted");
                    return Err(SubscribeError::Exhausted {
                        attempts: attempt,
                        last: Box::new(error),
                    });
                }
            }
        }
    }

    async fn subscribe_once(&self, body: &SubscriptionRequest) -> Result<String, SubscribeError> {
        let request = self
            .client
            .post(&self.subscriptions_url)
            .timeout(self.subscribe_timeout)
            .json(body)
            .build()
            .map_err(SubscribeError::Request)?;

        let response = self
            .client
            .execute(request)
            .await
            .map_err(SubscribeError::Transport)?;

        let status = response.status();
        if status != StatusCode::CREATED {
            return Err(SubscribeError::Status(status));
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| SubscribeError::Body(e.to_string()))?;
        body.get("id")
            .and_then(serde_json::Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| SubscribeError::Body(format!("no string 'id' in {}", body)))
    }
}

impl DescriptorSource for ManagerClient {
    fn fetch(&self) -> impl Future<Output = Result<Bytes, FetchError>> + Send {
        self.fetch_descriptor()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urls_join_base_and_paths() {
        let mut config = ManagerConfig::default();
        config.base_url = "http://appmgr:8080/".into();
        let client = ManagerClient::new(&config).unwrap();
        assert_eq!(client.config_url(), "http://appmgr:8080/ric/v1/config");
        assert_eq!(client.subscriptions_url(), "http://appmgr:8080/ric/v1/subscriptions");
    }

    #[tokio::test]
    async fn test_unbuildable_request_is_not_retried() {
        let mut config = ManagerConfig::default();
        config.base_url = "not a url".into();
        let client = ManagerClient::new(&config).unwrap();

        let policy = RetryPolicy::forever(Duration::from_millis(10));
        let err = tokio::time::timeout(Duration::from_secs(5), client.subscribe("http://me/", policy))
            .await
            .expect("non-retryable error must end the loop")
            .unwrap_err();
        assert!(matches!(err, SubscribeError::Request(_)));
    }
}
