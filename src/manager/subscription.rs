//! Notification subscription against the manager.

use reqwest::StatusCode;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::oneshot;

use crate::manager::client::ManagerClient;
use crate::resilience::RetryPolicy;

/// Body of `POST <subscriptions_path>`.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionRequest {
    pub max_retries: u32,
    pub retry_timer: u32,
    pub event_type: &'static str,
    pub target_url: String,
}

#[derive(Debug, Error)]
pub enum SubscribeError {
    #[error("cannot build subscription request: {0}")]
    Request(#[source] reqwest::Error),

    #[error("posting subscription failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("wrong subscription response status {0}")]
    Status(StatusCode),

    #[error("malformed subscription response: {0}")]
    Body(String),

    #[error("subscription gave up after {attempts} attempts: {last}")]
    Exhausted {
        attempts: u32,
        #[source]
        last: Box<SubscribeError>,
    },
}

impl SubscribeError {
    /// Transport and response problems may clear up; a request that cannot
    /// be built never will.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            SubscribeError::Transport(_) | SubscribeError::Status(_) | SubscribeError::Body(_)
        )
    }
}

/// Subscription id assigned by the manager, or why there is none.
pub type SubscriptionOutcome = Result<String, SubscribeError>;

/// Run the subscription in the background; the outcome arrives exactly once.
pub fn spawn_subscription(
    client: ManagerClient,
    target_url: String,
    policy: RetryPolicy,
) -> oneshot::Receiver<SubscriptionOutcome> {
    let (tx, rx) = oneshot::channel();
    tokio::spawn(async move {
        tracing::info!(
            manager = %client.subscriptions_url(),
            target = %target_url,
            "Subscribing for notifications"
        );
        let outcome = client.subscribe(&target_url, policy).await;
        let _ = tx.send(outcome);
    });
    rx
}
