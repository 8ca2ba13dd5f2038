//! Manager integration subsystem.
//!
//! # Data Flow
//! ```text
//! startup
//!     → subscription.rs spawn_subscription (background task)
//!     → client.rs POST per attempt, fixed-interval retries
//!     → SubscriptionOutcome (oneshot) → control loop
//!
//! change notification in the control loop
//!     → client.rs fetch_descriptor (GET, timeout)
//!     → descriptor bytes or FetchError
//! ```

pub mod client;
pub mod subscription;

pub use client::{DescriptorSource, FetchError, ManagerClient};
pub use subscription::{spawn_subscription, SubscribeError, SubscriptionOutcome, SubscriptionRequest};
