//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Subscribe attempt against the manager:
//!     → manager/subscription.rs (one POST, classify the failure)
//!     → retryable: backoff.rs (fixed delay, optional attempt bound)
//!     → non-retryable or bound reached: outcome reported to the control loop
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every external call has a deadline
//! - Fixed interval, no jitter: a single sidecar talks to a single manager
//! - Retrying happens inside the client, never across the control loop

pub mod backoff;

pub use backoff::RetryPolicy;
