#![forbid(unsafe_code)]
#![deny(warnings)]
#![cfg_attr(not(test), deny(clippy::all))]

//! # repomuse
//!
//! Resilient client core for AI-assisted GitHub repository tooling. The UI
//! shell (rendering, charts, DOM wiring) lives elsewhere; this crate owns
//! everything that talks to the network and everything worth getting right
//! about how those calls fail.
//!
//! ## What's inside
//!
//! - **Retry core** — [`RetryPolicy`] runs an async operation with bounded
//!   exponential backoff, a retryability predicate, optional jitter, and
//!   cooperative cancellation via [`CancelToken`]
//! - **Generation client** — [`AiClient`] speaks the serverless generation
//!   proxy's contract: capability-tagged requests, shape-validated responses,
//!   retries on rate limiting only
//! - **GitHub client** — [`GithubClient`] fetches repository metadata and
//!   file contents for prompt assembly
//! - **Prompt assembly** — [`prompt`] builds the operation prompts
//! - **Session** — [`Session`] holds one user's working context and the
//!   high-level operations
//!
//! ## Quick Start
//!
//! ```rust
//! use repomuse::{Backoff, RetryPolicy};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() {
//!     let policy = RetryPolicy::builder()
//!         .max_attempts(3)
//!         .backoff(Backoff::exponential(Duration::from_millis(100)))
//!         .build()
//!         .unwrap();
//!
//!     let result = policy
//!         .execute(|| async {
//!             // One attempt against something unreliable.
//!             Ok::<_, std::io::Error>("payload")
//!         })
//!         .await;
//!     assert_eq!(result.unwrap(), "payload");
//! }
//! ```

pub mod api;
pub mod backoff;
pub mod cancel;
pub mod error;
pub mod github;
pub mod jitter;
pub mod prompt;
pub mod retry;
pub mod session;
pub mod sleeper;

// Re-exports
pub use api::{
    AiClient, AiClientBuilder, ApiError, Capability, ClientBuildError, GeneratedImage,
    GenerateRequest, Generation,
};
pub use backoff::{Backoff, BackoffError, MAX_BACKOFF};
pub use cancel::CancelToken;
pub use error::CallError;
pub use github::{GithubClient, GithubError, RepoInfo, RepoRef};
pub use jitter::Jitter;
pub use retry::{BuildError, RetryConfig, RetryPolicy, RetryPolicyBuilder};
pub use session::{Session, SessionError};
pub use sleeper::{InstantSleeper, RecordingSleeper, Sleeper, TokioSleeper};
