//! # Tower Window
//!
//! `tower-window` puts a [`window_limit::RateLimiter`] in front of any
//! [Tower](https://github.com/tower-rs/tower) service, so an expensive or
//! rate-restricted resource only sees the traffic its window allows.
//!
//! ## Admission Modes
//!
//! The [`GuardLayer`] admits every request before the inner service is called:
//!
//! 1. **Waiting** (default): requests beyond the window's capacity are held until
//!    the next window opens and retried once there; a request that still finds
//!    the window full is rejected with `GuardError::RateLimited`. A timeout
//!    bounds the wait (`GuardError::Timeout`) and a shared cancellation token
//!    aborts every pending wait at once (`GuardError::Cancelled`).
//! 2. **Fail Fast**: requests beyond capacity are rejected immediately with
//!    `GuardError::RateLimited`, carrying the time until the window resets.
//!
//! Limiters are held behind an `Arc`, so every clone of a guarded service
//! shares one window. Swap in [`window_limit::NullLimiter`] to switch limiting off.
//!
//! ## Feature Flags
//!
//! - `axum`: Enables `IntoResponse` for [`GuardError`], allowing automatic conversion
//!   to HTTP status codes (408, 429, 503).

mod error;
mod layer;
mod service;
mod utils;


pub use error::GuardError;
pub use layer::GuardLayer;
pub use service::GuardService;
pub use utils::ServiceBuilderExt;
