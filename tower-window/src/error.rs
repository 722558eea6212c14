use std::time::Duration;

use window_limit::LimitError;

/// Why the guard refused to forward a request.
///
/// Errors from the inner service are not wrapped; they reach the caller as the
/// inner service produced them.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GuardError {
    /// The configured timeout elapsed before the request was admitted.
    ///
    /// With the `axum` feature this becomes `408 Request Timeout`.
    #[error("Request timed out waiting for rate limit capacity")]
    Timeout,

    /// The guard's cancellation token fired while the request was waiting,
    /// typically because the service is shutting down.
    ///
    /// With the `axum` feature this becomes `503 Service Unavailable`.
    #[error("Request cancelled while waiting for rate limit capacity")]
    Cancelled,

    /// The window had no capacity left for this request.
    ///
    /// Fail-fast guards return this immediately. Waiting guards return it when
    /// the next window filled up before their single retry. With the `axum`
    /// feature this becomes `429 Too Many Requests` with a `Retry-After` header.
    #[error("Rate limit exceeded; retry after {retry_after:?}")]
    RateLimited {
        /// Time until the current window ends.
        retry_after: Duration,
    },
}

impl From<LimitError> for GuardError {
    fn from(err: LimitError) -> Self {
        match err {
            LimitError::Cancelled => Self::Cancelled,
            LimitError::Timeout(_) => Self::Timeout,
        }
    }
}

#[cfg(feature = "axum")]
impl axum::response::IntoResponse for GuardError {
    fn into_response(self) -> axum::response::Response {
        use axum::http::HeaderValue;
        use axum::http::StatusCode;
        use axum::http::header::RETRY_AFTER;

        let status = match self {
            Self::Timeout => StatusCode::REQUEST_TIMEOUT,
            Self::Cancelled => StatusCode::SERVICE_UNAVAILABLE,
            Self::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
        };

        let mut response = (status, self.to_string()).into_response();
        if let Self::RateLimited { retry_after } = self {
            // Retry-After is whole seconds, never advertise zero
            let secs = retry_after.as_secs().max(1);
            response
                .headers_mut()
                .insert(RETRY_AFTER, HeaderValue::from(secs));
        }
        response
    }
}
