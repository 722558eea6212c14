use axum::{
    Router, error_handling::HandleErrorLayer, http::StatusCode, response::IntoResponse,
    routing::get,
};
use std::time::Duration;
use tower::BoxError;
use tower::ServiceBuilder;
use tower_window::{GuardError, ServiceBuilderExt};
use window_limit::LimiterConfig;

#[tokio::main]
async fn main() {
    // 1. Describe the limiter: 10 requests per second
    let config = LimiterConfig::from_yaml_str("limit: 10\nwindow: 1s\n").unwrap();
    let limiter = config.build();

    // 2. Build the Router
    let app = Router::new()
        .route("/", get(|| async { "Hello, Window!" }))
        .layer(
            ServiceBuilder::new()
                // 1. The outermost layer: catches BoxError and returns Response
                .layer(HandleErrorLayer::new(handle_guard_error))
                // 2. The middle layer: waits up to 500ms for the next window
                .waiting_guard(limiter, Duration::from_millis(500))
                // 3. Convert the Route's Infallible to BoxError for the guard
                .map_err(BoxError::from),
        );

    // 3. Serve
    let listener = tokio::net::TcpListener::bind("127.0.0.1:3000")
        .await
        .unwrap();
    println!("Listening on http://127.0.0.1:3000");

    axum::serve(listener, app).await.unwrap();
}

/// The signature must match BoxError -> IntoResponse
async fn handle_guard_error(err: BoxError) -> impl IntoResponse {
    if let Some(guard_err) = err.downcast_ref::<GuardError>() {
        guard_err.clone().into_response()
    } else {
        (StatusCode::INTERNAL_SERVER_ERROR, "Internal Service Error").into_response()
    }
}
