//! Authentication middleware for admin endpoints

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use cli::METRICS_TOKEN_HEADER;
use tracing::info;

use crate::error::ApiError;
use crate::metrics;
use crate::state::AppState;
use crate::utils::secure_eq;

/// Requires the configured token in `x-metrics-token` on `/admin` routes.
/// Without a configured token every admin request is refused.
pub async fn admin_auth_middleware(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if !request.uri().path().starts_with("/admin") {
        return Ok(next.run(request).await);
    }

    let authorized = match (&app_state.metrics_token, extract_metrics_token(&headers)) {
        (Some(expected), Some(given)) => secure_eq(expected, given),
        _ => false,
    };

    if !authorized {
        info!("Rejected admin request to {}", request.uri().path());
        metrics::record_admin_unauthorized();
        return Err(ApiError::Unauthorized);
    }

    Ok(next.run(request).await)
}

/// Extract the admin token header
pub fn extract_metrics_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(METRICS_TOKEN_HEADER)?
        .to_str()
        .ok()
        .map(str::trim)
        .filter(|token| !token.is_empty())
}
