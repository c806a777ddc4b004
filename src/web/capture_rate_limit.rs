use crate::web::api::{AppState, json_error};
use axum::{
    extract::{ConnectInfo, Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use std::net::SocketAddr;

pub const RATE_LIMIT_MESSAGE: &str = "Too many attempts. Please try again later.";

/// Source address of the request, as seen by the rate limiter and the attempt log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientAddress(pub String);

/// Middleware for rate limiting capture submissions per source address.
pub async fn capture_rate_limit_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    let address = client_address(&req);

    if !state.tracker.check(&address).await {
        return json_error(RATE_LIMIT_MESSAGE, StatusCode::TOO_MANY_REQUESTS);
    }
    req.extensions_mut().insert(ClientAddress(address));
    next.run(req).await
}

/// Peer address if the server recorded one, else the first `X-Forwarded-For`
/// entry, else `"unknown"`.
fn client_address(req: &Request) -> String {
    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0.ip().to_string())
        .or_else(|| {
            req.headers()
                .get("x-forwarded-for")
                .and_then(|h| h.to_str().ok())
                .and_then(|s| s.split(',').next())
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        })
        .unwrap_or_else(|| "unknown".to_string())
}
