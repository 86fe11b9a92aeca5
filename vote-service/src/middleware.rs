//! Middleware resolving the effective client IP

use std::net::SocketAddr;

use axum::{
    extract::ConnectInfo,
    http::{HeaderMap, Request},
    middleware::Next,
    response::Response,
};
use tracing::debug;

const CF_CONNECTING_IP: &str = "cf-connecting-ip";
const X_FORWARDED_FOR: &str = "x-forwarded-for";

/// Effective client address, stored as a request extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIp(pub String);

/// Priority: CF-Connecting-IP > X-Forwarded-For (first) > socket
pub fn resolve_client_ip(
    headers: &HeaderMap,
    socket: Option<SocketAddr>,
) -> Option<(String, &'static str)> {
    if let Some(ip) = headers
        .get(CF_CONNECTING_IP)
        .and_then(|val| val.to_str().ok())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
    {
        return Some((ip.to_string(), "cf-connecting-ip"));
    }

    if let Some(first) = headers
        .get(X_FORWARDED_FOR)
        .and_then(|val| val.to_str().ok())
        .and_then(|s| s.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
    {
        return Some((first.to_string(), "x-forwarded-for"));
    }

    socket.map(|addr| (addr.ip().to_string(), "socket"))
}

pub async fn inject_client_ip(mut req: Request<axum::body::Body>, next: Next) -> Response {
    let socket = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|connect_info| connect_info.0);

    match resolve_client_ip(req.headers(), socket) {
        Some((ip, source)) => {
            debug!("client_ip_source={} ip={}", source, ip);
            req.extensions_mut().insert(ClientIp(ip));
        }
        None => debug!("client_ip_source=unavailable"),
    }

    next.run(req).await
}
