use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, Request},
    middleware::Next,
    response::Response,
};
use tracing::info;

/// Log every inbound request with the caller's address, when known.
pub async fn log_request(req: Request, next: Next) -> Response {
    let ip = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".into());

    info!("Received {} request from IP {}. Processing...", req.uri().path(), ip);
    next.run(req).await
}
