use axum::{
    extract::{ConnectInfo, Request},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use std::net::{IpAddr, SocketAddr};

/// Extension key for storing extracted IP address
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClientIp(pub IpAddr);

/// Resolve the caller's address
///
/// Priority:
/// 1. X-Forwarded-For header (first entry)
/// 2. X-Real-IP header
/// 3. Socket address, when the server was started with connect info
pub fn resolve_client_ip(headers: &HeaderMap, socket: Option<SocketAddr>) -> Option<IpAddr> {
    if let Some(forwarded) = headers.get("x-forwarded-for") {
        return forwarded
            .to_str()
            .ok()
            .and_then(|s| s.split(',').next())
            .and_then(|s| s.trim().parse::<IpAddr>().ok());
    }
    if let Some(real_ip) = headers.get("x-real-ip") {
        return real_ip.to_str().ok().and_then(|s| s.trim().parse().ok());
    }
    socket.map(|addr| addr.ip())
}

/// Middleware storing the resolved `ClientIp` in request extensions
pub async fn extract_client_ip(
    connect_info: Option<ConnectInfo<SocketAddr>>,
    mut request: Request,
    next: Next,
) -> Response {
    let socket = connect_info.map(|ConnectInfo(addr)| addr);
    if let Some(ip) = resolve_client_ip(request.headers(), socket) {
        request.extensions_mut().insert(ClientIp(ip));
    }

    next.run(request).await
}
