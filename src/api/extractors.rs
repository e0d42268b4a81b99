//! Request extractors shared by handlers.

use std::convert::Infallible;
use std::net::{IpAddr, SocketAddr};

use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::HeaderMap;
use axum::http::request::Parts;

use crate::state::AppState;

/// Stored when no address can be determined.
pub const UNKNOWN_IP: &str = "unknown";

/// Client address of the request, as text.
///
/// Behind a trusted proxy the first `X-Forwarded-For` entry wins, then
/// `X-Real-IP`; otherwise (and as a fallback) the socket peer address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIp(pub String);

impl FromRequestParts<AppState> for ClientIp {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let peer = ConnectInfo::<SocketAddr>::from_request_parts(parts, state)
            .await
            .ok()
            .map(|ConnectInfo(addr)| addr.ip());

        Ok(ClientIp(client_ip(&parts.headers, peer, state.behind_proxy)))
    }
}

fn header_ip(headers: &HeaderMap, name: &str) -> Option<IpAddr> {
    headers
        .get(name)?
        .to_str()
        .ok()?
        .split(',')
        .next()?
        .trim()
        .parse()
        .ok()
}

/// Resolves the client address from proxy headers and the peer address.
pub fn client_ip(headers: &HeaderMap, peer: Option<IpAddr>, behind_proxy: bool) -> String {
    let forwarded = behind_proxy
        .then(|| header_ip(headers, "x-forwarded-for").or_else(|| header_ip(headers, "x-real-ip")))
        .flatten();

    forwarded
        .or(peer)
        .map(|ip| ip.to_canonical().to_string())
        .unwrap_or_else(|| UNKNOWN_IP.to_string())
}
