//! Client identification for rate limiting

use std::convert::Infallible;
use std::net::{IpAddr, SocketAddr};

use axum::{
    extract::{ConnectInfo, FromRequestParts},
    http::{request::Parts, HeaderMap},
};

use crate::api::state::AppState;

const FORWARDED_FOR: &str = "x-forwarded-for";
const UNKNOWN_CLIENT: &str = "unknown";

/// Identifier the rate limiters count requests against
///
/// The peer address, or the first `X-Forwarded-For` hop when the server is
/// configured to trust a fronting proxy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientId(pub String);

impl FromRequestParts<AppState> for ClientId {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip());

        Ok(Self(resolve_client_id(
            &parts.headers,
            peer,
            state.trust_forwarded_for,
        )))
    }
}

fn resolve_client_id(headers: &HeaderMap, peer: Option<IpAddr>, trust_forwarded_for: bool) -> String {
    if trust_forwarded_for {
        let forwarded = headers
            .get(FORWARDED_FOR)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .and_then(|hop| hop.trim().parse::<IpAddr>().ok());

        if let Some(ip) = forwarded {
            return ip.to_string();
        }
    }

    peer.map(|ip| ip.to_string())
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn forwarded(value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(FORWARDED_FOR, HeaderValue::from_static(value));
        headers
    }

    #[test]
    fn test_peer_address_used_by_default() {
        let peer = Some("192.168.1.7".parse().unwrap());
        assert_eq!(resolve_client_id(&forwarded("10.0.0.1"), peer, false), "192.168.1.7");
    }

    #[test]
    fn test_first_forwarded_hop_when_trusted() {
        let peer = Some("192.168.1.7".parse().unwrap());
        assert_eq!(
            resolve_client_id(&forwarded("10.0.0.1, 172.16.0.1"), peer, true),
            "10.0.0.1"
        );
    }

    #[test]
    fn test_unparseable_forwarded_falls_back() {
        let peer = Some("192.168.1.7".parse().unwrap());
        assert_eq!(resolve_client_id(&forwarded("garbage"), peer, true), "192.168.1.7");
        assert_eq!(resolve_client_id(&HeaderMap::new(), None, true), "unknown");
    }
}
