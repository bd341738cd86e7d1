//! Request metadata extraction.
//!
//! # Responsibilities
//! - Identify the originating client for rate limiting and record keeping
//! - Read the optional caller supplied idempotency key
//!
//! # Design Decisions
//! - Forwarding headers are only believed when the socket peer is a
//!   configured trusted proxy; anyone else could rotate them freely
//! - Behind a proxy chain the client is the rightmost `X-Forwarded-For` hop
//!   that isn't itself a trusted proxy
//! - Missing information degrades to the literal `"unknown"` client

use std::net::{IpAddr, SocketAddr};

use axum::extract::ConnectInfo;
use axum::http::{Extensions, HeaderMap};

pub const UNKNOWN_CLIENT: &str = "unknown";
pub const IDEMPOTENCY_KEY_HEADER: &str = "idempotency-key";

/// Longest idempotency key accepted; longer keys are ignored.
const MAX_IDEMPOTENCY_KEY_LEN: usize = 128;

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

fn peer_ip(extensions: &Extensions) -> Option<IpAddr> {
    extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
}

/// Client identifier for a request.
///
/// From a trusted proxy: the rightmost untrusted `X-Forwarded-For` hop, then
/// `X-Real-IP`, then `Client-IP`. From anyone else: the peer address.
pub fn client_id(headers: &HeaderMap, extensions: &Extensions, trusted_proxies: &[IpAddr]) -> String {
    let Some(peer) = peer_ip(extensions) else {
        return UNKNOWN_CLIENT.to_string();
    };
    if !trusted_proxies.contains(&peer) {
        return peer.to_string();
    }

    if let Some(forwarded) = header_str(headers, "x-forwarded-for") {
        let hop = forwarded
            .rsplit(',')
            .map(str::trim)
            .filter(|hop| !hop.is_empty())
            .find(|hop| {
                hop.parse::<IpAddr>()
                    .map_or(true, |ip| !trusted_proxies.contains(&ip))
            });
        if let Some(hop) = hop {
            return hop.to_string();
        }
    }

    for name in ["x-real-ip", "client-ip"] {
        if let Some(value) = header_str(headers, name) {
            return value.to_string();
        }
    }

    peer.to_string()
}

pub fn idempotency_key(headers: &HeaderMap) -> Option<String> {
    header_str(headers, IDEMPOTENCY_KEY_HEADER)
        .filter(|k| k.len() <= MAX_IDEMPOTENCY_KEY_LEN)
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn from_peer(addr: &str) -> Extensions {
        let mut extensions = Extensions::new();
        extensions.insert(ConnectInfo(addr.parse::<SocketAddr>().unwrap()));
        extensions
    }

    fn proxies() -> Vec<IpAddr> {
        vec!["10.0.0.1".parse().unwrap(), "10.0.0.2".parse().unwrap()]
    }

    #[test]
    fn untrusted_peer_headers_are_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("203.0.113.9"));
        headers.insert("x-real-ip", HeaderValue::from_static("203.0.113.10"));
        assert_eq!(
            client_id(&headers, &from_peer("192.0.2.7:5000"), &proxies()),
            "192.0.2.7"
        );
    }

    #[test]
    fn trusted_proxy_chain_yields_rightmost_untrusted_hop() {
        let mut headers = HeaderMap::new();
        // The leftmost entry is whatever the caller claimed.
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("1.1.1.1, 203.0.113.9, 10.0.0.2"),
        );
        assert_eq!(
            client_id(&headers, &from_peer("10.0.0.1:443"), &proxies()),
            "203.0.113.9"
        );
    }

    #[test]
    fn trusted_proxy_falls_back_to_real_ip_then_peer() {
        let mut headers = HeaderMap::new();
        headers.insert("client-ip", HeaderValue::from_static("198.51.100.4"));
        assert_eq!(
            client_id(&headers, &from_peer("10.0.0.1:443"), &proxies()),
            "198.51.100.4"
        );

        assert_eq!(
            client_id(&HeaderMap::new(), &from_peer("10.0.0.1:443"), &proxies()),
            "10.0.0.1"
        );
    }

    #[test]
    fn no_peer_is_unknown() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("203.0.113.9"));
        assert_eq!(client_id(&headers, &Extensions::new(), &proxies()), UNKNOWN_CLIENT);
    }

    #[test]
    fn oversized_idempotency_keys_are_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert(IDEMPOTENCY_KEY_HEADER, HeaderValue::from_static("retry-1"));
        assert_eq!(idempotency_key(&headers).as_deref(), Some("retry-1"));

        let long = "k".repeat(200);
        headers.insert(IDEMPOTENCY_KEY_HEADER, HeaderValue::from_str(&long).unwrap());
        assert_eq!(idempotency_key(&headers), None);
    }
}
