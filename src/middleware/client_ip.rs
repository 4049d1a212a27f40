//! Client IP address extraction.
//!
//! Inserts `ClientIp` into request extensions so later stages (rate limiter)
//! can key on it. Proxy headers are only honoured when the deployment says
//! it sits behind a trusted proxy; otherwise any client could pick its own
//! rate-limit bucket.

use std::net::{IpAddr, SocketAddr};

use axum::{
    Router,
    body::Body,
    extract::{ConnectInfo, State},
    http::Request,
    middleware::{self, Next},
    response::Response,
};

/// Header priority for IP extraction (highest to lowest).
const IP_HEADERS: &[&str] = &[
    "cf-connecting-ip", // Cloudflare
    "x-real-ip",        // Nginx
    "x-forwarded-for",  // Standard proxy header (first IP in chain)
];

/// Client IP address extracted from request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientIp(pub Option<IpAddr>);

impl ClientIp {
    #[must_use]
    pub fn from_request<T>(req: &Request<T>, trust_proxy_headers: bool) -> Self {
        let from_headers = if trust_proxy_headers {
            ip_from_headers(req)
        } else {
            None
        };

        Self(from_headers.or_else(|| {
            req.extensions()
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ci| ci.0.ip())
        }))
    }

    #[must_use]
    pub const fn ip(&self) -> Option<IpAddr> {
        self.0
    }
}

fn ip_from_headers<T>(req: &Request<T>) -> Option<IpAddr> {
    IP_HEADERS.iter().find_map(|header| {
        req.headers()
            .get(*header)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.split(',').next())
            .map(str::trim)
            .and_then(|ip_str| ip_str.parse::<IpAddr>().ok())
    })
}

/// Apply client IP extraction to every route of the given Router.
pub fn apply(router: Router, trust_proxy_headers: bool) -> Router {
    router.layer(middleware::from_fn_with_state(
        trust_proxy_headers,
        client_ip_middleware,
    ))
}

async fn client_ip_middleware(
    State(trust_proxy_headers): State<bool>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let client_ip = ClientIp::from_request(&req, trust_proxy_headers);
    req.extensions_mut().insert(client_ip);
    next.run(req).await
}
