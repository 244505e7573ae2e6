use std::convert::Infallible;
use std::net::SocketAddr;

use axum::{
    async_trait,
    extract::{ConnectInfo, FromRequestParts},
    http::{request::Parts, HeaderMap},
};

use crate::state::AppState;

pub const UNKNOWN_IP: &str = "unknown";

/// Who is calling. The IP is only as trustworthy as the proxy in front of us.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIdentity {
    pub ip_address: String,
    pub user_agent: String,
}

impl ClientIdentity {
    pub fn from_parts(headers: &HeaderMap, peer: Option<SocketAddr>, trust_proxy_headers: bool) -> Self {
        let forwarded = trust_proxy_headers
            .then(|| {
                header_value(headers, "x-forwarded-for")
                    .and_then(|v| v.split(',').next().map(str::trim).map(str::to_string))
                    .filter(|v| !v.is_empty())
                    .or_else(|| header_value(headers, "x-real-ip"))
            })
            .flatten();

        let ip_address = forwarded
            .or_else(|| peer.map(|addr| addr.ip().to_string()))
            .unwrap_or_else(|| UNKNOWN_IP.to_string());

        let user_agent = header_value(headers, "user-agent").unwrap_or_default();

        ClientIdentity { ip_address, user_agent }
    }
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[async_trait]
impl FromRequestParts<AppState> for ClientIdentity {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);

        Ok(ClientIdentity::from_parts(
            &parts.headers,
            peer,
            state.config.trust_proxy_headers,
        ))
    }
}
