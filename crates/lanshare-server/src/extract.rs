use std::convert::Infallible;
use std::net::SocketAddr;

use async_trait::async_trait;
use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::request::Parts;

pub const FORWARDED_FOR: &str = "x-forwarded-for";

/// The requesting client's address as seen by the server, not yet normalized.
///
/// Prefers the first hop of `X-Forwarded-For`, then the socket peer. Empty
/// when neither is available, which the ledger records as "unknown".
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ClientAddr(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for ClientAddr
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let forwarded = parts
            .headers
            .get(FORWARDED_FOR)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string);
        let addr = forwarded
            .or_else(|| {
                parts
                    .extensions
                    .get::<ConnectInfo<SocketAddr>>()
                    .map(|ConnectInfo(peer)| peer.ip().to_string())
            })
            .unwrap_or_default();
        Ok(ClientAddr(addr))
    }
}
