use crate::config::UpstreamConfig;
use crate::header_set::HeaderSet;
use async_trait::async_trait;
use bytes::Bytes;
use http::header::{ACCEPT_ENCODING, HeaderMap};
use http::{StatusCode, Version};
use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;
use tokio::time::timeout;

/// Request handed to the upstream client once the pipeline has rewritten it.
#[derive(Clone, Debug)]
pub struct OutboundRequest {
    pub url: String,
    pub headers: HeaderSet,
}

/// Fully materialized response from the target.
#[derive(Clone, Debug)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub version: Version,
    pub headers: HeaderSet,
    pub body: Bytes,
    /// Bytes received from the target, independent of any header rewriting.
    pub content_size: u64,
}

#[derive(thiserror::Error, Debug)]
pub enum UpstreamError {
    #[error("Invalid upstream target {0:?}: {1}")]
    InvalidTarget(String, String),

    #[error("Upstream timeout for {0}")]
    Timeout(String),

    #[error("Upstream request failed for {0}: {1}")]
    Transport(String, String),

    #[error("Failed to read response body from {0}: {1}")]
    Body(String, String),
}

/// Performs the single GET the proxy issues for every admitted request.
#[async_trait]
pub trait UpstreamClient: Send + Sync {
    async fn fetch(&self, request: OutboundRequest) -> Result<UpstreamResponse, UpstreamError>;
}

/// Upstream client backed by reqwest.
///
/// The timeout covers the complete cycle: connecting, sending the request,
/// receiving the response headers and collecting the body. Redirects are
/// relayed to the caller rather than followed.
pub struct ReqwestUpstream {
    client: reqwest::Client,
    timeout: Duration,
}

impl ReqwestUpstream {
    pub fn try_new(config: &UpstreamConfig) -> Result<Self, reqwest::Error> {
        let mut builder = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .no_proxy()
            .danger_accept_invalid_certs(config.accept_invalid_certs);

        if config.ipv4_only {
            // Binding to the IPv4 wildcard makes every connection use IPv4.
            builder = builder.local_address(IpAddr::V4(Ipv4Addr::UNSPECIFIED));
        }

        Ok(Self {
            client: builder.build()?,
            timeout: Duration::from_secs(config.timeout_secs),
        })
    }

    async fn send(&self, request: OutboundRequest) -> Result<UpstreamResponse, UpstreamError> {
        let OutboundRequest { url, mut headers } = request;

        // reqwest negotiates its own encodings and decodes the body; a client-supplied
        // Accept-Encoding would invite codings it cannot decode, and on Range requests it
        // asks for none at all.
        headers.remove(&ACCEPT_ENCODING);

        let response = self
            .client
            .get(url.as_str())
            .headers(HeaderMap::from(headers))
            .send()
            .await
            .map_err(|e| {
                if e.is_builder() {
                    UpstreamError::InvalidTarget(url.clone(), e.to_string())
                } else {
                    UpstreamError::Transport(url.clone(), e.to_string())
                }
            })?;

        let status = response.status();
        let version = response.version();
        let headers = HeaderSet::from(response.headers());

        let body = response
            .bytes()
            .await
            .map_err(|e| UpstreamError::Body(url.clone(), e.to_string()))?;

        Ok(UpstreamResponse {
            status,
            version,
            headers,
            content_size: body.len() as u64,
            body,
        })
    }
}

#[async_trait]
impl UpstreamClient for ReqwestUpstream {
    async fn fetch(&self, request: OutboundRequest) -> Result<UpstreamResponse, UpstreamError> {
        let url = request.url.clone();
        timeout(self.timeout, self.send(request))
            .await
            .map_err(|_| UpstreamError::Timeout(url))?
    }
}
