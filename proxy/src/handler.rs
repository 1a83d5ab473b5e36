use crate::errors::ProxyError;
use crate::header_set::HeaderSet;
use crate::headers::{transform_request_headers, transform_response_headers};
use crate::metrics_defs::{RANGE_REJECTED, UPSTREAM_BYTES_RECEIVED};
use crate::range::{RangeError, validate_range};
use crate::stats::ProxyStats;
use crate::upstream::{OutboundRequest, UpstreamClient};
use bytes::Bytes;
use http::header::{CONTENT_TYPE, HeaderValue, RANGE};
use http::{StatusCode, Version};
use shared::counter;
use std::sync::Arc;

/// A client request for `/`, reduced to what the pipeline looks at.
#[derive(Clone, Debug)]
pub struct InboundRequest {
    pub version: Version,
    /// Target taken from the `url` query parameter. Passed to the upstream client as is.
    pub url: Option<String>,
    /// The `range` query parameter
    pub range: Option<String>,
    pub headers: HeaderSet,
}

#[derive(Clone, Debug)]
pub struct OutboundResponse {
    pub status: StatusCode,
    pub headers: HeaderSet,
    pub body: Bytes,
}

impl OutboundResponse {
    fn html(status: StatusCode, body: impl Into<Bytes>) -> Self {
        let mut headers = HeaderSet::new();
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("text/html; charset=utf-8"),
        );
        Self {
            status,
            headers,
            body: body.into(),
        }
    }

    fn plain(status: StatusCode, body: impl Into<Bytes>) -> Self {
        let mut headers = HeaderSet::new();
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("text/plain; charset=utf-8"),
        );
        Self {
            status,
            headers,
            body: body.into(),
        }
    }
}

/// Runs a request through validation, header rewriting, the upstream fetch and
/// response rewriting, and owns the counters shared by all requests.
pub struct ProxyHandler {
    upstream: Arc<dyn UpstreamClient>,
    stats: Arc<ProxyStats>,
    pseudonym: String,
}

impl ProxyHandler {
    pub fn new(
        upstream: Arc<dyn UpstreamClient>,
        stats: Arc<ProxyStats>,
        pseudonym: impl Into<String>,
    ) -> Self {
        Self {
            upstream,
            stats,
            pseudonym: pseudonym.into(),
        }
    }

    pub fn stats(&self) -> &ProxyStats {
        &self.stats
    }

    /// Proxies the request. Failures are turned into the matching error response.
    pub async fn handle(&self, request: InboundRequest) -> OutboundResponse {
        match self.try_handle(request).await {
            Ok(response) => response,
            Err(e) => error_response(e),
        }
    }

    pub async fn try_handle(&self, request: InboundRequest) -> Result<OutboundResponse, ProxyError> {
        let InboundRequest {
            version,
            url,
            range,
            headers,
        } = request;

        // Runs before any I/O so a rejected request never reaches the target.
        let range_override =
            validate_range(headers.get(&RANGE), range.as_deref()).inspect_err(|e| {
                counter!(RANGE_REJECTED).increment(1);
                tracing::debug!(error = %e, "Rejected range");
            })?;

        let mut outbound_headers = transform_request_headers(&headers, version, &self.pseudonym);
        if let Some(value) = range_override {
            outbound_headers.insert(RANGE, value);
        }

        let url = url.unwrap_or_default();
        tracing::debug!(%url, headers = ?outbound_headers, "Fetching upstream");

        let response = self
            .upstream
            .fetch(OutboundRequest {
                url: url.clone(),
                headers: outbound_headers,
            })
            .await?;

        self.stats.record_bytes(response.content_size);
        counter!(UPSTREAM_BYTES_RECEIVED).increment(response.content_size);
        tracing::debug!(
            %url,
            status = %response.status,
            bytes = response.content_size,
            "Fetched upstream"
        );

        let headers = transform_response_headers(response.headers, response.version, &self.pseudonym);

        Ok(OutboundResponse {
            status: response.status,
            headers,
            body: response.body,
        })
    }

    pub fn stats_response(&self) -> OutboundResponse {
        OutboundResponse::html(StatusCode::OK, self.stats.summary())
    }
}

fn error_response(error: ProxyError) -> OutboundResponse {
    let status = error.status_code();
    match error {
        ProxyError::Range(e @ RangeError::Inconsistent) => {
            OutboundResponse::html(status, e.to_string())
        }
        e => {
            tracing::warn!(error = %e, %status, "Proxy request failed");
            OutboundResponse::plain(status, format!("{e}\n"))
        }
    }
}
