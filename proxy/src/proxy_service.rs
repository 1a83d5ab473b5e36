use crate::errors::ProxyError;
use crate::handler::{InboundRequest, OutboundResponse, ProxyHandler};
use crate::header_set::HeaderSet;
use crate::metrics_defs::{REQUEST_DURATION, REQUESTS_INFLIGHT};
use hyper::body::Incoming;
use hyper::service::Service as HyperService;
use hyper::{Method, Request, Response, StatusCode, Uri};
use shared::http::{BoxedBody, full_body, make_error_response};
use shared::{gauge, histogram};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Instant;

/// Serves `/` (proxy a target) and `/stats`.
pub struct ProxyService {
    handler: Arc<ProxyHandler>,
}

impl ProxyService {
    pub fn new(handler: ProxyHandler) -> Self {
        Self {
            handler: Arc::new(handler),
        }
    }
}

impl HyperService<Request<Incoming>> for ProxyService {
    type Response = Response<BoxedBody>;
    type Error = ProxyError;
    type Future =
        Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send + 'static>>;

    fn call(&self, req: Request<Incoming>) -> Self::Future {
        let handler = self.handler.clone();

        Box::pin(async move {
            let started = Instant::now();
            let _inflight = InflightGuard::new();

            let response = route(&handler, req).await;

            histogram!(REQUEST_DURATION, "status" => response.status().as_str().to_owned())
                .record(started.elapsed().as_secs_f64());
            Ok(response)
        })
    }
}

// Keeps requests.inflight right even when the client goes away and the future is dropped.
struct InflightGuard;

impl InflightGuard {
    fn new() -> Self {
        gauge!(REQUESTS_INFLIGHT).increment(1.0);
        InflightGuard
    }
}

impl Drop for InflightGuard {
    fn drop(&mut self) {
        gauge!(REQUESTS_INFLIGHT).decrement(1.0);
    }
}

pub(crate) async fn route<B>(handler: &ProxyHandler, req: Request<B>) -> Response<BoxedBody> {
    let is_stats = match req.uri().path() {
        "/" => false,
        "/stats" => true,
        _ => return make_error_response(StatusCode::NOT_FOUND),
    };

    if req.method() != Method::GET {
        tracing::debug!(method = %req.method(), path = %req.uri().path(), "Method not allowed");
        return make_error_response(StatusCode::METHOD_NOT_ALLOWED);
    }

    if is_stats {
        return into_response(handler.stats_response());
    }

    let inbound = inbound_request(req);
    into_response(handler.handle(inbound).await)
}

fn inbound_request<B>(req: Request<B>) -> InboundRequest {
    let (parts, _body) = req.into_parts();

    InboundRequest {
        version: parts.version,
        url: query_param(&parts.uri, "url"),
        range: query_param(&parts.uri, "range"),
        headers: HeaderSet::from(&parts.headers),
    }
}

// First occurrence wins.
fn query_param(uri: &Uri, key: &str) -> Option<String> {
    let query = uri.query()?;
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.into_owned())
}

fn into_response(outbound: OutboundResponse) -> Response<BoxedBody> {
    let mut response = Response::new(full_body(outbound.body));
    *response.status_mut() = outbound.status;
    *response.headers_mut() = outbound.headers.into();
    response
}
