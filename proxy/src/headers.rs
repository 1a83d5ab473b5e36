// Header rewriting applied by the proxy in both directions: requests from clients to the
// target, and responses coming back from the target to the client.

use crate::header_set::HeaderSet;
use http::Version;
use http::header::{
    CONNECTION, CONTENT_ENCODING, CONTENT_LENGTH, HOST, HeaderName, HeaderValue,
    PROXY_AUTHENTICATE, PROXY_AUTHORIZATION, TE, TRAILER, TRANSFER_ENCODING, UPGRADE, VIA,
};

static HOP_BY_HOP_NAMES: &[HeaderName] = &[
    CONNECTION,
    TE,
    TRAILER,
    TRANSFER_ENCODING,
    UPGRADE,
    PROXY_AUTHORIZATION,
    PROXY_AUTHENTICATE,
];

// The body is collected and re-framed by our own server, so the upstream framing is stale.
static STALE_RESPONSE_NAMES: &[HeaderName] = &[CONTENT_ENCODING, CONTENT_LENGTH, TRANSFER_ENCODING];

fn version_str(version: Version) -> Option<&'static str> {
    match version {
        Version::HTTP_09 => Some("0.9"),
        Version::HTTP_10 => Some("1.0"),
        Version::HTTP_11 => Some("1.1"),
        Version::HTTP_2 => Some("2"),
        Version::HTTP_3 => Some("3"),
        _ => None,
    }
}

/// Adds this proxy to the Via chain. An existing chain is extended, never replaced.
pub fn add_via_header(headers: &mut HeaderSet, version: Version, pseudonym: &str) {
    let Some(version_str) = version_str(version) else {
        tracing::warn!(?version, "Unknown HTTP version, skipping Via header");
        return;
    };
    let token = format!("{version_str} {pseudonym}");

    // Multiple Via lines are folded into one so the chain keeps its order.
    let mut chain = Vec::new();
    for existing in headers.get_all(&VIA) {
        chain.extend_from_slice(existing.as_bytes());
        chain.extend_from_slice(b", ");
    }
    chain.extend_from_slice(token.as_bytes());

    match HeaderValue::from_bytes(&chain) {
        Ok(value) => headers.insert(VIA, value),
        Err(e) => tracing::warn!(error = %e, pseudonym, "Could not build Via header"),
    }
}

/// Removes the standard hop-by-hop headers and every header named in `Connection`.
pub fn filter_hop_by_hop(headers: &mut HeaderSet) -> &mut HeaderSet {
    // Parse the Connection header to find additional headers to drop
    let mut extra_drops = Vec::new();
    for connection in headers.get_all(&CONNECTION) {
        let Ok(s) = connection.to_str() else {
            continue;
        };
        for token in s.split(',').map(|t| t.trim()).filter(|t| !t.is_empty()) {
            if let Ok(name) = HeaderName::from_bytes(token.as_bytes()) {
                extra_drops.push(name);
            }
        }
    }

    for name in extra_drops {
        headers.remove(&name);
    }

    for name in HOP_BY_HOP_NAMES {
        headers.remove(name);
    }

    // Not standard constants, so they cannot live in the static above
    headers.remove(&HeaderName::from_static("keep-alive"));
    headers.remove(&HeaderName::from_static("proxy-connection"));

    headers
}

/// Builds the header set sent to the target from the headers the client sent us.
///
/// `Host` is dropped since the target has its own origin; the HTTP client derives it
/// from the target URL.
pub fn transform_request_headers(
    inbound: &HeaderSet,
    version: Version,
    pseudonym: &str,
) -> HeaderSet {
    let mut headers = inbound.clone();
    filter_hop_by_hop(&mut headers);
    add_via_header(&mut headers, version, pseudonym);
    headers.remove(&HOST);
    headers
}

/// Builds the header set returned to the client from the target's response headers.
pub fn transform_response_headers(
    mut headers: HeaderSet,
    version: Version,
    pseudonym: &str,
) -> HeaderSet {
    filter_hop_by_hop(&mut headers);
    add_via_header(&mut headers, version, pseudonym);
    for name in STALE_RESPONSE_NAMES {
        headers.remove(name);
    }
    headers
}
