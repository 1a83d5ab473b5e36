use bytes::Bytes;
use http_body_util::Full;
use hyper::header::{ACCEPT_ENCODING, CONTENT_ENCODING, HeaderValue};
use hyper::service::service_fn;
use hyper::{Request, Response};
use hyper_util::rt::{TokioExecutor, TokioIo};
use std::convert::Infallible;
use std::future::Future;
use tokio::net::TcpListener;

// Replies with "<method> <path and query>" and reflects the request headers back.
async fn echo_handler(
    req: Request<hyper::body::Incoming>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let body = format!(
        "{} {}",
        req.method(),
        req.uri().path_and_query().map(|pq| pq.as_str()).unwrap_or("/")
    );

    let mut response = Response::new(Full::new(Bytes::from(body)));
    *response.headers_mut() = req.headers().clone();
    Ok(response)
}

// Compresses with zstd only when the client offers it; otherwise names what was offered.
async fn encoding_handler(
    req: Request<hyper::body::Incoming>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let offered = req
        .headers()
        .get(ACCEPT_ENCODING)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("none")
        .to_owned();

    if offered.contains("zstd") {
        let mut response = Response::new(Full::new(Bytes::from_static(ZSTD_FRAME)));
        response
            .headers_mut()
            .insert(CONTENT_ENCODING, HeaderValue::from_static("zstd"));
        return Ok(response);
    }

    Ok(Response::new(Full::new(Bytes::from(offered))))
}

/// Leading bytes of a zstd frame, enough to tell it apart from plain text.
pub const ZSTD_FRAME: &[u8] = b"\x28\xb5\x2f\xfd\x00\x58";

async fn serve<F, Fut>(handler: F) -> u16
where
    F: Fn(Request<hyper::body::Incoming>) -> Fut + Copy + Send + 'static,
    Fut: Future<Output = Result<Response<Full<Bytes>>, Infallible>> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind to address");

    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        loop {
            let (stream, _) = listener.accept().await.unwrap();
            let io = TokioIo::new(stream);

            tokio::spawn(async move {
                if let Err(err) =
                    hyper_util::server::conn::auto::Builder::new(TokioExecutor::new())
                        .serve_connection(io, service_fn(handler))
                        .await
                {
                    eprintln!("Error serving connection: {:?}", err);
                }
            });
        }
    });

    port
}

/// Starts an upstream that echoes requests, returning its port.
pub async fn start_echo_server() -> u16 {
    serve(echo_handler).await
}

/// Starts an upstream that answers in zstd to any client advertising it, returning its port.
pub async fn start_encoding_server() -> u16 {
    serve(encoding_handler).await
}

/// Starts an upstream that accepts connections and never answers.
pub async fn start_silent_server() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind to address");

    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        let mut held = Vec::new();
        loop {
            let (stream, _) = listener.accept().await.unwrap();
            held.push(stream);
        }
    });

    port
}
