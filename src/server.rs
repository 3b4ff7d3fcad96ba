//! HTTP surface: routing, the response envelope, and connection lifecycle.
//!
//! Each accepted connection is served on its own task; sessions share no
//! mutable state. Every response passes through [`envelope`], which applies
//! cache suppression and the CORS policy, and every handler fault is converted
//! to a generic 500 at the boundary so nothing internal reaches the client.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use http_body_util::combinators::BoxBody;
use http_body_util::{BodyExt, Empty, Full};
use hyper::body::{Body, Incoming};
use hyper::header::{self, HeaderValue};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use hyper_util::server::graceful::GracefulShutdown;
use serde::Serialize;
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

use crate::api::{
    ErrorResponse, HealthResponse, PingResponse, UploadResponse, epoch_millis, epoch_secs,
};
use crate::config::Config;
use crate::error::{Result, SpeedtestError};
use crate::params;
use crate::payload::{PayloadBody, clamp_size};
use crate::upload;

type ResponseBody = BoxBody<Bytes, Infallible>;

/// A bound listener ready to serve the measurement endpoints.
pub struct Server {
    listener: TcpListener,
    config: Arc<Config>,
}

impl Server {
    /// Bind the listener for `config` without accepting yet.
    pub async fn bind(config: Config) -> Result<Server> {
        let listener = TcpListener::bind(config.socket_addr()).await?;
        Ok(Server {
            listener,
            config: Arc::new(config),
        })
    }

    /// The address the listener actually bound to.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept connections until `shutdown` resolves, then drain in-flight
    /// responses before returning.
    pub async fn run<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        let graceful = GracefulShutdown::new();
        let mut shutdown = std::pin::pin!(shutdown);
        info!(addr = %self.listener.local_addr()?, "listening");

        loop {
            tokio::select! {
                accepted = self.listener.accept() => {
                    let (stream, peer) = accepted?;
                    let io = TokioIo::new(stream);
                    let config = Arc::clone(&self.config);
                    let service = service_fn(move |req| handle(req, Arc::clone(&config)));
                    let conn = http1::Builder::new()
                        .keep_alive(true)
                        .serve_connection(io, service);
                    let conn = graceful.watch(conn);
                    tokio::spawn(async move {
                        if let Err(e) = conn.await {
                            // client teardown mid-transfer is routine for a speed test
                            let msg = e.to_string();
                            if msg.contains("connection closed")
                                || msg.contains("Connection reset")
                                || msg.contains("incomplete message")
                            {
                                debug!(%peer, "client disconnected: {msg}");
                            } else {
                                warn!(%peer, "connection error: {msg}");
                            }
                        }
                    });
                }
                _ = &mut shutdown => break,
            }
        }

        info!("shutting down, draining in-flight sessions");
        graceful.shutdown().await;
        Ok(())
    }
}

/// Per-request entry point: route, catch faults, apply the envelope.
async fn handle(
    req: Request<Incoming>,
    config: Arc<Config>,
) -> std::result::Result<Response<ResponseBody>, Infallible> {
    let method = req.method().clone();
    let path = req.uri().path().to_owned();

    let response = match route(req).await {
        Ok(resp) => resp,
        Err(e) => {
            warn!(%method, %path, error = %e, "request failed");
            internal_error()
        }
    };

    Ok(envelope(response, &config))
}

/// Dispatch on method and path.
///
/// Generic over the request body so handlers can be exercised with in-memory
/// bodies; in production `B` is [`Incoming`].
pub(crate) async fn route<B>(req: Request<B>) -> Result<Response<ResponseBody>>
where
    B: Body + Unpin,
    B::Error: std::error::Error + Send + Sync + 'static,
{
    match (req.method(), req.uri().path()) {
        (&Method::GET, params::HEALTH_PATH) => json_response(
            StatusCode::OK,
            &HealthResponse {
                status: "ok".to_owned(),
                timestamp: epoch_millis(),
            },
        ),
        (&Method::GET, params::PING_PATH) => json_response(
            StatusCode::OK,
            &PingResponse {
                timestamp: epoch_millis(),
                server_time: epoch_secs(),
            },
        ),
        (&Method::GET, params::DOWNLOAD_PATH) => download(req.uri().query()),
        (&Method::POST, params::UPLOAD_PATH) => upload_endpoint(req).await,
        (&Method::OPTIONS, _) => preflight(),
        _ => json_response(
            StatusCode::NOT_FOUND,
            &ErrorResponse {
                error: "Not found".to_owned(),
            },
        ),
    }
}

/// Start a download session: clamp the requested size and hand the transport
/// a lazily generated body of exactly that many bytes.
fn download(query: Option<&str>) -> Result<Response<ResponseBody>> {
    let target = clamp_size(parse_size_param(query));
    debug!(target, "download session");

    let body = PayloadBody::sized(target);
    Ok(Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/octet-stream")
        .header(header::CONTENT_LENGTH, target)
        .header(
            header::CONTENT_DISPOSITION,
            "attachment; filename=\"speedtest.bin\"",
        )
        .body(body.boxed())?)
}

/// Time and count the inbound body, then report what was actually observed.
async fn upload_endpoint<B>(req: Request<B>) -> Result<Response<ResponseBody>>
where
    B: Body + Unpin,
    B::Error: std::error::Error + Send + Sync + 'static,
{
    let Some(expected) = upload::declared_len(req.headers()) else {
        return json_response(
            StatusCode::BAD_REQUEST,
            &ErrorResponse {
                error: "Content-Length header required".to_owned(),
            },
        );
    };

    let report = upload::drain(req.into_body())
        .await
        .map_err(|e| SpeedtestError::UploadStream(Box::new(e)))?;
    debug!(
        received = report.received,
        expected, "upload session complete"
    );

    json_response(
        StatusCode::OK,
        &UploadResponse {
            received: report.received,
            expected,
            duration: report.duration_secs,
            timestamp: report.completed_at_ms,
        },
    )
}

/// CORS preflight; the origin and credentials headers come from the envelope.
fn preflight() -> Result<Response<ResponseBody>> {
    Ok(Response::builder()
        .status(StatusCode::NO_CONTENT)
        .header(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            "GET, POST, OPTIONS",
        )
        .header(header::ACCESS_CONTROL_ALLOW_HEADERS, "Content-Type")
        .body(Empty::new().boxed())?)
}

/// `size` query parameter, if present and numeric.
fn parse_size_param(query: Option<&str>) -> Option<u64> {
    let query = query?;
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == "size")
        .and_then(|(_, value)| value.trim().parse().ok())
}

/// Cross-cutting headers applied to every response: cache suppression plus the
/// single-origin CORS policy with credentials.
fn envelope(mut resp: Response<ResponseBody>, config: &Config) -> Response<ResponseBody> {
    let headers = resp.headers_mut();
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static("no-store, no-cache, must-revalidate"),
    );
    headers.insert(header::PRAGMA, HeaderValue::from_static("no-cache"));
    headers.insert(header::EXPIRES, HeaderValue::from_static("0"));

    if let Ok(origin) = HeaderValue::from_str(&config.allowed_origin) {
        headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, origin);
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_CREDENTIALS,
            HeaderValue::from_static("true"),
        );
    }

    resp
}

fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Result<Response<ResponseBody>> {
    let payload = serde_json::to_vec(body)?;
    Ok(Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Full::new(Bytes::from(payload)).boxed())?)
}

/// Generic 500; built without fallible steps so the catch-all cannot itself fail.
fn internal_error() -> Response<ResponseBody> {
    let mut resp = Response::new(
        Full::new(Bytes::from_static(br#"{"error":"Internal server error"}"#)).boxed(),
    );
    *resp.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
    resp.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    resp
}
