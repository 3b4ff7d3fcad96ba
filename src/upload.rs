//! Inbound upload measurement.
//!
//! The upload body is treated as an opaque stream: each data frame's length is
//! added to a counter and the contents are dropped on the spot, so memory use
//! is independent of the upload size.

use bytes::Buf;
use http_body_util::BodyExt;
use hyper::body::Body;
use hyper::header::{CONTENT_LENGTH, HeaderMap};
use tokio::time::Instant;

use crate::api::epoch_millis;

/// Outcome of draining one upload body.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadReport {
    /// Bytes actually observed, whatever the client declared.
    pub received: u64,
    /// Seconds from acceptance to end of body.
    pub duration_secs: f64,
    /// Wall-clock completion time, milliseconds since the epoch.
    pub completed_at_ms: u64,
}

/// Parse the client's size declaration.
///
/// Returns `None` when the `Content-Length` header is absent, non-numeric, or
/// zero; the endpoint turns that into a 400 before touching the body.
pub fn declared_len(headers: &HeaderMap) -> Option<u64> {
    let raw = headers.get(CONTENT_LENGTH)?.to_str().ok()?;
    let n: u64 = raw.trim().parse().ok()?;
    (n > 0).then_some(n)
}

/// Consume `body` to completion, counting bytes without retaining them.
///
/// A transport error mid-stream is returned as the body's error; the count up
/// to that point is discarded with the session.
pub async fn drain<B>(mut body: B) -> std::result::Result<UploadReport, B::Error>
where
    B: Body + Unpin,
{
    let start = Instant::now();
    let mut received: u64 = 0;

    while let Some(frame) = body.frame().await {
        let frame = frame?;
        if let Some(data) = frame.data_ref() {
            received += data.remaining() as u64;
        }
    }

    Ok(UploadReport {
        received,
        duration_secs: start.elapsed().as_secs_f64(),
        completed_at_ms: epoch_millis(),
    })
}
