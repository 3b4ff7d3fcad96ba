//! Download payload generation and the flow-controlled streaming body.
//!
//! [`PayloadBody`] lazily produces exactly the requested number of pseudo-random
//! bytes in chunks of at most [`params::CHUNK_SIZE`]. The transport polls for
//! the next frame only after its outbound buffer has drained, so a slow or
//! stalled client suspends generation instead of queueing chunks in memory;
//! dropping the body (client disconnect) stops generation outright.

use std::convert::Infallible;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::{Bytes, BytesMut};
use hyper::body::{Body, Frame, SizeHint};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::RngCore;

use crate::params;

/// Clamp a client-requested download size to the admissible range.
///
/// `None` (absent or unparsable parameter) yields the default size. The bounds
/// exist to keep adversarial or malformed requests from exhausting the link.
pub fn clamp_size(requested: Option<u64>) -> u64 {
    match requested {
        None => params::DEFAULT_DOWNLOAD_BYTES,
        Some(n) => n.clamp(params::MIN_DOWNLOAD_BYTES, params::MAX_DOWNLOAD_BYTES),
    }
}

/// Streaming response body emitting exactly `target` random bytes.
///
/// Contents are freshly randomized per chunk so that proxies, CDNs, and
/// transport-level compression cannot shortcut the transfer. Memory use is
/// bounded by a single chunk regardless of the target size.
pub struct PayloadBody {
    remaining: u64,
    rng: StdRng,
}

impl PayloadBody {
    /// Body that will emit exactly `target` bytes, then end the stream.
    pub fn sized(target: u64) -> Self {
        PayloadBody {
            remaining: target,
            rng: StdRng::from_os_rng(),
        }
    }

    /// Bytes not yet handed to the transport.
    pub fn remaining(&self) -> u64 {
        self.remaining
    }

    fn next_chunk(&mut self) -> Bytes {
        let n = self.remaining.min(params::CHUNK_SIZE as u64) as usize;
        let mut chunk = BytesMut::zeroed(n);
        self.rng.fill_bytes(&mut chunk);
        self.remaining -= n as u64;
        chunk.freeze()
    }
}

impl Body for PayloadBody {
    type Data = Bytes;
    type Error = Infallible;

    fn poll_frame(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
    ) -> Poll<Option<std::result::Result<Frame<Bytes>, Infallible>>> {
        let this = self.get_mut();
        if this.remaining == 0 {
            return Poll::Ready(None);
        }
        Poll::Ready(Some(Ok(Frame::data(this.next_chunk()))))
    }

    fn is_end_stream(&self) -> bool {
        self.remaining == 0
    }

    fn size_hint(&self) -> SizeHint {
        // exact, so the response can carry a precise Content-Length
        SizeHint::with_exact(self.remaining)
    }
}
