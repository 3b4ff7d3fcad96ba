//! Measurement probe client.
//!
//! Drives the three tests against a running server and performs the
//! client-side statistical reduction: throughput from counted bytes and
//! elapsed time, latency as the mean of sequential round-trip samples, jitter
//! as their population standard deviation.

use futures_util::StreamExt;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::RngCore;
use serde::Serialize;
use tokio::time::Instant;
use url::Url;

use crate::api::{PingResponse, UploadResponse};
use crate::error::Result;
use crate::params;

/// HTTP client bound to one measurement server.
pub struct Probe {
    base: Url,
    http: reqwest::Client,
}

impl Probe {
    /// Create a probe for the server at `base_url` (e.g. `http://host:3000`).
    pub fn new(base_url: &str) -> Result<Probe> {
        let http = reqwest::Client::builder()
            .user_agent(concat!(
                env!("CARGO_PKG_NAME"),
                "/",
                env!("CARGO_PKG_VERSION")
            ))
            .build()?;
        Ok(Probe {
            base: Url::parse(base_url)?,
            http,
        })
    }

    /// Take `samples` round-trip measurements against the ping endpoint.
    ///
    /// Samples are issued strictly sequentially; concurrent requests would
    /// measure queueing delay, not network latency.
    pub async fn ping(&self, samples: usize) -> Result<LatencyStats> {
        let url = self.base.join(params::PING_PATH)?;
        let mut rtts_ms = Vec::with_capacity(samples);

        for _ in 0..samples {
            let start = Instant::now();
            let resp = self
                .http
                .get(url.clone())
                .send()
                .await?
                .error_for_status()?;
            let _ping: PingResponse = resp.json().await?;
            rtts_ms.push(start.elapsed().as_secs_f64() * 1000.0);
        }

        Ok(LatencyStats::from_samples(&rtts_ms))
    }

    /// Run a download test, counting the streamed bytes without retaining them.
    ///
    /// `size` is forwarded as the `size` query parameter when given; the
    /// server clamps it to its admissible range either way.
    pub async fn download(&self, size: Option<u64>) -> Result<TransferStats> {
        let mut url = self.base.join(params::DOWNLOAD_PATH)?;
        if let Some(size) = size {
            url.query_pairs_mut().append_pair("size", &size.to_string());
        }

        let start = Instant::now();
        let resp = self.http.get(url).send().await?.error_for_status()?;

        let mut stream = resp.bytes_stream();
        let mut bytes: u64 = 0;
        while let Some(chunk) = stream.next().await {
            bytes += chunk?.len() as u64;
        }

        Ok(TransferStats {
            bytes,
            seconds: start.elapsed().as_secs_f64(),
        })
    }

    /// Run an upload test with `size` bytes of fresh random payload.
    pub async fn upload(&self, size: u64) -> Result<UploadOutcome> {
        let url = self.base.join(params::UPLOAD_PATH)?;

        let mut rng = StdRng::from_os_rng();
        let mut payload = vec![0u8; size as usize];
        rng.fill_bytes(&mut payload);

        let start = Instant::now();
        let resp = self
            .http
            .post(url)
            .body(payload)
            .send()
            .await?
            .error_for_status()?;
        let report: UploadResponse = resp.json().await?;

        Ok(UploadOutcome {
            stats: TransferStats {
                bytes: report.received,
                seconds: start.elapsed().as_secs_f64(),
            },
            report,
        })
    }
}

/// Byte count and wall-clock duration of one transfer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TransferStats {
    /// Bytes observed by this side of the transfer.
    pub bytes: u64,
    /// Elapsed wall-clock seconds.
    pub seconds: f64,
}

impl TransferStats {
    /// Throughput in megabits per second; zero when no time elapsed.
    pub fn throughput_mbps(&self) -> f64 {
        if self.seconds <= 0.0 {
            return 0.0;
        }
        (self.bytes as f64 * 8.0) / self.seconds / 1e6
    }
}

/// Result of an upload test: client-side timing plus the server's report.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadOutcome {
    /// Client-side byte count and duration.
    pub stats: TransferStats,
    /// What the server observed.
    pub report: UploadResponse,
}

/// Reduction of a sequence of round-trip-time samples.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LatencyStats {
    /// Mean round-trip time in milliseconds.
    pub mean_ms: f64,
    /// Population standard deviation of the samples, in milliseconds.
    pub jitter_ms: f64,
    /// Fastest sample.
    pub min_ms: f64,
    /// Slowest sample.
    pub max_ms: f64,
    /// Number of samples taken.
    pub samples: usize,
}

impl LatencyStats {
    /// Reduce raw samples (milliseconds) to summary statistics.
    pub fn from_samples(rtts_ms: &[f64]) -> LatencyStats {
        if rtts_ms.is_empty() {
            return LatencyStats {
                mean_ms: 0.0,
                jitter_ms: 0.0,
                min_ms: 0.0,
                max_ms: 0.0,
                samples: 0,
            };
        }

        let n = rtts_ms.len() as f64;
        let mean = rtts_ms.iter().sum::<f64>() / n;
        let variance = rtts_ms.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n;

        LatencyStats {
            mean_ms: mean,
            jitter_ms: variance.sqrt(),
            min_ms: rtts_ms.iter().copied().fold(f64::INFINITY, f64::min),
            max_ms: rtts_ms.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            samples: rtts_ms.len(),
        }
    }
}
