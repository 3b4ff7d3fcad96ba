//! Output formatting for probe runs.
//!
//! The [`Emitter`] trait defines callbacks for each stage of a run.
//! Two implementations are provided:
//! - [`HumanReadableEmitter`] — progress lines and a formatted summary for a terminal.
//! - [`JsonEmitter`] — one JSON object per line, suitable for machine consumption.

use std::io::Write;

use serde::Serialize;

use crate::client::{LatencyStats, TransferStats};
use crate::error::Result;
use crate::summary::Summary;

/// Which test an event belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TestKind {
    /// Server-to-client throughput test.
    Download,
    /// Client-to-server throughput test.
    Upload,
    /// Round-trip latency sampling.
    Ping,
}

#[derive(Serialize)]
#[serde(tag = "type")]
enum Event<'a> {
    Starting { test: TestKind },
    Error { test: TestKind, error: &'a str },
    Transfer { test: TestKind, stats: &'a TransferStats, mbps: f64 },
    Latency { stats: &'a LatencyStats },
    Summary { summary: &'a Summary },
}

/// Callbacks for probe lifecycle events.
pub trait Emitter {
    /// Called when a test is about to begin.
    fn on_starting(&mut self, test: TestKind) -> Result<()>;
    /// Called when a test fails.
    fn on_error(&mut self, test: TestKind, err: &str) -> Result<()>;
    /// Called when a throughput test finishes.
    fn on_transfer(&mut self, test: TestKind, stats: &TransferStats) -> Result<()>;
    /// Called when latency sampling finishes.
    fn on_latency(&mut self, stats: &LatencyStats) -> Result<()>;
    /// Called after all tests complete, with the final summary.
    fn on_summary(&mut self, s: &Summary) -> Result<()>;
}

/// Emits human-readable progress and results to a writer.
pub struct HumanReadableEmitter<W: Write> {
    out: W,
}

impl<W: Write> HumanReadableEmitter<W> {
    /// Create a new emitter writing to `out`.
    pub fn new(out: W) -> Self {
        HumanReadableEmitter { out }
    }
}

impl<W: Write> Emitter for HumanReadableEmitter<W> {
    fn on_starting(&mut self, test: TestKind) -> Result<()> {
        writeln!(self.out, "starting {:?}", test)?;
        Ok(())
    }

    fn on_error(&mut self, test: TestKind, err: &str) -> Result<()> {
        writeln!(self.out, "{:?} test failed: {err}", test)?;
        Ok(())
    }

    fn on_transfer(&mut self, test: TestKind, stats: &TransferStats) -> Result<()> {
        writeln!(
            self.out,
            "{:?}: {:>7.1} Mbit/s ({} bytes in {:.2}s)",
            test,
            stats.throughput_mbps(),
            stats.bytes,
            stats.seconds
        )?;
        Ok(())
    }

    fn on_latency(&mut self, stats: &LatencyStats) -> Result<()> {
        writeln!(
            self.out,
            "Ping: {:.1} ms mean, {:.1} ms jitter ({} samples)",
            stats.mean_ms, stats.jitter_ms, stats.samples
        )?;
        Ok(())
    }

    fn on_summary(&mut self, s: &Summary) -> Result<()> {
        writeln!(self.out, "\nTest results\n")?;
        writeln!(self.out, "{:>10}: {}", "Server", s.server)?;
        if let Some(dl) = &s.download {
            writeln!(
                self.out,
                "{:>10}: {:>7.1} Mbit/s",
                "Download",
                dl.throughput_mbps()
            )?;
        }
        if let Some(ul) = &s.upload {
            writeln!(
                self.out,
                "{:>10}: {:>7.1} Mbit/s",
                "Upload",
                ul.throughput_mbps()
            )?;
        }
        if let Some(lat) = &s.latency {
            writeln!(self.out, "{:>10}: {:>7.1} ms", "Latency", lat.mean_ms)?;
            writeln!(self.out, "{:>10}: {:>7.1} ms", "Jitter", lat.jitter_ms)?;
        }
        Ok(())
    }
}

/// Emits one JSON object per line for each event.
pub struct JsonEmitter<W: Write> {
    out: W,
}

impl<W: Write> JsonEmitter<W> {
    /// Create a new JSON emitter writing to `out`.
    pub fn new(out: W) -> Self {
        JsonEmitter { out }
    }

    fn emit(&mut self, event: &Event) -> Result<()> {
        let json = serde_json::to_string(event)?;
        writeln!(self.out, "{}", json)?;
        Ok(())
    }
}

impl<W: Write> Emitter for JsonEmitter<W> {
    fn on_starting(&mut self, test: TestKind) -> Result<()> {
        self.emit(&Event::Starting { test })
    }

    fn on_error(&mut self, test: TestKind, err: &str) -> Result<()> {
        self.emit(&Event::Error { test, error: err })
    }

    fn on_transfer(&mut self, test: TestKind, stats: &TransferStats) -> Result<()> {
        self.emit(&Event::Transfer {
            test,
            stats,
            mbps: stats.throughput_mbps(),
        })
    }

    fn on_latency(&mut self, stats: &LatencyStats) -> Result<()> {
        self.emit(&Event::Latency { stats })
    }

    fn on_summary(&mut self, s: &Summary) -> Result<()> {
        self.emit(&Event::Summary { summary: s })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn human_readable_transfer() {
        let mut buf = Vec::new();
        let mut emitter = HumanReadableEmitter::new(&mut buf);

        let stats = TransferStats {
            bytes: 1_000_000,
            seconds: 1.0,
        };
        emitter.on_transfer(TestKind::Download, &stats).unwrap();

        let out = String::from_utf8(buf).unwrap();
        assert!(out.contains("8.0 Mbit/s"));
    }

    #[test]
    fn json_emitter_valid() {
        let mut buf = Vec::new();
        let mut emitter = JsonEmitter::new(&mut buf);

        emitter.on_starting(TestKind::Upload).unwrap();

        let out = String::from_utf8(buf).unwrap();
        let res = serde_json::from_str::<serde_json::Value>(&out).unwrap();

        assert_eq!(res["test"], "upload");
        assert_eq!(res["type"], "Starting");
    }

    #[test]
    fn json_latency_event_carries_stats() {
        let mut buf = Vec::new();
        let mut emitter = JsonEmitter::new(&mut buf);

        let stats = LatencyStats::from_samples(&[5.0, 7.0]);
        emitter.on_latency(&stats).unwrap();

        let out = String::from_utf8(buf).unwrap();
        let res = serde_json::from_str::<serde_json::Value>(&out).unwrap();
        assert_eq!(res["type"], "Latency");
        assert_eq!(res["stats"]["samples"], 2);
    }
}
