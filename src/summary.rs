use serde::Serialize;

use crate::client::{LatencyStats, TransferStats};

/// Final report of one probe run.
#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    pub server: String,
    pub download: Option<TransferStats>,
    pub upload: Option<TransferStats>,
    pub latency: Option<LatencyStats>,
}
