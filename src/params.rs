//! Protocol constants and tuning parameters.

/// Size of each generated download chunk (64 KiB).
pub const CHUNK_SIZE: usize = 1 << 16;

/// Smallest admissible download size (50 MiB). Smaller requests are clamped up.
pub const MIN_DOWNLOAD_BYTES: u64 = 50 << 20;

/// Largest admissible download size (200 MiB). Larger requests are clamped down.
pub const MAX_DOWNLOAD_BYTES: u64 = 200 << 20;

/// Download size used when the client does not supply one (100 MiB).
pub const DEFAULT_DOWNLOAD_BYTES: u64 = 100 << 20;

/// URL path for the download test.
pub const DOWNLOAD_PATH: &str = "/api/download";

/// URL path for the upload test.
pub const UPLOAD_PATH: &str = "/api/upload";

/// URL path for the latency sampling target.
pub const PING_PATH: &str = "/api/ping";

/// URL path for the liveness check.
pub const HEALTH_PATH: &str = "/health";

/// Number of sequential ping samples the probe takes by default.
pub const DEFAULT_PING_SAMPLES: usize = 10;

/// Default payload size for probe upload runs (10 MiB).
pub const DEFAULT_UPLOAD_BYTES: u64 = 10 << 20;
