//! An HTTP bandwidth and latency measurement server, with a probe client.
//!
//! The server streams precisely sized, incompressible random payloads under
//! transport backpressure (download test), counts inbound bytes without
//! retaining them (upload test), and answers timestamp requests for
//! client-side latency and jitter sampling (ping test). The probe client
//! drives all three against a server and reduces the results.
//!
//! # Quick start
//!
//! ```no_run
//! use speedtest_server::config::Config;
//! use speedtest_server::server::Server;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let server = Server::bind(Config::default()).await?;
//! server
//!     .run(async {
//!         let _ = tokio::signal::ctrl_c().await;
//!     })
//!     .await?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod api;
pub mod client;
pub mod config;
pub mod emitter;
pub mod error;
pub mod params;
pub mod payload;
pub mod server;
pub mod summary;
pub mod upload;
