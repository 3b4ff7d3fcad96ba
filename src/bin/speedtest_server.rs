use clap::Parser;
use speedtest_server::config::Config;
use speedtest_server::server::Server;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "speedtest-server",
    about = "HTTP bandwidth and latency measurement server"
)]
struct Cli {
    /// Listening port
    #[arg(long, env = "SPEEDTEST_PORT", default_value_t = 3000)]
    port: u16,
    /// Single origin allowed for cross-origin requests
    #[arg(long, env = "SPEEDTEST_ORIGIN", default_value = "http://localhost:5173")]
    origin: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let server = Server::bind(Config::new(cli.port, cli.origin)).await?;

    server
        .run(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    Ok(())
}
