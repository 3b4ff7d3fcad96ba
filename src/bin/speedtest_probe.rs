use clap::Parser;
use speedtest_server::client::Probe;
use speedtest_server::emitter::{Emitter, HumanReadableEmitter, JsonEmitter, TestKind};
use speedtest_server::params;
use speedtest_server::summary::Summary;

#[derive(Clone, Debug, clap::ValueEnum)]
enum Format {
    Human,
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "speedtest-probe", about = "Measurement client for speedtest-server")]
struct Cli {
    /// Base URL of the measurement server
    #[arg(long, default_value = "http://localhost:3000")]
    server: String,
    /// Output format to use: 'human' or 'json' for batch processing
    #[arg(long, default_value = "human")]
    format: Format,
    /// Requested download size in bytes (the server clamps to its admissible range)
    #[arg(long)]
    download_size: Option<u64>,
    /// Upload payload size in bytes
    #[arg(long, default_value_t = params::DEFAULT_UPLOAD_BYTES)]
    upload_size: u64,
    /// Number of sequential ping samples
    #[arg(long, default_value_t = params::DEFAULT_PING_SAMPLES)]
    ping_samples: usize,
    /// Skip the download test
    #[arg(long)]
    no_download: bool,
    /// Skip the upload test
    #[arg(long)]
    no_upload: bool,
    /// Skip latency sampling
    #[arg(long)]
    no_ping: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.no_download && cli.no_upload && cli.no_ping {
        eprintln!("error: nothing to do, all tests are disabled");
        std::process::exit(1);
    }

    let mut emitter: Box<dyn Emitter> = match cli.format {
        Format::Human => Box::new(HumanReadableEmitter::new(std::io::stdout())),
        Format::Json => Box::new(JsonEmitter::new(std::io::stdout())),
    };

    let probe = Probe::new(&cli.server)?;

    let mut summary = Summary {
        server: cli.server.clone(),
        download: None,
        upload: None,
        latency: None,
    };

    let mut any_succeeded = false;

    if !cli.no_ping {
        let t = TestKind::Ping;
        emitter.on_starting(t)?;
        match probe.ping(cli.ping_samples).await {
            Ok(stats) => {
                emitter.on_latency(&stats)?;
                summary.latency = Some(stats);
                any_succeeded = true;
            }
            Err(e) => emitter.on_error(t, &e.to_string())?,
        }
    }

    if !cli.no_download {
        let t = TestKind::Download;
        emitter.on_starting(t)?;
        match probe.download(cli.download_size).await {
            Ok(stats) => {
                emitter.on_transfer(t, &stats)?;
                summary.download = Some(stats);
                any_succeeded = true;
            }
            Err(e) => emitter.on_error(t, &e.to_string())?,
        }
    }

    if !cli.no_upload {
        let t = TestKind::Upload;
        emitter.on_starting(t)?;
        match probe.upload(cli.upload_size).await {
            Ok(outcome) => {
                emitter.on_transfer(t, &outcome.stats)?;
                summary.upload = Some(outcome.stats);
                any_succeeded = true;
            }
            Err(e) => emitter.on_error(t, &e.to_string())?,
        }
    }

    emitter.on_summary(&summary)?;

    if !any_succeeded {
        std::process::exit(1);
    }

    Ok(())
}
