//! End-to-end tests over a live listener, driven through the probe client
//! where possible and raw reqwest for the failure paths.

use speedtest_server::api::{ErrorResponse, PingResponse, UploadResponse};
use speedtest_server::client::Probe;
use speedtest_server::config::Config;
use speedtest_server::params;
use speedtest_server::server::Server;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

const TEST_ORIGIN: &str = "https://speed.example.net";

struct TestServer {
    base_url: String,
    shutdown: oneshot::Sender<()>,
    handle: JoinHandle<speedtest_server::error::Result<()>>,
}

async fn start() -> TestServer {
    let server = Server::bind(Config::new(0, TEST_ORIGIN.to_owned()))
        .await
        .expect("bind ephemeral port");
    let port = server.local_addr().unwrap().port();
    let (shutdown, rx) = oneshot::channel();
    let handle = tokio::spawn(server.run(async {
        let _ = rx.await;
    }));
    TestServer {
        base_url: format!("http://127.0.0.1:{port}"),
        shutdown,
        handle,
    }
}

#[tokio::test]
async fn health_endpoint_is_live() {
    let ts = start().await;

    let resp = reqwest::get(format!("{}{}", ts.base_url, params::HEALTH_PATH))
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "ok");

    let _ = ts.shutdown.send(());
}

#[tokio::test]
async fn ping_timestamps_are_non_decreasing() {
    let ts = start().await;
    let url = format!("{}{}", ts.base_url, params::PING_PATH);

    let mut previous = 0u64;
    for _ in 0..5 {
        let ping: PingResponse = reqwest::get(&url).await.unwrap().json().await.unwrap();
        assert!(ping.timestamp >= previous);
        assert!(ping.server_time > 0.0);
        previous = ping.timestamp;
    }

    let _ = ts.shutdown.send(());
}

#[tokio::test]
async fn every_response_carries_the_envelope() {
    let ts = start().await;

    let resp = reqwest::get(format!("{}{}", ts.base_url, params::PING_PATH))
        .await
        .unwrap();
    let headers = resp.headers();
    assert_eq!(
        headers.get("cache-control").unwrap(),
        "no-store, no-cache, must-revalidate"
    );
    assert_eq!(headers.get("pragma").unwrap(), "no-cache");
    assert_eq!(headers.get("expires").unwrap(), "0");
    assert_eq!(
        headers.get("access-control-allow-origin").unwrap(),
        TEST_ORIGIN
    );
    assert_eq!(
        headers.get("access-control-allow-credentials").unwrap(),
        "true"
    );

    // the 404 path gets the same treatment
    let resp = reqwest::get(format!("{}/definitely/not/here", ts.base_url))
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
    assert_eq!(
        resp.headers().get("access-control-allow-origin").unwrap(),
        TEST_ORIGIN
    );
    let err: ErrorResponse = resp.json().await.unwrap();
    assert_eq!(err.error, "Not found");

    let _ = ts.shutdown.send(());
}

#[tokio::test]
async fn download_clamps_below_minimum_and_streams_exact_count() {
    let ts = start().await;
    let probe = Probe::new(&ts.base_url).unwrap();

    // size=10 is far below the admissible range; the server clamps up
    let stats = probe.download(Some(10)).await.unwrap();
    assert_eq!(stats.bytes, params::MIN_DOWNLOAD_BYTES);
    assert!(stats.seconds > 0.0);

    let _ = ts.shutdown.send(());
}

#[tokio::test]
async fn download_declares_clamped_content_length() {
    let ts = start().await;
    let client = reqwest::Client::new();

    // check headers for the over-maximum case without pulling 200 MiB
    let resp = client
        .get(format!(
            "{}{}?size=500000000",
            ts.base_url,
            params::DOWNLOAD_PATH
        ))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(
        resp.headers().get("content-length").unwrap(),
        &params::MAX_DOWNLOAD_BYTES.to_string()
    );
    assert_eq!(
        resp.headers().get("content-type").unwrap(),
        "application/octet-stream"
    );
    // dropping the response aborts the stream mid-transfer; the server must
    // keep serving other sessions afterwards
    drop(resp);

    let ping = client
        .get(format!("{}{}", ts.base_url, params::PING_PATH))
        .send()
        .await
        .unwrap();
    assert_eq!(ping.status(), 200);

    let _ = ts.shutdown.send(());
}

#[tokio::test]
async fn upload_round_trip_reports_exact_count() {
    let ts = start().await;
    let probe = Probe::new(&ts.base_url).unwrap();

    let outcome = probe.upload(1 << 20).await.unwrap();
    assert_eq!(outcome.report.received, 1 << 20);
    assert_eq!(outcome.report.expected, 1 << 20);
    assert!(outcome.report.duration >= 0.0);
    assert!(outcome.report.timestamp > 0);

    let _ = ts.shutdown.send(());
}

#[tokio::test]
async fn upload_without_content_length_is_rejected() {
    let ts = start().await;
    let client = reqwest::Client::new();

    // a streamed body goes out chunked, with no Content-Length header
    let body = reqwest::Body::wrap_stream(futures_util::stream::once(async {
        Ok::<_, std::io::Error>(bytes::Bytes::from_static(b"some data"))
    }));
    let resp = client
        .post(format!("{}{}", ts.base_url, params::UPLOAD_PATH))
        .body(body)
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 400);
    let err: ErrorResponse = resp.json().await.unwrap();
    assert!(err.error.contains("Content-Length"));

    let _ = ts.shutdown.send(());
}

#[tokio::test]
async fn upload_report_matches_server_side_wire_type() {
    let ts = start().await;
    let client = reqwest::Client::new();

    let payload = vec![0xCD; 4096];
    let resp = client
        .post(format!("{}{}", ts.base_url, params::UPLOAD_PATH))
        .body(payload)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let report: UploadResponse = resp.json().await.unwrap();
    assert_eq!(report.received, 4096);
    assert_eq!(report.expected, 4096);

    let _ = ts.shutdown.send(());
}

#[tokio::test]
async fn shutdown_signal_drains_and_exits() {
    let ts = start().await;

    // server is live before the signal
    let resp = reqwest::get(format!("{}{}", ts.base_url, params::HEALTH_PATH))
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    ts.shutdown.send(()).unwrap();
    let result = ts.handle.await.unwrap();
    assert!(result.is_ok());
}
