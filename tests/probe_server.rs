//! End-to-end tests against a running exporter with stub speed testers

use async_trait::async_trait;
use speedtest_exporter::{
    collector::SAMPLE_NAMES,
    logging::Logger,
    AppError, ExporterServer, MeasurementResult, Result, ServeMode, ServerConfig, SpeedTester,
    SpeedtestCollector,
};
use std::{
    net::SocketAddr,
    path::Path,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::{Duration, Instant},
};
use tempfile::TempDir;
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpStream,
};

/// Stub that sleeps, then returns a fixed result or a timeout
struct StubTester {
    delay: Duration,
    fail: bool,
    calls: AtomicUsize,
}

impl StubTester {
    fn new(delay: Duration) -> Arc<Self> {
        Arc::new(Self { delay, fail: false, calls: AtomicUsize::new(0) })
    }

    fn failing() -> Arc<Self> {
        Arc::new(Self { delay: Duration::ZERO, fail: true, calls: AtomicUsize::new(0) })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SpeedTester for StubTester {
    async fn measure(&self) -> Result<MeasurementResult> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;

        if self.fail {
            return Err(AppError::timeout("speed test timed out"));
        }
        Ok(MeasurementResult::new(5_000_000.0, 1_000_000.0, 12.5, 524_288, 2_097_152))
    }
}

fn static_root() -> TempDir {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("index.html"), "<h1>speedtest exporter</h1>").unwrap();
    std::fs::write(dir.path().join("style.css"), "body {}").unwrap();
    dir
}

/// Send `target` verbatim, without client-side path normalization
async fn raw_get(addr: SocketAddr, target: &str) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    let request = format!(
        "GET {} HTTP/1.1\r\nHost: {}\r\nConnection: close\r\n\r\n",
        target, addr
    );
    stream.write_all(request.as_bytes()).await.unwrap();

    let mut response = String::new();
    stream.read_to_string(&mut response).await.unwrap();
    response
}

/// Start a server on an ephemeral port and return its address
async fn start(mode: ServeMode, tester: Arc<StubTester>, static_dir: &Path) -> SocketAddr {
    let config = ServerConfig {
        listen: "127.0.0.1:0".parse().unwrap(),
        mode,
        static_dir: static_dir.to_path_buf(),
    };
    let collector = SpeedtestCollector::new(tester);
    let server = ExporterServer::bind(config, collector, Logger::quiet("test"))
        .await
        .unwrap();
    let addr = server.local_addr().unwrap();

    tokio::spawn(server.serve());
    addr
}

#[tokio::test]
async fn test_probe_reports_measurement() {
    let root = static_root();
    let tester = StubTester::new(Duration::ZERO);
    let addr = start(ServeMode::Probe, tester.clone(), root.path()).await;

    let response = reqwest::get(format!("http://{}/probe", addr)).await.unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(
        response.headers()["content-type"],
        "text/plain; version=0.0.4"
    );

    let body = response.text().await.unwrap();
    for line in [
        "download_speed_bps 5000000",
        "upload_speed_bps 1000000",
        "ping_ms 12.5",
        "bytes_sent 524288",
        "bytes_received 2097152",
    ] {
        assert!(body.lines().any(|l| l == line), "missing {:?} in {}", line, body);
    }

    // Exactly five unlabelled samples, everything else is HELP/TYPE metadata
    let sample_line = regex::Regex::new(r"^[a-z_]+ [0-9.]+$").unwrap();
    let samples: Vec<_> = body.lines().filter(|l| !l.starts_with('#')).collect();
    assert_eq!(samples.len(), 5);
    assert!(samples.iter().all(|l| sample_line.is_match(l)));
    assert_eq!(tester.calls(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_probes_do_not_serialize() {
    let root = static_root();
    let delay = Duration::from_millis(600);
    let tester = StubTester::new(delay);
    let addr = start(ServeMode::Probe, tester.clone(), root.path()).await;
    let url = format!("http://{}/probe", addr);

    let started = Instant::now();
    let (first, second) = tokio::join!(reqwest::get(&url), reqwest::get(&url));
    let elapsed = started.elapsed();

    assert_eq!(first.unwrap().status(), 200);
    assert_eq!(second.unwrap().status(), 200);
    assert_eq!(tester.calls(), 2);
    assert!(elapsed >= delay);
    assert!(elapsed < delay * 2, "two probes took {:?}", elapsed);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_static_page_served_during_probe() {
    let root = static_root();
    let tester = StubTester::new(Duration::from_secs(2));
    let addr = start(ServeMode::Probe, tester.clone(), root.path()).await;

    let probe = tokio::spawn(reqwest::get(format!("http://{}/probe", addr)));
    tokio::time::sleep(Duration::from_millis(100)).await;

    let started = Instant::now();
    let response = reqwest::get(format!("http://{}/", addr)).await.unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(response.text().await.unwrap(), "<h1>speedtest exporter</h1>");
    assert!(started.elapsed() < Duration::from_secs(1));

    assert_eq!(probe.await.unwrap().unwrap().status(), 200);
}

#[tokio::test]
async fn test_only_probe_path_measures() {
    let root = static_root();
    let tester = StubTester::new(Duration::ZERO);
    let addr = start(ServeMode::Probe, tester.clone(), root.path()).await;

    let css = reqwest::get(format!("http://{}/style.css", addr)).await.unwrap();
    assert_eq!(css.status(), 200);
    assert_eq!(css.headers()["content-type"], "text/css; charset=utf-8");

    let missing = reqwest::get(format!("http://{}/metrics", addr)).await.unwrap();
    assert_eq!(missing.status(), 404);

    assert_eq!(tester.calls(), 0);

    reqwest::get(format!("http://{}/probe", addr)).await.unwrap();
    reqwest::get(format!("http://{}/probe", addr)).await.unwrap();
    assert_eq!(tester.calls(), 2);
}

#[tokio::test]
async fn test_encoded_paths_are_decoded_before_lookup() {
    let parent = TempDir::new().unwrap();
    let root = parent.path().join("static");
    std::fs::create_dir(&root).unwrap();
    std::fs::write(root.join("my logo.png"), b"png").unwrap();
    std::fs::write(parent.path().join("secret.txt"), "secret").unwrap();

    let tester = StubTester::new(Duration::ZERO);
    let addr = start(ServeMode::Probe, tester.clone(), &root).await;

    let logo = raw_get(addr, "/my%20logo.png").await;
    assert!(logo.starts_with("HTTP/1.1 200"), "got {}", logo);
    assert!(logo.ends_with("png"));

    for target in ["/%2e%2e/secret.txt", "/%2E%2E%2Fsecret.txt", "/../secret.txt"] {
        let response = raw_get(addr, target).await;
        assert!(response.starts_with("HTTP/1.1 404"), "{} got {}", target, response);
    }
    assert_eq!(tester.calls(), 0);
}

#[tokio::test]
async fn test_failed_probe_returns_error_without_samples() {
    let root = static_root();
    let tester = StubTester::failing();
    let addr = start(ServeMode::Probe, tester.clone(), root.path()).await;

    let response = reqwest::get(format!("http://{}/probe", addr)).await.unwrap();
    assert_eq!(response.status(), 500);

    let body = response.text().await.unwrap();
    assert!(body.contains("timed out"));
    for name in SAMPLE_NAMES {
        assert!(!body.contains(name), "error body leaked {}", name);
    }

    // The server keeps serving after a failed probe
    let response = reqwest::get(format!("http://{}/", addr)).await.unwrap();
    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn test_metrics_mode_serves_metrics_at_root() {
    let root = static_root();
    let tester = StubTester::new(Duration::ZERO);
    let addr = start(ServeMode::Metrics, tester.clone(), root.path()).await;

    let response = reqwest::get(format!("http://{}/", addr)).await.unwrap();
    assert_eq!(response.status(), 200);
    assert!(response.text().await.unwrap().contains("ping_ms 12.5"));

    let response = reqwest::get(format!("http://{}/style.css", addr)).await.unwrap();
    assert_eq!(response.status(), 404);
    assert_eq!(tester.calls(), 1);
}

#[tokio::test]
async fn test_post_probe_not_allowed() {
    let root = static_root();
    let tester = StubTester::new(Duration::ZERO);
    let addr = start(ServeMode::Probe, tester.clone(), root.path()).await;

    let response = reqwest::Client::new()
        .post(format!("http://{}/probe", addr))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 405);
    assert_eq!(tester.calls(), 0);
}
