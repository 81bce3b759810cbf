//! Speed tester for `__down` / `__up` style HTTP speed test servers

use crate::{
    error::{AppError, ErrorContext, Result},
    logging::Logger,
    models::{bits_per_second, MeasurementResult, TesterConfig},
    tester::SpeedTester,
};
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::{header::CONTENT_LENGTH, Body, Client, Response};
use std::{
    future::Future,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::{Duration, Instant},
};
use url::Url;

const DOWNLOAD_PATH: &str = "__down";
const UPLOAD_PATH: &str = "__up";
const UPLOAD_CHUNK_SIZE: usize = 64 * 1024;

/// Speed tester speaking the HTTP speed test protocol
///
/// The configured timeout bounds how long any single step may go without
/// progress. A transfer that keeps moving is never cut short, however long it
/// takes in total.
pub struct HttpSpeedTester {
    client: Client,
    config: TesterConfig,
    logger: Logger,
}

/// Winner of server selection
#[derive(Debug, Clone)]
struct SelectedServer {
    url: Url,
    latency: Duration,
}

impl HttpSpeedTester {
    /// Build the tester and its HTTP client from `config`
    pub fn new(config: TesterConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(config.timeout)
            .local_address(config.source_address)
            .user_agent(format!("{}/{}", crate::PKG_NAME, crate::VERSION))
            .build()
            .map_err(|e| AppError::network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            config,
            logger: Logger::quiet("tester"),
        })
    }

    /// Log through `logger` instead of the default quiet logger
    pub fn with_logger(mut self, logger: Logger) -> Self {
        self.logger = logger;
        self
    }

    pub fn config(&self) -> &TesterConfig {
        &self.config
    }

    /// Pick the candidate with the lowest latency
    async fn select_server(&self) -> Result<SelectedServer> {
        let mut best: Option<SelectedServer> = None;

        for server in &self.config.servers {
            match self.latency(server).await {
                Ok(latency) => {
                    self.logger.debug("Speed test server responded")
                        .field("server", server.as_str())
                        .field("latency_ms", latency.as_secs_f64() * 1000.0)
                        .log()
                        .await;

                    if best.as_ref().map_or(true, |b| latency < b.latency) {
                        best = Some(SelectedServer { url: server.clone(), latency });
                    }
                }
                Err(e) => {
                    self.logger.debug("Skipping speed test server")
                        .field("server", server.as_str())
                        .field("error", e.to_string())
                        .error_info(&e)
                        .log()
                        .await;
                }
            }
        }

        best.ok_or_else(|| AppError::measurement("no speed test servers available"))
    }

    /// Minimum round trip of zero-byte downloads
    async fn latency(&self, server: &Url) -> Result<Duration> {
        let url = endpoint(server, DOWNLOAD_PATH)?;
        let mut best = Duration::MAX;

        for _ in 0..self.config.ping_samples.max(1) {
            let start = Instant::now();
            let request = self.client.get(url.clone()).query(&[("bytes", 0u64)]).send();
            let response = check_status(self.within(request).await??)?;
            self.within(response.bytes()).await??;
            best = best.min(start.elapsed());
        }

        Ok(best)
    }

    /// Stream every download size, returns (bytes, elapsed)
    async fn download(&self, server: &Url) -> Result<(u64, Duration)> {
        let url = endpoint(server, DOWNLOAD_PATH)?;
        let mut received = 0u64;
        let mut elapsed = Duration::ZERO;

        for &size in &self.config.download_sizes {
            let start = Instant::now();
            let request = self.client.get(url.clone()).query(&[("bytes", size)]).send();
            let response = check_status(self.within(request).await??)?;

            // Each chunk gets a fresh timeout
            let mut stream = response.bytes_stream();
            while let Some(chunk) = self.within(stream.next()).await? {
                received += chunk?.len() as u64;
            }
            elapsed += start.elapsed();
        }

        Ok((received, elapsed))
    }

    /// Post a zero-filled body for every upload size, returns (bytes, elapsed)
    async fn upload(&self, server: &Url) -> Result<(u64, Duration)> {
        let url = endpoint(server, UPLOAD_PATH)?;
        let mut sent = 0u64;
        let mut elapsed = Duration::ZERO;

        for &size in &self.config.upload_sizes {
            let progress = Arc::new(AtomicU64::new(0));
            let start = Instant::now();
            let request = self.client
                .post(url.clone())
                .header(CONTENT_LENGTH, size)
                .body(upload_body(size, progress.clone()))
                .send();
            let response = check_status(self.until_idle(request, &progress).await??)?;
            self.within(response.bytes()).await??;
            elapsed += start.elapsed();
            sent += size;
        }

        Ok((sent, elapsed))
    }

    /// Await `step`, failing if it takes longer than the configured timeout
    async fn within<F: Future>(&self, step: F) -> Result<F::Output> {
        tokio::time::timeout(self.config.timeout, step)
            .await
            .map_err(|_| self.stalled())
    }

    /// Await `step` for as long as `progress` keeps moving
    ///
    /// Progress is sampled once per timeout, so a stall is reported between
    /// one and two timeouts after it starts.
    async fn until_idle<F: Future>(&self, step: F, progress: &AtomicU64) -> Result<F::Output> {
        tokio::pin!(step);
        let mut seen = progress.load(Ordering::Relaxed);

        loop {
            tokio::select! {
                output = &mut step => return Ok(output),
                _ = tokio::time::sleep(self.config.timeout) => {
                    let current = progress.load(Ordering::Relaxed);
                    if current == seen {
                        return Err(self.stalled());
                    }
                    seen = current;
                }
            }
        }
    }

    fn stalled(&self) -> AppError {
        AppError::timeout(format!(
            "operation timed out after {:?} without progress",
            self.config.timeout
        ))
    }
}

/// Zero-filled streaming body of `size` bytes, counting bytes handed to the connection
fn upload_body(size: u64, progress: Arc<AtomicU64>) -> Body {
    let chunks = (0..size).step_by(UPLOAD_CHUNK_SIZE).map(move |offset| {
        let len = (size - offset).min(UPLOAD_CHUNK_SIZE as u64);
        progress.fetch_add(len, Ordering::Relaxed);
        Ok::<_, std::io::Error>(vec![0u8; len as usize])
    });
    Body::wrap_stream(futures::stream::iter(chunks))
}

#[async_trait]
impl SpeedTester for HttpSpeedTester {
    async fn measure(&self) -> Result<MeasurementResult> {
        let selected = self.select_server().await?;
        let (bytes_received, download_time) =
            self.download(&selected.url).await.context("download")?;
        let (bytes_sent, upload_time) = self.upload(&selected.url).await.context("upload")?;

        Ok(MeasurementResult::new(
            bits_per_second(bytes_received, download_time),
            bits_per_second(bytes_sent, upload_time),
            selected.latency.as_secs_f64() * 1000.0,
            bytes_sent,
            bytes_received,
        )
        .with_server(selected.url.as_str()))
    }
}

/// Join `path` onto `server`, keeping any path prefix the server URL has
fn endpoint(server: &Url, path: &str) -> Result<Url> {
    let mut base = server.clone();
    if !base.path().ends_with('/') {
        let with_slash = format!("{}/", base.path());
        base.set_path(&with_slash);
    }
    Ok(base.join(path)?)
}

fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(AppError::measurement(format!(
            "{} returned HTTP {}",
            response.url(),
            status
        )))
    }
}
