//! Request dispatch between the probe handler and the status page

use crate::{
    collector::SpeedtestCollector,
    error::AppError,
    exposition,
    logging::Logger,
    server::static_files,
    types::ServeMode,
};
use axum::{
    extract::State,
    http::{header, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use std::{path::PathBuf, sync::Arc, time::Instant};

/// Shared, read-only state of every request
#[derive(Clone)]
pub struct AppState {
    pub collector: Arc<SpeedtestCollector>,
    pub logger: Logger,
    pub static_dir: Arc<PathBuf>,
}

impl AppState {
    pub fn new(collector: Arc<SpeedtestCollector>, logger: Logger, static_dir: PathBuf) -> Self {
        Self {
            collector,
            logger,
            static_dir: Arc::new(static_dir),
        }
    }
}

/// Build the router for `mode`
pub fn router(state: AppState, mode: ServeMode) -> Router {
    let probe = get(probe).head(probe_head).fallback(method_not_allowed);

    let router = Router::new().route(mode.probe_path(), probe);
    let router = if mode.serves_static() {
        router.fallback(static_file)
    } else {
        router.fallback(not_found)
    };

    router.with_state(state)
}

/// Run a speed test and answer with its exposition
async fn probe(State(state): State<AppState>) -> Response {
    let correlation_id = state.logger.start_operation("probe").await;
    let started = Instant::now();

    let outcome = match state.collector.collect().await {
        Ok(samples) => exposition::render(&samples),
        Err(e) => Err(e),
    };
    let duration_ms = started.elapsed().as_millis() as u64;

    match outcome {
        Ok((body, content_type)) => {
            state.logger.info("Probe completed")
                .correlation_id(&correlation_id)
                .field("duration_ms", duration_ms)
                .log()
                .await;
            state.logger.end_operation(&correlation_id, "probe", true).await;

            ([(header::CONTENT_TYPE, content_type)], body).into_response()
        }
        Err(e) => {
            state.logger.warn(&format!("Probe failed: {}", e))
                .correlation_id(&correlation_id)
                .field("duration_ms", duration_ms)
                .error_info(&e)
                .log()
                .await;
            state.logger.end_operation(&correlation_id, "probe", false).await;

            error_response(&e)
        }
    }
}

/// Headers of a probe response, without running a speed test
async fn probe_head() -> Response {
    [(header::CONTENT_TYPE, exposition::content_type())].into_response()
}

async fn static_file(State(state): State<AppState>, method: Method, uri: Uri) -> Response {
    if method != Method::GET && method != Method::HEAD {
        return method_not_allowed().await;
    }

    match static_files::load(&state.static_dir, uri.path()).await {
        Ok(file) => ([(header::CONTENT_TYPE, file.content_type)], file.body).into_response(),
        Err(e) => {
            if !matches!(e, AppError::NotFound(_)) {
                state.logger.warn(&format!("Static file error: {}", e))
                    .field("path", uri.path())
                    .error_info(&e)
                    .log()
                    .await;
            }
            error_response(&e)
        }
    }
}

async fn not_found() -> Response {
    error_response(&AppError::not_found("Not Found"))
}

async fn method_not_allowed() -> Response {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        [(header::ALLOW, "GET, HEAD")],
        "Method Not Allowed\n",
    )
        .into_response()
}

/// Plain-text error body, 404 for missing resources and 500 otherwise
fn error_response(error: &AppError) -> Response {
    let status = match error {
        AppError::NotFound(_) => StatusCode::NOT_FOUND,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };

    (
        status,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        format!("{}\n", error),
    )
        .into_response()
}
