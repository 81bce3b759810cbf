//! Prometheus text exposition of metric samples

use crate::{collector::MetricSample, error::Result};
use prometheus::{Encoder, Gauge, Opts, Registry, TextEncoder, TEXT_FORMAT};

/// Encode `samples` as gauges, returns the body and its content type
///
/// A fresh registry is built per call so concurrent probes never share
/// metric state.
pub fn render(samples: &[MetricSample]) -> Result<(Vec<u8>, String)> {
    let registry = Registry::new();

    for sample in samples {
        let gauge = Gauge::with_opts(Opts::new(sample.name, sample.help))?;
        gauge.set(sample.value);
        registry.register(Box::new(gauge))?;
    }

    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    encoder.encode(&registry.gather(), &mut buffer)?;

    Ok((buffer, encoder.format_type().to_string()))
}

/// Content type of every body `render` produces
pub fn content_type() -> &'static str {
    TEXT_FORMAT
}
