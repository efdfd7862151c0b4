//! Prometheus metrics for the rewards engine.
//!
//! Collectors live on the default registry; the embedding service exposes
//! them however it serves its `/metrics` endpoint.

use anyhow::Context;
use prometheus::{Encoder, TextEncoder};

pub mod engine;

/// Render all registered metrics in Prometheus text format.
pub fn render() -> anyhow::Result<String> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();

    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .context("encode prometheus metrics")?;
    String::from_utf8(buffer).context("metrics text is not valid utf-8")
}
