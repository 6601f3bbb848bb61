//! Renders a registry into one reusable exposition buffer.

use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use parking_lot::Mutex;
use promkit_core::{BufWriter, Label, Registry};

use crate::obs::metrics::ExporterMetrics;

pub const CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

pub struct ScrapeHandler {
    registry: Arc<Registry>,
    // serializes scrapes; the buffer's capacity survives between them
    buf: Mutex<BufWriter>,
    metrics: ExporterMetrics,
}

impl ScrapeHandler {
    pub fn new(registry: Arc<Registry>, static_labels: &[Label], metrics: ExporterMetrics) -> Self {
        Self {
            registry,
            buf: Mutex::new(BufWriter::new(static_labels)),
            metrics,
        }
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Render every registered collector. Failed collectors are left out of
    /// the body and counted in `promkit_scrape_errors_total`.
    pub fn render(&self) -> Bytes {
        let started = Instant::now();

        let (body, report) = {
            let mut buf = self.buf.lock();
            let report = self.registry.collect(&mut buf);
            (buf.to_bytes(), report)
        };

        for f in &report.failures {
            let index = f.index.to_string();
            self.metrics
                .scrape_errors
                .with_label_values(&[index.as_str()])
                .inc();
        }
        self.metrics.scrapes.inc();
        self.metrics
            .scrape_duration
            .observe(started.elapsed().as_secs_f64());

        tracing::debug!(
            bytes = body.len(),
            collected = report.collected,
            failed = report.failures.len(),
            "scrape rendered"
        );
        body
    }
}
