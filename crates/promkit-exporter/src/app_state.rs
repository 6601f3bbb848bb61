//! Shared application state for the exporter.

use std::sync::Arc;

use promkit_core::{Registry, Result};

use crate::config::ExporterConfig;
use crate::obs::metrics::ExporterMetrics;
use crate::runtime::RuntimeCollector;
use crate::scrape::ScrapeHandler;

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    cfg: ExporterConfig,
    scrape: ScrapeHandler,
}

impl AppState {
    /// Wire self-instrumentation (and the runtime collector when enabled)
    /// into `registry`, then build the scrape handler over it.
    pub fn new(cfg: ExporterConfig, registry: Arc<Registry>) -> Result<Self> {
        let metrics = ExporterMetrics::new(&cfg.scrape_summary)?;
        metrics.register(&registry)?;

        if cfg.runtime.enabled {
            registry.register(Arc::new(RuntimeCollector::new()))?;
        }

        tracing::info!(
            collectors = registry.len(),
            const_labels = cfg.const_labels.len(),
            "exporter state ready"
        );

        let scrape = ScrapeHandler::new(registry, &cfg.const_labels, metrics);

        Ok(Self {
            inner: Arc::new(AppStateInner { cfg, scrape }),
        })
    }

    pub fn cfg(&self) -> &ExporterConfig {
        &self.inner.cfg
    }

    pub fn registry(&self) -> Arc<Registry> {
        Arc::clone(self.inner.scrape.registry())
    }

    pub fn scrape(&self) -> &ScrapeHandler {
        &self.inner.scrape
    }
}
