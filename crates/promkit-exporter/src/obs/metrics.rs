//! Scrape counters and timings.

use std::sync::Arc;

use promkit_core::{
    Collector, Counter, CounterVec, Opts, Registry, Result, Summary, SummaryOpts,
};

pub struct ExporterMetrics {
    pub scrapes: Arc<Counter>,
    pub scrape_duration: Arc<Summary>,
    /// Keyed by the failing collector's registration index.
    pub scrape_errors: Arc<CounterVec>,
}

impl ExporterMetrics {
    pub fn new(so: &SummaryOpts) -> Result<Self> {
        let scrapes = Counter::new(
            &Opts::new("scrapes_total", "Scrapes served by this exporter.").namespace("promkit"),
        )?;
        let scrape_duration = Summary::new(
            &Opts::new("scrape_duration_seconds", "Time spent rendering one scrape.")
                .namespace("promkit"),
            so,
        )?;
        let scrape_errors = CounterVec::new(
            &Opts::new("scrape_errors_total", "Collectors that failed while rendering a scrape.")
                .namespace("promkit"),
            &["collector"],
        )?;

        Ok(Self {
            scrapes: Arc::new(scrapes),
            scrape_duration: Arc::new(scrape_duration),
            scrape_errors: Arc::new(scrape_errors),
        })
    }

    pub fn register(&self, r: &Registry) -> Result<()> {
        r.register_all([
            Arc::clone(&self.scrapes) as Arc<dyn Collector>,
            Arc::clone(&self.scrape_duration) as Arc<dyn Collector>,
            Arc::clone(&self.scrape_errors) as Arc<dyn Collector>,
        ])
    }
}
