//! Self-instrumentation of the exporter.
//!
//! These metrics live in the same registry they describe, so a scrape reports
//! the totals as of the previous scrape.

pub mod metrics;
