//! promkit core: metric types, labeled families, and the exposition writer.
//!
//! Application code mutates metrics (`Counter`, `Gauge`, `Summary`, or a
//! `Vector` child) from any thread; a scrape renders a `Registry` into a
//! `BufWriter` in the Prometheus text format. This crate carries no transport
//! or runtime dependencies so it can sit under any scrape endpoint.
//!
//! # Panics
//! `unwrap`, `expect`, and `panic!` are compile-denied here. The exceptions
//! are a label-count mismatch in `Vector::with_label_values` and a rejected
//! `Registry::must_register`; `try_with_label_values` and `register` report
//! the same conditions as errors.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod clock;
pub mod counter;
pub mod desc;
pub mod error;
pub mod handle;
pub mod registry;
pub mod sketch;
pub mod summary;
pub mod vector;
pub mod writer;

pub use clock::{Clock, ManualClock, SystemClock};
pub use counter::{Counter, CounterVec, Gauge, GaugeVec};
pub use desc::{build_fq_name, Desc, Label, Labels, MetricType, Opts};
pub use error::{ErrorKind, MetricsError, Result};
pub use handle::Handle;
pub use registry::{default_registry, CollectFailure, Registry, ScrapeReport};
pub use sketch::{CkmsSketch, Sketch};
pub use summary::{Summary, SummaryAllocator, SummaryOpts, SummaryVec};
pub use vector::{Allocator, DefaultAllocator, Vector};
pub use writer::{BufWriter, Collector, MetricCollector, Writer};
