//! Top-level facade crate for promkit.
//!
//! Depend on this one crate to get the metric types (`core`) and the HTTP
//! exposition layer (`exporter`). `prelude` covers the common instrumenting
//! call sites.

pub mod core {
    pub use promkit_core::*;
}

pub mod exporter {
    pub use promkit_exporter::*;
}

pub mod prelude {
    pub use promkit_core::{
        default_registry, Collector, Counter, CounterVec, Gauge, GaugeVec, Handle, Opts,
        Registry, Summary, SummaryOpts, SummaryVec,
    };
}
