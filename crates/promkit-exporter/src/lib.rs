//! HTTP exposition for promkit registries.
//!
//! Wires a `Registry` behind an axum `/metrics` route, with strict YAML
//! configuration, self-instrumentation and an optional runtime collector.
//! Consumed by the binary (`main.rs`) and by integration tests.

pub mod app_state;
pub mod config;
pub mod obs;
pub mod ops;
pub mod router;
pub mod runtime;
pub mod scrape;
