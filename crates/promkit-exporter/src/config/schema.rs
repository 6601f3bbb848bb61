use std::collections::HashSet;
use std::net::SocketAddr;

use serde::Deserialize;
use promkit_core::{Label, MetricsError, Result, SummaryOpts};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExporterConfig {
    pub version: u32,

    #[serde(default)]
    pub exporter: ExporterSection,

    /// Labels stamped on every exposed line.
    #[serde(default)]
    pub const_labels: Vec<Label>,

    #[serde(default)]
    pub runtime: RuntimeSection,

    /// Window and quantiles of `promkit_scrape_duration_seconds`.
    #[serde(default)]
    pub scrape_summary: SummaryOpts,
}

impl ExporterConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(MetricsError::UnsupportedVersion);
        }

        self.exporter.validate()?;

        let mut seen = HashSet::new();
        for l in &self.const_labels {
            if !is_valid_label_name(&l.name) {
                return Err(MetricsError::BadConfig(format!(
                    "const_labels: invalid label name {:?}",
                    l.name
                )));
            }
            if !seen.insert(l.name.as_str()) {
                return Err(MetricsError::BadConfig(format!(
                    "const_labels: duplicate label name {:?}",
                    l.name
                )));
            }
        }

        self.scrape_summary
            .validate()
            .map_err(|e| MetricsError::BadConfig(format!("scrape_summary: {e}")))?;

        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExporterSection {
    #[serde(default = "default_listen")]
    pub listen: String,

    #[serde(default = "default_metrics_path")]
    pub metrics_path: String,
}

impl Default for ExporterSection {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            metrics_path: default_metrics_path(),
        }
    }
}

impl ExporterSection {
    pub fn validate(&self) -> Result<()> {
        self.listen_addr()?;
        if !self.metrics_path.starts_with('/') || self.metrics_path.len() < 2 {
            return Err(MetricsError::BadConfig(
                "exporter.metrics_path must start with '/' and name a route".into(),
            ));
        }
        if self.metrics_path == "/healthz" {
            return Err(MetricsError::BadConfig(
                "exporter.metrics_path must not shadow /healthz".into(),
            ));
        }
        Ok(())
    }

    pub fn listen_addr(&self) -> Result<SocketAddr> {
        self.listen.parse().map_err(|_| {
            MetricsError::BadConfig(format!(
                "exporter.listen must be a valid SocketAddr (got {:?})",
                self.listen
            ))
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuntimeSection {
    #[serde(default = "default_runtime_enabled")]
    pub enabled: bool,
}

impl Default for RuntimeSection {
    fn default() -> Self {
        Self {
            enabled: default_runtime_enabled(),
        }
    }
}

fn default_listen() -> String {
    "0.0.0.0:9898".into()
}
fn default_metrics_path() -> String {
    "/metrics".into()
}
fn default_runtime_enabled() -> bool {
    true
}

/// `[a-zA-Z_][a-zA-Z0-9_]*`, and not reserved (`__` prefix, `quantile`).
fn is_valid_label_name(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else { return false; };
    if !(first.is_ascii_alphabetic() || first == '_') {
        return false;
    }
    if name.starts_with("__") || name == "quantile" {
        return false;
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
