//! Metric identity: names, labels, types.
//!
//! A `Desc` is built once when a metric is constructed and never changes
//! afterwards. It carries everything the HELP/TYPE preamble needs.

use serde::Deserialize;

use crate::error::{MetricsError, Result};
use crate::writer::Writer;

/// One `name="value"` pair.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Label {
    pub name: String,
    pub value: String,
}

impl Label {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Overwrite in place, reusing both string allocations.
    pub(crate) fn assign(&mut self, name: &str, value: &str) {
        self.name.clear();
        self.name.push_str(name);
        self.value.clear();
        self.value.push_str(value);
    }
}

/// Ordered label list. Order is serialization order.
pub type Labels = Vec<Label>;

/// Exposition type of a metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricType {
    Counter,
    Gauge,
    Summary,
    Untyped,
}

impl MetricType {
    /// Name used on the `# TYPE` line.
    pub fn as_str(self) -> &'static str {
        match self {
            MetricType::Counter => "counter",
            MetricType::Gauge => "gauge",
            MetricType::Summary => "summary",
            MetricType::Untyped => "untyped",
        }
    }
}

/// Construction options shared by all metric kinds.
#[derive(Debug, Clone, Default)]
pub struct Opts {
    pub namespace: String,
    pub subsystem: String,
    pub name: String,
    pub help: String,
    pub const_labels: Labels,
}

impl Opts {
    pub fn new(name: impl Into<String>, help: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            help: help.into(),
            ..Self::default()
        }
    }

    pub fn namespace(mut self, ns: impl Into<String>) -> Self {
        self.namespace = ns.into();
        self
    }

    pub fn subsystem(mut self, sub: impl Into<String>) -> Self {
        self.subsystem = sub.into();
        self
    }

    pub fn const_label(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.const_labels.push(Label::new(name, value));
        self
    }
}

/// Immutable metric identity.
#[derive(Debug, Clone, PartialEq)]
pub struct Desc {
    fq_name: String,
    help: String,
    typ: MetricType,
    const_labels: Labels,
}

impl Desc {
    /// Build a descriptor. Fails only when all name parts are empty.
    pub fn new(
        namespace: &str,
        subsystem: &str,
        name: &str,
        help: &str,
        typ: MetricType,
        const_labels: &[Label],
    ) -> Result<Self> {
        let fq_name = build_fq_name(namespace, subsystem, name);
        if fq_name.is_empty() {
            return Err(MetricsError::EmptyName);
        }

        Ok(Self {
            fq_name,
            help: help.to_string(),
            typ,
            const_labels: const_labels.to_vec(),
        })
    }

    pub fn from_opts(o: &Opts, typ: MetricType) -> Result<Self> {
        Self::new(&o.namespace, &o.subsystem, &o.name, &o.help, typ, &o.const_labels)
    }

    pub fn fq_name(&self) -> &str {
        &self.fq_name
    }

    pub fn help(&self) -> &str {
        &self.help
    }

    pub fn metric_type(&self) -> MetricType {
        self.typ
    }

    pub fn const_labels(&self) -> &[Label] {
        &self.const_labels
    }

    /// Emit the HELP/TYPE preamble. Must precede every data line of this
    /// metric within one scrape.
    pub fn write_header(&self, w: &mut dyn Writer) -> Result<()> {
        w.header(&self.fq_name, &self.help, self.typ, &self.const_labels)
    }
}

/// Join `namespace_subsystem_name`, dropping empty parts and trimming stray
/// underscores from each part.
pub fn build_fq_name(namespace: &str, subsystem: &str, name: &str) -> String {
    let mut out = String::with_capacity(namespace.len() + subsystem.len() + name.len() + 2);

    for part in [namespace, subsystem, name] {
        let part = part.trim_matches('_');
        if part.is_empty() {
            continue;
        }
        if !out.is_empty() {
            out.push('_');
        }
        out.push_str(part);
    }

    out
}
