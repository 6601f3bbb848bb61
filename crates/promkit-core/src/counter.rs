//! Counter and Gauge: a single `f64` behind the metric's own lock.

use parking_lot::Mutex;

use crate::desc::{Desc, Label, MetricType, Opts};
use crate::error::{MetricsError, Result};
use crate::vector::{DefaultAllocator, Vector};
use crate::writer::{Collector, MetricCollector, Writer};

/// Shared state of both scalar kinds. `desc` is `None` for vector children.
#[derive(Debug, Default)]
struct Scalar {
    desc: Option<Desc>,
    v: Mutex<f64>,
}

impl Scalar {
    fn new(o: &Opts, typ: MetricType) -> Result<Self> {
        Ok(Self {
            desc: Some(Desc::from_opts(o, typ)?),
            v: Mutex::new(0.0),
        })
    }

    fn get(&self) -> f64 {
        *self.v.lock()
    }

    fn collect(&self, w: &mut dyn Writer) -> Result<()> {
        let desc = self.desc.as_ref().ok_or(MetricsError::NoDescriptor)?;
        desc.write_header(w)?;
        self.collect_metric(w, &[])
    }

    fn collect_metric(&self, w: &mut dyn Writer, labels: &[Label]) -> Result<()> {
        let v = self.v.lock();
        w.write(*v, "", labels)
    }
}

/// Monotonically increasing value.
#[derive(Debug, Default)]
pub struct Counter(Scalar);

/// Counters keyed by label values.
pub type CounterVec = Vector<Counter>;

impl Counter {
    pub fn new(o: &Opts) -> Result<Self> {
        Ok(Self(Scalar::new(o, MetricType::Counter)?))
    }

    pub fn inc(&self) {
        *self.0.v.lock() += 1.0;
    }

    /// Add a non-negative delta. Negative (or NaN) deltas are rejected and
    /// leave the value untouched.
    pub fn add(&self, delta: f64) -> Result<()> {
        if delta.is_nan() || delta < 0.0 {
            return Err(MetricsError::NegativeDelta(delta));
        }
        *self.0.v.lock() += delta;
        Ok(())
    }

    pub fn get(&self) -> f64 {
        self.0.get()
    }
}

impl Collector for Counter {
    fn collect(&self, w: &mut dyn Writer) -> Result<()> {
        self.0.collect(w)
    }
}

impl MetricCollector for Counter {
    fn collect_metric(&self, w: &mut dyn Writer, labels: &[Label]) -> Result<()> {
        self.0.collect_metric(w, labels)
    }
}

impl CounterVec {
    pub fn new(o: &Opts, label_names: &[&str]) -> Result<Self> {
        Vector::with_allocator(o, MetricType::Counter, label_names, DefaultAllocator::default())
    }
}

/// Value that can go up and down.
#[derive(Debug, Default)]
pub struct Gauge(Scalar);

/// Gauges keyed by label values.
pub type GaugeVec = Vector<Gauge>;

impl Gauge {
    pub fn new(o: &Opts) -> Result<Self> {
        Ok(Self(Scalar::new(o, MetricType::Gauge)?))
    }

    pub fn inc(&self) {
        self.add(1.0);
    }

    pub fn dec(&self) {
        self.add(-1.0);
    }

    pub fn sub(&self, delta: f64) {
        self.add(-delta);
    }

    pub fn add(&self, delta: f64) {
        *self.0.v.lock() += delta;
    }

    pub fn set(&self, v: f64) {
        *self.0.v.lock() = v;
    }

    pub fn get(&self) -> f64 {
        self.0.get()
    }
}

impl Collector for Gauge {
    fn collect(&self, w: &mut dyn Writer) -> Result<()> {
        self.0.collect(w)
    }
}

impl MetricCollector for Gauge {
    fn collect_metric(&self, w: &mut dyn Writer, labels: &[Label]) -> Result<()> {
        self.0.collect_metric(w, labels)
    }
}

impl GaugeVec {
    pub fn new(o: &Opts, label_names: &[&str]) -> Result<Self> {
        Vector::with_allocator(o, MetricType::Gauge, label_names, DefaultAllocator::default())
    }
}
