//! Windowed quantile summary.
//!
//! Observations land in one of `buckets` sketches, chosen by
//! `(now / granule) mod buckets` where `granule = window / buckets`. Buckets
//! are recycled lazily: `observe` resets every bucket whose granule has come
//! around again since the previous observation. Nothing runs in the
//! background, so a summary that stops receiving observations keeps
//! reporting its last window until the next `observe`.
//!
//! `sum` and `count` are lifetime totals and are never windowed.

use std::sync::Arc;

use parking_lot::Mutex;
use serde::Deserialize;

use crate::clock::{Clock, SystemClock};
use crate::desc::{Desc, Label, Labels, MetricType, Opts};
use crate::error::{MetricsError, Result};
use crate::sketch::{CkmsSketch, Sketch};
use crate::vector::{Allocator, Vector};
use crate::writer::{Collector, MetricCollector, Writer};

/// Summary configuration. Fixed once the summary is built.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct SummaryOpts {
    /// Target quantiles, rendered in this order.
    pub quantiles: Vec<f64>,
    /// Length of the sliding window.
    pub window_ms: u64,
    /// Number of sketches the window is split into.
    pub buckets: u32,
    /// Rank error of each sketch.
    pub error: f64,
}

impl Default for SummaryOpts {
    fn default() -> Self {
        Self {
            quantiles: vec![0.9, 0.99, 1.0],
            window_ms: 15_000,
            buckets: 3,
            error: 0.01,
        }
    }
}

impl SummaryOpts {
    pub fn validate(&self) -> Result<()> {
        if self.quantiles.is_empty() {
            return Err(MetricsError::InvalidOpts("quantiles must not be empty".into()));
        }
        if let Some(q) = self.quantiles.iter().find(|q| !(0.0..=1.0).contains(*q)) {
            return Err(MetricsError::InvalidOpts(format!(
                "quantile {q} is outside [0, 1]"
            )));
        }
        if self.buckets == 0 {
            return Err(MetricsError::InvalidOpts("buckets must be at least 1".into()));
        }
        if self.window_ms < u64::from(self.buckets) {
            return Err(MetricsError::InvalidOpts(
                "window_ms must be at least one millisecond per bucket".into(),
            ));
        }
        self.granule_nanos()?;
        if !(self.error > 0.0 && self.error < 1.0) {
            return Err(MetricsError::InvalidOpts("error must be within (0, 1)".into()));
        }
        Ok(())
    }

    /// Width of one bucket's time slice. Fails when the window does not fit
    /// in `u64` nanoseconds.
    fn granule_nanos(&self) -> Result<u64> {
        let window = self.window_ms.checked_mul(1_000_000).ok_or_else(|| {
            MetricsError::InvalidOpts(format!("window_ms {} is too large", self.window_ms))
        })?;
        Ok(window / u64::from(self.buckets))
    }
}

/// Validated layout shared by a summary and its vector siblings.
#[derive(Debug)]
struct Shape {
    quantiles: Vec<f64>,
    qtext: Vec<String>,
    granule_nanos: u64,
    buckets: usize,
}

impl Shape {
    fn new(so: &SummaryOpts) -> Result<Self> {
        so.validate()?;

        Ok(Self {
            quantiles: so.quantiles.clone(),
            qtext: so.quantiles.iter().map(|q| q.to_string()).collect(),
            granule_nanos: so.granule_nanos()?,
            buckets: so.buckets as usize,
        })
    }
}

struct State<S> {
    sketches: Vec<S>,
    last: Option<u64>,

    sum: f64,
    count: f64,

    // scratch reused by collection
    qres: Vec<f64>,
    lsbuf: Labels,
}

/// Sliding-window quantiles plus lifetime sum and count.
pub struct Summary<S = CkmsSketch> {
    desc: Option<Desc>,
    shape: Arc<Shape>,
    clock: Arc<dyn Clock>,
    state: Mutex<State<S>>,
}

impl Summary {
    /// CKMS-backed summary on the wall clock.
    pub fn new(o: &Opts, so: &SummaryOpts) -> Result<Self> {
        Self::with_parts(o, so, CkmsSketch::new(so.error), Arc::new(SystemClock))
    }
}

impl<S: Sketch> Summary<S> {
    /// Summary over a custom sketch (cloned once per bucket) and clock.
    pub fn with_parts(o: &Opts, so: &SummaryOpts, proto: S, clock: Arc<dyn Clock>) -> Result<Self> {
        let desc = Desc::from_opts(o, MetricType::Summary)?;
        let shape = Arc::new(Shape::new(so)?);
        Ok(Self::build(Some(desc), shape, &proto, clock))
    }

    fn build(desc: Option<Desc>, shape: Arc<Shape>, proto: &S, clock: Arc<dyn Clock>) -> Self {
        let state = State {
            sketches: vec![proto.clone(); shape.buckets],
            last: None,
            sum: 0.0,
            count: 0.0,
            qres: vec![0.0; shape.quantiles.len()],
            lsbuf: Labels::new(),
        };

        Self {
            desc,
            shape,
            clock,
            state: Mutex::new(state),
        }
    }

    /// Record one value. `NaN` is ignored.
    ///
    /// A timestamp more than a whole window behind the newest granule seen
    /// still counts towards `sum` and `count`, but stays out of the
    /// quantiles: its bucket now holds a newer granule.
    pub fn observe(&self, v: f64) {
        if v.is_nan() {
            return;
        }

        let g = self.clock.now_nanos() / self.shape.granule_nanos;
        let n = self.shape.buckets as u64;

        let mut st = self.state.lock();

        let last = *st.last.get_or_insert(g);
        if g > last {
            // only the newest `n` granules map to distinct buckets
            let from = if g - last > n { g - n + 1 } else { last + 1 };
            for i in from..=g {
                st.sketches[(i % n) as usize].reset();
            }
            st.last = Some(g);
        }

        if last.saturating_sub(g) < n {
            st.sketches[(g % n) as usize].insert(v);
        }
        st.sum += v;
        st.count += 1.0;
    }

    pub fn sum(&self) -> f64 {
        self.state.lock().sum
    }

    pub fn count(&self) -> f64 {
        self.state.lock().count
    }

    /// Current estimates for the configured quantiles, in configured order.
    pub fn quantile_values(&self) -> Vec<f64> {
        let mut st = self.state.lock();
        let State { sketches, qres, .. } = &mut *st;
        S::query_multi(sketches, &self.shape.quantiles, qres);
        qres.clone()
    }
}

impl<S: Sketch> MetricCollector for Summary<S> {
    fn collect_metric(&self, w: &mut dyn Writer, labels: &[Label]) -> Result<()> {
        let mut st = self.state.lock();
        let State {
            sketches,
            sum,
            count,
            qres,
            lsbuf,
            ..
        } = &mut *st;

        S::query_multi(sketches, &self.shape.quantiles, qres);

        let n = labels.len();
        if lsbuf.len() <= n {
            lsbuf.resize_with(n + 1, Label::default);
        }
        for (slot, l) in lsbuf.iter_mut().zip(labels) {
            slot.assign(&l.name, &l.value);
        }

        for (v, text) in qres.iter().zip(&self.shape.qtext) {
            lsbuf[n].assign("quantile", text);
            w.write(*v, "", &lsbuf[..=n])?;
        }

        w.write(*sum, "sum", labels)?;
        w.write(*count, "count", labels)
    }
}

impl<S: Sketch> Collector for Summary<S> {
    fn collect(&self, w: &mut dyn Writer) -> Result<()> {
        let desc = self.desc.as_ref().ok_or(MetricsError::NoDescriptor)?;
        desc.write_header(w)?;
        self.collect_metric(w, &[])
    }
}

/// Builds vector children that share one layout, sketch prototype, and clock.
pub struct SummaryAllocator<S = CkmsSketch> {
    shape: Arc<Shape>,
    proto: S,
    clock: Arc<dyn Clock>,
}

impl<S: Sketch> SummaryAllocator<S> {
    pub fn new(so: &SummaryOpts, proto: S, clock: Arc<dyn Clock>) -> Result<Self> {
        Ok(Self {
            shape: Arc::new(Shape::new(so)?),
            proto,
            clock,
        })
    }
}

impl<S: Sketch> Allocator<Summary<S>> for SummaryAllocator<S> {
    fn allocate(&self) -> Summary<S> {
        Summary::build(None, Arc::clone(&self.shape), &self.proto, Arc::clone(&self.clock))
    }
}

/// Summaries keyed by label values.
pub type SummaryVec<S = CkmsSketch> = Vector<Summary<S>, SummaryAllocator<S>>;

impl SummaryVec {
    pub fn new(o: &Opts, so: &SummaryOpts, label_names: &[&str]) -> Result<Self> {
        let alloc = SummaryAllocator::new(so, CkmsSketch::new(so.error), Arc::new(SystemClock))?;
        Vector::with_allocator(o, MetricType::Summary, label_names, alloc)
    }
}
