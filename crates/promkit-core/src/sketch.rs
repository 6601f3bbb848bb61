//! Bounded-memory quantile estimators used by `Summary` buckets.

use quantiles::ckms::CKMS;

/// Approximate distribution with insert, reset, and a joint query over
/// several instances.
pub trait Sketch: Clone + Send + Sync + 'static {
    fn insert(&mut self, v: f64);

    /// Forget everything inserted so far.
    fn reset(&mut self);

    fn is_empty(&self) -> bool;

    /// Estimate each quantile in `qs` over the union of `sketches`, writing
    /// results into `out` (same length as `qs`). An empty union yields `NaN`.
    fn query_multi(sketches: &[Self], qs: &[f64], out: &mut [f64]);
}

/// CKMS sketch with a fixed rank error.
#[derive(Debug, Clone)]
pub struct CkmsSketch {
    error: f64,
    inner: CKMS<f64>,
}

impl CkmsSketch {
    pub fn new(error: f64) -> Self {
        Self {
            error,
            inner: CKMS::new(error),
        }
    }
}

impl Sketch for CkmsSketch {
    fn insert(&mut self, v: f64) {
        self.inner.insert(v);
    }

    fn reset(&mut self) {
        if !self.is_empty() {
            self.inner = CKMS::new(self.error);
        }
    }

    fn is_empty(&self) -> bool {
        self.inner.count() == 0
    }

    fn query_multi(sketches: &[Self], qs: &[f64], out: &mut [f64]) {
        let mut live = sketches.iter().filter(|s| !s.is_empty());

        let Some(first) = live.next() else {
            out.fill(f64::NAN);
            return;
        };

        let mut merged = first.inner.clone();
        for s in live {
            merged += s.inner.clone();
        }

        for (q, o) in qs.iter().zip(out.iter_mut()) {
            *o = merged.query(*q).map_or(f64::NAN, |(_, v)| v);
        }
    }
}
