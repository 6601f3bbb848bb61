//! Metric references that may not be wired up yet.
//!
//! Code can declare a `Handle` before deciding whether to build the metric
//! (feature flags, optional subsystems). Every mutator on an unresolved
//! handle is a no-op, so call sites never branch.

use std::hash::BuildHasher;
use std::sync::Arc;

use crate::counter::{Counter, Gauge};
use crate::error::Result;
use crate::sketch::Sketch;
use crate::summary::Summary;
use crate::vector::{Allocator, Vector};
use crate::writer::{Collector, MetricCollector, Writer};

#[derive(Debug)]
pub enum Handle<T> {
    Unresolved,
    Resolved(Arc<T>),
}

impl<T> Default for Handle<T> {
    fn default() -> Self {
        Handle::Unresolved
    }
}

impl<T> Clone for Handle<T> {
    fn clone(&self) -> Self {
        match self {
            Handle::Unresolved => Handle::Unresolved,
            Handle::Resolved(m) => Handle::Resolved(Arc::clone(m)),
        }
    }
}

impl<T> From<Arc<T>> for Handle<T> {
    fn from(m: Arc<T>) -> Self {
        Handle::Resolved(m)
    }
}

impl<T> Handle<T> {
    pub fn new(m: T) -> Self {
        Handle::Resolved(Arc::new(m))
    }

    pub fn get(&self) -> Option<&Arc<T>> {
        match self {
            Handle::Unresolved => None,
            Handle::Resolved(m) => Some(m),
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Handle::Resolved(_))
    }
}

impl Handle<Counter> {
    pub fn inc(&self) {
        if let Handle::Resolved(c) = self {
            c.inc();
        }
    }

    pub fn add(&self, delta: f64) -> Result<()> {
        match self {
            Handle::Unresolved => Ok(()),
            Handle::Resolved(c) => c.add(delta),
        }
    }
}

impl Handle<Gauge> {
    pub fn inc(&self) {
        if let Handle::Resolved(g) = self {
            g.inc();
        }
    }

    pub fn dec(&self) {
        if let Handle::Resolved(g) = self {
            g.dec();
        }
    }

    pub fn add(&self, delta: f64) {
        if let Handle::Resolved(g) = self {
            g.add(delta);
        }
    }

    pub fn sub(&self, delta: f64) {
        if let Handle::Resolved(g) = self {
            g.sub(delta);
        }
    }

    pub fn set(&self, v: f64) {
        if let Handle::Resolved(g) = self {
            g.set(v);
        }
    }
}

impl<S: Sketch> Handle<Summary<S>> {
    pub fn observe(&self, v: f64) {
        if let Handle::Resolved(s) = self {
            s.observe(v);
        }
    }
}

impl<M, A, S> Handle<Vector<M, A, S>>
where
    M: MetricCollector,
    A: Allocator<M>,
    S: BuildHasher,
{
    /// Resolve a child; an unresolved vector yields an unresolved child.
    pub fn with_label_values(&self, values: &[&str]) -> Handle<M> {
        match self {
            Handle::Unresolved => Handle::Unresolved,
            Handle::Resolved(v) => Handle::Resolved(v.with_label_values(values)),
        }
    }
}

impl<T: Collector> Collector for Handle<T> {
    fn collect(&self, w: &mut dyn Writer) -> Result<()> {
        match self {
            Handle::Unresolved => Ok(()),
            Handle::Resolved(m) => m.collect(w),
        }
    }
}
