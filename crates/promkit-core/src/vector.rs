//! Labeled metric families.
//!
//! A `Vector` declares its label names once and materializes one child per
//! distinct tuple of label values, on first use. Lookup goes through a hash
//! of the value tuple to a short chain of candidate positions in a flat
//! element list; candidates are always compared value by value, so hash
//! collisions resolve to distinct children. The flat list keeps creation
//! order, which is also collection order.
//!
//! Children are never evicted. Callers bound label cardinality.

use std::hash::{BuildHasher, Hash, Hasher};
use std::marker::PhantomData;
use std::sync::Arc;

use parking_lot::Mutex;
use rustc_hash::{FxBuildHasher, FxHashMap};

use crate::desc::{Desc, Label, Labels, MetricType, Opts};
use crate::error::{MetricsError, Result};
use crate::writer::{Collector, MetricCollector, Writer};

/// Creates a fresh child for a newly seen label-value tuple.
pub trait Allocator<M>: Send + Sync {
    fn allocate(&self) -> M;
}

/// Allocates children through `Default`.
#[derive(Debug)]
pub struct DefaultAllocator<M>(PhantomData<fn() -> M>);

impl<M> Default for DefaultAllocator<M> {
    fn default() -> Self {
        Self(PhantomData)
    }
}

impl<M: Default> Allocator<M> for DefaultAllocator<M> {
    fn allocate(&self) -> M {
        M::default()
    }
}

struct Elem<M> {
    labels: Labels,
    metric: Arc<M>,
}

struct Index<M> {
    list: Vec<Elem<M>>,
    hash: FxHashMap<u64, Vec<usize>>,
}

/// Family of metrics of type `M` keyed by label values.
pub struct Vector<M, A = DefaultAllocator<M>, S = FxBuildHasher> {
    desc: Desc,
    label_names: Vec<String>,
    alloc: A,
    hasher: S,
    index: Mutex<Index<M>>,
}

impl<M, A, S> Vector<M, A, S>
where
    M: MetricCollector,
    A: Allocator<M>,
    S: BuildHasher,
{
    pub fn with_allocator(o: &Opts, typ: MetricType, label_names: &[&str], alloc: A) -> Result<Self>
    where
        S: Default,
    {
        Self::with_hasher(o, typ, label_names, alloc, S::default())
    }

    /// Like `with_allocator`, with an explicit hasher for the value index.
    pub fn with_hasher(
        o: &Opts,
        typ: MetricType,
        label_names: &[&str],
        alloc: A,
        hasher: S,
    ) -> Result<Self> {
        Ok(Self {
            desc: Desc::from_opts(o, typ)?,
            label_names: label_names.iter().map(|n| n.to_string()).collect(),
            alloc,
            hasher,
            index: Mutex::new(Index {
                list: Vec::new(),
                hash: FxHashMap::default(),
            }),
        })
    }

    pub fn desc(&self) -> &Desc {
        &self.desc
    }

    pub fn label_names(&self) -> &[String] {
        &self.label_names
    }

    /// Number of materialized children.
    pub fn len(&self) -> usize {
        self.index.lock().list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Resolve (or create) the child for `values`.
    ///
    /// # Panics
    /// When `values.len()` differs from the number of declared label names.
    /// That is a wiring bug; use `try_with_label_values` to get an error.
    #[allow(clippy::panic)]
    pub fn with_label_values(&self, values: &[&str]) -> Arc<M> {
        match self.try_with_label_values(values) {
            Ok(m) => m,
            Err(e) => panic!("{}: {e}", self.desc.fq_name()),
        }
    }

    pub fn try_with_label_values(&self, values: &[&str]) -> Result<Arc<M>> {
        if values.len() != self.label_names.len() {
            return Err(MetricsError::LabelCardinality {
                expected: self.label_names.len(),
                got: values.len(),
            });
        }

        let h = self.values_hash(values);

        let mut index = self.index.lock();
        let Index { list, hash } = &mut *index;

        let chain = hash.entry(h).or_default();
        for &i in chain.iter() {
            let el = &list[i];
            if values_equal(&el.labels, values) {
                return Ok(Arc::clone(&el.metric));
            }
        }

        let labels = self
            .label_names
            .iter()
            .zip(values)
            .map(|(n, v)| Label::new(n.as_str(), *v))
            .collect();
        let metric = Arc::new(self.alloc.allocate());

        chain.push(list.len());
        list.push(Elem {
            labels,
            metric: Arc::clone(&metric),
        });

        tracing::trace!(metric = %self.desc.fq_name(), children = list.len(), "vector child created");

        Ok(metric)
    }

    fn values_hash(&self, values: &[&str]) -> u64 {
        let mut h = self.hasher.build_hasher();
        for v in values {
            v.hash(&mut h);
        }
        h.finish()
    }
}

fn values_equal(labels: &[Label], values: &[&str]) -> bool {
    labels.len() == values.len() && labels.iter().zip(values).all(|(l, v)| l.value == *v)
}

impl<M, A, S> Collector for Vector<M, A, S>
where
    M: MetricCollector,
    A: Allocator<M>,
    S: BuildHasher + Send + Sync,
{
    fn collect(&self, w: &mut dyn Writer) -> Result<()> {
        self.desc.write_header(w)?;

        let index = self.index.lock();
        for el in &index.list {
            el.metric.collect_metric(w, &el.labels)?;
        }

        Ok(())
    }
}
