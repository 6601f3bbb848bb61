//! Ordered set of collectors rendered together into one scrape.
//!
//! A collector that fails mid-render has its partial output cut from the
//! buffer; the collectors after it still render.

use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::Mutex;

use crate::error::{MetricsError, Result};
use crate::writer::{BufWriter, Collector, Writer};

/// One collector that failed during a scrape.
#[derive(Debug)]
pub struct CollectFailure {
    /// Registration position of the failing collector.
    pub index: usize,
    pub error: MetricsError,
}

/// Outcome of `Registry::collect`.
#[derive(Debug, Default)]
pub struct ScrapeReport {
    /// Collectors whose output made it into the buffer.
    pub collected: usize,
    pub failures: Vec<CollectFailure>,
}

impl ScrapeReport {
    pub fn is_ok(&self) -> bool {
        self.failures.is_empty()
    }
}

#[derive(Default)]
pub struct Registry {
    collectors: Mutex<Vec<Arc<dyn Collector>>>,
}

static DEFAULT_REGISTRY: Lazy<Registry> = Lazy::new(Registry::new);

/// Process-wide registry.
pub fn default_registry() -> &'static Registry {
    &DEFAULT_REGISTRY
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a collector.
    ///
    /// A registry registered into itself is rejected. Longer cycles
    /// (`a` inside `b` inside `a`) are not detected and deadlock the first
    /// `collect`; nest registries as a tree.
    pub fn register(&self, c: Arc<dyn Collector>) -> Result<()> {
        if std::ptr::eq(Arc::as_ptr(&c) as *const (), self as *const Self as *const ()) {
            return Err(MetricsError::SelfRegistration);
        }
        self.collectors.lock().push(c);
        Ok(())
    }

    /// Like `register`, for wiring done once at startup.
    ///
    /// # Panics
    /// When `register` fails.
    #[allow(clippy::panic)]
    pub fn must_register(&self, c: Arc<dyn Collector>) {
        if let Err(e) = self.register(c) {
            panic!("register collector: {e}");
        }
    }

    pub fn register_all<I>(&self, cs: I) -> Result<()>
    where
        I: IntoIterator<Item = Arc<dyn Collector>>,
    {
        for c in cs {
            self.register(c)?;
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.collectors.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Reset `w` and render every collector in registration order.
    pub fn collect(&self, w: &mut BufWriter) -> ScrapeReport {
        let collectors = self.collectors.lock();
        let mut report = ScrapeReport::default();

        w.reset();

        for (index, c) in collectors.iter().enumerate() {
            let mark = w.len();

            match c.collect(w) {
                Ok(()) => report.collected += 1,
                Err(error) => {
                    w.truncate(mark);
                    tracing::warn!(index, kind = error.kind().as_str(), %error, "collector failed; output dropped");
                    report.failures.push(CollectFailure { index, error });
                }
            }
        }

        report
    }
}

impl Collector for Registry {
    /// Nested rendering: the first failure aborts and propagates.
    fn collect(&self, w: &mut dyn Writer) -> Result<()> {
        let collectors = self.collectors.lock();
        for c in collectors.iter() {
            c.collect(w)?;
        }
        Ok(())
    }
}
