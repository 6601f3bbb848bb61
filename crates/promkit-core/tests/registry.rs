//! Scrape orchestration and failure isolation.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::sync::Arc;

use promkit_core::{
    default_registry, BufWriter, Collector, Counter, CounterVec, Gauge, MetricType, MetricsError,
    Opts, Registry, Result, Writer,
};

/// Writes a header and one line, then fails.
struct Broken;

impl Collector for Broken {
    fn collect(&self, w: &mut dyn Writer) -> Result<()> {
        w.header("broken", "Half written.", MetricType::Gauge, &[])?;
        w.write(1.0, "", &[])?;
        Err(MetricsError::Collect("sensor offline".into()))
    }
}

fn text(w: &BufWriter) -> String {
    String::from_utf8(w.bytes().to_vec()).unwrap()
}

#[test]
fn failing_collector_is_cut_out() {
    let first = Arc::new(Counter::new(&Opts::new("first_total", "First.")).unwrap());
    let third = Arc::new(Gauge::new(&Opts::new("third", "Third.")).unwrap());
    first.inc();
    third.set(3.0);

    let r = Registry::new();
    r.register(first.clone()).unwrap();
    r.register(Arc::new(Broken)).unwrap();
    r.register(third.clone()).unwrap();

    let mut w = BufWriter::new(&[]);
    let report = r.collect(&mut w);

    assert_eq!(
        text(&w),
        "# HELP first_total First.\n\
         # TYPE first_total counter\n\
         first_total 1\n\
         # HELP third Third.\n\
         # TYPE third gauge\n\
         third 3\n"
    );
    assert!(!text(&w).contains("broken"));

    assert_eq!(report.collected, 2);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].index, 1);
    assert_eq!(report.failures[0].error.kind().as_str(), "COLLECT");
    assert!(!report.is_ok());
}

#[test]
fn collect_resets_between_scrapes() {
    let c = Arc::new(Counter::new(&Opts::new("n_total", "N.")).unwrap());
    let r = Registry::new();
    r.register(c.clone()).unwrap();

    let mut w = BufWriter::new(&[]);
    c.inc();
    assert!(r.collect(&mut w).is_ok());
    assert!(text(&w).ends_with("n_total 1\n"));

    c.inc();
    r.collect(&mut w);
    assert!(text(&w).ends_with("n_total 2\n"));
    assert_eq!(text(&w).matches("# HELP").count(), 1);
}

#[test]
fn registration_order_is_render_order() {
    let r = Registry::new();
    let names = ["zeta", "alpha", "mid"];
    for n in names {
        r.register(Arc::new(Gauge::new(&Opts::new(n, "G.")).unwrap())).unwrap();
    }
    assert_eq!(r.len(), 3);

    let mut w = BufWriter::new(&[]);
    r.collect(&mut w);

    let order: Vec<String> = text(&w)
        .lines()
        .filter(|l| l.starts_with("# TYPE"))
        .map(|l| l.split(' ').nth(2).unwrap().to_string())
        .collect();
    assert_eq!(order, names);
}

#[test]
fn nested_registry_propagates_failure() {
    let inner = Arc::new(Registry::new());
    inner.register(Arc::new(Broken)).unwrap();

    let ok = Arc::new(Gauge::new(&Opts::new("ok", "Ok.")).unwrap());
    let outer = Registry::new();
    outer.register(ok).unwrap();
    outer.register(inner.clone()).unwrap();

    let mut w = BufWriter::new(&[]);
    let report = outer.collect(&mut w);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].index, 1);
    assert_eq!(text(&w), "# HELP ok Ok.\n# TYPE ok gauge\nok 0\n");

    let mut w = BufWriter::new(&[]);
    assert!(Collector::collect(inner.as_ref(), &mut w).is_err());
}

#[test]
fn registry_cannot_contain_itself() {
    let r = Arc::new(Registry::new());
    r.register(Arc::new(Gauge::new(&Opts::new("g", "G.")).unwrap())).unwrap();

    let err = r.register(r.clone()).unwrap_err();
    assert_eq!(err.kind().as_str(), "INVALID_OPERATION");
    assert_eq!(r.len(), 1);

    // still scrapes instead of deadlocking
    let mut w = BufWriter::new(&[]);
    assert!(r.collect(&mut w).is_ok());
    assert_eq!(text(&w), "# HELP g G.\n# TYPE g gauge\ng 0\n");
}

#[test]
fn must_register_appends() {
    let r = Registry::new();
    r.must_register(Arc::new(Counter::new(&Opts::new("m_total", "M.")).unwrap()));
    assert_eq!(r.len(), 1);
}

#[test]
#[should_panic(expected = "cannot be registered into itself")]
fn must_register_panics_on_rejection() {
    let r = Arc::new(Registry::new());
    r.must_register(r.clone());
}

#[test]
fn register_all_and_default_registry() {
    let cv = Arc::new(CounterVec::new(&Opts::new("dr_total", "Default."), &["k"]).unwrap());
    cv.with_label_values(&["v"]).inc();

    let r = default_registry();
    let before = r.len();
    r.register_all([cv.clone() as Arc<dyn Collector>]).unwrap();
    assert_eq!(r.len(), before + 1);

    let mut w = BufWriter::new(&[]);
    r.collect(&mut w);
    assert!(text(&w).contains("dr_total{k=\"v\"} 1\n"));
}
