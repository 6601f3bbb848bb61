//! Window rotation of summaries, driven by a manual clock.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::sync::Arc;
use std::time::Duration;

use promkit_core::{
    CkmsSketch, ManualClock, MetricType, Opts, Summary, SummaryAllocator, SummaryOpts, SummaryVec,
    Vector,
};

// 15s window in three 5s buckets; quantiles are min and max.
fn opts() -> SummaryOpts {
    SummaryOpts {
        quantiles: vec![0.0, 1.0],
        window_ms: 15_000,
        buckets: 3,
        error: 0.01,
    }
}

fn summary(clock: &Arc<ManualClock>) -> Summary {
    Summary::with_parts(
        &Opts::new("s", "S."),
        &opts(),
        CkmsSketch::new(0.01),
        clock.clone(),
    )
    .unwrap()
}

fn start() -> Arc<ManualClock> {
    // granule-aligned start: 1000s / 5s = granule 200
    Arc::new(ManualClock::new(Duration::from_secs(1_000)))
}

#[test]
fn empty_window_is_nan() {
    let s = summary(&start());
    assert!(s.quantile_values().iter().all(|v| v.is_nan()));
    assert_eq!(s.count(), 0.0);
}

#[test]
fn values_expire_after_the_window() {
    let clock = start();
    let s = summary(&clock);

    s.observe(100.0);
    assert_eq!(s.quantile_values(), [100.0, 100.0]);

    clock.advance(Duration::from_secs(20));
    s.observe(1.0);

    assert_eq!(s.quantile_values(), [1.0, 1.0]);
    assert_eq!(s.sum(), 101.0);
    assert_eq!(s.count(), 2.0);
}

#[test]
fn partial_rotation_keeps_live_buckets() {
    let clock = start();
    let s = summary(&clock);

    s.observe(10.0);
    clock.advance(Duration::from_secs(5));
    s.observe(20.0);
    assert_eq!(s.quantile_values(), [10.0, 20.0]);

    // two more granules: the bucket holding 10 comes around and is cleared
    clock.advance(Duration::from_secs(10));
    s.observe(30.0);
    assert_eq!(s.quantile_values(), [20.0, 30.0]);

    assert_eq!(s.sum(), 60.0);
    assert_eq!(s.count(), 3.0);
}

#[test]
fn same_granule_accumulates() {
    let clock = start();
    let s = summary(&clock);

    for v in [3.0, 1.0, 2.0] {
        s.observe(v);
        clock.advance(Duration::from_millis(1_000));
    }
    assert_eq!(s.quantile_values(), [1.0, 3.0]);
}

#[test]
fn idle_summary_keeps_reporting_stale_window() {
    let clock = start();
    let s = summary(&clock);

    s.observe(5.0);
    clock.advance(Duration::from_secs(3_600));

    // nothing observed for an hour: reset only happens on the next observe
    assert_eq!(s.quantile_values(), [5.0, 5.0]);

    s.observe(7.0);
    assert_eq!(s.quantile_values(), [7.0, 7.0]);
}

#[test]
fn clock_going_backwards_does_not_rewind() {
    let clock = start();
    let s = summary(&clock);

    clock.advance(Duration::from_secs(10));
    s.observe(1.0);
    clock.set(Duration::from_secs(1_005));
    s.observe(2.0);
    assert_eq!(s.quantile_values(), [1.0, 2.0]);
    assert_eq!(s.count(), 2.0);
}

#[test]
fn observation_older_than_window_stays_out_of_quantiles() {
    let clock = start();
    let s = summary(&clock);

    s.observe(5.0);
    clock.set(Duration::from_secs(100));
    s.observe(1_000.0);

    assert_eq!(s.quantile_values(), [5.0, 5.0]);
    assert_eq!(s.count(), 2.0);
    assert_eq!(s.sum(), 1_005.0);

    // the newest granule is still the reference point
    clock.set(Duration::from_secs(1_001));
    s.observe(7.0);
    assert_eq!(s.quantile_values(), [5.0, 7.0]);
}

#[test]
fn nan_is_ignored() {
    let s = summary(&start());
    s.observe(f64::NAN);
    s.observe(4.0);
    assert_eq!(s.count(), 1.0);
    assert_eq!(s.sum(), 4.0);
}

#[test]
fn vector_children_rotate_independently() {
    let clock = start();
    let so = opts();
    let sv: SummaryVec = Vector::with_allocator(
        &Opts::new("sv", "SV."),
        MetricType::Summary,
        &["k"],
        SummaryAllocator::new(&so, CkmsSketch::new(so.error), clock.clone()).unwrap(),
    )
    .unwrap();

    sv.with_label_values(&["a"]).observe(1.0);
    clock.advance(Duration::from_secs(30));
    sv.with_label_values(&["b"]).observe(2.0);

    // "a" was never touched again, so its old window is still visible
    assert_eq!(sv.with_label_values(&["a"]).quantile_values(), [1.0, 1.0]);
    assert_eq!(sv.with_label_values(&["b"]).quantile_values(), [2.0, 2.0]);
}

#[test]
fn approximate_quantiles_on_a_spread() {
    let clock = start();
    let s = Summary::with_parts(
        &Opts::new("spread", "Spread."),
        &SummaryOpts::default(),
        CkmsSketch::new(0.01),
        clock.clone(),
    )
    .unwrap();

    for i in 1..=1000 {
        s.observe(f64::from(i));
    }

    let q = s.quantile_values();
    assert!((880.0..=920.0).contains(&q[0]), "p90 = {}", q[0]);
    assert!((975.0..=1000.0).contains(&q[1]), "p99 = {}", q[1]);
    assert_eq!(q[2], 1000.0);
    assert_eq!(s.sum(), 500_500.0);
}

#[test]
fn invalid_opts_fail_construction() {
    let err = SummaryVec::new(
        &Opts::new("bad", "Bad."),
        &SummaryOpts {
            buckets: 0,
            ..SummaryOpts::default()
        },
        &["k"],
    )
    .err()
    .expect("must fail");
    assert_eq!(err.kind().as_str(), "INVALID_OPTS");
}
