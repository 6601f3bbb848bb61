#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::sync::Arc;

use promkit_core::{Collector, Counter, MetricsError, Opts, Registry, Writer};
use promkit_exporter::{app_state::AppState, config, router};
use tokio::io::{AsyncReadExt, AsyncWriteExt};

struct Broken;

impl Collector for Broken {
    fn collect(&self, _w: &mut dyn Writer) -> promkit_core::Result<()> {
        Err(MetricsError::Collect("backend unreachable".into()))
    }
}

fn state(yaml: &str) -> (AppState, Arc<Registry>) {
    let cfg = config::load_from_str(yaml).expect("config");
    let registry = Arc::new(Registry::new());
    let state = AppState::new(cfg, Arc::clone(&registry)).expect("state");
    (state, registry)
}

fn text(b: &[u8]) -> &str {
    std::str::from_utf8(b).expect("utf8")
}

#[test]
fn const_labels_stamp_every_line() {
    let (state, registry) = state(
        r#"
version: 1
const_labels:
  - { name: "service", value: "api" }
runtime:
  enabled: false
"#,
    );

    let c = Arc::new(Counter::new(&Opts::new("requests_total", "Requests.").namespace("app")).unwrap());
    c.inc();
    registry.register(c).unwrap();

    let body = state.scrape().render();
    let body = text(&body);

    assert!(body.contains("# TYPE app_requests_total counter\n"), "{body}");
    assert!(body.contains("app_requests_total{service=\"api\"} 1\n"), "{body}");
    for line in body.lines().filter(|l| !l.starts_with('#')) {
        assert!(line.contains("service=\"api\""), "{line}");
    }
}

#[test]
fn self_metrics_count_previous_scrapes() {
    let (state, _registry) = state("version: 1\nruntime: { enabled: false }\n");

    let first = state.scrape().render();
    assert!(text(&first).contains("promkit_scrapes_total 0\n"));
    assert!(text(&first).contains("promkit_scrape_duration_seconds_count 0\n"));

    let second = state.scrape().render();
    assert!(text(&second).contains("promkit_scrapes_total 1\n"));
    assert!(text(&second).contains("promkit_scrape_duration_seconds_count 1\n"));
}

#[test]
fn failing_collector_is_counted_and_skipped() {
    let (state, registry) = state("version: 1\nruntime: { enabled: false }\n");

    // index 3: after the three self-metrics
    registry.register(Arc::new(Broken)).unwrap();
    let tail = Arc::new(Counter::new(&Opts::new("tail_total", "After the broken one.")).unwrap());
    registry.register(tail).unwrap();

    let first = state.scrape().render();
    assert!(text(&first).contains("tail_total 0\n"));

    let second = state.scrape().render();
    assert!(
        text(&second).contains("promkit_scrape_errors_total{collector=\"3\"} 1\n"),
        "{}",
        text(&second)
    );
}

#[test]
fn runtime_collector_without_tokio() {
    let (state, _registry) = state("version: 1\n");

    let body = state.scrape().render();
    let body = text(&body);
    assert!(body.contains(&format!("process_info{{version=\"{}\"}} 1\n", env!("CARGO_PKG_VERSION"))));
    assert!(body.contains("# TYPE process_start_time_seconds gauge\n"));
    assert!(body.contains("process_available_parallelism "));
    assert!(!body.contains("tokio_workers"));
}

#[tokio::test]
async fn runtime_collector_inside_tokio() {
    let (state, _registry) = state("version: 1\n");

    let body = state.scrape().render();
    assert!(text(&body).contains("tokio_workers 1\n"), "{}", text(&body));
}

async fn get(addr: std::net::SocketAddr, path: &str) -> String {
    let mut s = tokio::net::TcpStream::connect(addr).await.expect("connect");
    let req = format!("GET {path} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n");
    s.write_all(req.as_bytes()).await.expect("write");

    let mut out = Vec::new();
    s.read_to_end(&mut out).await.expect("read");
    String::from_utf8(out).expect("utf8")
}

#[tokio::test]
async fn serves_metrics_over_http() {
    let (state, registry) = state(
        r#"
version: 1
exporter:
  metrics_path: "/internal/metrics"
runtime:
  enabled: false
"#,
    );
    let c = Arc::new(Counter::new(&Opts::new("hits_total", "Hits.")).unwrap());
    c.add(2.0).unwrap();
    registry.register(c).unwrap();

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router::build_router(state)).await.unwrap();
    });

    let health = get(addr, "/healthz").await;
    assert!(health.starts_with("HTTP/1.1 200"), "{health}");
    assert!(health.ends_with("ok"), "{health}");

    let metrics = get(addr, "/internal/metrics").await;
    assert!(metrics.starts_with("HTTP/1.1 200"), "{metrics}");
    assert!(
        metrics.to_ascii_lowercase().contains("content-type: text/plain; version=0.0.4; charset=utf-8"),
        "{metrics}"
    );
    assert!(metrics.contains("hits_total 2\n"), "{metrics}");

    let missing = get(addr, "/metrics").await;
    assert!(missing.starts_with("HTTP/1.1 404"), "{missing}");
}
