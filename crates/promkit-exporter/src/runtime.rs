//! Process and runtime facts, computed at collection time.

use std::time::{Instant, SystemTime, UNIX_EPOCH};

use promkit_core::{Collector, Label, MetricType, Result, Writer};

pub struct RuntimeCollector {
    started_at: SystemTime,
    started: Instant,
    info: [Label; 1],
}

impl Default for RuntimeCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl RuntimeCollector {
    pub fn new() -> Self {
        Self {
            started_at: SystemTime::now(),
            started: Instant::now(),
            info: [Label::new("version", env!("CARGO_PKG_VERSION"))],
        }
    }
}

impl Collector for RuntimeCollector {
    fn collect(&self, w: &mut dyn Writer) -> Result<()> {
        single(w, "process_info", "Exporter build information.", 1.0, &self.info)?;

        let start = self
            .started_at
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs_f64())
            .unwrap_or(0.0);
        single(
            w,
            "process_start_time_seconds",
            "Start time of the process since unix epoch in seconds.",
            start,
            &[],
        )?;
        single(
            w,
            "process_uptime_seconds",
            "Seconds since the process started.",
            self.started.elapsed().as_secs_f64(),
            &[],
        )?;

        let parallelism = std::thread::available_parallelism()
            .map(|n| n.get() as f64)
            .unwrap_or(1.0);
        single(
            w,
            "process_available_parallelism",
            "Parallelism reported by the operating system.",
            parallelism,
            &[],
        )?;

        if let Ok(rt) = tokio::runtime::Handle::try_current() {
            single(
                w,
                "tokio_workers",
                "Worker threads of the tokio runtime serving scrapes.",
                rt.metrics().num_workers() as f64,
                &[],
            )?;
        }

        Ok(())
    }
}

fn single(w: &mut dyn Writer, name: &str, help: &str, v: f64, labels: &[Label]) -> Result<()> {
    w.header(name, help, MetricType::Gauge, &[])?;
    w.write(v, "", labels)
}
