//! Exposition contract: `Writer`, `Collector`, and the buffered text writer.
//!
//! Every metric renders itself through a `Writer`: one `header` call, then
//! any number of `write` calls that share that header. `BufWriter` turns
//! those calls into the Prometheus text format, appending straight into one
//! reusable byte buffer.

use std::fmt::Write as _;
use std::io;
use std::sync::Arc;

use bytes::{Bytes, BytesMut};

use crate::desc::{Label, Labels, MetricType};
use crate::error::{MetricsError, Result};

/// Serializer consumed by every collector.
pub trait Writer {
    /// Start a metric family. Resets the current-name state.
    fn header(
        &mut self,
        fq_name: &str,
        help: &str,
        typ: MetricType,
        const_labels: &[Label],
    ) -> Result<()>;

    /// Append one data line under the last header.
    fn write(&mut self, value: f64, suffix: &str, labels: &[Label]) -> Result<()>;
}

/// Anything that can render itself, header included.
pub trait Collector: Send + Sync {
    fn collect(&self, w: &mut dyn Writer) -> Result<()>;
}

/// A vector element: renders its data lines under a header written by the
/// owning vector, with the element's captured label values.
pub trait MetricCollector: Send + Sync {
    fn collect_metric(&self, w: &mut dyn Writer, labels: &[Label]) -> Result<()>;
}

impl<T: Collector + ?Sized> Collector for Arc<T> {
    fn collect(&self, w: &mut dyn Writer) -> Result<()> {
        (**self).collect(w)
    }
}

/// Text-format writer over a reusable buffer.
#[derive(Debug, Default)]
pub struct BufWriter {
    fq_name: String,

    // static labels, then the current header's const labels
    labels: Labels,
    static_len: usize,
    active: usize,

    buf: BytesMut,
}

impl BufWriter {
    /// `static_labels` prefix every line this writer produces.
    pub fn new(static_labels: &[Label]) -> Self {
        Self {
            fq_name: String::new(),
            labels: static_labels.to_vec(),
            static_len: static_labels.len(),
            active: static_labels.len(),
            buf: BytesMut::with_capacity(4096),
        }
    }

    /// Drop buffered output and header state. Capacity is kept.
    pub fn reset(&mut self) {
        self.fq_name.clear();
        self.active = self.static_len;
        self.buf.clear();
    }

    pub fn bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Discard everything past `len` (a mark taken earlier with `len()`).
    pub fn truncate(&mut self, len: usize) {
        self.buf.truncate(len);
    }

    /// Copy the buffered output into an owned `Bytes`.
    pub fn to_bytes(&self) -> Bytes {
        Bytes::copy_from_slice(&self.buf)
    }

    /// Flush the buffered output into `sink`.
    pub fn write_to<W: io::Write + ?Sized>(&self, sink: &mut W) -> Result<usize> {
        sink.write_all(&self.buf)?;
        Ok(self.buf.len())
    }
}

impl Writer for BufWriter {
    fn header(
        &mut self,
        fq_name: &str,
        help: &str,
        typ: MetricType,
        const_labels: &[Label],
    ) -> Result<()> {
        self.fq_name.clear();
        self.fq_name.push_str(fq_name);

        for (i, l) in const_labels.iter().enumerate() {
            let idx = self.static_len + i;
            match self.labels.get_mut(idx) {
                Some(slot) => slot.assign(&l.name, &l.value),
                None => self.labels.push(l.clone()),
            }
        }
        self.active = self.static_len + const_labels.len();

        let b = &mut self.buf;
        b.extend_from_slice(b"# HELP ");
        b.extend_from_slice(fq_name.as_bytes());
        b.extend_from_slice(b" ");
        put_escaped(b, help, false);
        b.extend_from_slice(b"\n# TYPE ");
        b.extend_from_slice(fq_name.as_bytes());
        b.extend_from_slice(b" ");
        b.extend_from_slice(typ.as_str().as_bytes());
        b.extend_from_slice(b"\n");

        Ok(())
    }

    fn write(&mut self, value: f64, suffix: &str, labels: &[Label]) -> Result<()> {
        if self.fq_name.is_empty() {
            return Err(MetricsError::NoHeader);
        }

        let b = &mut self.buf;
        b.extend_from_slice(self.fq_name.as_bytes());

        if !suffix.is_empty() {
            b.extend_from_slice(b"_");
            b.extend_from_slice(suffix.as_bytes());
        }

        let prefix = &self.labels[..self.active];
        if !prefix.is_empty() || !labels.is_empty() {
            b.extend_from_slice(b"{");
            for (i, l) in prefix.iter().chain(labels.iter()).enumerate() {
                put_label(b, l, i != 0);
            }
            b.extend_from_slice(b"}");
        }

        b.extend_from_slice(b" ");
        put_float(b, value);
        b.extend_from_slice(b"\n");

        Ok(())
    }
}

fn put_label(b: &mut BytesMut, l: &Label, comma: bool) {
    if comma {
        b.extend_from_slice(b",");
    }
    b.extend_from_slice(l.name.as_bytes());
    b.extend_from_slice(b"=\"");
    put_escaped(b, &l.value, true);
    b.extend_from_slice(b"\"");
}

/// Escape `\` and newline, plus `"` inside label values.
fn put_escaped(b: &mut BytesMut, s: &str, quote: bool) {
    let mut start = 0;
    for (i, c) in s.bytes().enumerate() {
        let esc: &[u8] = match c {
            b'\\' => b"\\\\",
            b'\n' => b"\\n",
            b'"' if quote => b"\\\"",
            _ => continue,
        };
        b.extend_from_slice(&s.as_bytes()[start..i]);
        b.extend_from_slice(esc);
        start = i + 1;
    }
    b.extend_from_slice(&s.as_bytes()[start..]);
}

/// Compact float: `1`, `0.25`, `1e300`, `NaN`, `+Inf`.
pub(crate) fn put_float(b: &mut BytesMut, v: f64) {
    if v.is_nan() {
        b.extend_from_slice(b"NaN");
    } else if v.is_infinite() {
        b.extend_from_slice(if v > 0.0 { b"+Inf" } else { b"-Inf" });
    } else {
        let a = v.abs();
        if a == 0.0 || (1e-5..1e15).contains(&a) {
            let _ = write!(b, "{v}");
        } else {
            let _ = write!(b, "{v:e}");
        }
    }
}
