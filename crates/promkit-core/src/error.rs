//! Shared error type across promkit crates.

use thiserror::Error;

/// Stable error categories (used by logs and tests).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Metric identity could not be built.
    InvalidName,
    /// Construction options out of range.
    InvalidOpts,
    /// Operation rejected by the metric's contract.
    InvalidOperation,
    /// Writer used out of order.
    WriterState,
    /// Collection failed.
    Collect,
    /// Sink I/O failed.
    Io,
    /// Configuration rejected.
    BadConfig,
    /// Unsupported config version.
    UnsupportedVersion,
}

impl ErrorKind {
    /// String representation used in logs.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::InvalidName => "INVALID_NAME",
            ErrorKind::InvalidOpts => "INVALID_OPTS",
            ErrorKind::InvalidOperation => "INVALID_OPERATION",
            ErrorKind::WriterState => "WRITER_STATE",
            ErrorKind::Collect => "COLLECT",
            ErrorKind::Io => "IO",
            ErrorKind::BadConfig => "BAD_CONFIG",
            ErrorKind::UnsupportedVersion => "UNSUPPORTED_VERSION",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, MetricsError>;

/// Unified error type used by core and exporter.
#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("metric name is empty")]
    EmptyName,
    #[error("invalid options: {0}")]
    InvalidOpts(String),
    #[error("counter cannot decrease (delta {0})")]
    NegativeDelta(f64),
    #[error("label cardinality mismatch: expected {expected} values, got {got}")]
    LabelCardinality { expected: usize, got: usize },
    #[error("a registry cannot be registered into itself")]
    SelfRegistration,
    #[error("data line written before header")]
    NoHeader,
    #[error("metric has no descriptor; collect it through its vector")]
    NoDescriptor,
    #[error("collect failed: {0}")]
    Collect(String),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("bad config: {0}")]
    BadConfig(String),
    #[error("unsupported config version")]
    UnsupportedVersion,
}

impl MetricsError {
    /// Map the error to its stable category.
    pub fn kind(&self) -> ErrorKind {
        match self {
            MetricsError::EmptyName => ErrorKind::InvalidName,
            MetricsError::InvalidOpts(_) => ErrorKind::InvalidOpts,
            MetricsError::NegativeDelta(_)
            | MetricsError::LabelCardinality { .. }
            | MetricsError::SelfRegistration => ErrorKind::InvalidOperation,
            MetricsError::NoHeader | MetricsError::NoDescriptor => ErrorKind::WriterState,
            MetricsError::Collect(_) => ErrorKind::Collect,
            MetricsError::Io(_) => ErrorKind::Io,
            MetricsError::BadConfig(_) => ErrorKind::BadConfig,
            MetricsError::UnsupportedVersion => ErrorKind::UnsupportedVersion,
        }
    }
}
