//! Error type shared by all lakebucket crates.
use std::backtrace::{Backtrace, BacktraceStatus};
use std::error::Error;
use std::fmt;

pub type Result<T, E = BucketError> = std::result::Result<T, E>;

/// Return early with a "not implemented" error.
#[macro_export]
macro_rules! not_implemented {
    ($($arg:tt)+) => {{
        let msg = format!($($arg)+);
        return Err($crate::BucketError::new(format!("Not yet implemented: {msg}")));
    }};
}

#[derive(Debug)]
pub struct BucketError {
    inner: Box<BucketErrorInner>,
}

#[derive(Debug)]
struct BucketErrorInner {
    /// Message for the error.
    msg: String,
    /// Source of the error, if any.
    source: Option<Box<dyn Error + Send + Sync>>,
    /// Captured backtrace. Only populated when backtraces are enabled in the
    /// environment.
    backtrace: Backtrace,
}

impl BucketError {
    pub fn new(msg: impl Into<String>) -> Self {
        BucketError {
            inner: Box::new(BucketErrorInner {
                msg: msg.into(),
                source: None,
                backtrace: Backtrace::capture(),
            }),
        }
    }

    pub fn with_source(msg: impl Into<String>, source: Box<dyn Error + Send + Sync>) -> Self {
        BucketError {
            inner: Box::new(BucketErrorInner {
                msg: msg.into(),
                source: Some(source),
                backtrace: Backtrace::capture(),
            }),
        }
    }

    pub fn get_msg(&self) -> &str {
        &self.inner.msg
    }

    pub fn get_backtrace(&self) -> Option<&Backtrace> {
        match self.inner.backtrace.status() {
            BacktraceStatus::Captured => Some(&self.inner.backtrace),
            _ => None,
        }
    }
}

impl From<fmt::Error> for BucketError {
    fn from(value: fmt::Error) -> Self {
        Self::with_source("Format error", Box::new(value))
    }
}

impl From<std::io::Error> for BucketError {
    fn from(value: std::io::Error) -> Self {
        Self::with_source("IO error", Box::new(value))
    }
}

impl From<std::num::ParseIntError> for BucketError {
    fn from(value: std::num::ParseIntError) -> Self {
        Self::with_source("Failed to parse integer", Box::new(value))
    }
}

impl fmt::Display for BucketError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.inner.msg)?;
        if let Some(source) = &self.inner.source {
            write!(f, "\nError source: {source}")?;
        }
        if let Some(backtrace) = self.get_backtrace() {
            write!(f, "\nBacktrace: {backtrace}")?;
        }
        Ok(())
    }
}

impl Error for BucketError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.inner.source.as_ref().map(|e| e.as_ref() as _)
    }
}

/// Attach context to errors from other libraries.
pub trait ResultExt<T, E> {
    /// Wrap the error with a static message.
    fn context(self, msg: &'static str) -> Result<T, BucketError>;

    /// Wrap the error with a lazily built message.
    fn context_fn<F: Fn() -> String>(self, f: F) -> Result<T, BucketError>;
}

impl<T, E: Error + Send + Sync + 'static> ResultExt<T, E> for std::result::Result<T, E> {
    fn context(self, msg: &'static str) -> Result<T, BucketError> {
        self.map_err(|e| BucketError::with_source(msg, Box::new(e)))
    }

    fn context_fn<F: Fn() -> String>(self, f: F) -> Result<T, BucketError> {
        self.map_err(|e| BucketError::with_source(f(), Box::new(e)))
    }
}

pub trait OptionExt<T> {
    /// Return an error if the option is None.
    fn required(self, field: &'static str) -> Result<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn required(self, field: &'static str) -> Result<T> {
        match self {
            Some(v) => Ok(v),
            None => Err(BucketError::new(format!(
                "Missing required field '{field}'"
            ))),
        }
    }
}
