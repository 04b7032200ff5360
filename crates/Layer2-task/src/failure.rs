//! Failure carrier
//!
//! A work item reports failure with a [`WorkError`]. Every constructor is
//! `#[track_caller]`, so the error remembers where it was raised; that
//! includes `?`, which goes through the blanket `From` impl. Once the worker
//! records the error it becomes a [`WorkFailure`], a cheaply cloneable
//! handle to the same error that every waiter receives.

use serde::{Deserialize, Serialize};
use std::backtrace::Backtrace;
use std::fmt::{self, Debug, Display};
use std::panic::Location;
use std::sync::Arc;

/// Source position where a failure was raised
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Origin {
    pub file: String,
    pub line: u32,
    pub column: u32,
}

impl Origin {
    /// Position of the caller (through any `#[track_caller]` frames)
    #[track_caller]
    pub fn caller() -> Self {
        Self::from_location(Location::caller())
    }

    pub fn from_location(location: &Location<'_>) -> Self {
        Self {
            file: location.file().to_string(),
            line: location.line(),
            column: location.column(),
        }
    }

    /// Placeholder when no position was recorded
    pub fn unknown() -> Self {
        Self {
            file: "<unknown>".to_string(),
            line: 0,
            column: 0,
        }
    }

    pub fn is_known(&self) -> bool {
        self.line != 0
    }
}

impl Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

/// Error returned by a work item
pub struct WorkError {
    error: anyhow::Error,
    origin: Origin,
    panicked: bool,
}

impl WorkError {
    /// Wrap an error value
    #[track_caller]
    pub fn new<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self {
            error: anyhow::Error::new(error),
            origin: Origin::caller(),
            panicked: false,
        }
    }

    /// Error from a plain message
    #[track_caller]
    pub fn msg<M>(message: M) -> Self
    where
        M: Display + Debug + Send + Sync + 'static,
    {
        Self {
            error: anyhow::Error::msg(message),
            origin: Origin::caller(),
            panicked: false,
        }
    }

    /// Adopt an `anyhow::Error`; the origin is this call
    #[track_caller]
    pub fn from_anyhow(error: anyhow::Error) -> Self {
        Self {
            error,
            origin: Origin::caller(),
            panicked: false,
        }
    }

    pub(crate) fn from_panic(message: String, origin: Origin) -> Self {
        Self {
            error: anyhow::Error::msg(message),
            origin,
            panicked: true,
        }
    }

    /// Add a context layer; the origin stays where the error was raised
    pub fn with_context<C>(self, context: C) -> Self
    where
        C: Display + Send + Sync + 'static,
    {
        Self {
            error: self.error.context(context),
            ..self
        }
    }

    pub fn origin(&self) -> &Origin {
        &self.origin
    }

    /// Whether the work item panicked rather than returning an error
    pub fn is_panic(&self) -> bool {
        self.panicked
    }

    /// Backtrace captured with the error (empty unless `RUST_BACKTRACE` is set)
    pub fn backtrace(&self) -> &Backtrace {
        self.error.backtrace()
    }

    /// The original error value, if it has type `E`
    pub fn downcast_ref<E>(&self) -> Option<&E>
    where
        E: Display + Debug + Send + Sync + 'static,
    {
        self.error.downcast_ref::<E>()
    }

    /// The error followed by its sources
    pub fn chain(&self) -> anyhow::Chain<'_> {
        self.error.chain()
    }

    pub fn as_error(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
        self.error.as_ref()
    }
}

impl<E> From<E> for WorkError
where
    E: std::error::Error + Send + Sync + 'static,
{
    #[track_caller]
    fn from(error: E) -> Self {
        Self::new(error)
    }
}

impl Display for WorkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            write!(f, "{:#}", self.error)
        } else {
            write!(f, "{}", self.error)
        }
    }
}

impl Debug for WorkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkError")
            .field("message", &format_args!("{:#}", self.error))
            .field("origin", &format_args!("{}", self.origin))
            .field("panicked", &self.panicked)
            .finish()
    }
}

/// A recorded failure, shared by every waiter of a handle
#[derive(Clone)]
pub struct WorkFailure {
    inner: Arc<WorkError>,
}

impl WorkFailure {
    pub fn error(&self) -> &WorkError {
        &self.inner
    }

    pub fn origin(&self) -> &Origin {
        self.inner.origin()
    }

    pub fn is_panic(&self) -> bool {
        self.inner.is_panic()
    }

    pub fn backtrace(&self) -> &Backtrace {
        self.inner.backtrace()
    }

    pub fn downcast_ref<E>(&self) -> Option<&E>
    where
        E: Display + Debug + Send + Sync + 'static,
    {
        self.inner.downcast_ref::<E>()
    }

    pub fn chain(&self) -> anyhow::Chain<'_> {
        self.inner.chain()
    }

    /// True when both values carry the very same recorded error
    pub fn same_cause(&self, other: &WorkFailure) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl From<WorkError> for WorkFailure {
    fn from(error: WorkError) -> Self {
        Self {
            inner: Arc::new(error),
        }
    }
}

impl Display for WorkFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Display::fmt(&*self.inner, f)
    }
}

impl Debug for WorkFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Debug::fmt(&*self.inner, f)
    }
}

impl std::error::Error for WorkFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.inner.as_error().source()
    }
}
