use backtrace::Backtrace;
use serde::{de, ser};
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::result::Result;

use crate::common::{atomic, Atomic};

/// Error kinds for quickdoc operations.
///
/// Each kind describes one category of failure so callers can branch on
/// [QuickDocError::kind] instead of parsing messages.
///
/// # Examples
///
/// ```rust,ignore
/// use quickdoc::errors::{QuickDocError, ErrorKind, QuickDocResult};
///
/// fn example() -> QuickDocResult<()> {
///     Err(QuickDocError::new("Key cannot be empty", ErrorKind::InvalidKey))
/// }
/// ```
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum ErrorKind {
    // Key Errors - raised before any backend call
    /// The key is empty or contains an empty segment
    InvalidKey,

    // Connection Errors - raised by the readiness gate
    /// The connection is not in the connected state
    NotReady,

    // Arithmetic Errors - raised by add/subtract
    /// The stored value or the operand is not numeric, or the result overflowed
    TypeMismatch,

    // Backend Errors - anything surfaced by the document backend
    /// Error from the document backend (transport, validation, serialization)
    BackendError,

    // Operation Errors
    /// The operation is not valid in the current context
    InvalidOperation,

    // Data Encoding Errors
    /// Error mapping a value to or from its encoded form
    ObjectMappingError,
    /// Error encoding or decoding data
    EncodingError,

    // IO Errors
    /// Generic IO error
    IOError,

    // Event Errors
    /// Error in event processing
    EventError,

    // Generic/Internal Errors - used as fallback
    /// Internal error (usually indicates a bug)
    InternalError,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::InvalidKey => write!(f, "Invalid key"),
            ErrorKind::NotReady => write!(f, "Not ready"),
            ErrorKind::TypeMismatch => write!(f, "Type mismatch"),
            ErrorKind::BackendError => write!(f, "Backend error"),
            ErrorKind::InvalidOperation => write!(f, "Invalid operation"),
            ErrorKind::ObjectMappingError => write!(f, "Object mapping error"),
            ErrorKind::EncodingError => write!(f, "Encoding error"),
            ErrorKind::IOError => write!(f, "IO error"),
            ErrorKind::EventError => write!(f, "Event error"),
            ErrorKind::InternalError => write!(f, "Internal error"),
        }
    }
}

/// Custom quickdoc error type.
///
/// `QuickDocError` carries a message, an [ErrorKind], an optional cause and the
/// backtrace captured at construction time.
///
/// # Examples
///
/// ```rust,ignore
/// use quickdoc::errors::{QuickDocError, ErrorKind};
///
/// // Create a simple error
/// let err = QuickDocError::new("Connection is not ready", ErrorKind::NotReady);
///
/// // Create an error with a cause
/// let cause = QuickDocError::new("socket closed", ErrorKind::IOError);
/// let err = QuickDocError::new_with_cause("Upsert failed", ErrorKind::BackendError, cause);
/// ```
#[derive(Clone)]
pub struct QuickDocError {
    message: String,
    error_kind: ErrorKind,
    cause: Option<Box<QuickDocError>>,
    backtrace: Atomic<Backtrace>,
}

impl QuickDocError {
    /// Creates a new `QuickDocError` with the specified message and error kind.
    pub fn new(message: &str, error_kind: ErrorKind) -> Self {
        QuickDocError {
            message: message.to_string(),
            error_kind,
            cause: None,
            backtrace: atomic(Backtrace::new()),
        }
    }

    /// Creates a new `QuickDocError` wrapping an underlying cause.
    pub fn new_with_cause(message: &str, error_type: ErrorKind, cause: QuickDocError) -> Self {
        QuickDocError {
            message: message.to_string(),
            error_kind: error_type,
            cause: Some(Box::new(cause)),
            backtrace: atomic(Backtrace::new()),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.error_kind
    }

    pub fn cause(&self) -> Option<&QuickDocError> {
        self.cause.as_deref()
    }
}

impl Display for QuickDocError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Debug for QuickDocError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        // print error message with stack trace followed by cause
        match &self.cause {
            Some(cause) => write!(f, "{}\nCaused by: {:?}", self.message, cause),
            None => write!(f, "{}\n{:?}", self.message, self.backtrace.read()),
        }
    }
}

impl Error for QuickDocError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &self.cause {
            Some(cause) => Some(cause.as_ref()),
            None => None,
        }
    }
}

/// A result type alias for quickdoc operations.
pub type QuickDocResult<T> = Result<T, QuickDocError>;

impl de::Error for QuickDocError {
    fn custom<T: Display>(msg: T) -> Self {
        QuickDocError::new(&msg.to_string(), ErrorKind::ObjectMappingError)
    }
}

impl ser::Error for QuickDocError {
    fn custom<T: Display>(msg: T) -> Self {
        QuickDocError::new(&msg.to_string(), ErrorKind::ObjectMappingError)
    }
}

impl From<std::io::Error> for QuickDocError {
    fn from(err: std::io::Error) -> Self {
        QuickDocError::new(&format!("IO error: {}", err), ErrorKind::IOError)
    }
}

impl From<std::string::FromUtf8Error> for QuickDocError {
    fn from(err: std::string::FromUtf8Error) -> Self {
        QuickDocError::new(
            &format!("UTF-8 encoding error: {}", err),
            ErrorKind::EncodingError,
        )
    }
}

impl From<std::fmt::Error> for QuickDocError {
    fn from(err: std::fmt::Error) -> Self {
        QuickDocError::new(
            &format!("Formatting error: {}", err),
            ErrorKind::InternalError,
        )
    }
}

impl From<String> for QuickDocError {
    fn from(msg: String) -> Self {
        QuickDocError::new(&msg, ErrorKind::InternalError)
    }
}

impl From<&str> for QuickDocError {
    fn from(msg: &str) -> Self {
        QuickDocError::new(msg, ErrorKind::InternalError)
    }
}
