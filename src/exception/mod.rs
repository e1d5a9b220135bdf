//! Failure values and the capability shapes the interceptor recognizes.
//!
//! A [`Failure`] wraps anything that can interrupt request processing: an
//! error value, a boxed error, or the payload of a caught panic. On top of
//! that opaque value two capabilities can be probed:
//!
//! - [`SelfDescribing`]: carries a user-facing reason, a status and extra
//!   headers ([`Abort`] is the built-in implementation).
//! - [`DiagnosticCapable`]: carries detailed diagnostic text that is only
//!   ever shown outside production ([`Debuggable`] is the built-in
//!   implementation).

use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use std::any::Any;
use std::error::Error;
use std::fmt;
use std::sync::Arc;

mod debuggable;
pub mod http;

pub use debuggable::Debuggable;
pub use http::Abort;

/// A type-erased, thread-safe error
pub type BoxError = Box<dyn Error + Send + Sync>;

type DynError = dyn Error + Send + Sync + 'static;
type SelfDescribingProbe = for<'a> fn(&'a DynError) -> Option<&'a dyn SelfDescribing>;
type DiagnosticProbe = for<'a> fn(&'a DynError) -> Option<&'a dyn DiagnosticCapable>;

/// A failure that describes itself to the client.
///
/// The reason is sent verbatim in the response body, so it must not carry
/// internal detail.
///
/// Converting such a type with `?` or `Failure::from` erases the capability:
/// the failure is then treated as opaque and its `Display` text becomes the
/// message, even in production. Return it through
/// [`Failure::self_describing`] instead. [`Abort`] is the exception; it is
/// recognized after plain conversion.
///
/// ```
/// use error_interceptor::prelude::*;
///
/// #[derive(Debug, thiserror::Error)]
/// #[error("quota exceeded for tenant 42")]
/// struct QuotaExceeded;
///
/// impl SelfDescribing for QuotaExceeded {
///     fn reason(&self) -> String {
///         "Quota exceeded".to_string()
///     }
///
///     fn status(&self) -> StatusCode {
///         StatusCode::TOO_MANY_REQUESTS
///     }
/// }
///
/// fn charge() -> Result<(), Failure> {
///     Err(Failure::self_describing(QuotaExceeded))
/// }
///
/// let failure = charge().unwrap_err();
/// assert_eq!(failure.as_self_describing().unwrap().reason(), "Quota exceeded");
/// assert!(Failure::from(QuotaExceeded).as_self_describing().is_none());
/// ```
pub trait SelfDescribing: Error + Send + Sync + 'static {
    /// User-facing reason
    fn reason(&self) -> String;

    /// HTTP status for the response
    fn status(&self) -> StatusCode;

    /// Extra headers merged into the response
    fn headers(&self) -> Vec<(HeaderName, HeaderValue)> {
        Vec::new()
    }
}

/// A failure that can explain itself in detail to a developer.
pub trait DiagnosticCapable: Error + Send + Sync + 'static {
    fn diagnostic(&self) -> String;
}

#[derive(Clone, Copy)]
enum Shape {
    Opaque,
    SelfDescribing(SelfDescribingProbe),
    Diagnostic(DiagnosticProbe),
}

enum Repr {
    Error { error: BoxError, shape: Shape },
    Panic { message: Option<String> },
}

/// Anything that interrupted request processing.
///
/// Any `std::error::Error + Send + Sync + 'static` converts into a `Failure`
/// with `?`. Types implementing one of the capability traits should be
/// wrapped with [`Failure::self_describing`] or [`Failure::diagnostic`] so
/// the capability stays visible after type erasure.
pub struct Failure {
    repr: Repr,
}

impl Failure {
    /// Wrap an already boxed error
    pub fn boxed(error: BoxError) -> Self {
        Self {
            repr: Repr::Error {
                error,
                shape: Shape::Opaque,
            },
        }
    }

    /// Wrap a failure that carries its own reason, status and headers
    pub fn self_describing<E: SelfDescribing>(error: E) -> Self {
        fn probe<E: SelfDescribing>(error: &DynError) -> Option<&dyn SelfDescribing> {
            error.downcast_ref::<E>().map(|e| e as &dyn SelfDescribing)
        }

        Self {
            repr: Repr::Error {
                error: Box::new(error),
                shape: Shape::SelfDescribing(probe::<E>),
            },
        }
    }

    /// Wrap a failure that carries detailed diagnostic text
    pub fn diagnostic<E: DiagnosticCapable>(error: E) -> Self {
        fn probe<E: DiagnosticCapable>(error: &DynError) -> Option<&dyn DiagnosticCapable> {
            error.downcast_ref::<E>().map(|e| e as &dyn DiagnosticCapable)
        }

        Self {
            repr: Repr::Error {
                error: Box::new(error),
                shape: Shape::Diagnostic(probe::<E>),
            },
        }
    }

    /// Build a failure from the payload of a caught panic.
    ///
    /// The panic message is kept when the payload is a string.
    pub fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let message = match payload.downcast::<String>() {
            Ok(message) => Some(*message),
            Err(payload) => payload.downcast_ref::<&'static str>().map(|s| s.to_string()),
        };
        Self {
            repr: Repr::Panic { message },
        }
    }

    /// The underlying error, if this failure was not a panic
    pub fn error(&self) -> Option<&DynError> {
        match &self.repr {
            Repr::Error { error, .. } => Some(error.as_ref()),
            Repr::Panic { .. } => None,
        }
    }

    pub fn is_panic(&self) -> bool {
        matches!(self.repr, Repr::Panic { .. })
    }

    /// Iterate over the error and its `source()` chain, outermost first
    pub fn chain(&self) -> impl Iterator<Item = &(dyn Error + 'static)> {
        let first = self.error().map(|e| e as &(dyn Error + 'static));
        std::iter::successors(first, |&e| e.source())
    }

    /// Find the first error of type `T` in the source chain
    pub fn downcast_ref<T: Error + 'static>(&self) -> Option<&T> {
        self.chain().find_map(|e| e.downcast_ref::<T>())
    }

    pub fn is<T: Error + 'static>(&self) -> bool {
        self.downcast_ref::<T>().is_some()
    }

    /// Probe for the self-describing ("abort") shape
    pub fn as_self_describing(&self) -> Option<&dyn SelfDescribing> {
        if let Repr::Error {
            error,
            shape: Shape::SelfDescribing(probe),
        } = &self.repr
        {
            if let Some(found) = probe(error.as_ref()) {
                return Some(found);
            }
        }
        self.downcast_ref::<Abort>()
            .map(|abort| abort as &dyn SelfDescribing)
    }

    /// Probe for the diagnostic-capable shape
    pub fn as_diagnostic(&self) -> Option<&dyn DiagnosticCapable> {
        if let Repr::Error {
            error,
            shape: Shape::Diagnostic(probe),
        } = &self.repr
        {
            if let Some(found) = probe(error.as_ref()) {
                return Some(found);
            }
        }
        self.downcast_ref::<Debuggable>()
            .map(|debuggable| debuggable as &dyn DiagnosticCapable)
    }

    /// Generic textual description, if one is obtainable.
    ///
    /// Empty descriptions count as unobtainable.
    pub fn description(&self) -> Option<String> {
        let description = match &self.repr {
            Repr::Error { error, .. } => Some(error.to_string()),
            Repr::Panic { message } => message.clone(),
        };
        description.filter(|d| !d.trim().is_empty())
    }
}

impl<E> From<E> for Failure
where
    E: Error + Send + Sync + 'static,
{
    fn from(error: E) -> Self {
        Self::boxed(Box::new(error))
    }
}

impl fmt::Debug for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.repr {
            Repr::Error { error, .. } => f.debug_tuple("Failure").field(error).finish(),
            Repr::Panic { message } => f.debug_struct("Panic").field("message", message).finish(),
        }
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.repr {
            Repr::Error { error, .. } => write!(f, "{}", error),
            Repr::Panic { message: Some(message) } => write!(f, "panicked: {}", message),
            Repr::Panic { message: None } => f.write_str("panicked"),
        }
    }
}

/// Marker carried in response extensions by a handler that returned a [`Failure`].
#[derive(Clone)]
pub(crate) struct DeferredFailure(pub(crate) Arc<Failure>);

/// Handlers may return `Result<_, Failure>`.
///
/// The failure is handed to the surrounding
/// [`ErrorInterceptorService`](crate::interceptor::ErrorInterceptorService),
/// which replaces this placeholder with the uniform error response. Outside
/// the layer the placeholder is a bare `500` with an empty body.
impl IntoResponse for Failure {
    fn into_response(self) -> Response {
        let mut response = StatusCode::INTERNAL_SERVER_ERROR.into_response();
        response
            .extensions_mut()
            .insert(DeferredFailure(Arc::new(self)));
        response
    }
}
