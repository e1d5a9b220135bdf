use crate::error::{InterceptError, Result};
use crate::exception::{Failure, SelfDescribing};
use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use std::fmt;

/// A failure that aborts the request with a client-facing reason.
///
/// # Example
/// ```
/// use error_interceptor::exception::Abort;
/// use axum::http::StatusCode;
///
/// let abort = Abort::new(StatusCode::UNPROCESSABLE_ENTITY)
///     .with_reason("bad input")
///     .with_header("x-detail", "foo");
/// assert_eq!(abort.to_string(), "bad input");
/// ```
#[derive(Debug, Clone)]
pub struct Abort {
    status: StatusCode,
    reason: String,
    headers: Vec<(HeaderName, HeaderValue)>,
}

impl Abort {
    /// Abort with `status`; the reason defaults to its canonical phrase.
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
            headers: Vec::new(),
        }
    }

    pub fn bad_request(reason: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST).with_reason(reason)
    }

    pub fn unauthorized() -> Self {
        Self::new(StatusCode::UNAUTHORIZED)
    }

    pub fn forbidden() -> Self {
        Self::new(StatusCode::FORBIDDEN)
    }

    pub fn not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND)
    }

    pub fn unprocessable(reason: impl Into<String>) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY).with_reason(reason)
    }

    pub fn internal() -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR)
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = reason.into();
        self
    }

    /// Attach a header known to be valid at compile time.
    ///
    /// # Panics
    /// Panics if `name` or `value` is not a valid header component. Use
    /// [`Abort::try_header`] for runtime data.
    pub fn with_header(self, name: &'static str, value: &'static str) -> Self {
        self.with_typed_header(
            HeaderName::from_static(name),
            HeaderValue::from_static(value),
        )
    }

    /// Attach a header built from runtime data
    pub fn try_header(self, name: &str, value: &str) -> Result<Self> {
        let header_name =
            HeaderName::try_from(name).map_err(|_| InterceptError::InvalidHeaderName {
                name: name.to_string(),
            })?;
        let header_value =
            HeaderValue::try_from(value).map_err(|_| InterceptError::InvalidHeaderValue {
                name: name.to_string(),
            })?;
        Ok(self.with_typed_header(header_name, header_value))
    }

    pub fn with_typed_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.push((name, value));
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }
}

impl fmt::Display for Abort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.reason)
    }
}

impl std::error::Error for Abort {}

impl SelfDescribing for Abort {
    fn reason(&self) -> String {
        self.reason.clone()
    }

    fn status(&self) -> StatusCode {
        self.status
    }

    fn headers(&self) -> Vec<(HeaderName, HeaderValue)> {
        self.headers.clone()
    }
}

/// Handlers may return `Result<_, Abort>` directly; the abort is deferred to
/// the interceptor like any other [`Failure`].
impl IntoResponse for Abort {
    fn into_response(self) -> Response {
        Failure::from(self).into_response()
    }
}
