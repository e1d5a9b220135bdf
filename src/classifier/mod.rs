//! Pluggable failure classifiers.
//!
//! A [`Classifier`] inspects a [`Failure`] (and the request it interrupted)
//! and may claim it by returning a [`Classification`]. Classifiers are
//! evaluated by a [`ClassifierRegistry`] strictly in registration order, so
//! specific classifiers registered first win over general ones.

use crate::exception::Failure;
use crate::interceptor::RequestContext;
use axum::http::{HeaderName, HeaderValue, StatusCode};
use std::error::Error;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

#[cfg(feature = "sea-orm-db")]
pub mod database;

/// The outcome of a successful classification.
///
/// Immutable once built. A missing status is resolved to `400 Bad Request`
/// by the interceptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    message: String,
    status: Option<StatusCode>,
    headers: Vec<(HeaderName, HeaderValue)>,
}

impl Classification {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: None,
            headers: Vec::new(),
        }
    }

    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.push((name, value));
        self
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn status(&self) -> Option<StatusCode> {
        self.status
    }

    pub fn headers(&self) -> &[(HeaderName, HeaderValue)] {
        &self.headers
    }

    pub(crate) fn into_parts(self) -> (String, Option<StatusCode>, Vec<(HeaderName, HeaderValue)>) {
        (self.message, self.status, self.headers)
    }
}

/// Converts recognized failures into a [`Classification`].
///
/// Implementations must not mutate shared state. A classifier that panics
/// is treated as not matching.
pub trait Classifier: Send + Sync + 'static {
    fn convert(&self, failure: &Failure, context: &RequestContext) -> Option<Classification>;
}

impl<F> Classifier for F
where
    F: Fn(&Failure, &RequestContext) -> Option<Classification> + Send + Sync + 'static,
{
    fn convert(&self, failure: &Failure, context: &RequestContext) -> Option<Classification> {
        self(failure, context)
    }
}

/// Build a classifier that matches errors of type `E` anywhere in the
/// failure's source chain.
///
/// # Example
/// ```
/// use error_interceptor::classifier::{classify_type, Classification};
/// use axum::http::StatusCode;
///
/// let classifier = classify_type(|_: &std::num::ParseIntError, _| {
///     Some(Classification::new("not a number").with_status(StatusCode::BAD_REQUEST))
/// });
/// ```
pub fn classify_type<E, F>(convert: F) -> impl Classifier
where
    E: Error + 'static,
    F: Fn(&E, &RequestContext) -> Option<Classification> + Send + Sync + 'static,
{
    move |failure: &Failure, context: &RequestContext| {
        failure.downcast_ref::<E>().and_then(|error| convert(error, context))
    }
}

/// Ordered, first-match-wins collection of classifiers.
#[derive(Clone, Default)]
pub struct ClassifierRegistry {
    classifiers: Vec<Arc<dyn Classifier>>,
}

impl ClassifierRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a classifier; it is evaluated after every classifier registered before it.
    pub fn register<C: Classifier>(&mut self, classifier: C) -> &mut Self {
        self.classifiers.push(Arc::new(classifier));
        self
    }

    /// Builder-style [`register`](Self::register)
    pub fn with<C: Classifier>(mut self, classifier: C) -> Self {
        self.register(classifier);
        self
    }

    pub fn len(&self) -> usize {
        self.classifiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classifiers.is_empty()
    }

    /// Return the first classification produced, in registration order.
    pub fn classify(&self, failure: &Failure, context: &RequestContext) -> Option<Classification> {
        self.classifiers.iter().enumerate().find_map(|(index, classifier)| {
            match catch_unwind(AssertUnwindSafe(|| classifier.convert(failure, context))) {
                Ok(result) => result,
                Err(_) => {
                    tracing::warn!(index, "classifier panicked, treating as no match");
                    None
                }
            }
        })
    }
}
