use crate::exception::{Failure, SelfDescribing};
use axum::{
    extract::{FromRequest, FromRequestParts, Request},
    http::{StatusCode, request::Parts},
    response::IntoResponse,
};
use std::fmt;

/// Extractor wrapper that turns rejections into [`Failure`]s.
///
/// axum answers a failed extraction (a malformed JSON body, a path segment
/// that does not parse) with its own plain-text response. Wrapping the
/// extractor routes the rejection through the interceptor instead, so the
/// client gets the usual `{"error": ...}` body with the rejection's status.
///
/// # Example
/// ```
/// use axum::Json;
/// use error_interceptor::prelude::*;
///
/// #[derive(serde::Deserialize)]
/// struct NewUser {
///     name: String,
/// }
///
/// async fn create(
///     Checked(Path(team)): Checked<Path<u32>>,
///     Checked(Json(user)): Checked<Json<NewUser>>,
/// ) -> String {
///     format!("{} joined team {}", user.name, team)
/// }
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct Checked<T>(pub T);

impl<S, T> FromRequest<S> for Checked<T>
where
    S: Send + Sync,
    T: FromRequest<S>,
    T::Rejection: IntoResponse + fmt::Display,
{
    type Rejection = Failure;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        T::from_request(req, state)
            .await
            .map(Checked)
            .map_err(Rejected::failure)
    }
}

impl<S, T> FromRequestParts<S> for Checked<T>
where
    S: Send + Sync,
    T: FromRequestParts<S>,
    T::Rejection: IntoResponse + fmt::Display,
{
    type Rejection = Failure;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        T::from_request_parts(parts, state)
            .await
            .map(Checked)
            .map_err(Rejected::failure)
    }
}

impl<T> std::ops::Deref for Checked<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// A rejected extraction, with the status and text axum would have sent.
///
/// Classifiers can downcast to this type to reword rejections.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{reason}")]
pub struct Rejected {
    status: StatusCode,
    reason: String,
}

impl Rejected {
    pub fn new(status: StatusCode, reason: impl Into<String>) -> Self {
        Self {
            status,
            reason: reason.into(),
        }
    }

    /// Capture an extractor rejection
    pub fn from_rejection<R: IntoResponse + fmt::Display>(rejection: R) -> Self {
        let reason = rejection.to_string();
        let status = rejection.into_response().status();
        Self::new(status, reason)
    }

    fn failure<R: IntoResponse + fmt::Display>(rejection: R) -> Failure {
        Failure::self_describing(Self::from_rejection(rejection))
    }
}

impl SelfDescribing for Rejected {
    fn reason(&self) -> String {
        self.reason.clone()
    }

    fn status(&self) -> StatusCode {
        self.status
    }
}
