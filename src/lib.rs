//! # error-interceptor
//!
//! A request-pipeline error interceptor for axum/tower services.
//!
//! Every failure raised while handling a request (an `Err` from a handler,
//! an error from an inner tower service, or a panic) is classified and
//! turned into a uniform JSON response:
//!
//! ```text
//! HTTP/1.1 404 Not Found
//! content-type: application/json
//!
//! {"error":"not found"}
//! ```
//!
//! ## Features
//!
//! - **Pluggable classifiers**: an ordered, first-match-wins chain of
//!   [`Classifier`](classifier::Classifier)s
//! - **Self-describing failures**: [`Abort`](exception::Abort) and any
//!   [`SelfDescribing`](exception::SelfDescribing) type pick their own
//!   reason, status and headers
//! - **Disclosure policy**: diagnostic detail from
//!   [`DiagnosticCapable`](exception::DiagnosticCapable) failures is only
//!   shown outside [`Environment::Production`](config::Environment)
//! - **Never fails**: secondary failures while building the response are
//!   absorbed too
//! - **Uniform rejections**: [`Checked`](extract::Checked) extractors and
//!   [`ErrorInterceptor::apply`] give malformed requests and unmatched paths
//!   the same JSON body
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use error_interceptor::prelude::*;
//!
//! #[derive(Debug, thiserror::Error)]
//! #[error("user {0} not found")]
//! struct UserNotFound(String);
//!
//! async fn get_user(Path(id): Path<String>) -> Result<String, Failure> {
//!     Err(UserNotFound(id).into())
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let environment = ConfigService::new().environment().unwrap_or_default();
//!
//!     let interceptor = ErrorInterceptor::builder()
//!         .environment(environment)
//!         .classifier(classify_type(|err: &UserNotFound, _| {
//!             Some(Classification::new(err.to_string()).with_status(StatusCode::NOT_FOUND))
//!         }))
//!         .build();
//!
//!     let app: Router = interceptor.apply(
//!         Router::new().route("/users/{id}", axum::routing::get(get_user)),
//!     );
//!
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await.unwrap();
//!     axum::serve(listener, app).await.unwrap();
//! }
//! ```

pub mod classifier;
pub mod common;
pub mod config;
pub mod error;
pub mod exception;
pub mod extract;
pub mod interceptor;

// Re-export core types
pub use classifier::{Classification, Classifier, ClassifierRegistry};
pub use config::{ConfigService, Environment};
pub use error::{InterceptError, Result};
pub use exception::{Abort, Debuggable, Failure};
pub use extract::{Checked, Rejected};
pub use interceptor::{ErrorInterceptor, ErrorInterceptorLayer, RequestContext};

// Re-export commonly used types from dependencies
pub use axum;

/// Prelude module for convenient imports
///
/// ```
/// use error_interceptor::prelude::*;
/// ```
pub mod prelude {
    pub use crate::classifier::{Classification, Classifier, ClassifierRegistry, classify_type};
    pub use crate::common::ErrorResponse;
    pub use crate::config::{ConfigService, Environment};
    pub use crate::error::InterceptError;
    pub use crate::exception::{
        Abort, BoxError, Debuggable, DiagnosticCapable, Failure, SelfDescribing,
    };
    pub use crate::extract::{Checked, Rejected};
    pub use crate::interceptor::{
        ErrorInterceptor, ErrorInterceptorBuilder, ErrorInterceptorLayer, ErrorInterceptorService,
        RequestContext, not_found,
    };
    #[cfg(feature = "sea-orm-db")]
    pub use crate::classifier::database::RecordNotFoundClassifier;
    pub use axum::{
        Router,
        extract::Path,
        http::StatusCode,
        response::{IntoResponse, Response},
    };
}
