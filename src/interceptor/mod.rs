use crate::classifier::{Classifier, ClassifierRegistry};
use crate::common::ErrorResponse;
use crate::config::Environment;
use crate::exception::{Abort, DeferredFailure, Failure};
use axum::Router;
use axum::http::{Request, StatusCode};
use axum::response::{IntoResponse, Response};
use futures::FutureExt;
use std::future::Future;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

mod context;
pub mod layer;

pub use context::RequestContext;
pub use layer::{ErrorInterceptorLayer, ErrorInterceptorService};

/// Message used when a failure offers no description at all.
pub const UNKNOWN_ERROR: &str = "Unknown error.";

/// Funnels every downstream failure into a uniform JSON error response.
///
/// The interceptor holds only immutable configuration (the classifier
/// registry and the environment), so one instance is shared by all requests.
///
/// Resolution order for a failure:
/// 1. the first registered classifier that matches;
/// 2. the self-describing ("abort") shape: reason, status and headers;
/// 3. the diagnostic shape, with status 500, outside production only;
/// 4. the failure's description, or `"Unknown error."`, with status 400.
///
/// # Example
/// ```
/// use error_interceptor::prelude::*;
///
/// let interceptor = ErrorInterceptor::builder()
///     .environment(Environment::Production)
///     .build();
/// let app: Router = Router::new().layer(interceptor.layer());
/// ```
#[derive(Clone)]
pub struct ErrorInterceptor {
    registry: Arc<ClassifierRegistry>,
    environment: Environment,
}

impl ErrorInterceptor {
    pub fn new(registry: ClassifierRegistry, environment: Environment) -> Self {
        Self {
            registry: Arc::new(registry),
            environment,
        }
    }

    pub fn builder() -> ErrorInterceptorBuilder {
        ErrorInterceptorBuilder::new()
    }

    pub fn environment(&self) -> Environment {
        self.environment
    }

    pub fn registry(&self) -> &ClassifierRegistry {
        &self.registry
    }

    /// Tower layer applying this interceptor to a service
    pub fn layer(&self) -> ErrorInterceptorLayer {
        ErrorInterceptorLayer::new(self.clone())
    }

    /// Run `downstream` and convert any failure into an error response.
    ///
    /// A panic while invoking `downstream`, a panic while polling the
    /// returned future and an `Err` output all end up in
    /// [`build_response`](Self::build_response). A successful response is
    /// returned unchanged unless it carries a deferred [`Failure`].
    pub async fn intercept<B, F, Fut, R, E>(&self, request: Request<B>, downstream: F) -> Response
    where
        F: FnOnce(Request<B>) -> Fut,
        Fut: Future<Output = Result<R, E>>,
        R: IntoResponse,
        E: Into<Failure>,
    {
        let context = RequestContext::from(&request);

        let future = match catch_unwind(AssertUnwindSafe(|| downstream(request))) {
            Ok(future) => future,
            Err(payload) => return self.build_response(&Failure::from_panic(payload), &context),
        };

        let failure = match AssertUnwindSafe(future).catch_unwind().await {
            Ok(Ok(response)) => return self.settle(response.into_response(), &context),
            Ok(Err(err)) => err.into(),
            Err(payload) => Failure::from_panic(payload),
        };
        self.build_response(&failure, &context)
    }

    /// Convert a failure into a response. Never fails.
    pub fn build_response(&self, failure: &Failure, context: &RequestContext) -> Response {
        let response = match catch_unwind(AssertUnwindSafe(|| self.resolve(failure, context))) {
            Ok(response) => response,
            Err(_) => {
                tracing::warn!("failure shape panicked while resolving, using opaque message");
                ErrorResponse::new(UNKNOWN_ERROR)
            }
        };
        response.into_response()
    }

    /// Decide message, status and headers for a failure without encoding them.
    pub fn resolve(&self, failure: &Failure, context: &RequestContext) -> ErrorResponse {
        if let Some(classification) = self.registry.classify(failure, context) {
            let (message, status, headers) = classification.into_parts();
            tracing::debug!(status = ?status, path = %context.uri().path(), "failure classified");
            return ErrorResponse::new(message)
                .with_optional_status(status)
                .with_headers(headers);
        }

        if let Some(abort) = failure.as_self_describing() {
            let status = abort.status();
            tracing::debug!(status = %status, path = %context.uri().path(), "request aborted");
            return ErrorResponse::new(abort.reason())
                .with_status(status)
                .with_headers(abort.headers());
        }

        if !self.environment.is_release() {
            if let Some(diagnostic) = failure.as_diagnostic() {
                tracing::debug!(environment = %self.environment, "disclosing diagnostic detail");
                return ErrorResponse::new(diagnostic.diagnostic())
                    .with_status(StatusCode::INTERNAL_SERVER_ERROR);
            }
        }

        tracing::debug!(path = %context.uri().path(), "unrecognized failure");
        // Panic messages describe the code, not the request
        let description = if failure.is_panic() && self.environment.is_release() {
            None
        } else {
            failure.description()
        };
        ErrorResponse::new(description.unwrap_or_else(|| UNKNOWN_ERROR.to_string()))
    }

    /// Wrap `router` so unmatched paths and every route go through this interceptor.
    ///
    /// Installs [`not_found`] as the fallback, replacing any fallback the
    /// router already has; use [`layer`](Self::layer) directly to keep a
    /// custom one.
    pub fn apply<S>(&self, router: Router<S>) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        router.fallback(not_found).layer(self.layer())
    }

    fn settle(&self, mut response: Response, context: &RequestContext) -> Response {
        match response.extensions_mut().remove::<DeferredFailure>() {
            Some(DeferredFailure(failure)) => self.build_response(&failure, context),
            None => response,
        }
    }
}

/// Fallback handler answering unmatched paths with `404 {"error":"Not Found"}`.
///
/// The body is only produced when an [`ErrorInterceptorLayer`] wraps the
/// fallback; see [`ErrorInterceptor::apply`].
pub async fn not_found() -> Abort {
    Abort::not_found()
}

/// Builder for [`ErrorInterceptor`]
///
/// Classifiers can only be added here; the built interceptor is immutable.
#[derive(Default)]
pub struct ErrorInterceptorBuilder {
    registry: ClassifierRegistry,
    environment: Environment,
}

impl ErrorInterceptorBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    /// Append a classifier after those already registered
    pub fn classifier<C: Classifier>(mut self, classifier: C) -> Self {
        self.registry.register(classifier);
        self
    }

    /// Replace the registry wholesale
    pub fn registry(mut self, registry: ClassifierRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn build(self) -> ErrorInterceptor {
        ErrorInterceptor::new(self.registry, self.environment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::Classification;
    use crate::exception::{Abort, DiagnosticCapable, SelfDescribing};
    use axum::body::Body;
    use axum::http::{HeaderName, HeaderValue, header};
    use serde_json::Value;

    #[derive(Debug, thiserror::Error)]
    #[error("lookup failed")]
    struct LookupError;

    #[derive(Debug, thiserror::Error)]
    #[error("internal failure")]
    struct Traced;

    impl DiagnosticCapable for Traced {
        fn diagnostic(&self) -> String {
            "stack: ...".to_string()
        }
    }

    #[derive(Debug, thiserror::Error)]
    #[error("")]
    struct Silent;

    #[derive(Debug, thiserror::Error)]
    #[error("broken shape")]
    struct BrokenShape;

    impl SelfDescribing for BrokenShape {
        fn reason(&self) -> String {
            panic!("reason unavailable")
        }

        fn status(&self) -> StatusCode {
            StatusCode::CONFLICT
        }
    }

    fn context() -> RequestContext {
        RequestContext::from(&Request::get("/items/1").body(Body::empty()).unwrap())
    }

    fn request() -> Request<Body> {
        Request::get("/items/1").body(Body::empty()).unwrap()
    }

    async fn read(response: Response) -> (StatusCode, Value) {
        let status = response.status();
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn lookup_failed(failure: &Failure, _: &RequestContext) -> Option<Classification> {
        failure
            .is::<LookupError>()
            .then(|| Classification::new("not found").with_status(StatusCode::NOT_FOUND))
    }

    #[tokio::test]
    async fn test_classifier_match_wins() {
        let interceptor = ErrorInterceptor::builder()
            .classifier(lookup_failed)
            .classifier(|_: &Failure, _: &RequestContext| {
                Some(Classification::new("too late").with_status(StatusCode::GONE))
            })
            .build();

        let response = interceptor.build_response(&Failure::from(LookupError), &context());
        let (status, body) = read(response).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, serde_json::json!({"error": "not found"}));
    }

    #[tokio::test]
    async fn test_classifier_takes_precedence_over_abort() {
        let interceptor = ErrorInterceptor::builder()
            .classifier(|_: &Failure, _: &RequestContext| {
                Some(
                    Classification::new("classified").with_header(
                        HeaderName::from_static("retry-after"),
                        HeaderValue::from_static("5"),
                    ),
                )
            })
            .build();

        let failure = Failure::from(Abort::forbidden());
        let response = interceptor.build_response(&failure, &context());
        assert_eq!(response.headers()["retry-after"], "5");
        let (status, body) = read(response).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "classified");
    }

    #[tokio::test]
    async fn test_abort_shape() {
        let interceptor = ErrorInterceptor::builder().build();
        let abort = Abort::unprocessable("bad input").with_header("x-detail", "foo");

        let response = interceptor.build_response(&Failure::from(abort), &context());
        assert_eq!(response.headers()["x-detail"], "foo");
        let (status, body) = read(response).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body, serde_json::json!({"error": "bad input"}));
    }

    #[tokio::test]
    async fn test_diagnostic_disclosed_outside_production() {
        for environment in [Environment::Development, Environment::Testing] {
            let interceptor = ErrorInterceptor::builder().environment(environment).build();
            let response = interceptor.build_response(&Failure::diagnostic(Traced), &context());
            let (status, body) = read(response).await;
            assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
            assert_eq!(body["error"], "stack: ...");
        }
    }

    #[tokio::test]
    async fn test_diagnostic_hidden_in_production() {
        let interceptor = ErrorInterceptor::builder()
            .environment(Environment::Production)
            .build();
        let response = interceptor.build_response(&Failure::diagnostic(Traced), &context());
        let (status, body) = read(response).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "internal failure");
    }

    #[tokio::test]
    async fn test_opaque_failures() {
        let interceptor = ErrorInterceptor::builder().build();

        let response = interceptor.build_response(&Failure::from(Silent), &context());
        let (status, body) = read(response).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, serde_json::json!({"error": "Unknown error."}));

        let failure = Failure::from_panic(Box::new(17_i32));
        let (_, body) = read(interceptor.build_response(&failure, &context())).await;
        assert_eq!(body["error"], UNKNOWN_ERROR);

        let response = interceptor.build_response(&Failure::from(LookupError), &context());
        let (status, body) = read(response).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "lookup failed");
    }

    #[tokio::test]
    async fn test_message_needing_escapes_round_trips() {
        let interceptor = ErrorInterceptor::builder().build();
        let message = "say \"hi\"\n\t\\ ✓";
        let failure = Failure::from(Abort::bad_request(message));
        let (_, body) = read(interceptor.build_response(&failure, &context())).await;
        assert_eq!(body["error"], message);
    }

    #[tokio::test]
    async fn test_panicking_shape_is_absorbed() {
        let interceptor = ErrorInterceptor::builder().build();
        let failure = Failure::self_describing(BrokenShape);
        let (status, body) = read(interceptor.build_response(&failure, &context())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], UNKNOWN_ERROR);
    }

    #[tokio::test]
    async fn test_intercept_passes_success_through() {
        let interceptor = ErrorInterceptor::builder().build();
        let response = interceptor
            .intercept(request(), |_| async {
                Ok::<_, Failure>((StatusCode::CREATED, "made"))
            })
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(bytes, "made");
    }

    #[tokio::test]
    async fn test_intercept_async_error() {
        let interceptor = ErrorInterceptor::builder().classifier(lookup_failed).build();
        let response = interceptor
            .intercept(request(), |_| async {
                tokio::task::yield_now().await;
                Err::<Response, _>(LookupError)
            })
            .await;
        let (status, body) = read(response).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "not found");
    }

    #[tokio::test]
    async fn test_intercept_synchronous_panic() {
        let interceptor = ErrorInterceptor::builder().build();
        let response = interceptor
            .intercept(request(), |_| -> std::future::Ready<Result<Response, Failure>> {
                panic!("handler setup failed")
            })
            .await;
        let (status, body) = read(response).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "handler setup failed");
    }

    #[tokio::test]
    async fn test_intercept_panic_while_polling() {
        let interceptor = ErrorInterceptor::builder().build();
        let response = interceptor
            .intercept(request(), |_| async {
                tokio::task::yield_now().await;
                if true {
                    panic!("lost connection");
                }
                Ok::<Response, Failure>(StatusCode::OK.into_response())
            })
            .await;
        let (_, body) = read(response).await;
        assert_eq!(body["error"], "lost connection");
    }

    #[tokio::test]
    async fn test_panic_message_hidden_in_production() {
        let failure = Failure::from_panic(Box::new("index out of bounds: len is 3"));

        let interceptor = ErrorInterceptor::builder()
            .environment(Environment::Production)
            .build();
        let (status, body) = read(interceptor.build_response(&failure, &context())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], UNKNOWN_ERROR);

        let interceptor = ErrorInterceptor::builder()
            .environment(Environment::Testing)
            .build();
        let (_, body) = read(interceptor.build_response(&failure, &context())).await;
        assert_eq!(body["error"], "index out of bounds: len is 3");
    }

    #[tokio::test]
    async fn test_intercept_deferred_failure() {
        let interceptor = ErrorInterceptor::builder().build();
        let response = interceptor
            .intercept(request(), |_| async {
                Ok::<_, Failure>(Abort::not_found().into_response())
            })
            .await;
        let (status, body) = read(response).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Not Found");
    }

    #[tokio::test]
    async fn test_interceptor_is_shareable_across_tasks() {
        let interceptor = ErrorInterceptor::builder().classifier(lookup_failed).build();
        let mut handles = Vec::new();
        for _ in 0..8 {
            let interceptor = interceptor.clone();
            handles.push(tokio::spawn(async move {
                let response = interceptor
                    .intercept(request(), |_| async { Err::<Response, _>(LookupError) })
                    .await;
                response.status()
            }));
        }
        for handle in handles {
            assert_eq!(handle.await.unwrap(), StatusCode::NOT_FOUND);
        }
    }
}
