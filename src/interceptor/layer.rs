use crate::exception::{BoxError, Failure};
use crate::interceptor::ErrorInterceptor;
use axum::{
    http::Request,
    response::{IntoResponse, Response},
};
use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tower::{Layer, Service, ServiceExt};

/// Tower Layer wrapping a service with an [`ErrorInterceptor`]
#[derive(Clone)]
pub struct ErrorInterceptorLayer {
    interceptor: ErrorInterceptor,
}

impl ErrorInterceptorLayer {
    pub fn new(interceptor: ErrorInterceptor) -> Self {
        Self { interceptor }
    }
}

impl<S> Layer<S> for ErrorInterceptorLayer {
    type Service = ErrorInterceptorService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        ErrorInterceptorService {
            inner,
            interceptor: self.interceptor.clone(),
        }
    }
}

/// Service produced by [`ErrorInterceptorLayer`].
///
/// Its error type is [`Infallible`]: readiness errors, call errors, panics
/// and deferred handler failures of the inner service all become JSON error
/// responses.
#[derive(Clone)]
pub struct ErrorInterceptorService<S> {
    inner: S,
    interceptor: ErrorInterceptor,
}

impl<S, B> Service<Request<B>> for ErrorInterceptorService<S>
where
    S: Service<Request<B>> + Clone + Send + 'static,
    S::Response: IntoResponse,
    S::Error: Into<BoxError>,
    S::Future: Send + 'static,
    B: Send + 'static,
{
    type Response = Response;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Response, Infallible>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        // Readiness of the inner service is awaited per call so its errors can be converted
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: Request<B>) -> Self::Future {
        let interceptor = self.interceptor.clone();
        let inner = self.inner.clone();

        Box::pin(async move {
            let response = interceptor
                .intercept(request, move |request| async move {
                    inner
                        .oneshot(request)
                        .await
                        .map_err(|err| Failure::boxed(err.into()))
                })
                .await;
            Ok(response)
        })
    }
}
