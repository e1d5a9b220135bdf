use error_interceptor::prelude::*;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProductError {
    #[error("Product {0} not found")]
    NotFound(String),

    #[error("Price must be positive, got {0}")]
    InvalidPrice(f64),

    #[error("Product store unavailable")]
    StoreUnavailable,
}

/// Maps domain errors to client-facing responses.
///
/// `StoreUnavailable` is deliberately left unmatched so the interceptor's
/// fallback rules decide how much of it to reveal.
pub fn product_classifier(failure: &Failure, _context: &RequestContext) -> Option<Classification> {
    match failure.downcast_ref::<ProductError>()? {
        err @ ProductError::NotFound(_) => {
            Some(Classification::new(err.to_string()).with_status(StatusCode::NOT_FOUND))
        }
        err @ ProductError::InvalidPrice(_) => {
            Some(Classification::new(err.to_string()).with_status(StatusCode::UNPROCESSABLE_ENTITY))
        }
        ProductError::StoreUnavailable => None,
    }
}
