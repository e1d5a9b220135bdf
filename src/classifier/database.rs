use crate::classifier::{Classification, Classifier};
use crate::exception::Failure;
use crate::interceptor::RequestContext;
use axum::http::StatusCode;
use sea_orm::DbErr;

/// Maps `DbErr::RecordNotFound` to `404 Not Found`.
///
/// Other database errors are left to the interceptor's fallback rules, so
/// their detail stays hidden in production.
#[derive(Debug, Clone)]
pub struct RecordNotFoundClassifier {
    message: String,
}

impl RecordNotFoundClassifier {
    pub fn new() -> Self {
        Self {
            message: "Not Found".to_string(),
        }
    }

    pub fn with_message(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl Default for RecordNotFoundClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Classifier for RecordNotFoundClassifier {
    fn convert(&self, failure: &Failure, _context: &RequestContext) -> Option<Classification> {
        match failure.downcast_ref::<DbErr>()? {
            DbErr::RecordNotFound(_) => {
                Some(Classification::new(self.message.clone()).with_status(StatusCode::NOT_FOUND))
            }
            _ => None,
        }
    }
}
