use thiserror::Error;

pub type Result<T> = std::result::Result<T, InterceptError>;

/// Configuration faults raised while setting up an interceptor.
///
/// Request-time failures never surface as this type; they are carried by
/// [`Failure`](crate::exception::Failure) and absorbed by the interceptor.
#[derive(Debug, Error)]
pub enum InterceptError {
    #[error("Unknown environment: {value}")]
    UnknownEnvironment { value: String },

    #[error("Invalid header name: {name}")]
    InvalidHeaderName { name: String },

    #[error("Invalid value for header {name}")]
    InvalidHeaderValue { name: String },
}
