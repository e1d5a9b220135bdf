use axum::{
    body::{Body, Bytes},
    http::{HeaderName, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;

/// Body sent when the error message itself cannot be encoded.
pub const ENCODE_FAILURE_BODY: &str = r#"{"error": "Unable to encode error to JSON"}"#;

/// Wire shape of every error response: `{"error": "<message>"}`.
#[derive(Debug, Serialize)]
pub struct ErrorBody<'a, M: Serialize + ?Sized = str> {
    pub error: &'a M,
}

impl<'a, M: Serialize + ?Sized> ErrorBody<'a, M> {
    pub fn new(error: &'a M) -> Self {
        Self { error }
    }

    /// Serialize to JSON, substituting [`ENCODE_FAILURE_BODY`] if encoding fails.
    pub fn encode(&self) -> Bytes {
        match serde_json::to_vec(self) {
            Ok(bytes) => Bytes::from(bytes),
            Err(err) => {
                tracing::debug!(error = %err, "error message could not be encoded");
                Bytes::from_static(ENCODE_FAILURE_BODY.as_bytes())
            }
        }
    }
}

/// Uniform JSON error response
///
/// The status defaults to `400 Bad Request`. Extra headers are appended in
/// order; `Content-Type` is always `application/json`.
///
/// # Example
/// ```
/// use error_interceptor::common::ErrorResponse;
/// use axum::http::StatusCode;
///
/// let response = ErrorResponse::new("not found").with_status(StatusCode::NOT_FOUND);
/// assert_eq!(response.status(), StatusCode::NOT_FOUND);
/// ```
#[derive(Debug, Clone)]
pub struct ErrorResponse {
    message: String,
    status: Option<StatusCode>,
    headers: Vec<(HeaderName, HeaderValue)>,
}

impl ErrorResponse {
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

    pub fn with_optional_status(mut self, status: Option<StatusCode>) -> Self {
        self.status = status;
        self
    }

    pub fn with_headers(
        mut self,
        headers: impl IntoIterator<Item = (HeaderName, HeaderValue)>,
    ) -> Self {
        self.headers.extend(headers);
        self
    }

    /// Resolved status
    pub fn status(&self) -> StatusCode {
        self.status.unwrap_or(StatusCode::BAD_REQUEST)
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorBody::new(self.message.as_str()).encode();

        let mut response = Response::new(Body::from(body));
        *response.status_mut() = status;
        let headers = response.headers_mut();
        for (name, value) in self.headers {
            headers.append(name, value);
        }
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serializer;

    struct Unencodable;

    impl Serialize for Unencodable {
        fn serialize<S: Serializer>(&self, _serializer: S) -> Result<S::Ok, S::Error> {
            Err(serde::ser::Error::custom("not encodable"))
        }
    }

    #[test]
    fn test_message_round_trips_through_json() {
        let messages = [
            "plain",
            "with \"quotes\"",
            "back\\slash",
            "new\nline",
            "ünïcødé ✓",
            "",
        ];
        for message in messages {
            let bytes = ErrorBody::new(message).encode();
            let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
            assert_eq!(value["error"], message);
        }
    }

    #[test]
    fn test_encoding_failure_uses_fixed_body() {
        let bytes = ErrorBody::new(&Unencodable).encode();
        assert_eq!(bytes, ENCODE_FAILURE_BODY.as_bytes());
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value["error"], "Unable to encode error to JSON");
    }

    #[test]
    fn test_response_defaults_and_headers() {
        let response = ErrorResponse::new("nope")
            .with_headers([
                (HeaderName::from_static("x-detail"), HeaderValue::from_static("a")),
                (HeaderName::from_static("x-detail"), HeaderValue::from_static("b")),
                (header::CONTENT_TYPE, HeaderValue::from_static("text/plain")),
            ])
            .into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let values: Vec<_> = response.headers().get_all("x-detail").iter().collect();
        assert_eq!(values, vec!["a", "b"]);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");
    }
}
