pub mod response;

pub use response::{ENCODE_FAILURE_BODY, ErrorBody, ErrorResponse};
