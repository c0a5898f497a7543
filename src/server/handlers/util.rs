//! Utilities for request handlers.

use hyper::{Body, Response, StatusCode};
use hyper::header::{HeaderValue, CONTENT_LENGTH, CONTENT_TYPE};
use mime::{self, Mime};
use serde_json::{json, Value as Json};


/// Create a JSON response.
pub fn json_response(json: Json) -> Response<Body> {
    let body = json.to_string();
    let mut response = Response::new(Body::empty());
    response.headers_mut().insert(CONTENT_TYPE, content_type(&mime::APPLICATION_JSON));
    response.headers_mut().insert(CONTENT_LENGTH, HeaderValue::from(body.len()));
    *response.body_mut() = Body::from(body);
    response
}

/// Create a response with binary content of given MIME type.
pub fn bytes_response(mime_type: &Mime, bytes: Vec<u8>) -> Response<Body> {
    let mut response = Response::new(Body::empty());
    response.headers_mut().insert(CONTENT_TYPE, content_type(mime_type));
    response.headers_mut().insert(CONTENT_LENGTH, HeaderValue::from(bytes.len()));
    *response.body_mut() = Body::from(bytes);
    response
}

/// Create an erroneous JSON response.
///
/// The `details` usually describe the underlying cause of the error.
pub fn error_response<T: ToString>(status_code: StatusCode,
                                   message: T, details: Option<String>) -> Response<Body> {
    let json = match details {
        Some(details) => json!({"error": message.to_string(), "details": details}),
        None => json!({"error": message.to_string()}),
    };
    let mut response = json_response(json);
    *response.status_mut() = status_code;
    response
}

/// Create an empty response with given status.
pub fn empty_response(status_code: StatusCode) -> Response<Body> {
    let mut response = Response::new(Body::empty());
    *response.status_mut() = status_code;
    response.headers_mut().insert(CONTENT_TYPE, content_type(&mime::TEXT_PLAIN));
    response.headers_mut().insert(CONTENT_LENGTH, HeaderValue::from(0usize));
    response
}

/// Value of the Content-Type header for given MIME type.
pub fn content_type(mime_type: &Mime) -> HeaderValue {
    HeaderValue::from_str(mime_type.as_ref())
        .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"))
}


#[cfg(test)]
mod tests {
    use hyper::StatusCode;
    use hyper::header::CONTENT_TYPE;
    use serde_json::json;
    use super::{bytes_response, empty_response, error_response, json_response};

    #[test]
    fn json_content_type() {
        let response = json_response(json!({"a": 1}));
        assert_eq!(StatusCode::OK, response.status());
        assert_eq!("application/json", response.headers()[CONTENT_TYPE]);
    }

    #[test]
    fn error_status() {
        let response = error_response(StatusCode::NOT_FOUND, "not found", None);
        assert_eq!(StatusCode::NOT_FOUND, response.status());
        assert_eq!("application/json", response.headers()[CONTENT_TYPE]);
    }

    #[test]
    fn bytes() {
        let response = bytes_response(&mime::IMAGE_JPEG, vec![0xff, 0xd8]);
        assert_eq!("image/jpeg", response.headers()[CONTENT_TYPE]);
        assert_eq!("2", response.headers()[hyper::header::CONTENT_LENGTH]);
    }

    #[test]
    fn empty() {
        let response = empty_response(StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(StatusCode::METHOD_NOT_ALLOWED, response.status());
        assert_eq!("0", response.headers()[hyper::header::CONTENT_LENGTH]);
    }
}
