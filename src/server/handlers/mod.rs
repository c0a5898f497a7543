//! Module with the server's request handlers.

mod captioner;
pub mod list;
pub mod util;


use std::error::Error;

use hyper::{Body, Method, Response, StatusCode, Uri};
use quip::{ErrorKind, RenderRequest};
use serde_json::json;

pub use self::captioner::{Captioner, RenderError};
use self::util::{empty_response, error_response, json_response};


/// Handle the meme captioning HTTP request.
pub async fn caption_meme(captioner: &Captioner,
                          method: &Method, url: &Uri, body: &[u8]) -> Response<Body> {
    let parsed: Result<RenderRequest, Box<dyn Error + Send + Sync>> = match *method {
        Method::GET => {
            let query = match url.query() {
                Some(q) => { trace!("Caption request query string: {}", q); q }
                None => { trace!("No query string found in caption request"); "" }
            };
            debug!("Decoding render request from {} bytes of query string", query.len());
            serde_qs::from_str(query).map_err(Into::into)
        },
        Method::POST => {
            trace!("Caption request body: {}", String::from_utf8_lossy(body));
            debug!("Decoding render request from {} bytes of JSON", body.len());
            serde_json::from_slice(body).map_err(Into::into)
        },
        ref m => {
            warn!("Unsupported HTTP method for caption request: {}", m);
            return empty_response(StatusCode::METHOD_NOT_ALLOWED);
        },
    };

    let request = match parsed {
        Ok(r) => r,
        Err(e) => {
            error!("Failed to decode render request: {}", e);
            return error_response(StatusCode::BAD_REQUEST,
                "Cannot decode request", Some(e.to_string()));
        },
    };
    debug!("Decoded {:?}", request);

    match captioner.render(request).await {
        Ok(response) => json_response(json!(response)),
        Err(e) => error_response(status_code_for(&e), error_message(&e), Some(e.to_string())),
    }
}


/// Determine the HTTP response code that best corresponds to a meme rendering error.
fn status_code_for(e: &RenderError) -> StatusCode {
    match *e {
        RenderError::Pipeline(ref e) => match e.kind() {
            ErrorKind::TemplateNotFound => StatusCode::NOT_FOUND,
            ErrorKind::InvalidRequest => StatusCode::BAD_REQUEST,
            ErrorKind::CaptionGenerationFailed |
            ErrorKind::FontUnavailable |
            ErrorKind::TemplateAssetMissing |
            ErrorKind::RenderFailed |
            ErrorKind::PersistFailed => StatusCode::INTERNAL_SERVER_ERROR,
        },
        RenderError::Timeout => StatusCode::INTERNAL_SERVER_ERROR,
        RenderError::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
    }
}

/// Short, user-facing description of a meme rendering error.
/// The full error is reported separately as details.
fn error_message(e: &RenderError) -> &'static str {
    match *e {
        RenderError::Pipeline(ref e) => match e.kind() {
            ErrorKind::InvalidRequest => "Invalid request",
            ErrorKind::TemplateNotFound => "Meme template not found",
            ErrorKind::CaptionGenerationFailed => "Failed to generate caption",
            ErrorKind::FontUnavailable => "No usable font",
            ErrorKind::TemplateAssetMissing => "Meme template image is missing",
            ErrorKind::RenderFailed => "Failed to render the image",
            ErrorKind::PersistFailed => "Failed to store the image",
        },
        RenderError::Timeout => "Request timed out",
        RenderError::Unavailable => "Service unavailable",
    }
}
