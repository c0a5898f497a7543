//! Module defining the model types.

pub mod constants;
mod caption;
mod request;

pub use self::caption::Caption;
pub use self::request::{CaptionSource, RenderRequest, RenderResponse, RequestError};
