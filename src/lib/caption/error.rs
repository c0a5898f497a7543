//! Captioning error.

use std::error::Error;

use image::ImageError;
use thiserror::Error;


/// Error that may occur during the captioning.
#[derive(Debug, Error)]
pub enum CaptionError {
    /// The template image couldn't be loaded.
    #[error("cannot load template `{template}`: {source}")]
    TemplateAssetMissing {
        template: String,
        source: Box<dyn Error + Send + Sync>,
    },
    /// None of the fonts from the ladder could be loaded.
    #[error("no usable font (tried: {})", fonts.join(", "))]
    FontUnavailable {
        fonts: Vec<String>,
    },
    /// The final image couldn't be encoded.
    #[error("failed to encode the final image: {0}")]
    Encode(#[from] ImageError),
}

impl CaptionError {
    #[inline]
    pub(super) fn template<T, E>(template: T, error: E) -> Self
        where T: Into<String>, E: Error + Send + Sync + 'static
    {
        CaptionError::TemplateAssetMissing{
            template: template.into(),
            source: Box::new(error),
        }
    }
}
