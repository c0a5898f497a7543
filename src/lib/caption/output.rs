//! Defines the output of a captioning operation.

use std::ops::Deref;

use image::ImageFormat;
use mime::{self, Mime};


/// Output of the captioning process: an encoded JPEG image.
#[derive(Clone, Debug)]
#[must_use = "unused caption output which must be used"]
pub struct CaptionOutput {
    bytes: Vec<u8>,
    dimensions: (u32, u32),
    font_size: Option<f32>,
}

impl CaptionOutput {
    #[inline]
    pub(crate) fn new(bytes: Vec<u8>, dimensions: (u32, u32), font_size: Option<f32>) -> Self {
        CaptionOutput{bytes, dimensions, font_size}
    }
}

impl CaptionOutput {
    /// Image format of the output.
    #[inline]
    pub fn format(&self) -> ImageFormat {
        ImageFormat::Jpeg
    }

    /// The MIME type that matches output's format.
    #[inline]
    pub fn mime_type(&self) -> Mime {
        mime::IMAGE_JPEG
    }

    /// Raw bytes of the output.
    #[inline]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes[..]
    }

    /// Convert the output into a vector of bytes.
    #[inline]
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Width & height of the image.
    #[inline]
    pub fn dimensions(&self) -> (u32, u32) {
        self.dimensions
    }

    /// Size of the font the caption has been rendered with,
    /// or `None` if there was no text to render.
    #[inline]
    pub fn font_size(&self) -> Option<f32> {
        self.font_size
    }
}

impl Deref for CaptionOutput {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        self.bytes()
    }
}

impl From<CaptionOutput> for Vec<u8> {
    fn from(output: CaptionOutput) -> Self {
        output.into_bytes()
    }
}
