//! Module handling meme template images.

use std::collections::HashMap;
use std::fmt;
use std::io;
use std::path::Path;

use image::{self, DynamicImage, GenericImageView, ImageFormat};
use thiserror::Error;

use super::Loader;
use super::filesystem::PathLoader;


lazy_static! {
    /// Map of template file extensions to supported image formats.
    pub static ref IMAGE_FORMAT_EXTENSIONS: HashMap<&'static str, ImageFormat> = hashmap!{
        "gif" => ImageFormat::Gif,
        "jpeg" => ImageFormat::Jpeg,
        "jpg" => ImageFormat::Jpeg,
        "png" => ImageFormat::Png,
    };
}


/// Represents a template image.
///
/// Animated GIFs are reduced to their first frame.
#[derive(Clone)]
pub struct Template {
    image: DynamicImage,
    format: Option<ImageFormat>,
}

impl Template {
    /// Create the template for an image loaded from a file.
    /// Image format is figured out from the file extension.
    pub fn for_image<P: AsRef<Path>>(image: DynamicImage, path: P) -> Self {
        let extension = path.as_ref().extension().and_then(|e| e.to_str())
            .map(|s| s.trim().to_lowercase());
        let format = extension
            .and_then(|ext| IMAGE_FORMAT_EXTENSIONS.get(ext.as_str()).cloned());
        Template{image, format}
    }
}

impl Template {
    /// The template image itself.
    #[inline]
    pub fn image(&self) -> &DynamicImage {
        &self.image
    }

    /// Format the template has been loaded from, if known.
    #[inline]
    pub fn format(&self) -> Option<ImageFormat> {
        self.format
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

impl From<DynamicImage> for Template {
    fn from(image: DynamicImage) -> Self {
        Template{image, format: None}
    }
}

impl fmt::Debug for Template {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        let (width, height) = self.image.dimensions();
        write!(fmt, "Template({}x{}, {:?})", width, height, self.format)
    }
}


/// Error while loading a template.
#[derive(Debug, Error)]
pub enum TemplateError {
    /// Template file couldn't be found.
    #[error("cannot find template file: {0}")]
    File(#[from] io::Error),
    /// Error when opening a template image didn't succeed.
    #[error("cannot open template image: {0}")]
    OpenImage(#[from] image::ImageError),
}


#[derive(Debug)]
pub struct TemplateLoader {
    inner: PathLoader<'static>,
}

impl TemplateLoader {
    pub fn new<D: AsRef<Path>>(directory: D) -> Self {
        let extensions: Vec<_> = IMAGE_FORMAT_EXTENSIONS.keys().cloned().collect();
        TemplateLoader{
            inner: PathLoader::for_extensions(directory, extensions),
        }
    }
}

impl Loader for TemplateLoader {
    type Item = Template;
    type Err = TemplateError;

    fn load<'n>(&self, name: &'n str) -> Result<Template, Self::Err> {
        let path = self.inner.load(name)?;
        trace!("Opening image {}", path.display());
        let img = image::open(&path).map_err(|e| {
            error!("Failed to open template image {}: {}", path.display(), e); e
        })?;
        Ok(Template::for_image(img, &path))
    }
}
