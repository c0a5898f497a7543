//! Module implementing the whole captioning pipeline:
//! from a render request to the URL of a stored image.

use std::fmt;
use std::io;

use thiserror::Error;

use crate::caption::{CaptionError, Engine, Typeface};
use crate::catalog::Catalog;
use crate::generation::{CaptionGenerator, GenerateError};
use crate::model::{Caption, CaptionSource, RenderRequest, RenderResponse, RequestError};
use crate::resources::{FontLoader, Loader, Template, TemplateLoader};
use crate::storage::Storage;


/// Captioning pipeline.
///
/// Resolves the caption text (possibly by generating it),
/// renders it onto the template and stores the result.
pub struct Pipeline<Tl = TemplateLoader, Fl = FontLoader>
    where Tl: Loader<Item=Template>, Fl: Loader, Fl::Item: Typeface
{
    catalog: Catalog,
    engine: Engine<Tl, Fl>,
    generator: Option<Box<dyn CaptionGenerator>>,
    storage: Box<dyn Storage>,
}

impl<Tl, Fl> Pipeline<Tl, Fl>
    where Tl: Loader<Item=Template>, Fl: Loader, Fl::Item: Typeface
{
    /// Create the pipeline.
    /// Without a generator, only requests with verbatim captions can succeed.
    pub fn new<S: Storage + 'static>(catalog: Catalog, engine: Engine<Tl, Fl>, storage: S) -> Self {
        Pipeline{catalog, engine, generator: None, storage: Box::new(storage)}
    }

    /// Set the generator used for requests with prompts.
    pub fn with_generator<G: CaptionGenerator + 'static>(mut self, generator: G) -> Self {
        self.generator = Some(Box::new(generator)); self
    }
}

impl<Tl, Fl> Pipeline<Tl, Fl>
    where Tl: Loader<Item=Template>, Fl: Loader, Fl::Item: Typeface
{
    #[inline]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    #[inline]
    pub fn engine(&self) -> &Engine<Tl, Fl> {
        &self.engine
    }

    #[inline]
    pub fn has_generator(&self) -> bool {
        self.generator.is_some()
    }
}

impl<Tl, Fl> Pipeline<Tl, Fl>
    where Tl: Loader<Item=Template>, Fl: Loader, Fl::Item: Typeface
{
    /// Handle the render request.
    pub fn render(&self, request: &RenderRequest) -> Result<RenderResponse, Error> {
        let source = request.source()?;
        let meme = self.catalog.get(&request.template_id)
            .ok_or_else(|| Error::TemplateNotFound(request.template_id.clone()))?;
        debug!("Rendering meme `{}` ({})", meme.id, meme.name);

        let text = match source {
            CaptionSource::Prompt(prompt) => {
                let generator = self.generator.as_ref().ok_or_else(|| Error::CaptionGeneration(
                    GenerateError::Unavailable("no caption generator configured".into())))?;
                info!("Generating caption for `{}` from prompt {:?}", meme.name, prompt);
                generator.generate(&meme.name, prompt).map_err(|e| {
                    error!("Failed to generate caption for `{}`: {}", meme.name, e);
                    Error::CaptionGeneration(e)
                })?
            }
            CaptionSource::Text(text) => text.to_owned(),
        };

        let caption = Caption::parse(&text);
        trace!("Caption resolved to {:?}", caption);
        let output = self.engine.caption(&meme.image, &caption)?;
        let artifact = self.storage.store(&meme.id, &output).map_err(Error::Persist)?;

        info!("Rendered meme `{}` as {}", meme.id, artifact.url);
        Ok(RenderResponse{caption: text, image_url: artifact.url})
    }
}

impl<Tl, Fl> fmt::Debug for Pipeline<Tl, Fl>
    where Tl: Loader<Item=Template>, Fl: Loader, Fl::Item: Typeface
{
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt.debug_struct("Pipeline")
            .field("templates", &self.catalog.len())
            .field("engine", &self.engine)
            .field("has_generator", &self.has_generator())
            .finish()
    }
}


/// Error while handling a render request.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid request: {0}")]
    InvalidRequest(#[from] RequestError),
    #[error("meme template `{0}` not found")]
    TemplateNotFound(String),
    #[error("failed to generate the caption: {0}")]
    CaptionGeneration(#[source] GenerateError),
    #[error("failed to render the image: {0}")]
    Caption(#[from] CaptionError),
    #[error("failed to store the image: {0}")]
    Persist(#[source] io::Error),
}

/// Category of a pipeline `Error`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidRequest,
    TemplateNotFound,
    CaptionGenerationFailed,
    FontUnavailable,
    TemplateAssetMissing,
    RenderFailed,
    PersistFailed,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match *self {
            Error::InvalidRequest(_) => ErrorKind::InvalidRequest,
            Error::TemplateNotFound(_) => ErrorKind::TemplateNotFound,
            Error::CaptionGeneration(_) => ErrorKind::CaptionGenerationFailed,
            Error::Caption(CaptionError::TemplateAssetMissing{..}) => ErrorKind::TemplateAssetMissing,
            Error::Caption(CaptionError::FontUnavailable{..}) => ErrorKind::FontUnavailable,
            Error::Caption(CaptionError::Encode(_)) => ErrorKind::RenderFailed,
            Error::Persist(_) => ErrorKind::PersistFailed,
        }
    }
}
