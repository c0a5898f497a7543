//! Module implementing the builder for `Engine`.

use std::path::Path;

use antidote::RwLock;
use image::Rgba;
use thiserror::Error;

use crate::resources::{CachingLoader, FontLoader, Loader, Template, TemplateLoader};
use crate::caption::text::Typeface;
use super::config::{BottomPlacement, Config, FontLadder};
use super::{Engine, Inner};


const DEFAULT_TEMPLATE_CAPACITY: usize = 128;
const DEFAULT_FONT_CAPACITY: usize = 16;


/// Builder for `Engine`.
#[derive(Debug)]
#[must_use = "unused builder which must be used"]
pub struct Builder<Tl, Fl>
    where Tl: Loader<Item=Template>, Fl: Loader, Fl::Item: Typeface
{
    template_loader: Option<LoaderSetup<Tl>>,
    font_loader: Option<LoaderSetup<Fl>>,
    template_cache_size: usize,
    font_cache_size: usize,
    config: Config,
}

/// How a template or font loader should be wrapped by the engine.
#[derive(Debug)]
enum LoaderSetup<L> {
    Cached(L),
    Raw(L),
}

impl<L: Loader> LoaderSetup<L> {
    fn build(self, cache_size: usize) -> CachingLoader<L> {
        match self {
            LoaderSetup::Cached(loader) => CachingLoader::new(loader, cache_size),
            LoaderSetup::Raw(loader) => CachingLoader::uncached(loader),
        }
    }
}


impl<Tl, Fl> Builder<Tl, Fl>
    where Tl: Loader<Item=Template>, Fl: Loader, Fl::Item: Typeface
{
    /// Create a new `Builder`.
    #[inline]
    pub fn new() -> Self {
        Builder::default()
    }
}
impl<Tl, Fl> Default for Builder<Tl, Fl>
    where Tl: Loader<Item=Template>, Fl: Loader, Fl::Item: Typeface
{
    fn default() -> Self {
        Builder{
            template_loader: None,
            font_loader: None,
            template_cache_size: DEFAULT_TEMPLATE_CAPACITY,
            font_cache_size: DEFAULT_FONT_CAPACITY,
            config: Config::default(),
        }
    }
}

// Setters for the standard loaders.
impl<Fl> Builder<TemplateLoader, Fl>
    where Fl: Loader, Fl::Item: Typeface
{
    /// Set the directory where the templates will be loaded from.
    #[inline]
    pub fn template_directory<P: AsRef<Path>>(self, directory: P) -> Self {
        self.template_loader(TemplateLoader::new(directory))
    }
}
impl<Tl> Builder<Tl, FontLoader>
    where Tl: Loader<Item=Template>
{
    /// Set the directory where the fonts will be loaded from.
    #[inline]
    pub fn font_directory<P: AsRef<Path>>(self, directory: P) -> Self {
        self.font_loader(FontLoader::new(directory))
    }
}

// Setters for custom loaders.
impl<Tl, Fl> Builder<Tl, Fl>
    where Tl: Loader<Item=Template>, Fl: Loader, Fl::Item: Typeface
{
    /// Set a custom loader for templates.
    ///
    /// Templates loaded by it will still be cached in an LRU cache.
    /// See `raw_template_loader` if you want to provide your own caching.
    #[inline]
    pub fn template_loader(mut self, loader: Tl) -> Self {
        self.template_loader = Some(LoaderSetup::Cached(loader)); self
    }

    /// Change the size of the template cache.
    #[inline]
    pub fn template_cache_size(mut self, size: usize) -> Self {
        self.template_cache_size = size; self
    }

    /// Set a custom loader for fonts.
    ///
    /// Fonts loaded by it will still be cached in an LRU cache.
    /// See `raw_font_loader` if you want to provide your own caching.
    #[inline]
    pub fn font_loader(mut self, loader: Fl) -> Self {
        self.font_loader = Some(LoaderSetup::Cached(loader)); self
    }

    /// Change the size of the font cache.
    #[inline]
    pub fn font_cache_size(mut self, size: usize) -> Self {
        self.font_cache_size = size; self
    }

    /// Set a custom "raw" loader for templates.
    ///
    /// Templates loaded this way will not be cached (unless the loader itself
    /// implements some kind of caching).
    #[inline]
    pub fn raw_template_loader(mut self, loader: Tl) -> Self {
        self.template_loader = Some(LoaderSetup::Raw(loader)); self
    }

    /// Set a custom "raw" loader for fonts.
    ///
    /// Fonts loaded this way will not be cached (unless the loader itself
    /// implements some kind of caching).
    #[inline]
    pub fn raw_font_loader(mut self, loader: Fl) -> Self {
        self.font_loader = Some(LoaderSetup::Raw(loader)); self
    }
}

// Setters for the rendering configuration.
impl<Tl, Fl> Builder<Tl, Fl>
    where Tl: Loader<Item=Template>, Fl: Loader, Fl::Item: Typeface
{
    /// Replace the whole rendering configuration.
    #[inline]
    pub fn config(mut self, config: Config) -> Self {
        self.config = config; self
    }

    /// Set the quality percentage of JPEG images generated by the `Engine`.
    #[inline]
    pub fn jpeg_quality(mut self, quality: u8) -> Self {
        self.config.jpeg_quality = quality; self
    }

    /// Set the ladder of font sizes to fit the caption with.
    #[inline]
    pub fn font_ladder(mut self, ladder: FontLadder) -> Self {
        self.config.ladder = ladder; self
    }

    #[inline]
    pub fn margin(mut self, margin: f32) -> Self {
        self.config.margin = margin; self
    }

    #[inline]
    pub fn top_offset(mut self, offset: f32) -> Self {
        self.config.top_offset = offset; self
    }

    #[inline]
    pub fn bottom_margin(mut self, margin: f32) -> Self {
        self.config.bottom_margin = margin; self
    }

    #[inline]
    pub fn line_spacing(mut self, spacing: f32) -> Self {
        self.config.line_spacing = spacing; self
    }

    #[inline]
    pub fn bottom_placement(mut self, placement: BottomPlacement) -> Self {
        self.config.bottom_placement = placement; self
    }

    #[inline]
    pub fn text_color(mut self, color: Rgba<u8>) -> Self {
        self.config.text_color = color; self
    }
}

// Validation & building.
impl<Tl, Fl> Builder<Tl, Fl>
    where Tl: Loader<Item=Template>, Fl: Loader, Fl::Item: Typeface
{
    /// Build the `Engine`.
    pub fn build(self) -> Result<Engine<Tl, Fl>, Error> {
        validate(&self.config)?;

        let template_loader = self.template_loader
            .ok_or(Error::NoLoader("template"))?
            .build(self.template_cache_size);
        let font_loader = self.font_loader
            .ok_or(Error::NoLoader("font"))?
            .build(self.font_cache_size);

        let config = RwLock::new(self.config);
        Ok(Engine::from(Inner{config, template_loader, font_loader}))
    }
}

fn validate(config: &Config) -> Result<(), Error> {
    if config.jpeg_quality == 0 || config.jpeg_quality > 100 {
        return Err(Error::JpegQuality(config.jpeg_quality));
    }
    if config.ladder.is_empty() {
        return Err(Error::EmptyLadder);
    }
    if let Some(rung) = config.ladder.iter().find(|r| !(r.size > 0.0)) {
        return Err(Error::FontSize(rung.size));
    }
    if !(config.line_spacing > 0.0) {
        return Err(Error::LineSpacing(config.line_spacing));
    }
    Ok(())
}


/// Error that resulted from misconfiguration of the `Engine` via its `Builder`.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum Error {
    /// No loader set up for the resource.
    #[error("no {0} loader configured")]
    NoLoader(&'static str),
    #[error("JPEG quality must be between 1 and 100, got {0}")]
    JpegQuality(u8),
    #[error("font ladder must have at least one rung")]
    EmptyLadder,
    #[error("font sizes must be positive, got {0}")]
    FontSize(f32),
    #[error("line spacing must be positive, got {0}")]
    LineSpacing(f32),
}


#[cfg(test)]
mod tests {
    use crate::caption::engine::{FontLadder, Rung};
    use crate::testing::{FontMap, TemplateMap};
    use super::{Builder, Error};

    type TestBuilder = Builder<TemplateMap, FontMap>;

    #[test]
    fn missing_loaders() {
        let result = TestBuilder::new().font_loader(FontMap::new()).build();
        assert_eq!(Error::NoLoader("template"), result.unwrap_err());
        let result = TestBuilder::new().template_loader(TemplateMap::new()).build();
        assert_eq!(Error::NoLoader("font"), result.unwrap_err());
    }

    #[test]
    fn jpeg_quality_is_validated() {
        for &quality in [0, 101, 255].iter() {
            let result = TestBuilder::new()
                .template_loader(TemplateMap::new())
                .font_loader(FontMap::new())
                .jpeg_quality(quality)
                .build();
            assert_eq!(Error::JpegQuality(quality), result.unwrap_err());
        }
    }

    #[test]
    fn empty_ladder_is_rejected() {
        let result = TestBuilder::new()
            .template_loader(TemplateMap::new())
            .font_loader(FontMap::new())
            .font_ladder(FontLadder::new(vec![]))
            .build();
        assert_eq!(Error::EmptyLadder, result.unwrap_err());
    }

    #[test]
    fn nonpositive_sizes_are_rejected() {
        let result = TestBuilder::new()
            .template_loader(TemplateMap::new())
            .font_loader(FontMap::new())
            .font_ladder(FontLadder::new(vec![Rung::new(64.0, "a"), Rung::new(0.0, "a")]))
            .build();
        assert_eq!(Error::FontSize(0.0), result.unwrap_err());
    }

    #[test]
    fn configuration_is_applied() {
        let engine = TestBuilder::new()
            .template_loader(TemplateMap::new())
            .font_loader(FontMap::new())
            .template_cache_size(4)
            .jpeg_quality(70)
            .margin(20.0)
            .build().unwrap();
        assert_eq!(70, engine.config().jpeg_quality);
        assert_eq!(20.0, engine.config().margin);
        assert_eq!(Some(4), engine.template_cache().map(|c| c.capacity()));
    }
}
