//! Module which defines the captioning engine.

mod builder;
mod config;

pub use self::builder::{Builder, Error as BuildError};
pub use self::config::{BottomPlacement, Config as EngineConfig, FontLadder, Rung};


use std::fmt;
use std::path::Path;
use std::sync::Arc;

use antidote::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::model::Caption;
use crate::resources::{CachingLoader, FontLoader, Loader, Template, TemplateLoader};
use crate::util::cache::ThreadSafeCache;
use super::error::CaptionError;
use super::output::CaptionOutput;
use super::task::CaptionTask;
use super::text::Typeface;


/// Image captioning engine.
///
/// Fits the caption text with a font ladder, lays it out over the template
/// and encodes the result as JPEG. Engines are `Send + Sync`,
/// and cloning one only clones a shared reference to its state.
pub struct Engine<Tl = TemplateLoader, Fl = FontLoader>
    where Tl: Loader<Item=Template>, Fl: Loader, Fl::Item: Typeface
{
    inner: Arc<Inner<Tl, Fl>>,
}

/// Shared state of the engine that caption tasks have access to.
pub(super) struct Inner<Tl, Fl>
    where Tl: Loader<Item=Template>, Fl: Loader, Fl::Item: Typeface
{
    pub(super) config: RwLock<EngineConfig>,
    pub template_loader: CachingLoader<Tl>,
    pub font_loader: CachingLoader<Fl>,
}

impl<Tl, Fl> From<Inner<Tl, Fl>> for Engine<Tl, Fl>
    where Tl: Loader<Item=Template>, Fl: Loader, Fl::Item: Typeface
{
    fn from(inner: Inner<Tl, Fl>) -> Self {
        Engine{inner: Arc::new(inner)}
    }
}

impl<Tl, Fl> Clone for Engine<Tl, Fl>
    where Tl: Loader<Item=Template>, Fl: Loader, Fl::Item: Typeface
{
    fn clone(&self) -> Self {
        Engine{inner: self.inner.clone()}
    }
}

impl<Tl, Fl> fmt::Debug for Engine<Tl, Fl>
    where Tl: Loader<Item=Template>, Fl: Loader, Fl::Item: Typeface
{
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt.debug_struct("Engine")
            .field("config", &*self.inner.config.read())
            .field("template_loader", &self.inner.template_loader)
            .field("font_loader", &self.inner.font_loader)
            .finish()
    }
}

// Constructors.
impl Engine<TemplateLoader, FontLoader> {
    /// Engine with default configuration, reading templates and fonts
    /// from given directories. Both are kept in LRU caches once loaded.
    #[inline]
    pub fn new<Dt, Df>(template_directory: Dt, font_directory: Df) -> Result<Self, BuildError>
        where Dt: AsRef<Path>, Df: AsRef<Path>
    {
        Builder::<TemplateLoader, FontLoader>::new()
            .template_directory(template_directory)
            .font_directory(font_directory)
            .build()
    }
}
impl<Tl, Fl> Engine<Tl, Fl>
    where Tl: Loader<Item=Template>, Fl: Loader, Fl::Item: Typeface
{
    /// Engine with custom loaders, whose resources are cached by the engine.
    #[inline]
    pub fn with_loaders(template_loader: Tl, font_loader: Fl) -> Result<Self, BuildError> {
        Builder::new()
            .template_loader(template_loader)
            .font_loader(font_loader)
            .build()
    }

    /// Engine with custom loaders, whose resources are never cached by the engine.
    #[inline]
    pub fn with_raw_loaders(template_loader: Tl, font_loader: Fl) -> Result<Self, BuildError> {
        Builder::new()
            .raw_template_loader(template_loader)
            .raw_font_loader(font_loader)
            .build()
    }
}


// Captioning.
impl<Tl, Fl> Engine<Tl, Fl>
    where Tl: Loader<Item=Template>, Fl: Loader, Fl::Item: Typeface
{
    /// Render the caption onto the template with given name,
    /// producing a JPEG image.
    ///
    /// Note that captioning is a CPU-intensive process.
    /// It is recommended to execute it in a separate thread.
    #[inline]
    pub fn caption(&self, template: &str, caption: &Caption) -> Result<CaptionOutput, CaptionError> {
        CaptionTask::new(template, caption, self.inner.clone()).perform()
    }
}

// Managing resources.
impl<Tl, Fl> Engine<Tl, Fl>
    where Tl: Loader<Item=Template>, Fl: Loader, Fl::Item: Typeface
{
    /// Load a template into the engine's cache ahead of time.
    /// Does nothing if templates aren't cached.
    pub fn preload_template(&self, name: &str) -> Result<(), Tl::Err> {
        if self.template_cache().is_some() {
            self.inner.template_loader.load(name)?;
        }
        Ok(())
    }

    /// Load a font into the engine's cache ahead of time.
    /// Does nothing if fonts aren't cached.
    pub fn preload_font(&self, name: &str) -> Result<(), Fl::Err> {
        if self.font_cache().is_some() {
            self.inner.font_loader.load(name)?;
        }
        Ok(())
    }

    /// The template cache, if any, e.g. for its hit & miss statistics.
    #[inline]
    pub fn template_cache(&self) -> Option<&ThreadSafeCache<String, Tl::Item>> {
        self.inner.template_loader.cache()
    }

    #[inline]
    pub fn font_cache(&self) -> Option<&ThreadSafeCache<String, Fl::Item>> {
        self.inner.font_loader.cache()
    }
}

// Configuration.
impl<Tl, Fl> Engine<Tl, Fl>
    where Tl: Loader<Item=Template>, Fl: Loader, Fl::Item: Typeface
{
    /// Read the `Engine`'s configuration.
    #[inline]
    pub fn config(&self) -> RwLockReadGuard<EngineConfig> {
        self.inner.config.read()
    }

    /// Modify the `Engine`'s configuration.
    ///
    /// Changes will affect captioning tasks started afterwards.
    #[inline]
    pub fn config_mut(&self) -> RwLockWriteGuard<EngineConfig> {
        self.inner.config.write()
    }
}
