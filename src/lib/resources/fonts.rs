//! Module for loading fonts used in image macros.

use std::fmt;
use std::io;
use std::ops::Deref;
use std::path::Path;

use image::{Pixel, Rgba, RgbaImage};
use rusttype::{self, point, GlyphId, Scale};
use thiserror::Error;

use crate::caption::Typeface;
use super::Loader;
use super::filesystem::BytesLoader;


pub const FILE_EXTENSION: &'static str = "ttf";


/// Font that can be used to caption image macros.
pub struct Font {
    name: String,
    inner: rusttype::Font<'static>,
}

impl Font {
    /// Parse a TrueType font from the content of a font file.
    pub fn from_bytes<N: Into<String>>(name: N, bytes: Vec<u8>) -> Result<Self, FontError> {
        let name = name.into();
        match rusttype::Font::try_from_vec(bytes) {
            Some(inner) => Ok(Font{name, inner}),
            None => Err(FontError::Invalid(name)),
        }
    }

    /// Name of the font resource.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Deref for Font {
    type Target = rusttype::Font<'static>;
    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl fmt::Debug for Font {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        write!(fmt, "Font({:?})", self.name)
    }
}

impl Typeface for Font {
    fn text_width(&self, text: &str, size: f32) -> f32 {
        // Width is the final X position of the "caret"
        // after laying out all the glyphs, starting from X=0.
        self.layout(text, Scale::uniform(size), point(0.0, 0.0))
            .last()
            .map(|g| g.position().x + g.unpositioned().h_metrics().advance_width)
            .unwrap_or(0.0)
    }

    fn draw_line(&self, canvas: &mut RgbaImage, text: &str, size: f32,
                 x: f32, y: f32, color: Rgba<u8>) {
        let scale = Scale::uniform(size);
        let v_metrics = self.v_metrics(scale);
        let (width, height) = canvas.dimensions();

        // Layout is relative to the baseline, so move it down from the top of the line.
        let origin = point(x, y + v_metrics.ascent);
        let [r, g, b, a] = color.0;
        for glyph in self.layout(text, scale, origin) {
            if let Some(bbox) = glyph.pixel_bounding_box() {
                glyph.draw(|gx, gy, v| {
                    let px = bbox.min.x + gx as i32;
                    let py = bbox.min.y + gy as i32;
                    if px < 0 || py < 0 || px as u32 >= width || py as u32 >= height {
                        return;
                    }
                    let alpha = (v * a as f32) as u8;
                    canvas.get_pixel_mut(px as u32, py as u32).blend(&Rgba([r, g, b, alpha]));
                });
            }
        }
    }

    fn missing_glyphs(&self, text: &str) -> Vec<char> {
        let mut missing: Vec<_> = text.chars()
            .filter(|c| !c.is_whitespace())
            .filter(|&c| self.glyph(c).id() == GlyphId(0))
            .collect();
        missing.sort();
        missing.dedup();
        missing
    }
}


/// Error while loading a font.
#[derive(Debug, Error)]
pub enum FontError {
    #[error("cannot read font file: {0}")]
    Io(#[from] io::Error),
    #[error("font file for `{0}` is not a valid TrueType font")]
    Invalid(String),
}


#[derive(Debug)]
pub struct FontLoader {
    inner: BytesLoader<'static>,
}

impl FontLoader {
    pub fn new<D: AsRef<Path>>(directory: D) -> Self {
        FontLoader{
            inner: BytesLoader::for_extension(directory, FILE_EXTENSION),
        }
    }
}

impl Loader for FontLoader {
    type Item = Font;
    type Err = FontError;

    fn load<'n>(&self, name: &'n str) -> Result<Font, Self::Err> {
        let bytes = self.inner.load(name)?;
        let font = Font::from_bytes(name, bytes).map_err(|e| {
            error!("Failed to parse font `{}`: {}", name, e); e
        })?;
        debug!("Font `{}` loaded successfully", name);
        Ok(font)
    }
}


#[cfg(test)]
mod tests {
    use std::fs;
    use tempfile::TempDir;
    use super::{FontError, FontLoader, Loader};

    #[test]
    fn missing_font() {
        let dir = TempDir::new().unwrap();
        match FontLoader::new(dir.path()).load("open-sans") {
            Err(FontError::Io(_)) => {}
            other => panic!("expected an I/O error, got {:?}", other),
        }
    }

    #[test]
    fn invalid_font() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("broken.ttf"), b"definitely not a font").unwrap();
        match FontLoader::new(dir.path()).load("broken") {
            Err(FontError::Invalid(name)) => assert_eq!("broken", name),
            other => panic!("expected an invalid font error, got {:?}", other),
        }
    }
}
