//! Test doubles for templates & fonts.

use std::collections::HashMap;
use std::io;
use std::sync::{Arc, Mutex};

use image::{DynamicImage, Rgba, RgbaImage, RgbImage};

use crate::caption::Typeface;
use crate::resources::{Loader, Template};


/// A black image of given size.
pub fn blank_image(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::new(width, height))
}


/// Typeface where every character is `advance * size` wide,
/// and glyphs are drawn as filled boxes.
///
/// Clones share the record of lines that have been drawn.
#[derive(Clone, Debug)]
pub struct FixedFace {
    advance: f32,
    drawn: Arc<Mutex<Vec<String>>>,
}

impl FixedFace {
    pub fn new(advance: f32) -> Self {
        FixedFace{advance, drawn: Arc::new(Mutex::new(vec![]))}
    }

    /// Lines drawn with this face (or its clones) so far, in order.
    pub fn drawn_lines(&self) -> Vec<String> {
        self.drawn.lock().unwrap().clone()
    }
}

impl Typeface for FixedFace {
    fn text_width(&self, text: &str, size: f32) -> f32 {
        text.chars().count() as f32 * self.advance * size
    }

    fn draw_line(&self, canvas: &mut RgbaImage, text: &str, size: f32,
                 x: f32, y: f32, color: Rgba<u8>) {
        self.drawn.lock().unwrap().push(text.to_owned());

        let (width, height) = canvas.dimensions();
        let glyph_width = self.advance * size;
        for (i, c) in text.chars().enumerate() {
            if c.is_whitespace() {
                continue;
            }
            let left = x + i as f32 * glyph_width;
            let (x0, x1) = ((left + 1.0).max(0.0) as u32, (left + glyph_width - 1.0).max(0.0) as u32);
            let (y0, y1) = (y.max(0.0) as u32, (y + size).max(0.0) as u32);
            for py in y0..y1.min(height) {
                for px in x0..x1.min(width) {
                    canvas.put_pixel(px, py, color);
                }
            }
        }
    }
}


/// Font "loader" serving typefaces from memory.
#[derive(Debug, Default)]
pub struct FontMap {
    faces: HashMap<String, FixedFace>,
}

impl FontMap {
    pub fn new() -> Self {
        FontMap::default()
    }

    pub fn with(mut self, name: &str, face: FixedFace) -> Self {
        self.faces.insert(name.to_owned(), face); self
    }
}

impl Loader for FontMap {
    type Item = FixedFace;
    type Err = io::Error;

    fn load<'n>(&self, name: &'n str) -> Result<FixedFace, io::Error> {
        self.faces.get(name).cloned().ok_or_else(|| io::Error::new(
            io::ErrorKind::NotFound, format!("no font `{}`", name)))
    }
}


/// Template "loader" serving images from memory.
#[derive(Debug, Default)]
pub struct TemplateMap {
    images: HashMap<String, DynamicImage>,
}

impl TemplateMap {
    pub fn new() -> Self {
        TemplateMap::default()
    }

    pub fn with(mut self, name: &str, image: DynamicImage) -> Self {
        self.images.insert(name.to_owned(), image); self
    }
}

impl Loader for TemplateMap {
    type Item = Template;
    type Err = io::Error;

    fn load<'n>(&self, name: &'n str) -> Result<Template, io::Error> {
        self.images.get(name).cloned().map(Template::from).ok_or_else(|| io::Error::new(
            io::ErrorKind::NotFound, format!("no template `{}`", name)))
    }
}
