//! Module implementing the actual captioning task.
//! Most if not all captioning logic lives here.

use std::sync::Arc;

use image::{DynamicImage, RgbaImage};
use image::codecs::jpeg::JpegEncoder;
use unicode_normalization::UnicodeNormalization;

use crate::model::Caption;
use crate::resources::{Loader, Template};
use super::engine::{self, EngineConfig};
use super::error::CaptionError;
use super::layout;
use super::output::CaptionOutput;
use super::text::{self, Typeface};


/// Represents a single captioning task and contains all the relevant logic.
///
/// All the code here is executed in a background thread,
/// and so it can be synchronous.
pub(super) struct CaptionTask<Tl, Fl>
    where Tl: Loader<Item=Template>, Fl: Loader, Fl::Item: Typeface
{
    template: String,
    top: String,
    bottom: String,
    engine: Arc<engine::Inner<Tl, Fl>>,
}

impl<Tl, Fl> CaptionTask<Tl, Fl>
    where Tl: Loader<Item=Template>, Fl: Loader, Fl::Item: Typeface
{
    #[inline]
    pub fn new(template: &str, caption: &Caption, engine: Arc<engine::Inner<Tl, Fl>>) -> Self {
        // Normalize the text so that combining characters have a better chance
        // of mapping onto single glyphs.
        let top = caption.top().unwrap_or("").nfc().collect();
        let bottom = caption.bottom().unwrap_or("").nfc().collect();
        CaptionTask{template: template.to_owned(), top, bottom, engine}
    }
}

impl<Tl, Fl> CaptionTask<Tl, Fl>
    where Tl: Loader<Item=Template>, Fl: Loader, Fl::Item: Typeface
{
    /// Perform the captioning task.
    pub fn perform(self) -> Result<CaptionOutput, CaptionError> {
        debug!("Rendering top={:?} bottom={:?} on template `{}`",
            self.top, self.bottom, self.template);
        let config = self.engine.config.read().clone();

        let template = self.engine.template_loader.load(&self.template)
            .map_err(|e| CaptionError::template(self.template.clone(), e))?;
        let dimensions = (template.width(), template.height());
        trace!("Size of the template image `{}`: {}x{}",
            self.template, dimensions.0, dimensions.1);

        // Rendering text requires alpha blending,
        // and the template itself must stay intact.
        let mut canvas = template.image().to_rgba8();

        let mut font_size = None;
        if self.top.is_empty() && self.bottom.is_empty() {
            debug!("Empty caption text, skipping.");
        } else {
            let (face, size) = self.select_font(&config, dimensions.0)?;
            self.draw_texts(&mut canvas, &*face, size, &config);
            font_size = Some(size);
        }

        let bytes = self.encode_result(canvas, config.jpeg_quality)?;
        Ok(CaptionOutput::new(bytes, dimensions, font_size))
    }

    /// Pick the largest rung of the font ladder at which the longer caption line
    /// fits within the image, loading the fonts along the way.
    fn select_font(&self, config: &EngineConfig,
                   image_width: u32) -> Result<(Arc<Fl::Item>, f32), CaptionError> {
        let rungs = config.ladder.rungs();
        let available = image_width as f32 - config.margin;
        trace!("Width available for text: {}", available);

        let mut faces: Vec<Option<Arc<Fl::Item>>> = vec![None; rungs.len()];
        let chosen = layout::choose_rung(rungs.len(), available, |i| {
            let rung = &rungs[i];
            let face = match self.engine.font_loader.load(&rung.font) {
                Ok(face) => face,
                Err(e) => {
                    warn!("Cannot use font `{}` for size {}: {}", rung.font, rung.size, e);
                    return None;
                }
            };
            let width = face.text_width(&self.top, rung.size)
                .max(face.text_width(&self.bottom, rung.size));
            trace!("Caption is {} wide with font `{}` at size {}", width, rung.font, rung.size);
            faces[i] = Some(face);
            Some(width)
        });

        let index = match chosen {
            Some(i) => i,
            None => {
                let fonts = config.ladder.fonts().into_iter().map(String::from).collect();
                return Err(CaptionError::FontUnavailable{fonts});
            }
        };
        let rung = &rungs[index];
        debug!("Using font `{}` at size {}", rung.font, rung.size);

        let face = faces[index].take().ok_or_else(|| CaptionError::FontUnavailable{
            fonts: vec![rung.font.clone()],
        })?;
        text::check(&*face, &rung.font, &format!("{}{}", self.top, self.bottom));
        Ok((face, rung.size))
    }

    /// Draw both caption lines on the canvas.
    fn draw_texts(&self, canvas: &mut RgbaImage, face: &Fl::Item,
                  size: f32, config: &EngineConfig) {
        let dimensions = canvas.dimensions();
        let lines = layout::place_caption(
            &self.top, &self.bottom, dimensions, size, config,
            |s| face.text_width(s, size));
        for line in lines {
            trace!("Drawing {:?} at ({}, {})", line.text, line.x, line.y);
            face.draw_line(canvas, &line.text, size, line.x, line.y, config.text_color);
        }
    }

    /// Encode final result as JPEG bytes.
    fn encode_result(&self, canvas: RgbaImage, quality: u8) -> Result<Vec<u8>, CaptionError> {
        trace!("Writing JPEG with quality {}", quality);
        // JPEG has no alpha channel.
        let img = DynamicImage::ImageRgb8(DynamicImage::ImageRgba8(canvas).to_rgb8());

        let mut result = vec![];
        img.write_with_encoder(JpegEncoder::new_with_quality(&mut result, quality))?;
        Ok(result)
    }
}
