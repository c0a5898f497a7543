//! Module with the text rendering abstraction.

use image::{Rgba, RgbaImage};


/// A face that caption text can be measured & drawn with.
///
/// Sizes are in pixels (the height of a line of text at scale 1.0).
pub trait Typeface: Send + Sync {
    /// Rendered width of a single line of text.
    fn text_width(&self, text: &str, size: f32) -> f32;

    /// Draw a single line of text so that its top-left corner is at `(x, y)`.
    /// Parts falling outside of the canvas are clipped.
    fn draw_line(&self, canvas: &mut RgbaImage, text: &str, size: f32,
                 x: f32, y: f32, color: Rgba<u8>);

    /// Characters of the text that the face has no glyphs for.
    fn missing_glyphs(&self, _text: &str) -> Vec<char> {
        vec![]
    }
}


/// Check if given typeface has all the glyphs for given text.
/// Missing ones are only logged, they will be rendered as blanks.
pub fn check<T: Typeface + ?Sized>(face: &T, font: &str, text: &str) {
    let missing = face.missing_glyphs(text);
    if !missing.is_empty() {
        warn!("Font `{}` is missing glyphs for {} codepoint(s): {}", font, missing.len(),
            missing.into_iter().map(|c| format!("{:#x}", c as u32)).collect::<Vec<_>>().join(", "));
    }
}
