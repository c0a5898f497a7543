//! Module with captioning engine configuration.

use std::slice;

use image::Rgba;

use crate::model::constants::{DEFAULT_BOTTOM_MARGIN, DEFAULT_FONT, DEFAULT_FONT_SIZES,
                              DEFAULT_JPEG_QUALITY, DEFAULT_LINE_SPACING, DEFAULT_MARGIN,
                              DEFAULT_TOP_OFFSET};


/// Structure holding configuration for the `Engine`.
///
/// This is shared with `CaptionTask`s.
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    /// Quality of the generated JPEG images (in %).
    pub jpeg_quality: u8,
    /// Font sizes to try when fitting the caption, largest first.
    pub ladder: FontLadder,
    /// Horizontal space (in pixels) subtracted from image width
    /// to obtain the width available for text.
    pub margin: f32,
    /// Distance of the first top line from the top edge.
    pub top_offset: f32,
    /// Distance of the bottom block from the bottom edge.
    pub bottom_margin: f32,
    /// Line height as a multiple of the font size.
    pub line_spacing: f32,
    pub bottom_placement: BottomPlacement,
    pub text_color: Rgba<u8>,
}

impl Default for Config {
    /// Initialize Config with default values.
    fn default() -> Self {
        Config {
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            ladder: FontLadder::default(),
            margin: DEFAULT_MARGIN,
            top_offset: DEFAULT_TOP_OFFSET,
            bottom_margin: DEFAULT_BOTTOM_MARGIN,
            line_spacing: DEFAULT_LINE_SPACING,
            bottom_placement: BottomPlacement::default(),
            text_color: Rgba([0xff, 0xff, 0xff, 0xff]),
        }
    }
}


/// How the starting Y coordinate of the bottom text block is computed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BottomPlacement {
    /// Estimate the line count from the unwrapped width of the text.
    /// This can disagree with the actual wrapping when words don't split evenly.
    Estimated,
    /// Use the number of lines that the text has been actually wrapped into.
    Wrapped,
}

impl Default for BottomPlacement {
    fn default() -> Self { BottomPlacement::Estimated }
}


/// A single font size to try, along with the font to render it with.
#[derive(Clone, Debug, PartialEq)]
pub struct Rung {
    pub size: f32,
    pub font: String,
}

impl Rung {
    #[inline]
    pub fn new<F: Into<String>>(size: f32, font: F) -> Self {
        Rung{size, font: font.into()}
    }
}


/// Ladder of font sizes, ordered from the largest to the smallest.
#[derive(Clone, Debug, PartialEq)]
pub struct FontLadder {
    rungs: Vec<Rung>,
}

impl FontLadder {
    /// Create the ladder from given rungs.
    /// They are sorted so that the largest size comes first.
    pub fn new<I: IntoIterator<Item=Rung>>(rungs: I) -> Self {
        let mut rungs: Vec<_> = rungs.into_iter().collect();
        rungs.sort_by(|a, b| b.size.partial_cmp(&a.size)
            .unwrap_or(::std::cmp::Ordering::Equal));
        FontLadder{rungs}
    }

    /// Create a ladder where every size uses the same scalable font.
    pub fn uniform<F: Into<String>>(font: F, sizes: &[f32]) -> Self {
        let font = font.into();
        Self::new(sizes.iter().map(|&s| Rung::new(s, font.clone())))
    }
}

impl FontLadder {
    #[inline]
    pub fn rungs(&self) -> &[Rung] {
        &self.rungs
    }

    #[inline]
    pub fn iter(&self) -> slice::Iter<Rung> {
        self.rungs.iter()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.rungs.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rungs.is_empty()
    }

    /// Names of all distinct fonts used by the ladder.
    pub fn fonts(&self) -> Vec<&str> {
        let mut fonts: Vec<&str> = vec![];
        for rung in &self.rungs {
            if !fonts.contains(&rung.font.as_str()) {
                fonts.push(&rung.font);
            }
        }
        fonts
    }
}

impl Default for FontLadder {
    fn default() -> Self {
        Self::uniform(DEFAULT_FONT, DEFAULT_FONT_SIZES)
    }
}

impl<'l> IntoIterator for &'l FontLadder {
    type Item = &'l Rung;
    type IntoIter = slice::Iter<'l, Rung>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}


#[cfg(test)]
mod tests {
    use super::{FontLadder, Rung};

    #[test]
    fn default_ladder() {
        let ladder = FontLadder::default();
        let sizes: Vec<_> = ladder.iter().map(|r| r.size).collect();
        assert_eq!(vec![128.0, 64.0, 32.0], sizes);
        assert_eq!(vec!["open-sans"], ladder.fonts());
    }

    #[test]
    fn ladder_is_sorted_descending() {
        let ladder = FontLadder::new(vec![
            Rung::new(32.0, "small"), Rung::new(128.0, "large"), Rung::new(64.0, "medium"),
        ]);
        let fonts: Vec<_> = ladder.iter().map(|r| r.font.as_str()).collect();
        assert_eq!(vec!["large", "medium", "small"], fonts);
    }
}
