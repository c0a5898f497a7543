//! Module defining constants relevant to the data model.


/// Name of the default font asset.
pub const DEFAULT_FONT: &'static str = "open-sans";

/// Point sizes of the default font ladder, largest first.
pub const DEFAULT_FONT_SIZES: &'static [f32] = &[128.0, 64.0, 32.0];

/// Horizontal space (in pixels) that caption lines must leave free.
///
/// A line fits if its width is at most `image width - DEFAULT_MARGIN`.
pub const DEFAULT_MARGIN: f32 = 60.0;

/// Distance (in pixels) of the first top caption line from the top edge.
pub const DEFAULT_TOP_OFFSET: f32 = 30.0;
/// Distance (in pixels) left below the bottom caption block.
pub const DEFAULT_BOTTOM_MARGIN: f32 = 30.0;

/// Line height as a multiple of the font size.
pub const DEFAULT_LINE_SPACING: f32 = 1.5;

/// Quality of the generated JPEG images (in %).
pub const DEFAULT_JPEG_QUALITY: u8 = 85;


/// Maximum length (in bytes) of the whole caption text.
pub const MAX_CAPTION_LENGTH: usize = 1024;
/// Maximum length (in bytes) of a generation prompt.
pub const MAX_PROMPT_LENGTH: usize = 2048;
