//! Module with the pure text layout logic.
//!
//! All the functions here measure text through a closure,
//! so they don't depend on any particular font implementation.

use super::engine::{BottomPlacement, EngineConfig};


/// A line of text positioned on the image.
/// Coordinates are of the line's top-left corner.
#[derive(Clone, Debug, PartialEq)]
pub struct PlacedLine {
    pub text: String,
    pub x: f32,
    pub y: f32,
}


/// Choose the font size from a ladder of `count` rungs (ordered largest to smallest).
///
/// `measure` returns the width of the text at given rung,
/// or `None` if that rung cannot be used at all.
///
/// The first rung where the text fits in `available` width is chosen.
/// If there is none, the smallest rung is used.
///
/// Once a rung turns out to be unusable, the search stops and the smallest
/// usable rung is returned instead (looking upward from the bottom of the ladder).
/// `None` means no rung is usable.
pub fn choose_rung<M>(count: usize, available: f32, mut measure: M) -> Option<usize>
    where M: FnMut(usize) -> Option<f32>
{
    let mut smallest_usable = None;
    for i in 0..count {
        match measure(i) {
            Some(width) if width <= available => return Some(i),
            Some(_) => smallest_usable = Some(i),
            None => {
                let below = (i + 1..count).rev().find(|&j| measure(j).is_some());
                return below.or(smallest_usable);
            }
        }
    }
    smallest_usable
}


/// Greedily break text into lines no wider than `max_width`.
///
/// Words are separated by whitespace and joined back with single spaces.
/// A word that's wider than `max_width` on its own gets a line to itself
/// (words are never broken).
pub fn wrap_words<W>(text: &str, max_width: f32, width: W) -> Vec<String>
    where W: Fn(&str) -> f32
{
    let mut lines = vec![];
    let mut current = String::new();
    for word in text.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_owned()
        } else {
            format!("{} {}", current, word)
        };
        if width(&candidate) > max_width && !current.is_empty() {
            lines.push(current);
            current = word.to_owned();
        } else {
            current = candidate;
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}


/// Number of lines that the bottom text is expected to occupy,
/// judging only by its unwrapped width.
pub fn estimated_line_count(unwrapped_width: f32, available: f32) -> usize {
    if unwrapped_width <= 0.0 {
        return 0;
    }
    (unwrapped_width / available.max(1.0)).ceil() as usize
}


/// Lay out both lines of a caption onto an image of given size,
/// using text of given font size.
///
/// Empty lines produce no output.
pub fn place_caption<W>(top: &str, bottom: &str,
                        (width, height): (u32, u32), size: f32,
                        config: &EngineConfig, measure: W) -> Vec<PlacedLine>
    where W: Fn(&str) -> f32
{
    let image_width = width as f32;
    let available = image_width - config.margin;
    let line_height = size * config.line_spacing;
    let center = |text: String, y: f32| {
        let x = (image_width - measure(&text)) / 2.0;
        PlacedLine{text, x, y}
    };

    let mut placed = vec![];

    let top = top.trim();
    if !top.is_empty() {
        let lines = wrap_words(top, available, &measure);
        trace!("Top text wrapped into {} line(s)", lines.len());
        for (i, line) in lines.into_iter().enumerate() {
            let y = config.top_offset + i as f32 * line_height;
            placed.push(center(line, y));
        }
    }

    let bottom = bottom.trim();
    if !bottom.is_empty() {
        let lines = wrap_words(bottom, available, &measure);
        let line_count = match config.bottom_placement {
            BottomPlacement::Estimated => estimated_line_count(measure(bottom), available),
            BottomPlacement::Wrapped => lines.len(),
        };
        trace!("Bottom text wrapped into {} line(s), {} assumed for placement",
            lines.len(), line_count);

        let start = height as f32 - line_count as f32 * line_height - config.bottom_margin;
        for (i, line) in lines.into_iter().enumerate() {
            let y = start + i as f32 * line_height;
            placed.push(center(line, y));
        }
    }

    placed
}


#[cfg(test)]
mod tests {
    use spectral::prelude::*;
    use crate::caption::engine::{BottomPlacement, EngineConfig};
    use super::{choose_rung, estimated_line_count, place_caption, wrap_words};
    use spectral::{AssertionFailure, Spec};

    /// spectral 0.6 only ships `is_empty` for `Vec`; this supplies its negation.
    trait VecNotEmpty {
        fn is_not_empty(&mut self);
    }

    impl<'s, T> VecNotEmpty for Spec<'s, Vec<T>> {
        fn is_not_empty(&mut self) {
            if self.subject.is_empty() {
                AssertionFailure::from_spec(self)
                    .with_expected(String::from("a non-empty vec"))
                    .with_actual(String::from("an empty vec"))
                    .fail();
            }
        }
    }

    /// Every character is 10 units wide at the sizes used here.
    fn monospace(text: &str) -> f32 {
        text.chars().count() as f32 * 10.0
    }

    #[test]
    fn largest_size_that_fits() {
        // 500px wide image with margin 60: widths measured at 128/64/32.
        let widths = [900.0, 430.0, 210.0];
        let chosen = choose_rung(3, 500.0 - 60.0, |i| Some(widths[i]));
        assert_eq!(Some(1), chosen);
    }

    #[test]
    fn first_rung_when_everything_fits() {
        let chosen = choose_rung(3, 440.0, |i| Some([100.0, 50.0, 25.0][i]));
        assert_eq!(Some(0), chosen);
    }

    #[test]
    fn smallest_rung_when_nothing_fits() {
        let chosen = choose_rung(3, 440.0, |i| Some([4000.0, 2000.0, 1000.0][i]));
        assert_eq!(Some(2), chosen);
    }

    #[test]
    fn exact_fit_counts() {
        let chosen = choose_rung(2, 440.0, |i| Some([440.0, 220.0][i]));
        assert_eq!(Some(0), chosen);
    }

    #[test]
    fn unusable_rungs_are_skipped() {
        let widths = [None, Some(300.0), None];
        assert_eq!(Some(1), choose_rung(3, 440.0, |i| widths[i]));

        // Nothing fits, so the smallest usable rung wins.
        let widths = [Some(4000.0), Some(2000.0), None];
        assert_eq!(Some(1), choose_rung(3, 440.0, |i| widths[i]));

        assert_eq!(None, choose_rung(3, 440.0, |_| None));
    }

    #[test]
    fn unusable_rung_falls_back_to_smallest() {
        // The middle rung would fit, but after the top one fails
        // the bottom of the ladder is used.
        let widths = [None, Some(300.0), Some(150.0)];
        assert_eq!(Some(2), choose_rung(3, 440.0, |i| widths[i]));

        let widths = [Some(4000.0), None, Some(1000.0), None];
        assert_eq!(Some(2), choose_rung(4, 440.0, |i| widths[i]));

        // Rungs above the failed one are kept if nothing below it loads.
        let widths = [Some(4000.0), None, None];
        assert_eq!(Some(0), choose_rung(3, 440.0, |i| widths[i]));
    }

    #[test]
    fn wrapped_lines_stay_within_width() {
        let texts = [
            "one does not simply walk into mordor",
            "when you finally fix the bug but the tests were wrong all along",
            "a supercalifragilisticexpialidocious word among short ones",
            "x y z",
            "brace yourselves, winter is coming",
        ];
        for text in &texts {
            for &max_width in &[30.0, 50.0, 80.0, 120.0, 200.0, 440.0] {
                let lines = wrap_words(text, max_width, monospace);
                assert_that!(lines).is_not_empty();
                for line in &lines {
                    let sole_word = !line.contains(' ');
                    assert!(monospace(line) <= max_width || sole_word,
                        "line {:?} of {:?} exceeds {}", line, text, max_width);
                }
                assert_eq!(text.split_whitespace().collect::<Vec<_>>().join(" "), lines.join(" "));
            }
        }
    }

    #[test]
    fn wrap_respects_width() {
        let lines = wrap_words("one does not simply walk into mordor", 120.0, monospace);
        assert_eq!(vec!["one does not", "simply walk", "into mordor"], lines);
        for line in &lines {
            assert_that!(monospace(line)).is_less_than_or_equal_to(120.0);
        }
    }

    #[test]
    fn wrap_keeps_long_words_whole() {
        let lines = wrap_words("a supercalifragilistic word", 100.0, monospace);
        assert_eq!(vec!["a", "supercalifragilistic", "word"], lines);
    }

    #[test]
    fn wrap_normalizes_whitespace() {
        let lines = wrap_words("  lots \t of   space ", 1000.0, monospace);
        assert_eq!(vec!["lots of space"], lines);
        assert_that!(wrap_words("   ", 1000.0, monospace)).is_empty();
    }

    #[test]
    fn estimated_lines() {
        assert_eq!(0, estimated_line_count(0.0, 440.0));
        assert_eq!(1, estimated_line_count(440.0, 440.0));
        assert_eq!(2, estimated_line_count(441.0, 440.0));
        assert_eq!(3, estimated_line_count(1000.0, 440.0));
    }

    #[test]
    fn top_lines_go_down_from_offset() {
        let config = EngineConfig::default();
        let placed = place_caption("hello world", "", (500, 400), 64.0, &config, monospace);
        assert_eq!(1, placed.len());
        assert_eq!("hello world", placed[0].text);
        assert_eq!(30.0, placed[0].y);
        assert_eq!((500.0 - 110.0) / 2.0, placed[0].x);
    }

    #[test]
    fn top_lines_are_spaced_by_line_height() {
        let config = EngineConfig::default();
        let text = "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb";
        let placed = place_caption(text, "", (500, 400), 32.0, &config, monospace);
        assert_eq!(2, placed.len());
        assert_eq!(30.0, placed[0].y);
        assert_eq!(30.0 + 48.0, placed[1].y);
    }

    #[test]
    fn empty_bottom_is_not_placed() {
        let config = EngineConfig::default();
        let placed = place_caption("top", "   ", (500, 400), 64.0, &config, monospace);
        assert_eq!(vec!["top"], placed.iter().map(|p| p.text.as_str()).collect::<Vec<_>>());
    }

    #[test]
    fn bottom_block_is_anchored_to_bottom_edge() {
        let config = EngineConfig::default();
        let placed = place_caption("", "bottom", (500, 400), 64.0, &config, monospace);
        assert_eq!(1, placed.len());
        // 400 - 1 * (64 * 1.5) - 30
        assert_eq!(274.0, placed[0].y);
    }

    #[test]
    fn bottom_placement_modes() {
        // Three 25-char words are 770 units wide unwrapped, which is estimated
        // as two lines of 440 units, but no two of them fit on one line.
        let word = "w".repeat(25);
        let text = format!("{} {} {}", word, word, word);
        let mut config = EngineConfig::default();

        let estimated = place_caption("", &text, (500, 400), 32.0, &config, monospace);
        assert_eq!(3, estimated.len());
        assert_eq!(400.0 - 2.0 * 48.0 - 30.0, estimated[0].y);
        assert_eq!(400.0 - 2.0 * 48.0 - 30.0 + 2.0 * 48.0, estimated[2].y);

        config.bottom_placement = BottomPlacement::Wrapped;
        let wrapped = place_caption("", &text, (500, 400), 32.0, &config, monospace);
        assert_eq!(3, wrapped.len());
        assert_eq!(400.0 - 3.0 * 48.0 - 30.0, wrapped[0].y);
    }
}
