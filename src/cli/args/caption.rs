//! Module handling the caption text given on the command line.
//!
//! Typing actual line breaks in a shell is awkward, so either a `|` character
//! or a literal `\n` escape can be used to separate the lines of a caption.


/// Character that separates caption lines on the command line.
const LINE_SEPARATOR: char = '|';
/// Escape sequence that also separates caption lines.
const LINE_ESCAPE: &'static str = "\\n";


/// Convert the caption argument into the caption text proper.
pub fn caption_text(arg: &str) -> String {
    arg.replace(LINE_ESCAPE, "\n")
        .split(LINE_SEPARATOR)
        .map(str::trim)
        .collect::<Vec<_>>()
        .join("\n")
}


#[cfg(test)]
mod tests {
    use super::caption_text;

    #[test]
    fn single_line() {
        assert_eq!("", caption_text(""));
        assert_eq!("One does not simply", caption_text("One does not simply"));
    }

    #[test]
    fn separators() {
        assert_eq!("Top\nBottom", caption_text("Top|Bottom"));
        assert_eq!("Top\nBottom", caption_text("Top | Bottom"));
        assert_eq!("Top\nBottom", caption_text("Top\\nBottom"));
        assert_eq!("\nBottom only", caption_text("|Bottom only"));
    }

    #[test]
    fn more_lines() {
        assert_eq!("a\nb\nc", caption_text("a|b\\nc"));
    }
}
