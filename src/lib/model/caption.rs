//! Module implementing the `Caption` type.

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use itertools::Itertools;


/// Two-line text rendered on the image macro.
///
/// The first line goes on top of the image, the second one at the bottom.
/// Either of them may be empty.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct Caption {
    /// Text rendered at the top of the image.
    pub top: String,
    /// Text rendered at the bottom of the image.
    pub bottom: String,
}

impl Caption {
    /// Create a `Caption` from separate top & bottom texts.
    /// Surrounding whitespace is trimmed from both.
    #[inline]
    pub fn new<T, B>(top: T, bottom: B) -> Self
        where T: AsRef<str>, B: AsRef<str>
    {
        Caption{
            top: top.as_ref().trim().to_owned(),
            bottom: bottom.as_ref().trim().to_owned(),
        }
    }

    /// Split caption text into top & bottom lines.
    ///
    /// Everything before the first newline is the top text.
    /// Whatever follows makes up the bottom text; if there are more lines there,
    /// the non-blank ones are joined with spaces.
    pub fn parse(text: &str) -> Self {
        let mut parts = text.splitn(2, '\n');
        let top = parts.next().unwrap_or("").trim().to_owned();
        let bottom = parts.next()
            .map(|rest| rest.lines().map(str::trim).filter(|l| !l.is_empty()).join(" "))
            .unwrap_or_else(String::new);
        Caption{top, bottom}
    }
}

impl Caption {
    /// The top text, unless it's empty.
    #[inline]
    pub fn top(&self) -> Option<&str> {
        Some(self.top.as_str()).filter(|t| !t.is_empty())
    }

    /// The bottom text, unless it's empty.
    #[inline]
    pub fn bottom(&self) -> Option<&str> {
        Some(self.bottom.as_str()).filter(|t| !t.is_empty())
    }

    /// Whether the caption has no text at all.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.top.is_empty() && self.bottom.is_empty()
    }

    /// Iterate over the non-empty lines of the caption.
    pub fn lines<'c>(&'c self) -> impl Iterator<Item=&'c str> + 'c {
        self.top().into_iter().chain(self.bottom())
    }

    /// Total length of the caption text in bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.top.len() + self.bottom.len()
    }
}

impl fmt::Display for Caption {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        if self.bottom.is_empty() {
            write!(fmt, "{}", self.top)
        } else {
            write!(fmt, "{}\n{}", self.top, self.bottom)
        }
    }
}

impl fmt::Debug for Caption {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        write!(fmt, "Caption({:?} / {:?})", self.top, self.bottom)
    }
}

impl FromStr for Caption {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Caption::parse(s))
    }
}

impl<'s> From<&'s str> for Caption {
    fn from(s: &'s str) -> Self {
        Caption::parse(s)
    }
}
