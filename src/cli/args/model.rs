//! Data structures for command-line arguments.

use std::borrow::Cow;
use std::num::ParseIntError;
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;


/// Structure to hold options received from the command line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Options {
    /// Verbosity of the logging output.
    ///
    /// Corresponds to the number of times the -v flag has been passed.
    /// If -q has been used instead, this will be negative.
    pub verbosity: isize,

    /// What the program should do.
    pub mode: Mode,
    /// ID of the meme template to caption.
    /// Absent only when listing the templates.
    pub template_id: Option<String>,
    /// Verbatim caption, with line breaks already in place.
    pub caption: Option<String>,
    /// Prompt for generating the caption.
    pub prompt: Option<String>,
    /// Quiet window of the --edit mode.
    pub debounce: Duration,
    /// Whether the result should be printed as JSON.
    pub json: bool,

    /// Directory with the catalog, template images and fonts.
    pub data_dir: PathBuf,
    /// Directory to write the rendered images to, if not the default one.
    pub output_dir: Option<PathBuf>,
    /// Quality of the JPEG images, if not the default one.
    pub jpeg_quality: Option<u8>,

    /// Chat model for caption generation.
    pub model: String,
    /// Base URL of the caption generation API.
    pub api_url: String,
    /// Maximum time for a single caption generation.
    pub generation_timeout: Duration,
}

#[allow(dead_code)]
impl Options {
    #[inline]
    pub fn verbose(&self) -> bool { self.verbosity > 0 }
    #[inline]
    pub fn quiet(&self) -> bool { self.verbosity < 0 }
}

impl Options {
    #[inline]
    pub fn catalog_path(&self) -> PathBuf {
        self.data_dir.join("catalog.json")
    }

    #[inline]
    pub fn template_dir(&self) -> PathBuf {
        self.data_dir.join("templates")
    }

    #[inline]
    pub fn font_dir(&self) -> PathBuf {
        self.data_dir.join("fonts")
    }

    pub fn output_dir(&self) -> Cow<Path> {
        match self.output_dir {
            Some(ref dir) => Cow::Borrowed(dir.as_path()),
            None => Cow::Owned(self.data_dir.join("generated")),
        }
    }
}


/// What the program does after parsing the arguments.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Mode {
    /// Render a single meme and exit.
    Render,
    /// Render a meme after every edit of the caption read from standard input.
    Edit,
    /// List the meme templates from the catalog.
    List,
}


/// Error that can occur while parsing of command line arguments.
#[derive(Debug, Error)]
pub enum ArgsError {
    /// General when parsing the arguments.
    #[error("invalid arguments: {0}")]
    Parse(#[from] clap::Error),
    /// Neither caption nor prompt has been given.
    #[error("either a caption, --prompt, or --edit is required")]
    NoCaption,
    /// Invalid JPEG quality.
    #[error("invalid JPEG quality: {0}")]
    Quality(#[from] QualityError),
    /// Invalid duration value.
    #[error("invalid duration `{0}`: {1}")]
    Duration(String, #[source] ParseIntError),
}

#[derive(Debug, Error)]
pub enum QualityError {
    #[error("{0}")]
    Parse(#[from] ParseIntError),
    #[error("{0} is not between 1 and 100")]
    Range(u8),
}
