//! Module implementing image captioning.

mod engine;
mod error;
mod layout;
mod output;
mod task;
mod text;


pub use self::engine::{BottomPlacement,
                       Builder as EngineBuilder,
                       BuildError as EngineBuildError,
                       Engine,
                       EngineConfig,
                       FontLadder,
                       Rung};
pub use self::error::CaptionError;
pub use self::layout::wrap_words;
pub use self::output::CaptionOutput;
pub use self::text::Typeface;
