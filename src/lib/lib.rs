//!
//! quip  -- Captions on demand
//!

             extern crate antidote;
             extern crate glob;
             extern crate image;
             extern crate itertools;
#[macro_use] extern crate lazy_static;
#[macro_use] extern crate log;
             extern crate lru_cache;
#[macro_use] extern crate maplit;
             extern crate mime;
             extern crate regex;
             extern crate reqwest;
             extern crate rusttype;
             extern crate serde;
#[macro_use] extern crate serde_derive;
             extern crate serde_json;
             extern crate thiserror;
             extern crate time;
             extern crate unicode_normalization;


#[cfg(test)]              extern crate tempfile;
#[cfg(test)] #[macro_use] extern crate spectral;


mod caption;
mod catalog;
mod generation;
mod model;
mod pipeline;
mod resources;
mod storage;
mod util;


pub use caption::*;
pub use catalog::{Catalog, CatalogError, MemeTemplate, TextPosition};
pub use generation::{CaptionGenerator, GenerateError, OpenAiGenerator, API_KEY_VAR,
                     DEFAULT_BASE_URL as DEFAULT_GENERATION_URL,
                     DEFAULT_MODEL as DEFAULT_GENERATION_MODEL};
pub use model::*;
pub use pipeline::{Error as PipelineError, ErrorKind, Pipeline};
pub use resources::*;
pub use storage::{is_artifact_id, Artifact, ArtifactIds, FileStorage, Storage,
                  ARTIFACT_EXTENSION};
pub use util::cache::*;
pub use util::debounce::{Debouncer, DEFAULT_WINDOW_MS as DEFAULT_DEBOUNCE_MS};


#[cfg(test)]
mod testing;
