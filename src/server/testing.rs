//! Helpers for the server tests.

use std::fs;

use quip::{Catalog, EngineBuilder, FileStorage, FontLoader, MemeTemplate, Pipeline,
           TemplateLoader, TextPosition};
use tempfile::TempDir;


/// Create a pipeline backed by a temporary data directory
/// with a single, blank template (`blank`) and no fonts.
pub fn pipeline(dir: &TempDir) -> Pipeline {
    let templates = dir.path().join("templates");
    fs::create_dir_all(&templates).unwrap();
    image::RgbImage::new(120, 80).save(templates.join("blank.png")).unwrap();

    let catalog = Catalog::new(vec![MemeTemplate{
        id: "blank".into(),
        name: "Blank".into(),
        image: "blank.png".into(),
        description: "Nothing to see here".into(),
        instructions: None,
        text_position: TextPosition::Top,
    }]).unwrap();
    let engine = EngineBuilder::<TemplateLoader, FontLoader>::new()
        .template_directory(&templates)
        .font_directory(dir.path().join("fonts"))
        .build().unwrap();
    let storage = FileStorage::new(dir.path().join("generated"), "/generated");
    Pipeline::new(catalog, engine, storage)
}
