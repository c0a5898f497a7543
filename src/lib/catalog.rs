//! Module implementing the catalog of meme templates.
//!
//! The catalog is loaded once from a JSON file and never changes afterwards.

use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;
use std::slice;

use thiserror::Error;


/// Where the caption text is anchored by default.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TextPosition {
    Top,
    Bottom,
    Both,
}

impl Default for TextPosition {
    fn default() -> Self { TextPosition::Top }
}


/// A single meme template from the catalog.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct MemeTemplate {
    /// Unique ID of the template.
    pub id: String,
    /// Human-readable name, also used as context for caption generation.
    pub name: String,
    /// Reference to the template image, resolved by the template loader.
    #[serde(rename = "template_url", alias = "image")]
    pub image: String,
    /// Description of the meme and its typical usage.
    #[serde(default)]
    pub description: String,
    /// Additional hints on how the meme should be captioned.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
    /// Default anchoring of the caption text.
    #[serde(rename = "textPosition", default)]
    pub text_position: TextPosition,
}


/// Immutable table of meme templates, indexed by their IDs.
#[derive(Clone, Debug, Default)]
pub struct Catalog {
    templates: Vec<MemeTemplate>,
    index: HashMap<String, usize>,
}

/// Shape of the catalog file.
#[derive(Deserialize)]
struct CatalogFile {
    memes: Vec<MemeTemplate>,
}

// Constructors.
impl Catalog {
    /// Build the catalog from a list of templates.
    ///
    /// Templates retain their order. Duplicate IDs are rejected.
    pub fn new<I: IntoIterator<Item=MemeTemplate>>(templates: I) -> Result<Self, CatalogError> {
        let templates: Vec<_> = templates.into_iter().collect();
        let mut index = HashMap::with_capacity(templates.len());
        for (i, t) in templates.iter().enumerate() {
            if t.id.trim().is_empty() {
                return Err(CatalogError::EmptyId(i));
            }
            if index.insert(t.id.clone(), i).is_some() {
                return Err(CatalogError::DuplicateId(t.id.clone()));
            }
        }
        debug!("Catalog built with {} template(s)", templates.len());
        Ok(Catalog{templates, index})
    }

    /// Load the catalog from JSON of the form `{"memes": [...]}`.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, CatalogError> {
        let file: CatalogFile = serde_json::from_reader(reader)?;
        Self::new(file.memes)
    }

    /// Load the catalog from a JSON file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        trace!("Loading template catalog from {}", path.display());
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }
}

impl Catalog {
    /// Find a template by its ID.
    #[inline]
    pub fn get(&self, id: &str) -> Option<&MemeTemplate> {
        self.index.get(id).map(|&i| &self.templates[i])
    }

    #[inline]
    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Iterate over templates in catalog order.
    #[inline]
    pub fn iter(&self) -> slice::Iter<MemeTemplate> {
        self.templates.iter()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

impl<'c> IntoIterator for &'c Catalog {
    type Item = &'c MemeTemplate;
    type IntoIter = slice::Iter<'c, MemeTemplate>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}


/// Error while loading the template catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("cannot read catalog file: {0}")]
    Io(#[from] io::Error),
    #[error("malformed catalog: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("template #{0} has an empty ID")]
    EmptyId(usize),
    #[error("duplicate template ID `{0}`")]
    DuplicateId(String),
}


#[cfg(test)]
mod tests {
    use spectral::prelude::*;
    use super::{Catalog, CatalogError, TextPosition};

    const CATALOG: &'static str = r#"{
        "memes": [
            {
                "id": "181913649",
                "name": "Drake Hotline Bling",
                "template_url": "/memes/181913649.jpg",
                "description": "Disapproving one thing, approving another",
                "instructions": "Top is rejected, bottom is preferred"
            },
            {
                "id": "135256802",
                "name": "Epic Handshake",
                "template_url": "/memes/135256802.jpg",
                "description": "Two parties agreeing on something",
                "textPosition": "bottom"
            }
        ]
    }"#;

    #[test]
    fn load_from_json() {
        let catalog = Catalog::from_reader(CATALOG.as_bytes()).unwrap();
        assert_eq!(2, catalog.len());

        let drake = catalog.get("181913649").unwrap();
        assert_eq!("Drake Hotline Bling", drake.name);
        assert_eq!("/memes/181913649.jpg", drake.image);
        assert_eq!(TextPosition::Top, drake.text_position);

        let handshake = catalog.get("135256802").unwrap();
        assert_eq!(TextPosition::Bottom, handshake.text_position);
        assert_that!(handshake.instructions).is_none();
    }

    #[test]
    fn preserves_order() {
        let catalog = Catalog::from_reader(CATALOG.as_bytes()).unwrap();
        let ids: Vec<_> = catalog.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(vec!["181913649", "135256802"], ids);
    }

    #[test]
    fn unknown_id() {
        let catalog = Catalog::from_reader(CATALOG.as_bytes()).unwrap();
        assert_that!(catalog.get("nope")).is_none();
        assert!(!catalog.contains("nope"));
    }

    #[test]
    fn duplicate_ids() {
        let json = r#"{"memes": [
            {"id": "1", "name": "A", "template_url": "a.jpg"},
            {"id": "1", "name": "B", "template_url": "b.jpg"}
        ]}"#;
        match Catalog::from_reader(json.as_bytes()) {
            Err(CatalogError::DuplicateId(id)) => assert_eq!("1", id),
            other => panic!("expected duplicate ID error, got {:?}", other),
        }
    }

    #[test]
    fn malformed() {
        assert_that!(Catalog::from_reader("{\"memes\": 42}".as_bytes())).is_err();
        assert_that!(Catalog::from_reader("".as_bytes())).is_err();
    }
}
