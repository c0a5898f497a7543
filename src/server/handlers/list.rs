//! Module with the handlers for listing available meme templates.

use quip::{Catalog, MemeTemplate, TextPosition};


/// Public information about a meme template.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TemplateInfo<'c> {
    pub id: &'c str,
    pub name: &'c str,
    pub description: &'c str,
    #[serde(rename = "textPosition")]
    pub text_position: TextPosition,
}

impl<'c> From<&'c MemeTemplate> for TemplateInfo<'c> {
    fn from(meme: &'c MemeTemplate) -> Self {
        TemplateInfo{
            id: &meme.id,
            name: &meme.name,
            description: &meme.description,
            text_position: meme.text_position,
        }
    }
}


/// List all templates from the catalog, in the catalog order.
pub fn list_templates(catalog: &Catalog) -> Vec<TemplateInfo> {
    debug!("Listing all {} template(s)...", catalog.len());
    catalog.iter().map(TemplateInfo::from).collect()
}

/// Find a single template in the catalog.
pub fn find_template<'c>(catalog: &'c Catalog, id: &str) -> Option<TemplateInfo<'c>> {
    let result = catalog.get(id).map(TemplateInfo::from);
    if result.is_none() {
        debug!("Template `{}` not found in the catalog", id);
    }
    result
}


#[cfg(test)]
mod tests {
    use quip::{Catalog, MemeTemplate, TextPosition};
    use serde_json::json;
    use super::{find_template, list_templates};

    fn catalog() -> Catalog {
        Catalog::new(vec![
            MemeTemplate{
                id: "181913649".into(),
                name: "Drake Hotline Bling".into(),
                image: "drake.jpg".into(),
                description: "Preferring one thing over another".into(),
                instructions: None,
                text_position: TextPosition::Both,
            },
            MemeTemplate{
                id: "87743020".into(),
                name: "Two Buttons".into(),
                image: "buttons.jpg".into(),
                description: String::new(),
                instructions: Some("Two hard choices".into()),
                text_position: TextPosition::Top,
            },
        ]).unwrap()
    }

    #[test]
    fn list_keeps_order() {
        let catalog = catalog();
        let ids: Vec<_> = list_templates(&catalog).into_iter().map(|t| t.id).collect();
        assert_eq!(vec!["181913649", "87743020"], ids);
    }

    #[test]
    fn json_shape() {
        let catalog = catalog();
        let info = find_template(&catalog, "181913649").unwrap();
        assert_eq!(json!({
            "id": "181913649",
            "name": "Drake Hotline Bling",
            "description": "Preferring one thing over another",
            "textPosition": "both",
        }), serde_json::to_value(&info).unwrap());
    }

    #[test]
    fn missing_template() {
        assert!(find_template(&catalog(), "nope").is_none());
    }
}
