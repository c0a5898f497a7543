//! Module defining the render request & response.

use thiserror::Error;

use super::constants::{MAX_CAPTION_LENGTH, MAX_PROMPT_LENGTH};


/// Request to caption a meme template.
///
/// Exactly one of `prompt` or `caption` decides where the caption text comes from.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderRequest {
    /// ID of the template in the catalog.
    #[serde(alias = "memeId")]
    pub template_id: String,
    /// Free-form prompt for the caption generator.
    #[serde(default)]
    pub prompt: Option<String>,
    /// Caption text provided directly (e.g. after manual edits).
    #[serde(default)]
    pub caption: Option<String>,
}

impl RenderRequest {
    /// Request rendering of a caption text as-is.
    #[inline]
    pub fn with_caption<I, C>(template_id: I, caption: C) -> Self
        where I: Into<String>, C: Into<String>
    {
        RenderRequest{
            template_id: template_id.into(),
            caption: Some(caption.into()),
            ..Default::default()
        }
    }

    /// Request rendering of a caption generated from given prompt.
    #[inline]
    pub fn with_prompt<I, P>(template_id: I, prompt: P) -> Self
        where I: Into<String>, P: Into<String>
    {
        RenderRequest{
            template_id: template_id.into(),
            prompt: Some(prompt.into()),
            ..Default::default()
        }
    }
}

impl RenderRequest {
    /// Determine where the caption should come from.
    ///
    /// A non-blank prompt takes precedence over the caption text.
    /// The caption text, on the other hand, is used as-is even if it's empty.
    pub fn source(&self) -> Result<CaptionSource, RequestError> {
        if self.template_id.trim().is_empty() {
            return Err(RequestError::NoTemplate);
        }
        if let Some(prompt) = self.prompt.as_ref().filter(|p| !p.trim().is_empty()) {
            if prompt.len() > MAX_PROMPT_LENGTH {
                return Err(RequestError::PromptTooLong(prompt.len()));
            }
            return Ok(CaptionSource::Prompt(prompt.trim()));
        }
        match self.caption {
            Some(ref caption) if caption.len() > MAX_CAPTION_LENGTH =>
                Err(RequestError::CaptionTooLong(caption.len())),
            Some(ref caption) => Ok(CaptionSource::Text(caption)),
            None => Err(RequestError::NoCaptionSource),
        }
    }
}


/// Where the caption text of a `RenderRequest` comes from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CaptionSource<'r> {
    /// Caption should be generated from this prompt.
    Prompt(&'r str),
    /// Caption text given verbatim.
    Text(&'r str),
}


/// Successful result of a `RenderRequest`.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderResponse {
    /// Final caption text that has been rendered.
    pub caption: String,
    /// URL of the rendered image.
    pub image_url: String,
}


/// Error for an invalid `RenderRequest`.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum RequestError {
    #[error("no template ID given")]
    NoTemplate,
    #[error("either a prompt or a caption is required")]
    NoCaptionSource,
    #[error("prompt too long: {0} > {}", MAX_PROMPT_LENGTH)]
    PromptTooLong(usize),
    #[error("caption text too long: {0} > {}", MAX_CAPTION_LENGTH)]
    CaptionTooLong(usize),
}


#[cfg(test)]
mod tests {
    use spectral::prelude::*;
    use super::{CaptionSource, RenderRequest, RenderResponse, RequestError};

    #[test]
    fn deserialize_with_prompt() {
        let req: RenderRequest = serde_json::from_str(
            r#"{"templateId": "181913649", "prompt": "mondays"}"#).unwrap();
        assert_eq!("181913649", req.template_id);
        assert_that!(req.source()).is_ok().is_equal_to(CaptionSource::Prompt("mondays"));
    }

    #[test]
    fn deserialize_meme_id_alias() {
        let req: RenderRequest = serde_json::from_str(
            r#"{"memeId": "87743020", "prompt": null, "caption": "Top\nBottom"}"#).unwrap();
        assert_eq!("87743020", req.template_id);
        assert_that!(req.source()).is_ok().is_equal_to(CaptionSource::Text("Top\nBottom"));
    }

    #[test]
    fn neither_prompt_nor_caption() {
        let req: RenderRequest = serde_json::from_str(r#"{"templateId": "x"}"#).unwrap();
        assert_that!(req.source()).is_err().is_equal_to(RequestError::NoCaptionSource);
    }

    #[test]
    fn missing_template_id() {
        assert_that!(serde_json::from_str::<RenderRequest>(r#"{"caption": "x"}"#)).is_err();
        let req = RenderRequest::with_caption("  ", "x");
        assert_that!(req.source()).is_err().is_equal_to(RequestError::NoTemplate);
    }

    #[test]
    fn prompt_wins_over_caption() {
        let req = RenderRequest{
            caption: Some("Old\nCaption".into()),
            ..RenderRequest::with_prompt("x", "new idea")
        };
        assert_that!(req.source()).is_ok().is_equal_to(CaptionSource::Prompt("new idea"));
    }

    #[test]
    fn blank_prompt_falls_back_to_caption() {
        let req = RenderRequest{
            prompt: Some("   ".into()),
            ..RenderRequest::with_caption("x", "")
        };
        assert_that!(req.source()).is_ok().is_equal_to(CaptionSource::Text(""));
    }

    #[test]
    fn overly_long_caption() {
        let req = RenderRequest::with_caption("x", "a".repeat(4096));
        assert_that!(req.source()).is_err();
    }

    #[test]
    fn serialize_response() {
        let resp = RenderResponse{
            caption: "A\nB".into(),
            image_url: "/generated/x-1.jpg".into(),
        };
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["imageUrl"], "/generated/x-1.jpg");
        assert_eq!(json["caption"], "A\nB");
    }
}
