//! Module with the sources of generated caption text.

mod openai;

pub use self::openai::{OpenAiGenerator, API_KEY_VAR, DEFAULT_BASE_URL, DEFAULT_MODEL};


use thiserror::Error;


/// Something that can come up with a caption for a meme.
pub trait CaptionGenerator: Send + Sync {
    /// Generate caption text for the meme with given display name,
    /// based on the user's prompt.
    ///
    /// The result is expected to be two lines separated by a newline,
    /// but this isn't verified.
    fn generate(&self, template_name: &str, prompt: &str) -> Result<String, GenerateError>;
}

impl<F> CaptionGenerator for F
    where F: Fn(&str, &str) -> Result<String, GenerateError> + Send + Sync
{
    fn generate(&self, template_name: &str, prompt: &str) -> Result<String, GenerateError> {
        self(template_name, prompt)
    }
}


/// Error while generating a caption.
#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },
    #[error("cannot parse the response: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("generator returned no text")]
    EmptyContent,
    #[error("API key not found in ${0}")]
    MissingApiKey(&'static str),
    #[error("{0}")]
    Unavailable(String),
}
