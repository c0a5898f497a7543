//! Caption generation through an OpenAI-compatible chat completions API.

use std::env;
use std::fmt;
use std::time::Duration;

use reqwest::blocking::Client;

use super::{CaptionGenerator, GenerateError};


pub const DEFAULT_BASE_URL: &'static str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &'static str = "gpt-4o-2024-11-20";
/// Environment variable holding the API key.
pub const API_KEY_VAR: &'static str = "OPENAI_API_KEY";

const DEFAULT_TIMEOUT_SECS: u64 = 60;


#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ApiError {
    error: ApiErrorBody,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    message: String,
}


/// Generator that asks a chat model for the caption, in a single request.
///
/// Failures are reported as they are, without any retries.
#[derive(Clone)]
pub struct OpenAiGenerator {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl OpenAiGenerator {
    /// Create the generator using given API key.
    pub fn new<K: Into<String>>(api_key: K) -> Result<Self, GenerateError> {
        Self::with_timeout(api_key, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    pub fn with_timeout<K: Into<String>>(api_key: K,
                                         timeout: Duration) -> Result<Self, GenerateError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(OpenAiGenerator{
            client,
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.into(),
            model: DEFAULT_MODEL.into(),
        })
    }

    /// Create the generator with the API key taken from `$OPENAI_API_KEY`.
    pub fn from_env(timeout: Duration) -> Result<Self, GenerateError> {
        let api_key = env::var(API_KEY_VAR).ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or(GenerateError::MissingApiKey(API_KEY_VAR))?;
        Self::with_timeout(api_key, timeout)
    }

    /// Use a different API endpoint, e.g. a compatible local server.
    pub fn base_url<U: Into<String>>(mut self, url: U) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_owned(); self
    }

    pub fn model<M: Into<String>>(mut self, model: M) -> Self {
        self.model = model.into(); self
    }
}

impl CaptionGenerator for OpenAiGenerator {
    fn generate(&self, template_name: &str, prompt: &str) -> Result<String, GenerateError> {
        let instruction = instruction(template_name, prompt);
        let request = ChatRequest{
            model: &self.model,
            messages: vec![ChatMessage{role: "user", content: &instruction}],
        };

        let url = format!("{}/chat/completions", self.base_url);
        debug!("Requesting caption from {} (model: {})", url, self.model);
        let response = self.client.post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()?;

        let status = response.status();
        let body = response.text()?;
        if !status.is_success() {
            let message = serde_json::from_str::<ApiError>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            warn!("Caption generation failed with status {}: {}", status, message);
            return Err(GenerateError::Api{status: status.as_u16(), message});
        }

        let text = parse_response(&body)?;
        trace!("Generated caption: {:?}", text);
        Ok(text)
    }
}

impl fmt::Debug for OpenAiGenerator {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt.debug_struct("OpenAiGenerator")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish()
    }
}


/// Instruction sent to the model.
fn instruction(template_name: &str, prompt: &str) -> String {
    format!(concat!(
        "Write a funny two-part caption for the \"{name}\" meme, based on this idea: \"{prompt}\".\n",
        "\n",
        "Answer with exactly two lines separated by a newline:\n",
        "- the first line goes at the top of the image,\n",
        "- the second line goes at the bottom of the image.\n",
        "\n",
        "Keep both lines short and punchy. No emojis, symbols, quotes or any other text."),
        name = template_name, prompt = prompt)
}

/// Extract the caption text from the body of a chat completion response.
fn parse_response(body: &str) -> Result<String, GenerateError> {
    let response: ChatResponse = serde_json::from_str(body)?;
    response.choices.into_iter().next()
        .and_then(|c| c.message.content)
        .filter(|text| !text.trim().is_empty())
        .ok_or(GenerateError::EmptyContent)
}
