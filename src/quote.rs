//! Quote generation through an OpenAI-compatible chat completion endpoint.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use url::Url;

use crate::constants::STYLE_SAMPLE_SIZE;
use crate::corpus::ReferenceCorpus;
use crate::error::{PosterError, body_snippet};

const SYSTEM_PROMPT: &str = "You are a cynical comedian who writes dark, humorous anti-inspirational English quotes. \
Return ONE short quote (max 18 words). Do NOT add any extra text.";

const TEMPERATURE: f32 = 0.9;
const MAX_TOKENS: u32 = 60;

/// What the quote should be about.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum QuoteRequest<'a> {
    /// Write about this topic
    Topic(&'a str),
    /// Write something brand new in the style of a few reference quotes
    Inspired,
}

/// Produces one short quote per call.
#[async_trait]
pub trait QuoteSource: Send + Sync {
    /// Returns the generated quote, trimmed.
    async fn generate_quote(&self, request: QuoteRequest<'_>) -> Result<String, PosterError>;
}

#[derive(Serialize, Debug)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize, Debug)]
struct ChatMessage<'a> {
    role: &'a str,
    content: String,
}

#[derive(Deserialize, Debug)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize, Debug)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize, Debug)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// [`QuoteSource`] backed by a chat completion API.
pub struct ChatQuoteSource {
    client: reqwest::Client,
    endpoint: Url,
    api_key: String,
    model: String,
    corpus: Arc<ReferenceCorpus>,
}

impl ChatQuoteSource {
    /// `base_url` is the API root, eg `https://api.openai.com/v1`.
    pub fn new(
        client: reqwest::Client,
        base_url: &Url,
        api_key: &str,
        model: &str,
        corpus: Arc<ReferenceCorpus>,
    ) -> Result<Self, PosterError> {
        let endpoint = Url::parse(&format!(
            "{}/chat/completions",
            base_url.as_str().trim_end_matches('/')
        ))?;
        Ok(Self {
            client,
            endpoint,
            api_key: api_key.to_string(),
            model: model.to_string(),
            corpus,
        })
    }

    fn user_prompt(&self, request: QuoteRequest<'_>) -> String {
        match request {
            QuoteRequest::Topic(topic) => format!("Write a quote about: {topic}"),
            QuoteRequest::Inspired => {
                let examples = self.corpus.sample(STYLE_SAMPLE_SIZE);
                let mut prompt = String::from(
                    "Here are some quotes whose tone you should match. Do not copy or paraphrase them:\n",
                );
                for example in examples {
                    prompt.push_str("- ");
                    prompt.push_str(example);
                    prompt.push('\n');
                }
                prompt.push_str("Write one brand-new quote in the same spirit.");
                prompt
            }
        }
    }
}

#[async_trait]
impl QuoteSource for ChatQuoteSource {
    async fn generate_quote(&self, request: QuoteRequest<'_>) -> Result<String, PosterError> {
        let body = ChatCompletionRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: self.user_prompt(request),
                },
            ],
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
        };
        debug!("Requesting quote for {:?}", request);

        let resp = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|err| PosterError::QuoteGeneration(format!("request failed: {err}")))?;
        let status = resp.status();
        let bytes = resp
            .bytes()
            .await
            .map_err(|err| PosterError::QuoteGeneration(format!("failed reading body: {err}")))?;
        if !status.is_success() {
            return Err(PosterError::QuoteGeneration(format!(
                "API error {status}: {}",
                body_snippet(&bytes)
            )));
        }

        let parsed: ChatCompletionResponse = serde_json::from_slice(&bytes).map_err(|err| {
            PosterError::QuoteGeneration(format!(
                "invalid JSON ({err}): {}",
                body_snippet(&bytes)
            ))
        })?;
        let quote = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .unwrap_or_default();
        if quote.is_empty() {
            return Err(PosterError::QuoteGeneration(
                "response contained no quote".to_string(),
            ));
        }
        info!("Generated quote: {quote}");
        Ok(quote)
    }
}
