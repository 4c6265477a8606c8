use std::sync::LazyLock;

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::{
        ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs
    },
    Client as OpenAIClient
};
use async_trait::async_trait;
use backoff::ExponentialBackoff;
use regex::Regex;
use thiserror::Error;
use tracing::{debug, warn};

use crate::{
    config::{ClassifierConfig, OPENAI_API_KEY},
    error::{Error, Result},
    prompt::relevance_prompt
};

static NON_ALPHA: LazyLock<Regex> = LazyLock::new(|| Regex::new("[^a-z]").expect("valid regex"));

/// Decides whether an abstract matches a single interest.
#[async_trait]
pub trait Classifier: Send + Sync {
    /// Only configuration problems surface as errors; call failures yield `Ok(false)`.
    async fn is_relevant(&self, summary: &str, interest: &str) -> Result<bool>;

    /// Fails when the classifier could never succeed, so a run can stop before fetching.
    fn preflight(&self) -> Result<()> {
        Ok(())
    }
}

/// A text-completion service answering one prompt at a time.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    fn check_credentials(&self) -> std::result::Result<(), AgentError> {
        Ok(())
    }

    async fn complete(&self, prompt: &str) -> std::result::Result<String, AgentError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Relevant,
    NotRelevant,
    /// The completion call failed; counted as not relevant.
    Unavailable,
}

impl Verdict {
    pub fn is_relevant(self) -> bool {
        self == Verdict::Relevant
    }

    /// Only an answer whose leading word reduces to exactly "yes" counts.
    pub fn from_answer(answer: &str) -> Self {
        let lowered = answer.trim().to_lowercase();
        let first = lowered.split_whitespace().next().unwrap_or_default();
        if NON_ALPHA.replace_all(first, "") == "yes" {
            Verdict::Relevant
        } else {
            Verdict::NotRelevant
        }
    }
}

pub struct RelevanceClassifier<B> {
    backend: B
}

impl<B: CompletionBackend> RelevanceClassifier<B> {
    pub fn new(backend: B) -> Self {
        RelevanceClassifier {
            backend
        }
    }

    pub async fn classify(&self, summary: &str, interest: &str) -> Result<Verdict> {
        let prompt = relevance_prompt(summary, interest);
        let err = match self.backend.complete(&prompt).await {
            Ok(answer) => {
                let verdict = Verdict::from_answer(&answer);
                debug!(interest, answer = %answer.trim(), ?verdict, "classified paper");
                return Ok(verdict);
            }
            Err(err) => err
        };

        match err {
            AgentError::MissingCredential(key) => {
                return Err(Error::Config(format!("{} not found in env", key)));
            }
            AgentError::Connection(e) => {
                warn!(interest, error = %e, "could not reach completion API, treating paper as not relevant");
            }
            AgentError::RateLimited(e) => {
                warn!(interest, error = %e, "completion API rate limit hit, treating paper as not relevant");
            }
            AgentError::Api(e) | AgentError::Request(e) => {
                warn!(interest, error = %e, "completion API error, treating paper as not relevant");
            }
        }
        Ok(Verdict::Unavailable)
    }
}

#[async_trait]
impl<B: CompletionBackend> Classifier for RelevanceClassifier<B> {
    async fn is_relevant(&self, summary: &str, interest: &str) -> Result<bool> {
        Ok(self.classify(summary, interest).await?.is_relevant())
    }

    fn preflight(&self) -> Result<()> {
        self.backend.check_credentials()
            .map_err(|e| Error::Config(e.to_string()))
    }
}

pub struct OpenAIAgent {
    client: Option<OpenAIClient<OpenAIConfig>>,
    model: String,
    max_tokens: u32
}

impl OpenAIAgent {
    pub fn new(config: &ClassifierConfig) -> Result<Self> {
        let client = match config.api_key.as_deref() {
            Some(key) => {
                let http = reqwest::Client::builder()
                    .timeout(config.timeout)
                    .build()?;
                // a rate-limited call must fail right away, not be retried.
                let no_retry = ExponentialBackoff {
                    max_elapsed_time: Some(std::time::Duration::ZERO),
                    ..ExponentialBackoff::default()
                };
                Some(OpenAIClient::with_config(OpenAIConfig::new().with_api_key(key))
                    .with_http_client(http)
                    .with_backoff(no_retry))
            }
            None => None
        };
        Ok(OpenAIAgent {
            client,
            model: config.model.clone(),
            max_tokens: config.max_tokens
        })
    }
}

#[async_trait]
impl CompletionBackend for OpenAIAgent {
    fn check_credentials(&self) -> std::result::Result<(), AgentError> {
        match self.client {
            Some(_) => Ok(()),
            None => Err(AgentError::MissingCredential(OPENAI_API_KEY)),
        }
    }

    async fn complete(&self, prompt: &str) -> std::result::Result<String, AgentError> {
        let client = self.client.as_ref()
            .ok_or(AgentError::MissingCredential(OPENAI_API_KEY))?;

        let request = CreateChatCompletionRequestArgs::default()
            .model(self.model.as_str())
            .max_tokens(self.max_tokens)
            .temperature(0.0)
            .messages([
                ChatCompletionRequestUserMessageArgs::default()
                    .content(prompt)
                    .build()?
                    .into(),
            ])
            .build()?;

        let answer = client
            .chat()
            .create(request)
            .await?
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default();
        Ok(answer)
    }
}

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("{0} not found in env")]
    MissingCredential(&'static str),
    #[error("connection failed: {0}")]
    Connection(String),
    #[error("rate limited: {0}")]
    RateLimited(String),
    #[error("api error: {0}")]
    Api(String),
    #[error("invalid request: {0}")]
    Request(String),
}

impl From<OpenAIError> for AgentError {
    fn from(err: OpenAIError) -> Self {
        match err {
            OpenAIError::Reqwest(e) => AgentError::Connection(e.to_string()),
            OpenAIError::ApiError(e) => {
                let rate_limited = matches!(e.r#type.as_deref(), Some("requests") | Some("tokens"))
                    || e.message.to_lowercase().contains("rate limit");
                if rate_limited {
                    AgentError::RateLimited(e.message)
                } else {
                    AgentError::Api(e.message)
                }
            }
            OpenAIError::InvalidArgument(e) => AgentError::Request(e),
            other => AgentError::Api(other.to_string()),
        }
    }
}
