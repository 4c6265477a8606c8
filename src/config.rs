use std::{env, time::Duration};
use tracing::warn;

use crate::error::{Error, Result};

const ENV_FILE: &str = "paperwatch.env";

pub const ARXIV_API: &str = "https://export.arxiv.org/api/query";

pub const OPENAI_API_KEY: &str = "OPENAI_API_KEY";
const DEFAULT_MODEL: &str = "gpt-4o-mini";

#[derive(Debug, Clone)]
pub struct ArxivConfig {
    pub base_url: String,
    pub max_results: usize,
    pub page_size: usize,
    /// Pause between page requests; arXiv asks clients for three seconds.
    pub page_delay: Duration,
    pub categories: Vec<String>,
}

impl Default for ArxivConfig {
    fn default() -> Self {
        ArxivConfig {
            base_url: ARXIV_API.to_string(),
            max_results: 500,
            page_size: 100,
            page_delay: Duration::from_secs(3),
            categories: Vec::new()
        }
    }
}

#[derive(Clone)]
pub struct ClassifierConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub max_tokens: u32,
    pub timeout: Duration,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        ClassifierConfig {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            max_tokens: 3,
            timeout: Duration::from_secs(10)
        }
    }
}

// keep the key out of logs.
impl std::fmt::Debug for ClassifierConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClassifierConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[derive(Clone)]
pub struct SlackConfig {
    pub token: String,
    pub channel: String,
}

impl std::fmt::Debug for SlackConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlackConfig")
            .field("token", &"***")
            .field("channel", &self.channel)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub arxiv: ArxivConfig,
    pub classifier: ClassifierConfig,
    pub slack: Option<SlackConfig>,
    pub interests: Vec<String>,
}

impl Config {
    /// Loads `paperwatch.env` when present, then reads the process environment.
    pub fn from_env() -> Result<Self> {
        if let Err(e) = dotenvy::from_filename(ENV_FILE) {
            if !e.not_found() {
                return Err(Error::Config(format!("failed to read {}: {}", ENV_FILE, e)));
            }
        }
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let api_key = get(OPENAI_API_KEY)
            .ok_or_else(|| Error::Config(format!("{} not found in env", OPENAI_API_KEY)))?;

        let defaults = ClassifierConfig::default();
        let classifier = ClassifierConfig {
            api_key: Some(api_key),
            model: get("OPENAI_MODEL").unwrap_or(defaults.model),
            max_tokens: get_positive_as::<u32, _>(&get, "OPENAI_MAX_TOKENS")?
                .unwrap_or(defaults.max_tokens),
            timeout: get_positive(&get, "OPENAI_TIMEOUT_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout)
        };

        let defaults = ArxivConfig::default();
        let arxiv = ArxivConfig {
            base_url: defaults.base_url,
            max_results: get_positive_as::<usize, _>(&get, "MAX_RESULTS")?
                .unwrap_or(defaults.max_results),
            page_size: get_positive_as::<usize, _>(&get, "PAGE_SIZE")?
                .unwrap_or(defaults.page_size),
            page_delay: get_positive(&get, "PAGE_DELAY_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.page_delay),
            categories: get("CATEGORIES")
                .map(|v| v.split_whitespace().map(String::from).collect())
                .unwrap_or_default()
        };

        let slack = match (get("SLACK_BOT_TOKEN"), get("SLACK_CHANNEL")) {
            (Some(token), Some(channel)) => Some(SlackConfig { token, channel }),
            (None, None) => None,
            (Some(_), None) => return Err(Error::Config("SLACK_CHANNEL not found in env".to_string())),
            (None, Some(_)) => return Err(Error::Config("SLACK_BOT_TOKEN not found in env".to_string())),
        };

        let interests = get("INTERESTS")
            .map(|v| parse_interests(&v))
            .unwrap_or_default();
        if interests.is_empty() {
            warn!("INTERESTS is empty, no paper will match");
        }

        Ok(Config { arxiv, classifier, slack, interests })
    }
}

// interests are free text, so they are separated by ';' or newlines rather than whitespace.
pub fn parse_interests(raw: &str) -> Vec<String> {
    raw.split(|c| c == ';' || c == '\n')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

fn get_positive<G>(get: &G, key: &str) -> Result<Option<u64>>
where
    G: Fn(&str) -> Option<String>,
{
    let Some(raw) = get(key) else {
        return Ok(None);
    };
    match raw.trim().parse::<u64>() {
        Ok(n) if n > 0 => Ok(Some(n)),
        _ => Err(not_positive(key, &raw)),
    }
}

// like get_positive, but the value must also fit the target type.
fn get_positive_as<T, G>(get: &G, key: &str) -> Result<Option<T>>
where
    T: TryFrom<u64>,
    G: Fn(&str) -> Option<String>,
{
    match get_positive(get, key)? {
        Some(n) => T::try_from(n)
            .map(Some)
            .map_err(|_| not_positive(key, &n.to_string())),
        None => Ok(None),
    }
}

fn not_positive(key: &str, raw: &str) -> Error {
    Error::Config(format!("{} must be a positive integer, got {:?}", key, raw))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_missing_api_key_is_config_error() {
        let result = Config::from_lookup(lookup(&[("INTERESTS", "robotics")]));
        assert!(matches!(result, Err(Error::Config(msg)) if msg.contains(OPENAI_API_KEY)));
    }

    #[test]
    fn test_blank_api_key_counts_as_missing() {
        let result = Config::from_lookup(lookup(&[(OPENAI_API_KEY, "  ")]));
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&[(OPENAI_API_KEY, "sk-test")])).unwrap();
        assert_eq!(config.arxiv.max_results, 500);
        assert_eq!(config.arxiv.page_size, 100);
        assert_eq!(config.arxiv.page_delay, Duration::from_secs(3));
        assert_eq!(config.arxiv.base_url, ARXIV_API);
        assert!(config.arxiv.categories.is_empty());
        assert_eq!(config.classifier.model, "gpt-4o-mini");
        assert_eq!(config.classifier.max_tokens, 3);
        assert_eq!(config.classifier.timeout, Duration::from_secs(10));
        assert!(config.slack.is_none());
        assert!(config.interests.is_empty());
    }

    #[test]
    fn test_full_env() {
        let config = Config::from_lookup(lookup(&[
            (OPENAI_API_KEY, "sk-test"),
            ("OPENAI_MODEL", "gpt-4o"),
            ("OPENAI_TIMEOUT_SECS", "5"),
            ("MAX_RESULTS", "200"),
            ("PAGE_DELAY_SECS", "5"),
            ("CATEGORIES", "cs.CL cs.AI"),
            ("SLACK_BOT_TOKEN", "xoxb-1"),
            ("SLACK_CHANNEL", "C123"),
            ("INTERESTS", "large language models; robotics\nprotein folding;"),
        ])).unwrap();
        assert_eq!(config.classifier.model, "gpt-4o");
        assert_eq!(config.classifier.timeout, Duration::from_secs(5));
        assert_eq!(config.arxiv.max_results, 200);
        assert_eq!(config.arxiv.page_delay, Duration::from_secs(5));
        assert_eq!(config.arxiv.categories, vec!["cs.CL", "cs.AI"]);
        assert_eq!(config.slack.as_ref().map(|s| s.channel.as_str()), Some("C123"));
        assert_eq!(config.interests, vec!["large language models", "robotics", "protein folding"]);
    }

    #[test]
    fn test_rejects_non_positive_numbers() {
        for bad in ["0", "-3", "many"] {
            let result = Config::from_lookup(lookup(&[(OPENAI_API_KEY, "sk-test"), ("MAX_RESULTS", bad)]));
            assert!(matches!(result, Err(Error::Config(msg)) if msg.contains("MAX_RESULTS")), "accepted {}", bad);
        }
    }

    #[test]
    fn test_rejects_max_tokens_beyond_u32() {
        let result = Config::from_lookup(lookup(&[(OPENAI_API_KEY, "sk-test"), ("OPENAI_MAX_TOKENS", "4294967296")]));
        assert!(matches!(result, Err(Error::Config(msg)) if msg.contains("OPENAI_MAX_TOKENS") && msg.contains("4294967296")));

        let config = Config::from_lookup(lookup(&[(OPENAI_API_KEY, "sk-test"), ("OPENAI_MAX_TOKENS", "4294967295")])).unwrap();
        assert_eq!(config.classifier.max_tokens, u32::MAX);
    }

    #[test]
    fn test_half_configured_slack_is_rejected() {
        let result = Config::from_lookup(lookup(&[(OPENAI_API_KEY, "sk-test"), ("SLACK_BOT_TOKEN", "xoxb-1")]));
        assert!(matches!(result, Err(Error::Config(msg)) if msg.contains("SLACK_CHANNEL")));
    }

    #[test]
    fn test_debug_hides_secrets() {
        let config = Config::from_lookup(lookup(&[
            (OPENAI_API_KEY, "sk-secret"),
            ("SLACK_BOT_TOKEN", "xoxb-secret"),
            ("SLACK_CHANNEL", "C123"),
        ])).unwrap();
        let printed = format!("{:?}", config);
        assert!(!printed.contains("sk-secret"));
        assert!(!printed.contains("xoxb-secret"));
    }
}
