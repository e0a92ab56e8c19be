use std::fmt;
use thiserror::Error;

use crate::prompt::GenerationParams;

pub const DEFAULT_MAX_TOKENS: u32 = 1000;
pub const OPENAI_TEMPERATURE: f64 = 0.7;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("unknown CONTENT_PROVIDER '{0}' (expected 'openai' or 'anthropic')")] UnknownProvider(String),
    #[error("{0} must be set for the selected provider")] MissingCredential(&'static str),
    #[error("invalid PORT '{0}'")] InvalidPort(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider { OpenAi, Anthropic }

impl Provider {
    fn key_var(self) -> &'static str {
        match self {
            Provider::OpenAi => "OPENAI_API_KEY",
            Provider::Anthropic => "ANTHROPIC_API_KEY",
        }
    }

    fn base_var(self) -> &'static str {
        match self {
            Provider::OpenAi => "OPENAI_API_BASE",
            Provider::Anthropic => "ANTHROPIC_API_BASE",
        }
    }

    fn default_base(self) -> &'static str {
        match self {
            Provider::OpenAi => "https://api.openai.com/v1",
            Provider::Anthropic => "https://api.anthropic.com/v1",
        }
    }

    fn default_model(self) -> &'static str {
        match self {
            Provider::OpenAi => "gpt-4o-mini",
            Provider::Anthropic => "claude-sonnet-4-20250514",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provider::OpenAi => f.write_str("OpenAI"),
            Provider::Anthropic => f.write_str("Anthropic"),
        }
    }
}

#[derive(Clone, PartialEq)]
pub struct ProviderConfig {
    pub provider: Provider,
    pub api_key: String,
    pub base_url: String,
    pub params: GenerationParams,
}

// Keeps the key out of logs.
impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("provider", &self.provider)
            .field("api_key", &mask(&self.api_key))
            .field("base_url", &self.base_url)
            .field("params", &self.params)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub provider: ProviderConfig,
    pub port: u16,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let provider = match var("CONTENT_PROVIDER").as_deref().map(str::to_ascii_lowercase).as_deref() {
            None | Some("openai") => Provider::OpenAi,
            Some("anthropic") => Provider::Anthropic,
            Some(other) => return Err(ConfigError::UnknownProvider(other.to_string())),
        };

        let api_key = var(provider.key_var()).ok_or(ConfigError::MissingCredential(provider.key_var()))?;
        let base_url = var(provider.base_var())
            .unwrap_or_else(|| provider.default_base().to_string())
            .trim_end_matches('/')
            .to_string();
        let model = var("CONTENT_MODEL").unwrap_or_else(|| provider.default_model().to_string());

        let params = match provider {
            Provider::OpenAi => GenerationParams {
                model,
                max_tokens: DEFAULT_MAX_TOKENS,
                temperature: Some(OPENAI_TEMPERATURE),
                include_system: true,
            },
            Provider::Anthropic => GenerationParams {
                model,
                max_tokens: DEFAULT_MAX_TOKENS,
                temperature: None,
                include_system: false,
            },
        };

        let port = match var("PORT") {
            Some(p) => p.parse().map_err(|_| ConfigError::InvalidPort(p))?,
            None => 8080,
        };

        Ok(Self { provider: ProviderConfig { provider, api_key, base_url, params }, port })
    }
}

pub fn mask(secret: &str) -> String {
    let visible: String = secret.chars().take(6).collect();
    format!("{visible}***")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_to_openai() {
        let cfg = Config::from_lookup(lookup(&[("OPENAI_API_KEY", "sk-test")])).unwrap();
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.provider.provider, Provider::OpenAi);
        assert_eq!(cfg.provider.base_url, "https://api.openai.com/v1");
        assert_eq!(cfg.provider.params.model, "gpt-4o-mini");
        assert_eq!(cfg.provider.params.temperature, Some(0.7));
        assert_eq!(cfg.provider.params.max_tokens, 1000);
        assert!(cfg.provider.params.include_system);
    }

    #[test]
    fn anthropic_requires_its_own_key() {
        let err = Config::from_lookup(lookup(&[
            ("CONTENT_PROVIDER", "anthropic"),
            ("OPENAI_API_KEY", "sk-test"),
        ]))
        .unwrap_err();
        assert_eq!(err, ConfigError::MissingCredential("ANTHROPIC_API_KEY"));

        let cfg = Config::from_lookup(lookup(&[
            ("CONTENT_PROVIDER", "Anthropic"),
            ("ANTHROPIC_API_KEY", "ak-test"),
            ("ANTHROPIC_API_BASE", "http://localhost:9000/v1/"),
            ("CONTENT_MODEL", "claude-test"),
            ("PORT", "3000"),
        ]))
        .unwrap();
        assert_eq!(cfg.port, 3000);
        assert_eq!(cfg.provider.base_url, "http://localhost:9000/v1");
        assert_eq!(cfg.provider.params.model, "claude-test");
        assert_eq!(cfg.provider.params.temperature, None);
        assert!(!cfg.provider.params.include_system);
    }

    #[test]
    fn rejects_bad_values() {
        assert_eq!(
            Config::from_lookup(lookup(&[("CONTENT_PROVIDER", "gemini")])).unwrap_err(),
            ConfigError::UnknownProvider("gemini".into())
        );
        assert_eq!(
            Config::from_lookup(lookup(&[("OPENAI_API_KEY", "k"), ("PORT", "http")])).unwrap_err(),
            ConfigError::InvalidPort("http".into())
        );
        assert_eq!(
            Config::from_lookup(lookup(&[("OPENAI_API_KEY", "  ")])).unwrap_err(),
            ConfigError::MissingCredential("OPENAI_API_KEY")
        );
    }

    #[test]
    fn debug_output_masks_the_key() {
        let cfg = Config::from_lookup(lookup(&[("OPENAI_API_KEY", "sk-secret-value")])).unwrap();
        let debug = format!("{:?}", cfg);
        assert!(!debug.contains("sk-secret-value"));
        assert!(debug.contains("sk-sec***"));
    }
}
