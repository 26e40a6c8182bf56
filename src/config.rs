use std::path::PathBuf;

use anyhow::Context;
use serde::Deserialize;

pub const DEFAULT_API_URL: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";

#[derive(Debug, Clone, Deserialize)]
pub struct OpenAiConfig {
    /// Checked per request, not at startup.
    pub api_key: Option<String>,
    pub api_url: String,
    pub model: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub index_path: PathBuf,
    pub host: String,
    pub port: u16,
    pub openai: OpenAiConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = match lookup("APP_PORT") {
            Some(v) => v
                .parse::<u16>()
                .with_context(|| format!("invalid APP_PORT {:?}", v))?,
            None => 8080,
        };
        let openai = OpenAiConfig {
            api_key: lookup("OPENAI_API_KEY").filter(|k| !k.is_empty()),
            api_url: lookup("OPENAI_API_URL").unwrap_or_else(|| DEFAULT_API_URL.into()),
            model: lookup("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.into()),
        };
        Ok(Self {
            database_url: lookup("DATABASE_URL").unwrap_or_else(|| "sqlite://chat.db".into()),
            index_path: lookup("INDEX_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("index.html")),
            host: lookup("APP_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port,
            openai,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> anyhow::Result<AppConfig> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|k| vars.get(k).cloned())
    }

    #[test]
    fn defaults_when_environment_is_empty() {
        let cfg = config_from(&[]).unwrap();
        assert_eq!(cfg.database_url, "sqlite://chat.db");
        assert_eq!(cfg.index_path, PathBuf::from("index.html"));
        assert_eq!(cfg.host, "0.0.0.0");
        assert_eq!(cfg.port, 8080);
        assert!(cfg.openai.api_key.is_none());
        assert_eq!(cfg.openai.api_url, DEFAULT_API_URL);
        assert_eq!(cfg.openai.model, DEFAULT_MODEL);
    }

    #[test]
    fn empty_api_key_counts_as_missing() {
        let cfg = config_from(&[("OPENAI_API_KEY", "")]).unwrap();
        assert!(cfg.openai.api_key.is_none());

        let cfg = config_from(&[("OPENAI_API_KEY", "sk-test")]).unwrap();
        assert_eq!(cfg.openai.api_key.as_deref(), Some("sk-test"));
    }

    #[test]
    fn invalid_port_is_an_error() {
        let err = config_from(&[("APP_PORT", "eighty")]).unwrap_err();
        assert!(err.to_string().contains("APP_PORT"));
    }
}
