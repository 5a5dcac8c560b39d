use anyhow::{Context, Result};
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File};
use serde::Deserialize;

use crate::relevance::segment::DEFAULT_MIN_TAIL;

/// Optional settings file in the working directory (`ranker.toml`, `ranker.json`, ...).
const SETTINGS_FILE: &str = "ranker";
const ENV_PREFIX: &str = "RANKER";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum EmbedderKind {
    #[default]
    #[serde(rename = "hashing")]
    Hashing,
    #[serde(rename = "openai")]
    OpenAi,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub embedder: EmbedderKind,
    pub hashing_dimensions: usize,
    pub openai_base_url: String,
    pub openai_model: String,
    pub openai_api_key: Option<String>,
    pub request_timeout_secs: u64,
    /// Letters/spaces a heading line needs after its capital.
    pub segment_min_tail: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            embedder: EmbedderKind::Hashing,
            hashing_dimensions: 384,
            openai_base_url: "https://api.openai.com/v1".to_string(),
            openai_model: "text-embedding-3-small".to_string(),
            openai_api_key: None,
            request_timeout_secs: 30,
            segment_min_tail: DEFAULT_MIN_TAIL,
        }
    }
}

impl Settings {
    /// `ranker.*` file if present, then `RANKER_*` environment variables.
    pub fn load() -> Result<Self> {
        let builder = Config::builder()
            .add_source(File::with_name(SETTINGS_FILE).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true));
        Self::from_builder(builder)
    }

    fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self> {
        builder
            .build()
            .context("failed to read settings")?
            .try_deserialize()
            .context("invalid settings")
    }
}
