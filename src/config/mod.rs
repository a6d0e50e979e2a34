mod types;

pub use types::*;

use crate::{Error, Result};
use std::{env, path::Path};
use tracing::debug;

const DEFAULT_CONFIG_PATH: &str = "config.yaml";

pub async fn load() -> Result<Config> {
    dotenvy::dotenv().ok();

    let mut config = load_from(env::var("CONFIG_PATH").ok().as_deref()).await?;
    apply_overrides(&mut config, |key| env::var(key).ok())?;

    Ok(config)
}

/// Reads the YAML file at `path`. Without an explicit path, `config.yaml` is
/// used when present and defaults otherwise; an explicit path must exist.
pub async fn load_from(path: Option<&str>) -> Result<Config> {
    let config_path = match path {
        Some(path) => path,
        None if Path::new(DEFAULT_CONFIG_PATH).exists() => DEFAULT_CONFIG_PATH,
        None => {
            debug!("No {} found, using defaults", DEFAULT_CONFIG_PATH);
            return Ok(Config::default());
        }
    };

    debug!("Loading configuration from: {}", config_path);

    let config_str = tokio::fs::read_to_string(config_path)
        .await
        .map_err(|e| Error::config(format!("Cannot read {}: {}", config_path, e)))?;
    let config: Config = serde_yaml::from_str(&config_str)?;

    Ok(config)
}

/// Overlays recognised environment variables onto `config`. Empty values
/// count as unset.
pub fn apply_overrides<F>(config: &mut Config, lookup: F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(v) = var("DETAIL_SYS_PROMPT") {
        config.prompts.detail = Some(v);
    }
    if let Some(v) = var("TAG_SELECTOR_SYS_PROMPT") {
        config.prompts.tag_selector = Some(v);
    }
    if let Some(v) = var("LANGUAGE_SYS_PROMPT") {
        config.prompts.language = Some(v);
    }

    if let Some(v) = var("LLM_PROVIDER") {
        config.llm.provider = v;
    }
    if let Some(v) = var("LLM_BASE_URL") {
        config.llm.base_url = v;
    }
    if let Some(v) = var("REPLICATE_API_TOKEN") {
        config.llm.api_key = v;
    }
    if let Some(v) = var("REPLICATE_MODEL") {
        config.llm.model = Some(v);
    }
    if let Some(v) = var("REPLICATE_MAX_TOKENS") {
        config.llm.max_input_tokens = v
            .trim()
            .parse()
            .ok()
            .filter(|&n: &usize| n > 0)
            .ok_or_else(|| {
                Error::config(format!(
                    "REPLICATE_MAX_TOKENS must be a positive integer, got '{v}'"
                ))
            })?;
    }
    if let Some(v) = var("TOKENIZER_PATH") {
        config.llm.tokenizer.path = Some(v);
    }
    if let Some(v) = var("TOKENIZER_CACHE_DIR") {
        config.llm.tokenizer.cache_dir = Some(v);
    }

    if let Some(v) = var("R2_ENDPOINT_URL") {
        config.storage.endpoint_url = v;
    }
    if let Some(v) = var("R2_ACCESS_KEY_ID") {
        config.storage.access_key_id = v;
    }
    if let Some(v) = var("R2_SECRET_ACCESS_KEY") {
        config.storage.secret_access_key = v;
    }
    if let Some(v) = var("R2_BUCKET_NAME") {
        config.storage.bucket = v;
    }
    if let Some(v) = var("R2_CUSTOM_DOMAIN") {
        config.storage.custom_domain = Some(v);
    }

    if let Some(v) = var("LOG_LEVEL") {
        config.logs.level = v;
    }

    Ok(())
}
