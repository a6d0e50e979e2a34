use crate::{Error, Result, config::TokenizerConfig};
use tokenizers::Tokenizer;
use tracing::info;

/// Text ↔ token id conversion used to bound prompt size.
pub trait TokenCodec: Send + Sync {
    fn encode(&self, text: &str) -> Result<Vec<u32>>;
    fn decode(&self, ids: &[u32]) -> Result<String>;
}

/// Hugging Face tokenizer. Must share a vocabulary with the target model for
/// truncation to line up with what the service counts.
pub struct HfTokenizer {
    inner: Tokenizer,
}

impl HfTokenizer {
    pub fn from_file(path: &str) -> Result<Self> {
        let inner = Tokenizer::from_file(path)
            .map_err(|e| Error::tokenizer(format!("Failed to load {}: {}", path, e)))?;
        Ok(Self { inner })
    }

    /// Fetches `tokenizer.json` from the Hub. Files already in the `hf-hub`
    /// cache under `cache_dir` are used without a download.
    pub async fn from_hub(repo: &str, cache_dir: Option<&str>) -> Result<Self> {
        let mut builder = hf_hub::api::tokio::ApiBuilder::new();
        if let Some(dir) = cache_dir {
            builder = builder.with_cache_dir(dir.into());
        }
        let api = builder
            .build()
            .map_err(|e| Error::tokenizer(format!("Hub client error: {}", e)))?;
        let path = api
            .model(repo.to_string())
            .get("tokenizer.json")
            .await
            .map_err(|e| {
                Error::tokenizer(format!("Failed to download tokenizer for {}: {}", repo, e))
            })?;
        Self::from_file(&path.to_string_lossy())
    }

    pub async fn load(config: &TokenizerConfig) -> Result<Self> {
        match config.path.as_deref() {
            Some(path) => {
                info!("Loading tokenizer from {}", path);
                Self::from_file(path)
            }
            None => {
                info!("Loading tokenizer from hub repo {}", config.repo);
                Self::from_hub(&config.repo, config.cache_dir.as_deref()).await
            }
        }
    }
}

impl TokenCodec for HfTokenizer {
    fn encode(&self, text: &str) -> Result<Vec<u32>> {
        let encoding = self
            .inner
            .encode(text, false)
            .map_err(|e| Error::tokenizer(format!("Encode failed: {}", e)))?;
        Ok(encoding.get_ids().to_vec())
    }

    fn decode(&self, ids: &[u32]) -> Result<String> {
        self.inner
            .decode(ids, false)
            .map_err(|e| Error::tokenizer(format!("Decode failed: {}", e)))
    }
}
