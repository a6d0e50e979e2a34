use super::text;
use crate::{
    Result,
    config::{Config, LlmConfig, PromptsConfig},
    llm::{
        FragmentStream, HfTokenizer, InferenceClient, InferenceRequest, SamplingConfig,
        TokenCodec, create_inference_client,
    },
};
use futures::TryStreamExt;
use std::sync::Arc;
use tracing::{debug, error, info};

/// Runs system/user prompt pairs through the inference client and
/// post-processes the answers.
///
/// Empty inputs, a missing system prompt, or a missing model are not errors:
/// the call resolves to `Ok(None)` without touching the tokenizer or the
/// network. Everything else that goes wrong is returned as `Err`.
pub struct PromptProcessor {
    client: Arc<dyn InferenceClient>,
    tokenizer: Arc<dyn TokenCodec>,
    prompts: PromptsConfig,
    model: Option<String>,
    max_input_tokens: usize,
    sampling: SamplingConfig,
}

impl PromptProcessor {
    pub fn new(
        client: Arc<dyn InferenceClient>,
        tokenizer: Arc<dyn TokenCodec>,
        llm_config: &LlmConfig,
        prompts: PromptsConfig,
    ) -> Self {
        Self {
            client,
            tokenizer,
            prompts,
            model: llm_config.model.clone(),
            max_input_tokens: llm_config.max_input_tokens,
            sampling: SamplingConfig::default(),
        }
    }

    /// Wires the configured provider client and tokenizer together.
    pub async fn from_config(config: &Config) -> Result<Self> {
        let client: Arc<dyn InferenceClient> = Arc::from(create_inference_client(&config.llm)?);
        let tokenizer = Arc::new(HfTokenizer::load(&config.llm.tokenizer).await?);

        Ok(Self::new(
            client,
            tokenizer,
            &config.llm,
            config.prompts.clone(),
        ))
    }

    /// Cuts `user_prompt` to the first `max_input_tokens` tokens. Prompts
    /// within budget come back unchanged.
    pub fn truncate_prompt(&self, user_prompt: &str) -> Result<String> {
        let tokens = self.tokenizer.encode(user_prompt)?;
        if tokens.len() <= self.max_input_tokens {
            return Ok(user_prompt.to_string());
        }

        info!(
            "User prompt is {} tokens, truncating to {}",
            tokens.len(),
            self.max_input_tokens
        );
        self.tokenizer.decode(&tokens[..self.max_input_tokens])
    }

    fn prepare(
        &self,
        system_prompt: Option<&str>,
        user_prompt: &str,
    ) -> Result<Option<InferenceRequest>> {
        let Some(system_prompt) = system_prompt.filter(|p| !p.is_empty()) else {
            info!("Skipping LLM call: system prompt is empty");
            return Ok(None);
        };
        if user_prompt.is_empty() {
            info!("Skipping LLM call: user prompt is empty");
            return Ok(None);
        }
        let Some(model) = self.model.as_deref() else {
            info!("Skipping LLM call: no model configured");
            return Ok(None);
        };

        let prompt = self.truncate_prompt(user_prompt)?;
        if prompt.is_empty() {
            info!("Skipping LLM call: prompt is empty after truncation");
            return Ok(None);
        }
        Ok(Some(InferenceRequest {
            model: model.to_string(),
            system_prompt: system_prompt.to_string(),
            prompt,
            sampling: self.sampling.clone(),
        }))
    }

    /// Lazy variant of [`process`](Self::process): fragments are yielded as
    /// the service produces them.
    pub async fn process_stream(
        &self,
        system_prompt: Option<&str>,
        user_prompt: &str,
    ) -> Result<Option<FragmentStream>> {
        let Some(request) = self.prepare(system_prompt, user_prompt).inspect_err(|e| {
            error!("Failed to prepare prompt: {}", e);
        })?
        else {
            return Ok(None);
        };

        let stream = self.client.stream(request).await.inspect_err(|e| {
            error!("LLM request failed: {}", e);
        })?;
        Ok(Some(stream))
    }

    pub async fn process(
        &self,
        system_prompt: Option<&str>,
        user_prompt: &str,
    ) -> Result<Option<String>> {
        let Some(stream) = self.process_stream(system_prompt, user_prompt).await? else {
            return Ok(None);
        };

        info!("LLM is processing");
        let fragments: Vec<String> = stream
            .try_collect()
            .await
            .inspect_err(|e| error!("LLM stream failed: {}", e))?;
        debug!("Received {} fragments", fragments.len());

        Ok(Some(fragments.concat()))
    }

    pub async fn process_detail(&self, user_prompt: &str) -> Result<Option<String>> {
        info!("Processing detail");
        let result = self.process(self.prompts.detail.as_deref(), user_prompt).await?;
        Ok(result.map(|answer| text::clean_detail(&answer)))
    }

    pub async fn process_tags(&self, user_prompt: &str) -> Result<Vec<String>> {
        info!("Processing tags");
        let result = self
            .process(self.prompts.tag_selector.as_deref(), user_prompt)
            .await?;
        let tags = text::split_tags(result.as_deref());
        info!("Tags: {:?}", tags);
        Ok(tags)
    }

    /// English targets pass through untouched. Otherwise the answer has its
    /// markdown markers removed unless the input itself started with a
    /// heading.
    pub async fn process_language(
        &self,
        language: &str,
        user_prompt: &str,
    ) -> Result<Option<String>> {
        info!("Processing language: {}", language);
        if text::is_english(language) {
            return Ok(Some(user_prompt.to_string()));
        }

        let system_prompt = self
            .prompts
            .language
            .as_deref()
            .map(|template| text::language_prompt(template, language));
        let result = self.process(system_prompt.as_deref(), user_prompt).await?;

        let result = match result {
            Some(answer) if !answer.is_empty() && !user_prompt.starts_with('#') => {
                Some(text::strip_markdown_markers(&answer))
            }
            other => other,
        };
        debug!("Language {} result: {:?}", language, result);
        Ok(result)
    }
}
