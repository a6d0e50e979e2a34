use super::{FragmentStream, InferenceRequest, OpenAiClient, ReplicateClient};
use crate::{Error, Result, config::LlmConfig};
use async_trait::async_trait;
use futures::TryStreamExt;

#[async_trait]
pub trait InferenceClient: Send + Sync {
    async fn stream(&self, request: InferenceRequest) -> Result<FragmentStream>;

    /// Drains the stream and concatenates fragments in order.
    async fn complete(&self, request: InferenceRequest) -> Result<String> {
        let fragments: Vec<String> = self.stream(request).await?.try_collect().await?;
        Ok(fragments.concat())
    }
}

pub fn create_inference_client(config: &LlmConfig) -> Result<Box<dyn InferenceClient>> {
    match config.provider.as_str() {
        "replicate" => Ok(Box::new(ReplicateClient::new(config.clone())?)),
        "openai" => Ok(Box::new(OpenAiClient::new(config.clone()))),
        other => Err(Error::config(format!("Unknown LLM provider: {other}"))),
    }
}
