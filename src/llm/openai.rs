use super::{FragmentStream, InferenceClient, InferenceRequest};
use crate::{Error, Result, config::LlmConfig};
use async_openai::{
    Client,
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestSystemMessageContent, ChatCompletionRequestUserMessageArgs,
        ChatCompletionRequestUserMessageContent, CreateChatCompletionRequest,
        CreateChatCompletionRequestArgs, Stop,
    },
};
use async_trait::async_trait;
use futures::StreamExt;
use tracing::debug;

/// Streams chat completions from any OpenAI-compatible endpoint.
pub struct OpenAiClient {
    client: Client<OpenAIConfig>,
}

impl OpenAiClient {
    pub fn new(config: LlmConfig) -> Self {
        let mut openai_config = OpenAIConfig::new().with_api_key(config.api_key);

        if !config.base_url.is_empty() {
            openai_config = openai_config.with_api_base(config.base_url);
        }

        Self {
            client: Client::with_config(openai_config),
        }
    }
}

pub(crate) fn build_chat_request(
    request: &InferenceRequest,
) -> Result<CreateChatCompletionRequest> {
    let system: ChatCompletionRequestMessage = ChatCompletionRequestSystemMessageArgs::default()
        .content(ChatCompletionRequestSystemMessageContent::Text(
            request.system_prompt.clone(),
        ))
        .build()
        .map_err(|e| Error::llm(format!("Failed to build system message: {}", e)))?
        .into();
    let user: ChatCompletionRequestMessage = ChatCompletionRequestUserMessageArgs::default()
        .content(ChatCompletionRequestUserMessageContent::Text(
            request.prompt.clone(),
        ))
        .build()
        .map_err(|e| Error::llm(format!("Failed to build user message: {}", e)))?
        .into();

    let sampling = &request.sampling;
    let mut builder = CreateChatCompletionRequestArgs::default();
    builder
        .model(&request.model)
        .messages(vec![system, user])
        .temperature(sampling.temperature)
        .top_p(sampling.top_p)
        .max_tokens(sampling.max_new_tokens)
        .presence_penalty(sampling.presence_penalty);

    let stops = sampling.stop_sequence_list();
    if !stops.is_empty() {
        builder.stop(Stop::StringArray(stops));
    }

    Ok(builder.build()?)
}

#[async_trait]
impl InferenceClient for OpenAiClient {
    async fn stream(&self, request: InferenceRequest) -> Result<FragmentStream> {
        debug!("Creating chat completion stream for model {}", request.model);

        let chat_request = build_chat_request(&request)?;
        let stream = self.client.chat().create_stream(chat_request).await?;

        let fragments = stream.filter_map(|chunk| async move {
            match chunk {
                Ok(response) => response
                    .choices
                    .into_iter()
                    .next()
                    .and_then(|choice| choice.delta.content)
                    .filter(|content| !content.is_empty())
                    .map(Ok),
                Err(e) => Some(Err(Error::from(e))),
            }
        });

        Ok(fragments.boxed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_build_chat_request() {
        let request = InferenceRequest::new("gpt-4o-mini", "You are terse", "Hello");
        let chat = build_chat_request(&request).unwrap();

        assert_eq!(chat.model, "gpt-4o-mini");
        assert_eq!(chat.messages.len(), 2);
        assert!(matches!(chat.messages[0], ChatCompletionRequestMessage::System(_)));
        assert!(matches!(chat.messages[1], ChatCompletionRequestMessage::User(_)));
        assert_eq!(chat.temperature, Some(0.7));
        assert_eq!(chat.top_p, Some(0.95));
        assert!(matches!(chat.stop, Some(Stop::StringArray(ref s)) if s.len() == 2));
    }
}
