use async_trait::async_trait;
use content_tools::{
    Error, Result,
    llm::{FragmentStream, InferenceClient, InferenceRequest, TokenCodec},
};
use futures::StreamExt;
use std::sync::{Arc, Mutex};

/// Mock inference client that replays canned fragments
#[derive(Debug, Clone)]
pub struct MockInferenceClient {
    pub fragments: Arc<Mutex<Vec<String>>>,
    pub requests: Arc<Mutex<Vec<InferenceRequest>>>,
    pub error: Option<String>,
    pub stream_error: Option<String>,
}

impl MockInferenceClient {
    pub fn new() -> Self {
        Self {
            fragments: Arc::new(Mutex::new(Vec::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
            error: None,
            stream_error: None,
        }
    }

    pub fn with_fragments(self, fragments: &[&str]) -> Self {
        *self.fragments.lock().unwrap() = fragments.iter().map(|f| f.to_string()).collect();
        self
    }

    pub fn with_error(mut self, error: &str) -> Self {
        self.error = Some(error.to_string());
        self
    }

    /// Fails after the canned fragments have been yielded
    pub fn with_stream_error(mut self, error: &str) -> Self {
        self.stream_error = Some(error.to_string());
        self
    }

    pub fn get_requests(&self) -> Vec<InferenceRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl Default for MockInferenceClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl InferenceClient for MockInferenceClient {
    async fn stream(&self, request: InferenceRequest) -> Result<FragmentStream> {
        self.requests.lock().unwrap().push(request);

        if let Some(ref error) = self.error {
            return Err(Error::llm(error.clone()));
        }

        let mut items: Vec<Result<String>> = self
            .fragments
            .lock()
            .unwrap()
            .iter()
            .cloned()
            .map(Ok)
            .collect();
        if let Some(ref error) = self.stream_error {
            items.push(Err(Error::llm(error.clone())));
        }

        Ok(futures::stream::iter(items).boxed())
    }
}

/// One token per character, so encode/decode round-trips exactly
#[derive(Debug, Default)]
pub struct CharCodec {
    pub encode_calls: Mutex<usize>,
}

impl TokenCodec for CharCodec {
    fn encode(&self, text: &str) -> Result<Vec<u32>> {
        *self.encode_calls.lock().unwrap() += 1;
        Ok(text.chars().map(|c| c as u32).collect())
    }

    fn decode(&self, ids: &[u32]) -> Result<String> {
        ids.iter()
            .map(|&id| {
                char::from_u32(id).ok_or_else(|| Error::tokenizer(format!("invalid id {id}")))
            })
            .collect()
    }
}

/// Codec that always fails to encode
#[derive(Debug, Default)]
pub struct BrokenCodec;

impl TokenCodec for BrokenCodec {
    fn encode(&self, _text: &str) -> Result<Vec<u32>> {
        Err(Error::tokenizer("vocabulary missing"))
    }

    fn decode(&self, _ids: &[u32]) -> Result<String> {
        Err(Error::tokenizer("vocabulary missing"))
    }
}
