use super::{FragmentStream, InferenceClient, InferenceRequest, SseDecoder, SseEvent};
use crate::{Error, Result, config::LlmConfig};
use async_trait::async_trait;
use futures::{StreamExt, stream::Fuse};
use reqwest::{Client, header};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tracing::debug;

const DEFAULT_BASE_URL: &str = "https://api.replicate.com/v1";

/// Streams predictions from the Replicate HTTP API.
pub struct ReplicateClient {
    client: Client,
    base_url: String,
    api_token: String,
}

#[derive(Debug, Serialize)]
struct PredictionInput<'a> {
    top_k: u32,
    top_p: f32,
    prompt: &'a str,
    max_tokens: u32,
    temperature: f32,
    system_prompt: &'a str,
    length_penalty: f32,
    max_new_tokens: u32,
    stop_sequences: &'a str,
    prompt_template: &'a str,
    presence_penalty: f32,
    log_performance_metrics: bool,
}

#[derive(Debug, Serialize)]
struct CreatePrediction<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    version: Option<&'a str>,
    input: PredictionInput<'a>,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct Prediction {
    id: String,
    #[serde(default)]
    error: Option<serde_json::Value>,
    #[serde(default)]
    urls: PredictionUrls,
}

#[derive(Debug, Default, Deserialize)]
struct PredictionUrls {
    #[serde(default)]
    stream: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StreamError {
    #[serde(default)]
    detail: Option<String>,
}

impl ReplicateClient {
    pub fn new(config: LlmConfig) -> Result<Self> {
        let client = Client::builder().build()?;
        let base_url = if config.base_url.is_empty() {
            DEFAULT_BASE_URL.to_string()
        } else {
            config.base_url.trim_end_matches('/').to_string()
        };

        Ok(Self {
            client,
            base_url,
            api_token: config.api_key,
        })
    }

    /// `owner/name` runs the model's latest deployment; `owner/name:version`
    /// pins a version.
    fn prediction_endpoint<'a>(&self, model: &'a str) -> Result<(String, Option<&'a str>)> {
        match model.split_once(':') {
            Some((_, version)) if !version.is_empty() => {
                Ok((format!("{}/predictions", self.base_url), Some(version)))
            }
            _ => {
                let name = model.split(':').next().unwrap_or_default();
                let mut parts = name.splitn(2, '/');
                match (parts.next(), parts.next()) {
                    (Some(owner), Some(model_name))
                        if !owner.is_empty() && !model_name.is_empty() =>
                    {
                        let endpoint = format!(
                            "{}/models/{}/{}/predictions",
                            self.base_url, owner, model_name
                        );
                        Ok((endpoint, None))
                    }
                    _ => Err(Error::config(format!(
                        "Replicate model must look like owner/name, got '{model}'"
                    ))),
                }
            }
        }
    }

    async fn create_prediction(&self, request: &InferenceRequest) -> Result<Prediction> {
        let (endpoint, version) = self.prediction_endpoint(&request.model)?;
        let sampling = &request.sampling;
        let body = CreatePrediction {
            version,
            input: PredictionInput {
                top_k: sampling.top_k,
                top_p: sampling.top_p,
                prompt: &request.prompt,
                max_tokens: sampling.max_tokens,
                temperature: sampling.temperature,
                system_prompt: &request.system_prompt,
                length_penalty: sampling.length_penalty,
                max_new_tokens: sampling.max_new_tokens,
                stop_sequences: &sampling.stop_sequences,
                prompt_template: &sampling.prompt_template,
                presence_penalty: sampling.presence_penalty,
                log_performance_metrics: sampling.log_performance_metrics,
            },
            stream: true,
        };

        let response = self
            .client
            .post(&endpoint)
            .bearer_auth(&self.api_token)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::UpstreamStatus { status, body });
        }

        let prediction: Prediction = response.json().await?;
        if let Some(error) = prediction.error.as_ref().filter(|e| !e.is_null()) {
            return Err(Error::llm(format!(
                "Prediction {} failed: {}",
                prediction.id, error
            )));
        }
        Ok(prediction)
    }
}

#[async_trait]
impl InferenceClient for ReplicateClient {
    async fn stream(&self, request: InferenceRequest) -> Result<FragmentStream> {
        debug!(
            "Creating prediction for model {} ({} prompt chars)",
            request.model,
            request.prompt.len()
        );

        let prediction = self.create_prediction(&request).await?;
        let stream_url = prediction.urls.stream.ok_or_else(|| {
            Error::llm(format!("Prediction {} has no stream URL", prediction.id))
        })?;

        debug!("Streaming prediction {} from {}", prediction.id, stream_url);

        let response = self
            .client
            .get(&stream_url)
            .header(header::ACCEPT, "text/event-stream")
            .header(header::CACHE_CONTROL, "no-store")
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::UpstreamStatus { status, body });
        }

        Ok(fragment_stream(Box::pin(response.bytes_stream())))
    }
}

struct StreamState<S> {
    bytes: Fuse<S>,
    decoder: SseDecoder,
    pending: VecDeque<SseEvent>,
    finished: bool,
}

/// Turns an SSE byte stream into output fragments. Ends on `done`, fails on
/// `error`, ignores other event types.
pub(crate) fn fragment_stream<S, B>(bytes: S) -> FragmentStream
where
    S: futures::Stream<Item = std::result::Result<B, reqwest::Error>>
        + Send
        + Unpin
        + 'static,
    B: AsRef<[u8]> + Send + 'static,
{
    let state = StreamState {
        bytes: bytes.fuse(),
        decoder: SseDecoder::new(),
        pending: VecDeque::new(),
        finished: false,
    };

    futures::stream::unfold(state, |mut state| async move {
        loop {
            if state.finished {
                return None;
            }

            while let Some(event) = state.pending.pop_front() {
                match event.event.as_str() {
                    "output" => return Some((Ok(event.data), state)),
                    "error" => {
                        state.finished = true;
                        let detail = serde_json::from_str::<StreamError>(&event.data)
                            .ok()
                            .and_then(|e| e.detail)
                            .unwrap_or(event.data);
                        let err = Error::llm(format!("Stream error: {detail}"));
                        return Some((Err(err), state));
                    }
                    "done" => {
                        state.finished = true;
                        return None;
                    }
                    _ => {}
                }
            }

            match state.bytes.next().await {
                Some(Ok(chunk)) => {
                    let events = state.decoder.push(chunk.as_ref());
                    state.pending.extend(events);
                }
                Some(Err(e)) => {
                    state.finished = true;
                    return Some((Err(Error::Network(e)), state));
                }
                None => match state.decoder.finish() {
                    Some(event) => state.pending.push_back(event),
                    None => return None,
                },
            }
        }
    })
    .boxed()
}
