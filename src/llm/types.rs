use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};

/// Incremental pieces of generated text, in arrival order. Finite and
/// single-pass.
pub type FragmentStream = BoxStream<'static, crate::Result<String>>;

pub const LLAMA3_PROMPT_TEMPLATE: &str = concat!(
    "<|begin_of_text|><|start_header_id|>system<|end_header_id|>\n\n{system_prompt}<|eot_id|>",
    "<|start_header_id|>user<|end_header_id|>\n\n{prompt}<|eot_id|>",
    "<|start_header_id|>assistant<|end_header_id|>\n\n"
);

pub const LLAMA3_STOP_SEQUENCES: &str = "<|end_of_text|>,<|eot_id|>";

/// Sampling parameters sent with every inference call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SamplingConfig {
    pub top_k: u32,
    pub top_p: f32,
    pub max_tokens: u32,
    pub temperature: f32,
    pub length_penalty: f32,
    pub max_new_tokens: u32,
    pub stop_sequences: String,
    pub prompt_template: String,
    pub presence_penalty: f32,
    pub log_performance_metrics: bool,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            top_k: 0,
            top_p: 0.95,
            max_tokens: 512,
            temperature: 0.7,
            length_penalty: 1.0,
            max_new_tokens: 512,
            stop_sequences: LLAMA3_STOP_SEQUENCES.to_string(),
            prompt_template: LLAMA3_PROMPT_TEMPLATE.to_string(),
            presence_penalty: 0.0,
            log_performance_metrics: false,
        }
    }
}

impl SamplingConfig {
    pub fn stop_sequence_list(&self) -> Vec<String> {
        self.stop_sequences
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct InferenceRequest {
    pub model: String,
    pub system_prompt: String,
    pub prompt: String,
    pub sampling: SamplingConfig,
}

impl InferenceRequest {
    pub fn new(
        model: impl Into<String>,
        system_prompt: impl Into<String>,
        prompt: impl Into<String>,
    ) -> Self {
        Self {
            model: model.into(),
            system_prompt: system_prompt.into(),
            prompt: prompt.into(),
            sampling: SamplingConfig::default(),
        }
    }
}
