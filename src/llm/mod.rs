mod client;
mod openai;
mod replicate;
mod sse;
mod tokenizer;
mod types;

pub use client::{InferenceClient, create_inference_client};
pub use openai::OpenAiClient;
pub use replicate::ReplicateClient;
pub use sse::{SseDecoder, SseEvent};
pub use tokenizer::{HfTokenizer, TokenCodec};
pub use types::*;
