use super::mocks::{CharCodec, MockInferenceClient};
use content_tools::{
    config::{LlmConfig, PromptsConfig, StorageConfig},
    llm::TokenCodec,
    processor::PromptProcessor,
    storage::{FixedClock, OssClient},
};
use chrono::{TimeZone, Utc};
use image::{ImageBuffer, ImageFormat, Rgba};
use object_store::memory::InMemory;
use serde_json::{Map, Value, json};
use std::{
    io::Cursor,
    path::{Path, PathBuf},
    sync::Arc,
};

pub const MODEL: &str = "meta/meta-llama-3-8b-instruct";

/// Create an LLM configuration with a model and a small token budget
pub fn create_llm_config(max_input_tokens: usize) -> LlmConfig {
    LlmConfig {
        model: Some(MODEL.to_string()),
        max_input_tokens,
        ..LlmConfig::default()
    }
}

pub fn create_prompts() -> PromptsConfig {
    PromptsConfig {
        detail: Some("Describe the tool.".to_string()),
        tag_selector: Some("Pick tags from the list.".to_string()),
        language: Some("Translate the text into {language}.".to_string()),
    }
}

pub fn create_processor(
    client: &MockInferenceClient,
    max_input_tokens: usize,
) -> PromptProcessor {
    create_processor_with_codec(client, Arc::new(CharCodec::default()), max_input_tokens)
}

pub fn create_processor_with_codec(
    client: &MockInferenceClient,
    codec: Arc<dyn TokenCodec>,
    max_input_tokens: usize,
) -> PromptProcessor {
    PromptProcessor::new(
        Arc::new(client.clone()),
        codec,
        &create_llm_config(max_input_tokens),
        create_prompts(),
    )
}

pub fn fixed_clock() -> FixedClock {
    FixedClock(Utc.with_ymd_and_hms(2024, 5, 3, 8, 30, 0).unwrap())
}

pub fn create_storage_config(custom_domain: Option<&str>) -> StorageConfig {
    StorageConfig {
        endpoint_url: "https://account.r2.cloudflarestorage.com".to_string(),
        bucket: "tools-bucket".to_string(),
        custom_domain: custom_domain.map(str::to_string),
        ..StorageConfig::default()
    }
}

/// In-memory store plus a client wired to it with a fixed clock
pub fn create_oss_client(custom_domain: Option<&str>) -> (Arc<InMemory>, OssClient) {
    let store = Arc::new(InMemory::new());
    let client = OssClient::with_store(store.clone(), &create_storage_config(custom_domain))
        .unwrap()
        .with_clock(Arc::new(fixed_clock()));
    (store, client)
}

/// PNG of the given size
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = ImageBuffer::from_fn(width, height, |x, y| {
        Rgba([(x % 256) as u8, (y % 256) as u8, 200, 255])
    });
    let mut buffer = Cursor::new(Vec::new());
    img.write_to(&mut buffer, ImageFormat::Png).unwrap();
    buffer.into_inner()
}

pub const BOS_TOKEN: &str = "<|begin_of_text|>";
pub const BOS_ID: u32 = 256;

/// Character the byte-level pre-tokenizer uses for `byte`
fn byte_char(byte: u8) -> char {
    let printable = |b: u8| matches!(b, b'!'..=b'~' | 0xA1..=0xAC | 0xAE..=0xFF);
    if printable(byte) {
        return char::from(byte);
    }
    let offset = (0..byte).filter(|&b| !printable(b)).count() as u32;
    char::from_u32(256 + offset).unwrap()
}

/// Byte-level BPE `tokenizer.json` without merges, so token id == byte value.
/// Carries a BOS special token and a template that prepends it.
pub fn byte_level_tokenizer_json() -> String {
    let vocab: Map<String, Value> = (0..=255u8)
        .map(|b| (byte_char(b).to_string(), json!(b)))
        .collect();
    let bos = json!({ "SpecialToken": { "id": BOS_TOKEN, "type_id": 0 } });

    json!({
        "version": "1.0",
        "truncation": null,
        "padding": null,
        "added_tokens": [{
            "id": BOS_ID,
            "content": BOS_TOKEN,
            "single_word": false,
            "lstrip": false,
            "rstrip": false,
            "normalized": false,
            "special": true
        }],
        "normalizer": null,
        "pre_tokenizer": {
            "type": "ByteLevel",
            "add_prefix_space": false,
            "trim_offsets": true,
            "use_regex": true
        },
        "post_processor": {
            "type": "TemplateProcessing",
            "single": [bos, { "Sequence": { "id": "A", "type_id": 0 } }],
            "pair": [
                bos,
                { "Sequence": { "id": "A", "type_id": 0 } },
                { "Sequence": { "id": "B", "type_id": 1 } }
            ],
            "special_tokens": {
                (BOS_TOKEN): { "id": BOS_TOKEN, "ids": [BOS_ID], "tokens": [BOS_TOKEN] }
            }
        },
        "decoder": {
            "type": "ByteLevel",
            "add_prefix_space": true,
            "trim_offsets": true,
            "use_regex": true
        },
        "model": {
            "type": "BPE",
            "dropout": null,
            "unk_token": null,
            "continuing_subword_prefix": null,
            "end_of_word_suffix": null,
            "fuse_unk": false,
            "byte_fallback": false,
            "vocab": vocab,
            "merges": []
        }
    })
    .to_string()
}

/// Writes the byte-level tokenizer to `dir/tokenizer.json`
pub fn write_tokenizer(dir: &Path) -> PathBuf {
    std::fs::create_dir_all(dir).unwrap();
    let path = dir.join("tokenizer.json");
    std::fs::write(&path, byte_level_tokenizer_json()).unwrap();
    path
}

/// Lays out an `hf-hub` cache under `cache_dir` holding `repo`'s tokenizer
/// at revision `main`.
pub fn seed_hub_cache(cache_dir: &Path, repo: &str) {
    let repo_dir = cache_dir.join(format!("models--{}", repo.replace('/', "--")));
    let commit = "0123456789abcdef";
    std::fs::create_dir_all(repo_dir.join("refs")).unwrap();
    std::fs::write(repo_dir.join("refs").join("main"), commit).unwrap();
    write_tokenizer(&repo_dir.join("snapshots").join(commit));
}
