use anyhow::Result;
use content_tools::{config, processor::PromptProcessor, storage::OssClient};
use futures::StreamExt;
use std::io::Write;
use tracing::info;

const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant";
const DEFAULT_PROMPT: &str = concat!(
    "Johnny has 8 billion parameters. His friend Tommy has 70 billion parameters. ",
    "What does this mean when it comes to speed?"
);

/// Validates that a log level string is valid
fn validate_log_level(level: &str) -> Result<()> {
    level
        .parse::<tracing_subscriber::filter::LevelFilter>()
        .map_err(|_| {
            anyhow::anyhow!(
                "Invalid log level: '{}'. Valid levels: error, warn, info, debug, trace",
                level
            )
        })?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (before logging setup)
    let config = match config::load().await {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    // Environment variable overrides config
    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| config.logs.level.clone());

    if let Err(e) = validate_log_level(&log_level) {
        eprintln!("{}", e);
        std::process::exit(1);
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .or_else(|_| tracing_subscriber::EnvFilter::try_new(&log_level))?,
        )
        .json()
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();

    // `upload <file-or-url>...` stores images; anything else is a prompt
    if args.first().map(String::as_str) == Some("upload") {
        let storage = OssClient::new(&config.storage)?;
        for source in &args[1..] {
            let uploaded = storage.upload_image(source).await?;
            println!("{}\t{}", uploaded.url, uploaded.thumbnail_url);
        }
        return Ok(());
    }

    if config.llm.model.is_none() {
        anyhow::bail!("No model configured; set llm.model or REPLICATE_MODEL");
    }

    let prompt = if args.is_empty() {
        DEFAULT_PROMPT.to_string()
    } else {
        args.join(" ")
    };

    info!("Streaming prompt through {}", config.llm.provider);

    let processor = PromptProcessor::from_config(&config).await?;
    let Some(mut stream) = processor
        .process_stream(Some(DEFAULT_SYSTEM_PROMPT), &prompt)
        .await?
    else {
        anyhow::bail!("Prompt was skipped");
    };

    let mut stdout = std::io::stdout();
    while let Some(fragment) = stream.next().await {
        write!(stdout, "{}", fragment?)?;
        stdout.flush()?;
    }
    writeln!(stdout)?;

    Ok(())
}
