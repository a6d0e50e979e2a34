mod prompt;
pub mod text;

pub use prompt::PromptProcessor;
