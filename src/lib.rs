pub mod config;
pub mod error;
pub mod llm;
pub mod processor;
pub mod storage;

pub use error::{Error, ErrorKind, Result};
