mod cli;
mod http;

pub use cli::OllamaCli;
pub use http::OllamaHttp;

pub const DEFAULT_MODEL: &str = "CustomLlama3:latest";
