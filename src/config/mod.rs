pub mod env;
mod loader;

pub use env::{AppConfig, DirectoryConfig, ModelConfig};
pub use loader::load_config;
