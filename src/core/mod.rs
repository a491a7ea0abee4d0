pub mod config;
pub mod errors;
pub mod logging;
pub mod paths;

pub use config::{ChunkingStrategy, PipelineConfig, Settings};
pub use errors::ApiError;
pub use paths::AppPaths;
