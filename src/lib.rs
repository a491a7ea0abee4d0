pub mod core;
pub mod llm;
pub mod pipeline;
pub mod rag;
pub mod scraper;
pub mod server;
pub mod state;
