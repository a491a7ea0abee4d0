pub mod facts;

pub use facts::{extract_facts, Fact, ExtractionReport};
