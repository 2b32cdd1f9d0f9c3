pub mod chunking_strategy;
pub mod loader;
pub mod retriever;
