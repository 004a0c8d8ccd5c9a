pub mod indexer;
pub mod matcher;
