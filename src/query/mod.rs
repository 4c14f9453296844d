pub mod engine;

pub use engine::{AutocompleteResponse, QueryEngine, ResultItem};
