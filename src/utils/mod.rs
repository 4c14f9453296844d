//! Utility functions shared across savor.
//!
//! ## Modules
//!
//! - [`app_data`] - Configuration and application data directory (XDG-compliant)
//! - [`progress`] - Progress bars that compile away without the `progress` feature
//! - [`tokenizer`] - Name and cuisine token splitting, case-insensitive matching
//!
//! ## Key Functions
//!
//! ```no_run
//! use savor::utils::{cuisine_tokens, name_tokens, MIN_TOKEN_CHARS};
//!
//! // Words of a restaurant name that get their own index keys
//! let words: Vec<_> = name_tokens("Pizza Hut", MIN_TOKEN_CHARS).collect();
//! // Returns: ["Pizza", "Hut"]
//!
//! // Trimmed cuisine names
//! let cuisines: Vec<_> = cuisine_tokens("Pizza, Fast Food", MIN_TOKEN_CHARS).collect();
//! // Returns: ["Pizza", "Fast Food"]
//! ```

pub mod app_data;
pub mod progress;
pub mod tokenizer;

pub use app_data::*;
pub use tokenizer::*;
