//! Built-in native tools used by the executors
//!
//! - `terminal`: allow-listed command execution
//! - `web`: page fetching
//! - `extract`: HTML to bounded text

pub mod extract;
pub mod terminal;
pub mod web;

pub use extract::{truncate_chars, ContentExtractor, ExtractedContent};
pub use terminal::{TerminalOutcome, TerminalTool};
pub use web::{FetchError, FetchedPage, WebFetcher};
