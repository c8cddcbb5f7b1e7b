//! Response caching for repeated questions.

mod store;

pub use store::{CacheStats, ResponseCache};
