//! Built-in classifier and generator backends.

mod classifier;
mod generator;

pub use classifier::KeywordClassifier;
pub use generator::TemplateGenerator;
