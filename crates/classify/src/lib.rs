//! Sensitive text classification backed by a generative model.

mod gemini;

pub use gemini::{build_generate_body, extract_reply_text, GeminiClassifier, GeminiConfig, DEFAULT_MODEL};
pub use redact_core::{ClassificationError, ClassificationRequest, Classifier};
