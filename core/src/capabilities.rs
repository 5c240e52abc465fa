//! Model-backed capabilities a host may inject. Nothing in this crate implements them; the
//! retrieval index never depends on them.

use anyhow::Result;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sentiment {
    /// Label as reported by the model, e.g. `POSITIVE`.
    pub label: String,
    pub confidence: f32,
}

pub trait TextClassifier: Send + Sync {
    fn classify(&self, text: &str) -> Result<Sentiment>;
}

pub trait TextGenerator: Send + Sync {
    /// Continue `prompt`, producing at most `max_length` tokens including the prompt.
    fn generate(&self, prompt: &str, max_length: usize) -> Result<String>;
}
