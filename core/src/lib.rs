pub mod capabilities;
pub mod corpus;
pub mod index;
pub mod projects;
pub mod prompts;
pub mod tokenizer;

use serde::{Deserialize, Serialize};

pub use index::{IdfMode, IndexConfig, IndexError, RetrievalIndex, SearchResult, SharedIndex};

pub type TermId = u32;
/// Position of a document within its corpus generation.
pub type DocId = u32;

/// Version tag for one `load` of a corpus. `Generation(0)` means nothing has been loaded yet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Generation(pub u64);

impl Generation {
    pub fn next(self) -> Self { Generation(self.0 + 1) }
}

impl std::fmt::Display for Generation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "gen-{}", self.0)
    }
}

/// Seed corpus hosts load when a search arrives before any corpus was supplied.
pub const DEFAULT_CORPUS: [&str; 5] = [
    "AI is transforming healthcare through improved diagnosis and treatment planning.",
    "Machine learning algorithms can predict equipment failures in manufacturing.",
    "AI-powered chatbots revolutionize customer service with 24/7 availability.",
    "Generative AI creates new opportunities in content creation and creative industries.",
    "Edge AI enables real-time processing and privacy-preserving applications.",
];

/// RFC 3339 UTC timestamp for API payloads.
pub fn now_rfc3339() -> String {
    time::OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_default()
}
