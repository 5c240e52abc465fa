//! In-memory TF-IDF retrieval index.
//!
//! Documents are weighted with `tf = 1 + ln(raw_tf)` and an IDF chosen by [`IdfMode`], then
//! normalized to unit length and stored as per-term postings. A query is projected into the
//! same space with the current vocabulary, so cosine similarity reduces to a dot product
//! over the postings of the query terms.

use crate::tokenizer::{tokenize_with, TokenizerConfig};
use crate::{DocId, Generation, TermId};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum IndexError {
    #[error("top_k must be a positive integer")]
    InvalidTopK,
}

/// Inverse document frequency variants.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdfMode {
    /// `ln(N / df)`. A term present in every document carries no weight.
    Standard,
    /// `ln(1 + N / df)`. Every vocabulary term keeps a positive weight.
    #[default]
    Smoothed,
}

impl IdfMode {
    fn idf(self, num_docs: u32, df: u32) -> f32 {
        let ratio = (num_docs.max(1) as f32) / (df.max(1) as f32);
        match self {
            IdfMode::Standard => ratio.ln(),
            IdfMode::Smoothed => (1.0 + ratio).ln(),
        }
    }
}

impl std::str::FromStr for IdfMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "standard" => Ok(IdfMode::Standard),
            "smoothed" => Ok(IdfMode::Smoothed),
            other => Err(format!("unknown idf mode '{other}' (expected standard or smoothed)")),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexConfig {
    #[serde(default)]
    pub idf: IdfMode,
    #[serde(default)]
    pub tokenizer: TokenizerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Posting {
    pub doc_id: DocId,
    pub weight: f32, // unit-normalized tf-idf weight
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub doc_id: DocId,
    pub document: String,
    /// Cosine similarity in `[0, 1]`.
    pub score: f32,
    /// 1-based position in the ranking.
    pub rank: usize,
    pub generation: Generation,
}

impl SearchResult {
    /// True once the corpus this result was ranked against has been replaced.
    pub fn is_stale(&self, current: Generation) -> bool { self.generation != current }
}

#[inline]
fn tf_weight(tf_raw: u32) -> f32 {
    if tf_raw > 0 { 1.0 + (tf_raw as f32).ln() } else { 0.0 }
}

/// One corpus generation: documents, vocabulary and normalized document vectors.
///
/// An index that has never been loaded is Empty; `load` always leaves it Loaded, even
/// with zero documents.
#[derive(Debug, Default)]
pub struct RetrievalIndex {
    config: IndexConfig,
    generation: Generation,
    documents: Vec<String>,
    dictionary: HashMap<String, TermId>,
    df: Vec<u32>,
    postings: Vec<Vec<Posting>>, // by term id, each list sorted by doc_id
}

impl RetrievalIndex {
    pub fn new(config: IndexConfig) -> Self {
        Self { config, ..Self::default() }
    }

    /// Replace the corpus and rebuild every derived structure. Returns the new generation.
    pub fn load<I, S>(&mut self, documents: I) -> Generation
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let next = self.generation.next();
        *self = Self::build(self.config, documents.into_iter().map(Into::into).collect(), next);
        next
    }

    fn build(config: IndexConfig, documents: Vec<String>, generation: Generation) -> Self {
        let mut dictionary: HashMap<String, TermId> = HashMap::new();
        let mut df: Vec<u32> = Vec::new();
        let mut doc_terms: Vec<HashMap<TermId, u32>> = Vec::with_capacity(documents.len());

        for text in &documents {
            let mut tf_counts: HashMap<TermId, u32> = HashMap::new();
            for (term, _pos) in tokenize_with(text, &config.tokenizer) {
                let next_id = dictionary.len() as TermId;
                let tid = *dictionary.entry(term).or_insert_with(|| {
                    df.push(0);
                    next_id
                });
                *tf_counts.entry(tid).or_insert(0) += 1;
            }
            for tid in tf_counts.keys() {
                df[*tid as usize] += 1;
            }
            doc_terms.push(tf_counts);
        }

        let n = documents.len() as u32;
        let idf: Vec<f32> = df.iter().map(|&d| config.idf.idf(n, d)).collect();
        let mut postings: Vec<Vec<Posting>> = vec![Vec::new(); dictionary.len()];
        let mut zero_norm_docs = 0usize;

        // Documents are visited in id order, so every postings list comes out sorted.
        for (doc_id, tf_counts) in doc_terms.into_iter().enumerate() {
            let mut weights: Vec<(TermId, f32)> = tf_counts
                .into_iter()
                .map(|(tid, tf_raw)| (tid, tf_weight(tf_raw) * idf[tid as usize]))
                .filter(|(_, w)| *w > 0.0)
                .collect();
            let norm = weights.iter().map(|(_, w)| w * w).sum::<f32>().sqrt();
            if norm == 0.0 {
                zero_norm_docs += 1;
                continue;
            }
            weights.sort_by_key(|(tid, _)| *tid);
            for (tid, w) in weights {
                postings[tid as usize].push(Posting { doc_id: doc_id as DocId, weight: w / norm });
            }
        }

        tracing::info!(
            %generation,
            num_docs = n,
            num_terms = dictionary.len(),
            zero_norm_docs,
            "corpus loaded"
        );
        Self { config, generation, documents, dictionary, df, postings }
    }

    /// Rank every document against `query` and return the best `min(top_k, len)` of them.
    ///
    /// Ties are broken by ascending document id. Out-of-vocabulary query terms are dropped;
    /// a query with no known terms scores every document 0.
    pub fn search(&self, query: &str, top_k: usize) -> Result<Vec<SearchResult>, IndexError> {
        if top_k == 0 {
            return Err(IndexError::InvalidTopK);
        }
        if self.documents.is_empty() {
            return Ok(Vec::new());
        }

        let q_weights = self.query_vector(query);
        let mut scores = vec![0.0f32; self.documents.len()];
        for (tid, q_w) in &q_weights {
            for p in &self.postings[*tid as usize] {
                scores[p.doc_id as usize] += p.weight * q_w; // cosine since both sides are unit length
            }
        }

        let mut ranked: Vec<(DocId, f32)> = scores
            .into_iter()
            .enumerate()
            .map(|(doc_id, s)| (doc_id as DocId, s.clamp(0.0, 1.0)))
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        ranked.truncate(top_k);

        tracing::debug!(
            generation = %self.generation,
            query_terms = q_weights.len(),
            returned = ranked.len(),
            "search"
        );
        Ok(ranked
            .into_iter()
            .enumerate()
            .map(|(i, (doc_id, score))| SearchResult {
                doc_id,
                document: self.documents[doc_id as usize].clone(),
                score,
                rank: i + 1,
                generation: self.generation,
            })
            .collect())
    }

    /// Unit-normalized query weights keyed by term id. Ordered so that score accumulation
    /// is bit-for-bit repeatable.
    fn query_vector(&self, query: &str) -> BTreeMap<TermId, f32> {
        let mut tf_q_raw: BTreeMap<TermId, u32> = BTreeMap::new();
        for (term, _pos) in tokenize_with(query, &self.config.tokenizer) {
            if let Some(&tid) = self.dictionary.get(&term) {
                *tf_q_raw.entry(tid).or_insert(0) += 1;
            }
        }
        let n = self.documents.len() as u32;
        let mut q_weights: BTreeMap<TermId, f32> = tf_q_raw
            .into_iter()
            .map(|(tid, tf_raw)| (tid, tf_weight(tf_raw) * self.config.idf.idf(n, self.df[tid as usize])))
            .filter(|(_, w)| *w > 0.0)
            .collect();
        let norm = q_weights.values().map(|w| w * w).sum::<f32>().sqrt();
        if norm == 0.0 {
            return BTreeMap::new();
        }
        for w in q_weights.values_mut() {
            *w /= norm;
        }
        q_weights
    }

    pub fn generation(&self) -> Generation { self.generation }
    pub fn config(&self) -> IndexConfig { self.config }
    pub fn len(&self) -> usize { self.documents.len() }
    pub fn is_empty(&self) -> bool { self.documents.is_empty() }
    pub fn is_loaded(&self) -> bool { self.generation > Generation(0) }
    pub fn vocabulary_len(&self) -> usize { self.dictionary.len() }
    pub fn document(&self, doc_id: DocId) -> Option<&str> { self.documents.get(doc_id as usize).map(String::as_str) }
    pub fn documents(&self) -> &[String] { &self.documents }

    /// Document frequency of an already-tokenized term, if it is in the vocabulary.
    pub fn doc_frequency(&self, term: &str) -> Option<u32> {
        self.dictionary.get(term).map(|&tid| self.df[tid as usize])
    }
}

/// A [`RetrievalIndex`] shared between concurrent readers.
///
/// Loads build the next generation without holding the read/write lock and then publish it
/// with a pointer swap, so a search always sees one complete generation. Loads are
/// serialized among themselves so generations are published in order.
pub struct SharedIndex {
    current: RwLock<Arc<RetrievalIndex>>,
    writer: Mutex<()>,
}

impl SharedIndex {
    pub fn new(config: IndexConfig) -> Self {
        Self { current: RwLock::new(Arc::new(RetrievalIndex::new(config))), writer: Mutex::new(()) }
    }

    /// The currently published generation. Holding it does not block loads.
    pub fn snapshot(&self) -> Arc<RetrievalIndex> { self.current.read().clone() }

    /// Replace the corpus and return the generation that was published.
    pub fn load<I, S>(&self, documents: I) -> Arc<RetrievalIndex>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let _guard = self.writer.lock();
        self.publish(documents.into_iter().map(Into::into).collect())
    }

    /// Load `documents` only if the current generation holds no documents. Returns the new
    /// generation when a load happened.
    pub fn seed_if_empty<I, S>(&self, documents: I) -> Option<Generation>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        // Searches on a populated index must not queue behind a load in progress.
        if !self.snapshot().is_empty() {
            return None;
        }
        let _guard = self.writer.lock();
        if !self.snapshot().is_empty() {
            return None;
        }
        Some(self.publish(documents.into_iter().map(Into::into).collect()).generation())
    }

    fn publish(&self, documents: Vec<String>) -> Arc<RetrievalIndex> {
        let prev = self.snapshot();
        let next = prev.generation().next();
        let built = Arc::new(RetrievalIndex::build(prev.config(), documents, next));
        *self.current.write() = Arc::clone(&built);
        built
    }

    pub fn search(&self, query: &str, top_k: usize) -> Result<Vec<SearchResult>, IndexError> {
        self.snapshot().search(query, top_k)
    }
}

impl Default for SharedIndex {
    fn default() -> Self { Self::new(IndexConfig::default()) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_index_returns_nothing() {
        let idx = RetrievalIndex::default();
        assert!(!idx.is_loaded());
        assert!(idx.search("anything", 5).unwrap().is_empty());
    }

    #[test]
    fn zero_top_k_is_rejected() {
        let mut idx = RetrievalIndex::default();
        idx.load(["rust search"]);
        assert_eq!(idx.search("rust", 0), Err(IndexError::InvalidTopK));
        // Even on an empty corpus the contract is checked first.
        assert_eq!(RetrievalIndex::default().search("rust", 0), Err(IndexError::InvalidTopK));
    }

    #[test]
    fn postings_are_unit_normalized() {
        let mut idx = RetrievalIndex::default();
        idx.load(["alpha beta beta", "beta gamma"]);
        let mut norms = vec![0.0f32; idx.len()];
        for plist in &idx.postings {
            for p in plist {
                norms[p.doc_id as usize] += p.weight * p.weight;
            }
        }
        for n in norms {
            assert!((n - 1.0).abs() < 1e-5, "norm^2 = {n}");
        }
    }

    #[test]
    fn standard_idf_zeroes_ubiquitous_terms() {
        let mut idx = RetrievalIndex::new(IndexConfig { idf: IdfMode::Standard, ..Default::default() });
        idx.load(["shared alpha", "shared beta"]);
        let hits = idx.search("shared", 2).unwrap();
        assert!(hits.iter().all(|h| h.score == 0.0));
        assert_eq!(hits[0].doc_id, 0);
    }

    #[test]
    fn idf_mode_parses() {
        assert_eq!("Standard".parse::<IdfMode>(), Ok(IdfMode::Standard));
        assert_eq!("smoothed".parse::<IdfMode>(), Ok(IdfMode::Smoothed));
        assert!("bm25".parse::<IdfMode>().is_err());
    }

    #[test]
    fn seed_if_empty_only_seeds_once() {
        let shared = SharedIndex::default();
        assert_eq!(shared.seed_if_empty(["first corpus"]), Some(Generation(1)));
        assert_eq!(shared.seed_if_empty(["second corpus"]), None);
        assert_eq!(shared.snapshot().document(0), Some("first corpus"));
    }

    #[test]
    fn load_returns_the_generation_it_published() {
        let shared = SharedIndex::default();
        let published = shared.load(["alpha beta", "gamma"]);
        assert_eq!(published.generation(), Generation(1));
        assert_eq!(published.len(), 2);
        assert_eq!(published.vocabulary_len(), 3);
        assert!(Arc::ptr_eq(&published, &shared.snapshot()));
    }

    #[test]
    fn seed_if_empty_does_not_wait_for_a_running_load() {
        use std::sync::mpsc;
        use std::time::{Duration, Instant};

        let shared = Arc::new(SharedIndex::default());
        shared.load(["already loaded"]);

        // Hold the loader lock the way a long rebuild would.
        let (locked_tx, locked_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel::<()>();
        let holder = {
            let shared = Arc::clone(&shared);
            std::thread::spawn(move || {
                let _guard = shared.writer.lock();
                locked_tx.send(()).unwrap();
                release_rx.recv_timeout(Duration::from_secs(10)).ok();
            })
        };
        locked_rx.recv().unwrap();

        let start = Instant::now();
        assert_eq!(shared.seed_if_empty(["seed"]), None);
        assert!(shared.search("loaded", 1).unwrap()[0].score > 0.0);
        let waited = start.elapsed();

        release_tx.send(()).unwrap();
        holder.join().unwrap();
        assert!(waited < Duration::from_secs(5), "waited {waited:?}");
        assert_eq!(shared.snapshot().generation(), Generation(1));
    }
}
