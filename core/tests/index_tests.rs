use genai_core::corpus::read_corpus;
use genai_core::{Generation, IdfMode, IndexConfig, RetrievalIndex, SharedIndex, DEFAULT_CORPUS};
use std::fs;
use std::sync::Arc;
use tempfile::tempdir;

const HEALTH_CORPUS: [&str; 3] = [
    "AI is transforming healthcare through improved diagnosis.",
    "Machine learning predicts equipment failures in manufacturing.",
    "AI chatbots revolutionize customer service.",
];

fn loaded(docs: &[&str]) -> RetrievalIndex {
    let mut idx = RetrievalIndex::default();
    idx.load(docs.iter().copied());
    idx
}

#[test]
fn healthcare_query_ranks_shared_terms_first() {
    for idf in [IdfMode::Smoothed, IdfMode::Standard] {
        let mut idx = RetrievalIndex::new(IndexConfig { idf, ..Default::default() });
        idx.load(HEALTH_CORPUS);
        let all = idx.search("How is AI improving healthcare?", 3).unwrap();
        assert_eq!(all.iter().map(|r| r.doc_id).collect::<Vec<_>>(), vec![0, 2, 1], "{idf:?}");
        assert!(all[0].score > all[1].score);
        assert!(all[1].score > all[2].score);
        assert_eq!(all[2].score, 0.0);

        let top2 = idx.search("How is AI improving healthcare?", 2).unwrap();
        assert_eq!(top2.len(), 2);
        assert_eq!(top2[0].document, HEALTH_CORPUS[0]);
        assert_eq!(top2[1].document, HEALTH_CORPUS[2]);
    }
}

#[test]
fn empty_corpus_returns_empty_results() {
    let idx = loaded(&[]);
    assert!(idx.is_loaded());
    assert_eq!(idx.generation(), Generation(1));
    for k in [1, 5, 100] {
        assert!(idx.search("anything at all", k).unwrap().is_empty());
    }
}

#[test]
fn returns_min_of_k_and_corpus_size_with_dense_ranks() {
    let idx = loaded(&DEFAULT_CORPUS);
    for k in [1, 3, 5, 50] {
        let hits = idx.search("AI applications", k).unwrap();
        assert_eq!(hits.len(), k.min(DEFAULT_CORPUS.len()));
        for (i, h) in hits.iter().enumerate() {
            assert_eq!(h.rank, i + 1);
            assert!((0.0..=1.0).contains(&h.score));
        }
        for pair in hits.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
    }
}

#[test]
fn search_is_deterministic() {
    let idx = loaded(&DEFAULT_CORPUS);
    let a = idx.search("generative AI content creation", 5).unwrap();
    let b = idx.search("generative AI content creation", 5).unwrap();
    assert_eq!(a, b);
}

#[test]
fn ties_break_by_corpus_order() {
    let idx = loaded(&["solar panels", "wind turbines", "solar panels", "solar panels"]);
    let hits = idx.search("solar", 4).unwrap();
    assert_eq!(hits.iter().map(|h| h.doc_id).collect::<Vec<_>>(), vec![0, 2, 3, 1]);
    assert_eq!(hits[0].score, hits[1].score);
    assert_eq!(hits[1].score, hits[2].score);

    // A query with no known terms ties everything at zero.
    let none = idx.search("quantum", 4).unwrap();
    assert_eq!(none.iter().map(|h| h.doc_id).collect::<Vec<_>>(), vec![0, 1, 2, 3]);
    assert!(none.iter().all(|h| h.score == 0.0));
}

#[test]
fn document_is_most_similar_to_itself() {
    let idx = loaded(&DEFAULT_CORPUS);
    for (i, doc) in DEFAULT_CORPUS.iter().enumerate() {
        let hits = idx.search(doc, 1).unwrap();
        assert_eq!(hits[0].doc_id as usize, i);
        assert!((hits[0].score - 1.0).abs() < 1e-4, "score {}", hits[0].score);
    }
}

#[test]
fn reload_discards_previous_generation() {
    let mut idx = loaded(&HEALTH_CORPUS);
    let old = idx.search("healthcare", 1).unwrap();
    assert!(old[0].score > 0.0);

    let gen = idx.load(["Rust ownership and borrowing.", "Tokio async runtimes."]);
    assert_eq!(gen, Generation(2));
    assert!(old[0].is_stale(gen));
    assert_eq!(idx.doc_frequency("healthcare"), None);
    assert_eq!(idx.len(), 2);

    let hits = idx.search("healthcare", 5).unwrap();
    assert_eq!(hits.len(), 2);
    assert!(hits.iter().all(|h| h.score == 0.0 && h.generation == gen));
    assert!(hits.iter().all(|h| !HEALTH_CORPUS.contains(&h.document.as_str())));
}

#[test]
fn stopword_only_documents_score_zero() {
    let idx = loaded(&["the a of", "", "rust search engine"]);
    let hits = idx.search("the rust", 3).unwrap();
    assert_eq!(hits[0].doc_id, 2);
    assert!(hits[0].score > 0.0);
    assert_eq!(hits[1].score, 0.0);
    assert_eq!(hits[2].score, 0.0);
    assert!(hits.iter().all(|h| h.score.is_finite()));

    // A query made only of stop words is equally harmless.
    let hits = idx.search("the a of", 3).unwrap();
    assert!(hits.iter().all(|h| h.score == 0.0));
}

#[test]
fn stemming_matches_inflections() {
    let mut idx = RetrievalIndex::new(IndexConfig { tokenizer: genai_core::tokenizer::TokenizerConfig { stem: true }, ..Default::default() });
    idx.load(HEALTH_CORPUS);
    assert_eq!(idx.doc_frequency("improv"), Some(1));
    let hits = idx.search("improving diagnoses", 1).unwrap();
    assert_eq!(hits[0].doc_id, 0);
}

#[test]
fn concurrent_searches_see_whole_generations() {
    let shared = Arc::new(SharedIndex::default());
    shared.load(HEALTH_CORPUS);
    let readers: Vec<_> = (0..4)
        .map(|_| {
            let shared = Arc::clone(&shared);
            std::thread::spawn(move || {
                for _ in 0..200 {
                    let snap = shared.snapshot();
                    let hits = snap.search("AI healthcare", 10).unwrap();
                    assert_eq!(hits.len(), snap.len());
                    assert!(hits.iter().all(|h| h.generation == snap.generation()));
                }
            })
        })
        .collect();
    for i in 0..20 {
        if i % 2 == 0 { shared.load(DEFAULT_CORPUS); } else { shared.load(HEALTH_CORPUS); }
    }
    for r in readers {
        r.join().unwrap();
    }
    assert_eq!(shared.snapshot().generation(), Generation(21));
}

#[test]
fn reads_corpus_files_in_path_order() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.json"), r#"["first", {"text": "second"}]"#).unwrap();
    fs::write(dir.path().join("b.jsonl"), "\"third\"\n\n{\"body\": \"fourth\"}\n").unwrap();
    fs::write(dir.path().join("c.txt"), "fifth\n  \nsixth\n").unwrap();
    let docs = read_corpus(dir.path()).unwrap();
    assert_eq!(docs, vec!["first", "second", "third", "fourth", "fifth", "sixth"]);
}

#[test]
fn corpus_with_non_string_entry_is_rejected() {
    let dir = tempdir().unwrap();
    let file = dir.path().join("bad.json");
    fs::write(&file, r#"["ok", 3]"#).unwrap();
    let err = read_corpus(&file).unwrap_err();
    assert!(format!("{err:#}").contains("bad.json"));
    assert!(read_corpus(dir.path().join("missing")).is_err());
}
