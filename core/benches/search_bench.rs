use criterion::{criterion_group, criterion_main, Criterion};
use genai_core::prompts::EXAMPLES;
use genai_core::{RetrievalIndex, DEFAULT_CORPUS};

fn corpus() -> Vec<String> {
    let mut docs: Vec<String> = Vec::new();
    for i in 0..200 {
        docs.push(format!("{} variant {i}", DEFAULT_CORPUS[i % DEFAULT_CORPUS.len()]));
        docs.push(EXAMPLES[i % EXAMPLES.len()].prompt.to_string());
    }
    docs
}

fn bench_load(c: &mut Criterion) {
    let docs = corpus();
    c.bench_function("load_400_docs", |b| {
        b.iter(|| {
            let mut idx = RetrievalIndex::default();
            idx.load(docs.iter().cloned())
        })
    });
}

fn bench_search(c: &mut Criterion) {
    let mut idx = RetrievalIndex::default();
    idx.load(corpus());
    c.bench_function("search_top10", |b| b.iter(|| idx.search("How is AI improving healthcare?", 10)));
}

criterion_group!(benches, bench_load, bench_search);
criterion_main!(benches);
