use genai_core::tokenizer::{tokenize, tokenize_with, TokenizerConfig};

fn words(toks: Vec<(String, usize)>) -> Vec<String> {
    toks.into_iter().map(|(w, _)| w).collect()
}

#[test]
fn it_normalizes_and_lowercases() {
    let words = words(tokenize("Running Runners RUN! The ﬁle menu."));
    assert!(words.contains(&"running".to_string()));
    assert!(words.contains(&"run".to_string()));
    // NFKC folds the ligature
    assert!(words.contains(&"file".to_string()));
}

#[test]
fn it_stems_when_configured() {
    let words = words(tokenize_with("improved improving improves", &TokenizerConfig { stem: true }));
    assert_eq!(words, vec!["improv", "improv", "improv"]);
}

#[test]
fn it_filters_stopwords() {
    let words = words(tokenize("The quick brown fox and the lazy dog"));
    assert!(!words.contains(&"the".to_string()));
    assert!(!words.contains(&"and".to_string()));
    assert_eq!(words, vec!["quick", "brown", "fox", "lazy", "dog"]);
}

#[test]
fn hyphens_and_digits_split_words() {
    let words = words(tokenize("AI-powered chatbots, 24/7 availability"));
    assert_eq!(words, vec!["ai", "powered", "chatbots", "availability"]);
}

#[test]
fn stopword_only_text_is_empty() {
    assert!(tokenize("the a of").is_empty());
    assert!(tokenize("").is_empty());
}
