use anyhow::{bail, Result};
use clap::{Args, Parser, Subcommand};
use genai_core::corpus::read_corpus;
use genai_core::prompts::{analyze_prompt, prompt_template, technique_summaries, Technique};
use genai_core::tokenizer::TokenizerConfig;
use genai_core::{IdfMode, IndexConfig, RetrievalIndex, DEFAULT_CORPUS};
use serde::Serialize;
use serde_json::json;
use std::path::PathBuf;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "rag")]
#[command(about = "Query a TF-IDF document index and inspect prompts", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct CorpusArgs {
    /// Corpus file or directory (.json, .jsonl or one document per line). Defaults to the built-in corpus.
    #[arg(long)]
    corpus: Option<PathBuf>,
    /// IDF variant: standard = ln(N/df), smoothed = ln(1 + N/df)
    #[arg(long, default_value = "smoothed")]
    idf: IdfMode,
    /// Stem terms with the English Snowball stemmer
    #[arg(long, default_value_t = false)]
    stem: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Rank corpus documents against a query
    Search {
        #[command(flatten)]
        corpus: CorpusArgs,
        /// Free-text query
        #[arg(long, short)]
        query: String,
        /// Number of results to return
        #[arg(long, short, default_value_t = 3)]
        k: usize,
    },
    /// Print corpus and vocabulary sizes
    Stats {
        #[command(flatten)]
        corpus: CorpusArgs,
    },
    /// Score a prompt against prompt-writing heuristics
    AnalyzePrompt {
        prompt: String,
    },
    /// List prompt techniques with their catalog coverage
    Techniques,
    /// Print the prompt template for a use case and technique
    Template {
        #[arg(long)]
        use_case: String,
        #[arg(long)]
        technique: Technique,
    },
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).with_writer(std::io::stderr).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Search { corpus, query, k } => {
            if k == 0 {
                bail!("--k must be a positive integer");
            }
            let index = load_index(&corpus)?;
            let results = index.search(&query, k)?;
            print_json(&json!({
                "query": query,
                "total_documents": index.len(),
                "results": results,
            }))
        }
        Commands::Stats { corpus } => {
            let index = load_index(&corpus)?;
            print_json(&json!({
                "total_documents": index.len(),
                "vocabulary_size": index.vocabulary_len(),
                "config": index.config(),
            }))
        }
        Commands::AnalyzePrompt { prompt } => print_json(&analyze_prompt(&prompt)),
        Commands::Techniques => print_json(&technique_summaries()),
        Commands::Template { use_case, technique } => {
            println!("{}", prompt_template(&use_case, technique));
            Ok(())
        }
    }
}

fn load_index(args: &CorpusArgs) -> Result<RetrievalIndex> {
    let documents = match &args.corpus {
        Some(path) => read_corpus(path)?,
        None => DEFAULT_CORPUS.iter().map(|d| d.to_string()).collect(),
    };
    let mut index = RetrievalIndex::new(IndexConfig { idf: args.idf, tokenizer: TokenizerConfig { stem: args.stem } });
    index.load(documents);
    Ok(index)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_corpus_is_used_without_path() {
        let args = CorpusArgs { corpus: None, idf: IdfMode::Standard, stem: false };
        let index = load_index(&args).unwrap();
        assert_eq!(index.len(), DEFAULT_CORPUS.len());
        assert_eq!(index.config().idf, IdfMode::Standard);
    }

    #[test]
    fn cli_parses_search_flags() {
        let cli = Cli::try_parse_from(["rag", "search", "-q", "edge ai", "-k", "2", "--stem"]).unwrap();
        match cli.command {
            Commands::Search { corpus, query, k } => {
                assert!(corpus.stem);
                assert_eq!(query, "edge ai");
                assert_eq!(k, 2);
            }
            _ => panic!("expected search"),
        }
    }
}
