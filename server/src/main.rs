use anyhow::Result;
use axum::Router;
use clap::Parser;
use genai_core::tokenizer::TokenizerConfig;
use genai_core::{IdfMode, IndexConfig};
use genai_server::{build_app, state_from_corpus, AppState};
use std::net::SocketAddr;
use std::path::PathBuf;
use tokio::net::TcpListener;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "genai-server")]
#[command(about = "REST API over the TF-IDF retrieval index, prompt tools and project registry")]
struct Args {
    /// Corpus to load at startup (file or directory). Without it the default corpus is seeded on first search.
    #[arg(long)]
    corpus: Option<PathBuf>,
    /// IDF variant: standard = ln(N/df), smoothed = ln(1 + N/df)
    #[arg(long, default_value = "smoothed")]
    idf: IdfMode,
    /// Stem terms with the English Snowball stemmer
    #[arg(long, default_value_t = false)]
    stem: bool,
    /// Host to bind
    #[arg(long, default_value = "0.0.0.0")]
    host: String,
    /// Port to bind
    #[arg(long, default_value_t = 8000)]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Args::parse();
    let config = IndexConfig { idf: args.idf, tokenizer: TokenizerConfig { stem: args.stem } };
    let state = match &args.corpus {
        Some(path) => state_from_corpus(config, path)?,
        None => AppState::new(config),
    };
    let app: Router = build_app(state);

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
