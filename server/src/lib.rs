use anyhow::Result;
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        FromRequest, FromRequestParts, Path, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use genai_core::capabilities::{TextClassifier, TextGenerator};
use genai_core::projects::{NewProject, Project, ProjectError, ProjectStore};
use genai_core::prompts::{self, Difficulty, PromptAnalysis, PromptExample, Technique, TechniqueSummary};
use genai_core::{now_rfc3339, DocId, Generation, IndexConfig, IndexError, SearchResult, SharedIndex, DEFAULT_CORPUS};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub const API_VERSION: &str = "1.0.0";
pub const MAX_TOP_K: usize = 10;

/// Error response rendered as `{ "detail": "..." }` with the matching status code.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    detail: String,
}

type ApiResult<T> = std::result::Result<Json<T>, ApiError>;

fn api_error(status: StatusCode, detail: impl Into<String>) -> ApiError {
    ApiError { status, detail: detail.into() }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "detail": self.detail }))).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        api_error(rejection.status(), rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        api_error(rejection.status(), rejection.body_text())
    }
}

/// `Json` body extractor whose rejections use the API error body.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// `Query` extractor whose rejections use the API error body.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);

#[derive(Default)]
pub struct AppState {
    pub index: SharedIndex,
    pub projects: ProjectStore,
    pub classifier: Option<Arc<dyn TextClassifier>>,
    pub generator: Option<Arc<dyn TextGenerator>>,
}

impl AppState {
    pub fn new(config: IndexConfig) -> Self {
        Self { index: SharedIndex::new(config), ..Self::default() }
    }

    pub fn with_classifier(mut self, classifier: Arc<dyn TextClassifier>) -> Self {
        self.classifier = Some(classifier);
        self
    }

    pub fn with_generator(mut self, generator: Arc<dyn TextGenerator>) -> Self {
        self.generator = Some(generator);
        self
    }
}

pub fn build_app(state: AppState) -> Router {
    // CORS: read CORS_ALLOW_ORIGIN (comma-separated) or allow Any by default
    let cors = match std::env::var("CORS_ALLOW_ORIGIN") {
        Ok(val) => {
            let origins: Vec<_> = val
                .split(',')
                .filter_map(|s| s.trim().parse().ok())
                .collect();
            if origins.is_empty() {
                CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
            } else {
                CorsLayer::new().allow_origin(AllowOrigin::list(origins)).allow_methods(Any).allow_headers(Any)
            }
        }
        Err(_) => CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any),
    };

    Router::new()
        .route("/health", get(health_handler))
        .route("/search", get(search_handler))
        .route("/api/rag-search", post(rag_search_handler))
        .route("/api/corpus", post(load_corpus_handler))
        .route("/api/analyze-prompt", post(analyze_prompt_handler))
        .route("/api/prompt-techniques", get(techniques_handler))
        .route("/api/prompt-examples", get(examples_handler))
        .route("/api/prompt-template", get(template_handler))
        .route("/api/projects", post(create_project).get(list_projects))
        .route("/api/projects/:project_id", get(get_project))
        .route("/api/projects/:project_id/metrics", put(update_project_metrics))
        .route("/api/generate-text", post(generate_text_handler))
        .route("/api/analyze-sentiment", post(analyze_sentiment_handler))
        .route("/api/stats", get(stats_handler))
        .with_state(Arc::new(state))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

/// Load the corpus at `path` into a fresh state, for hosts that seed from disk at startup.
pub fn state_from_corpus(config: IndexConfig, path: &std::path::Path) -> Result<AppState> {
    let documents = genai_core::corpus::read_corpus(path)?;
    let state = AppState::new(config);
    state.index.load(documents);
    Ok(state)
}

type AppStateRef = State<Arc<AppState>>;

async fn health_handler(State(state): AppStateRef) -> Json<Value> {
    let availability = |present: bool| if present { "operational" } else { "unavailable" };
    Json(json!({
        "status": "healthy",
        "timestamp": now_rfc3339(),
        "version": API_VERSION,
        "services": {
            "rag_system": "operational",
            "prompt_engineering": "operational",
            "text_generation": availability(state.generator.is_some()),
            "sentiment_analysis": availability(state.classifier.is_some()),
        }
    }))
}

// --- Retrieval ---

#[derive(Deserialize)]
pub struct SearchParams {
    pub q: String,
    #[serde(default = "default_k")]
    pub k: usize,
}
fn default_k() -> usize { 3 }

#[derive(Deserialize)]
pub struct RagSearchRequest {
    pub query: String,
    #[serde(default = "default_k")]
    pub top_k: usize,
}

#[derive(Serialize)]
pub struct SearchResponse {
    pub success: bool,
    pub query: String,
    pub took_s: f64,
    pub total_documents: usize,
    pub generation: Generation,
    pub results: Vec<SearchHit>,
    pub timestamp: String,
}

#[derive(Serialize)]
pub struct SearchHit {
    pub doc_id: DocId,
    pub document: String,
    pub similarity_score: f32,
    pub rank: usize,
}

impl From<SearchResult> for SearchHit {
    fn from(r: SearchResult) -> Self {
        SearchHit { doc_id: r.doc_id, document: r.document, similarity_score: r.score, rank: r.rank }
    }
}

pub async fn search_handler(State(state): AppStateRef, ApiQuery(params): ApiQuery<SearchParams>) -> ApiResult<SearchResponse> {
    let k = params.k.clamp(1, MAX_TOP_K);
    run_search(&state, params.q, k).map(Json)
}

pub async fn rag_search_handler(State(state): AppStateRef, ApiJson(req): ApiJson<RagSearchRequest>) -> ApiResult<SearchResponse> {
    if !(1..=MAX_TOP_K).contains(&req.top_k) {
        return Err(api_error(
            StatusCode::UNPROCESSABLE_ENTITY,
            format!("top_k must be between 1 and {MAX_TOP_K}"),
        ));
    }
    run_search(&state, req.query, req.top_k).map(Json)
}

fn run_search(state: &AppState, query: String, k: usize) -> std::result::Result<SearchResponse, ApiError> {
    let start = Instant::now();
    if let Some(generation) = state.index.seed_if_empty(DEFAULT_CORPUS) {
        tracing::info!(%generation, "seeded default corpus");
    }
    // One snapshot for both the hits and the reported corpus size.
    let snapshot = state.index.snapshot();
    let results = snapshot.search(&query, k).map_err(|e: IndexError| {
        tracing::warn!(error = %e, "rejected search");
        api_error(StatusCode::UNPROCESSABLE_ENTITY, e.to_string())
    })?;
    Ok(SearchResponse {
        success: true,
        query,
        took_s: start.elapsed().as_secs_f64(),
        total_documents: snapshot.len(),
        generation: snapshot.generation(),
        results: results.into_iter().map(SearchHit::from).collect(),
        timestamp: now_rfc3339(),
    })
}

#[derive(Deserialize)]
pub struct LoadCorpusRequest {
    pub documents: Vec<Value>,
}

async fn load_corpus_handler(State(state): AppStateRef, ApiJson(req): ApiJson<LoadCorpusRequest>) -> ApiResult<Value> {
    let documents = req
        .documents
        .iter()
        .enumerate()
        .map(|(i, v)| match v {
            Value::String(s) => Ok(s.clone()),
            _ => Err(api_error(StatusCode::UNPROCESSABLE_ENTITY, format!("documents[{i}] is not a string"))),
        })
        .collect::<std::result::Result<Vec<String>, ApiError>>()?;
    let snapshot = state.index.load(documents);
    Ok(Json(json!({
        "success": true,
        "generation": snapshot.generation(),
        "total_documents": snapshot.len(),
        "vocabulary_size": snapshot.vocabulary_len(),
        "timestamp": now_rfc3339(),
    })))
}

// --- Prompt engineering ---

#[derive(Deserialize)]
pub struct PromptAnalysisRequest {
    pub prompt: String,
}

#[derive(Serialize)]
pub struct PromptAnalysisResponse {
    pub success: bool,
    pub prompt: String,
    pub analysis: PromptAnalysis,
    pub timestamp: String,
}

async fn analyze_prompt_handler(ApiJson(req): ApiJson<PromptAnalysisRequest>) -> Json<PromptAnalysisResponse> {
    let analysis = prompts::analyze_prompt(&req.prompt);
    Json(PromptAnalysisResponse { success: true, prompt: req.prompt, analysis, timestamp: now_rfc3339() })
}

#[derive(Serialize)]
pub struct TechniquesResponse {
    pub success: bool,
    pub techniques: Vec<TechniqueSummary>,
    pub total_techniques: usize,
    pub timestamp: String,
}

async fn techniques_handler() -> Json<TechniquesResponse> {
    let techniques = prompts::technique_summaries();
    Json(TechniquesResponse { success: true, total_techniques: techniques.len(), techniques, timestamp: now_rfc3339() })
}

#[derive(Deserialize)]
pub struct ExampleFilter {
    pub technique: Option<String>,
    pub difficulty: Option<String>,
}

async fn examples_handler(ApiQuery(filter): ApiQuery<ExampleFilter>) -> ApiResult<Vec<&'static PromptExample>> {
    let technique = filter
        .technique
        .as_deref()
        .map(str::parse::<Technique>)
        .transpose()
        .map_err(|e| api_error(StatusCode::BAD_REQUEST, e))?;
    let difficulty = filter
        .difficulty
        .as_deref()
        .map(str::parse::<Difficulty>)
        .transpose()
        .map_err(|e| api_error(StatusCode::BAD_REQUEST, e))?;
    let examples = prompts::EXAMPLES
        .iter()
        .filter(|ex| technique.map_or(true, |t| ex.technique == t))
        .filter(|ex| difficulty.map_or(true, |d| ex.difficulty == d))
        .collect();
    Ok(Json(examples))
}

#[derive(Deserialize)]
pub struct TemplateParams {
    pub use_case: String,
    pub technique: String,
}

async fn template_handler(ApiQuery(params): ApiQuery<TemplateParams>) -> ApiResult<Value> {
    let technique: Technique = params.technique.parse().map_err(|e: String| api_error(StatusCode::BAD_REQUEST, e))?;
    Ok(Json(json!({
        "use_case": params.use_case,
        "technique": technique,
        "template": prompts::prompt_template(&params.use_case, technique),
    })))
}

// --- Projects ---

fn project_error(e: ProjectError) -> ApiError {
    match e {
        ProjectError::NotFound(_) => api_error(StatusCode::NOT_FOUND, e.to_string()),
    }
}

async fn create_project(State(state): AppStateRef, ApiJson(req): ApiJson<NewProject>) -> Json<Project> {
    Json(state.projects.create(req))
}

async fn list_projects(State(state): AppStateRef) -> Json<Vec<Project>> {
    Json(state.projects.list())
}

async fn get_project(State(state): AppStateRef, Path(project_id): Path<String>) -> ApiResult<Project> {
    state.projects.get(&project_id).map(Json).map_err(project_error)
}

async fn update_project_metrics(
    State(state): AppStateRef,
    Path(project_id): Path<String>,
    ApiJson(metrics): ApiJson<Map<String, Value>>,
) -> ApiResult<Value> {
    state.projects.update_metrics(&project_id, metrics).map_err(project_error)?;
    Ok(Json(json!({ "success": true, "message": "Metrics updated successfully" })))
}

// --- Model-backed capabilities ---

#[derive(Deserialize)]
pub struct TextGenerationRequest {
    pub prompt: String,
    #[serde(default = "default_max_length")]
    pub max_length: usize,
}
fn default_max_length() -> usize { 50 }

async fn generate_text_handler(State(state): AppStateRef, ApiJson(req): ApiJson<TextGenerationRequest>) -> ApiResult<Value> {
    if !(10..=500).contains(&req.max_length) {
        return Err(api_error(StatusCode::UNPROCESSABLE_ENTITY, "max_length must be between 10 and 500"));
    }
    let generator = state
        .generator
        .as_ref()
        .ok_or_else(|| api_error(StatusCode::SERVICE_UNAVAILABLE, "text generation is not configured"))?;
    let generated = generator.generate(&req.prompt, req.max_length).map_err(|e| {
        tracing::error!(error = %e, "text generation failed");
        api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    })?;
    Ok(Json(json!({
        "success": true,
        "prompt": req.prompt,
        "generated_text": generated,
        "max_length": req.max_length,
        "timestamp": now_rfc3339(),
    })))
}

#[derive(Deserialize)]
pub struct SentimentRequest {
    pub text: String,
}

async fn analyze_sentiment_handler(State(state): AppStateRef, ApiJson(req): ApiJson<SentimentRequest>) -> ApiResult<Value> {
    let classifier = state
        .classifier
        .as_ref()
        .ok_or_else(|| api_error(StatusCode::SERVICE_UNAVAILABLE, "sentiment analysis is not configured"))?;
    let sentiment = classifier.classify(&req.text).map_err(|e| {
        tracing::error!(error = %e, "sentiment analysis failed");
        api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    })?;
    Ok(Json(json!({
        "success": true,
        "text": req.text,
        "sentiment": sentiment.label,
        "confidence": sentiment.confidence,
        "timestamp": now_rfc3339(),
    })))
}

async fn stats_handler(State(state): AppStateRef) -> Json<Value> {
    let snapshot = state.index.snapshot();
    Json(json!({
        "total_projects": state.projects.len(),
        "active_projects": state.projects.active_count(),
        "total_documents": snapshot.len(),
        "corpus_generation": snapshot.generation(),
        "available_techniques": Technique::ALL.len(),
        "api_version": API_VERSION,
        "timestamp": now_rfc3339(),
    }))
}
