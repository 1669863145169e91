use axum::extract::rejection::JsonRejection;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::{header, Method, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::compose;
use crate::config::Config;
use crate::deploy::DeployGateway;
use crate::errors::{SiteError, SiteResult};
use crate::generate::SiteGenerator;
use crate::safety;
use crate::wire::{DeployRequest, DeployResponse, ErrorBody, GenerateRequest, SiteArtifact};

const INDEX_HTML: &str = include_str!("../../assets/index.html");
const BODY_LIMIT: usize = 16 * 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub generator: Arc<SiteGenerator>,
    /// `Err` carries the reason deploys are disabled; generation keeps working.
    pub deployer: Result<Arc<DeployGateway>, String>,
}

impl AppState {
    pub fn new(generator: SiteGenerator, deployer: DeployGateway) -> Self {
        Self { generator: Arc::new(generator), deployer: Ok(Arc::new(deployer)) }
    }

    pub fn without_deploy(generator: SiteGenerator, reason: impl Into<String>) -> Self {
        Self { generator: Arc::new(generator), deployer: Err(reason.into()) }
    }

    /// A bad LLM config is fatal. A bad deploy config (usually a missing site
    /// id) only disables `/deploy`.
    pub fn from_config(cfg: &Config) -> SiteResult<Self> {
        let generator = SiteGenerator::from_config(cfg)?;
        Ok(match DeployGateway::from_config(&cfg.deploy) {
            Ok(gw) => Self::new(generator, gw),
            Err(e) => {
                tracing::warn!("deploy disabled: {e}");
                Self::without_deploy(generator, e.details())
            }
        })
    }
}

/// HTTP face of [`SiteError`].
pub struct ApiError(pub SiteError);

impl From<SiteError> for ApiError {
    fn from(e: SiteError) -> Self {
        Self(e)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(r: JsonRejection) -> Self {
        Self(SiteError::InvalidRequest(r.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let e = self.0;
        let (status, error) = match &e {
            SiteError::Upstream(_) => (StatusCode::BAD_GATEWAY, "LLM API request failed"),
            SiteError::MalformedOutput { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "Invalid LLM output"),
            SiteError::DeployFailed { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "Deployment failed"),
            SiteError::UrlNotFound { .. } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Deployment successful, but URL not found in output.",
            ),
            SiteError::Filesystem(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Could not stage files for deploy"),
            SiteError::InvalidFileName(_) => (StatusCode::BAD_REQUEST, "Invalid file name"),
            SiteError::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Server is misconfigured"),
            SiteError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "Invalid request body"),
        };
        let (raw, details) = match &e {
            SiteError::MalformedOutput { raw } => (Some(raw.clone()), None),
            other => (None, Some(other.details())),
        };
        let body = ErrorBody { error: error.to_string(), kind: e.kind().to_string(), raw, details };
        (status, Json(body)).into_response()
    }
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT]);

    Router::new()
        .route("/", get(index))
        .route("/health", get(|| async { "ok" }))
        .route("/generate-site", post(generate_site))
        .route("/deploy", post(deploy))
        .route("/compose", post(compose_document))
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn generate_site(
    State(state): State<AppState>,
    payload: Result<Json<GenerateRequest>, JsonRejection>,
) -> Result<Json<SiteArtifact>, ApiError> {
    let Json(req) = payload?;
    let artifact = state.generator.generate(&req.prompt).await?;
    Ok(Json(artifact))
}

async fn deploy(
    State(state): State<AppState>,
    payload: Result<Json<DeployRequest>, JsonRejection>,
) -> Result<Json<DeployResponse>, ApiError> {
    let Json(req) = payload?;
    let deployer = state.deployer.as_ref().map_err(|reason| SiteError::Config(reason.clone()))?;
    let outcome = deployer.deploy(&req).await?;
    Ok(Json(DeployResponse { message: "Deployment successful!".into(), url: outcome.url }))
}

async fn compose_document(payload: Result<Json<SiteArtifact>, JsonRejection>) -> Result<Html<String>, ApiError> {
    let Json(artifact) = payload?;
    Ok(Html(compose::compose(&artifact)))
}

pub async fn serve(cfg: &Config) -> anyhow::Result<()> {
    let state = AppState::from_config(cfg)?;
    if let Some(p) = state.deployer.as_ref().ok().and_then(|gw| gw.program()) {
        if !safety::program_is_available(&p) {
            tracing::warn!(program = %p, "deploy tool not found on PATH; /deploy will fail until it is installed")
        }
    }

    let listener = TcpListener::bind(&cfg.server.bind).await?;
    tracing::info!(
        addr = %listener.local_addr()?,
        model = state.generator.model(),
        "backend running"
    );
    axum::serve(listener, router(state)).await?;
    Ok(())
}
