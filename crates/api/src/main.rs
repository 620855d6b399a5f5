use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use cloudopt_core::agent::OptimizerAgent;
use cloudopt_core::domain::cost::{CostSnapshot, DateRange};
use cloudopt_core::domain::result::{OptimizationResult, OrgContext, ProactiveCycleOutcome};
use cloudopt_core::error::AgentError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = cloudopt_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let agent = match cloudopt_core::bootstrap::default_agent(&settings) {
        Ok(agent) => agent,
        Err(e) => {
            sentry_anyhow::capture_anyhow(&e);
            return Err(e);
        }
    };

    let state = AppState {
        agent: Arc::new(agent),
        default_org: settings.org_name().to_string(),
    };
    let app = router(state);

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3000);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));

    tracing::info!(%addr, "api listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/providers/:provider/costs", get(get_costs))
        .route("/optimize/:provider/:strategy", get(get_optimization))
        .route("/recommendations", get(get_recommendations))
        .route("/proactive/run", post(run_proactive))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

async fn healthz() -> &'static str {
    "ok"
}

#[derive(Clone)]
struct AppState {
    agent: Arc<OptimizerAgent>,
    default_org: String,
}

#[derive(Debug, Default, Deserialize)]
struct RangeQuery {
    start_date: Option<String>,
    end_date: Option<String>,
}

impl RangeQuery {
    fn resolve(&self) -> Result<Option<DateRange>, ApiError> {
        match (self.start_date.as_deref(), self.end_date.as_deref()) {
            (None, None) => Ok(None),
            (Some(start), Some(end)) => DateRange::parse(start, end)
                .map(Some)
                .map_err(|e| ApiError::BadRequest(format!("{e:#}"))),
            _ => Err(ApiError::BadRequest(
                "start_date and end_date must be given together".to_string(),
            )),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ProviderQuery {
    provider: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ProactiveRunRequest {
    provider: Option<String>,
    channels: Option<Vec<String>>,
    org_context: Option<OrgContext>,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

#[derive(Debug)]
enum ApiError {
    BadRequest(String),
    Agent(AgentError),
}

impl From<AgentError> for ApiError {
    fn from(err: AgentError) -> Self {
        Self::Agent(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            Self::Agent(err) if err.is_unknown_name() => (StatusCode::NOT_FOUND, err.to_string()),
            Self::Agent(err) => {
                sentry::capture_error(&err);
                tracing::error!(error = %err, "agent call failed");
                (StatusCode::BAD_GATEWAY, err.to_string())
            }
        };
        (status, Json(ErrorBody { error: message })).into_response()
    }
}

async fn get_costs(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    Query(range): Query<RangeQuery>,
) -> Result<Json<CostSnapshot>, ApiError> {
    let range = range.resolve()?;
    let snapshot = state.agent.analyze_costs(&provider, range).await?;
    Ok(Json(snapshot))
}

async fn get_optimization(
    State(state): State<AppState>,
    Path((provider, strategy)): Path<(String, String)>,
    Query(range): Query<RangeQuery>,
) -> Result<Json<OptimizationResult>, ApiError> {
    let range = range.resolve()?;
    let result = state.agent.optimize(&provider, &strategy, range).await?;
    Ok(Json(result))
}

async fn get_recommendations(
    State(state): State<AppState>,
    Query(query): Query<ProviderQuery>,
) -> Json<Vec<OptimizationResult>> {
    Json(state.agent.get_recommendations(query.provider.as_deref()).await)
}

async fn run_proactive(
    State(state): State<AppState>,
    body: Option<Json<ProactiveRunRequest>>,
) -> Json<ProactiveCycleOutcome> {
    let req = body.map(|Json(req)| req).unwrap_or_default();
    let org = req
        .org_context
        .unwrap_or_else(|| OrgContext::named(state.default_org.as_str()));
    let outcome = state
        .agent
        .run_proactive_cycle(req.provider.as_deref(), req.channels.as_deref(), Some(&org))
        .await;
    Json(outcome)
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

fn init_sentry(settings: &cloudopt_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
