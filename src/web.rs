use crate::lookup::{LookupService, POPUP_SOURCE, PopupResponse, SidePanelResponse};
use crate::session::LanguageModel;
use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::info;

type SharedState<M> = Arc<LookupService<M>>;

#[derive(Clone)]
pub struct WebConfig {
    pub addr: SocketAddr,
    /// Allow cross-origin calls (extension pages run on their own origin).
    pub permissive_cors: bool,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            permissive_cors: true,
        }
    }
}

#[derive(Debug)]
pub enum WebError {
    Io(std::io::Error),
}

impl fmt::Display for WebError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WebError::Io(err) => write!(f, "io error: {err}"),
        }
    }
}

impl std::error::Error for WebError {}

impl From<std::io::Error> for WebError {
    fn from(value: std::io::Error) -> Self {
        WebError::Io(value)
    }
}

/// Serves the lookup API until ctrl-c or SIGTERM, then disposes of the
/// generation session.
pub async fn serve<M: LanguageModel>(
    config: WebConfig,
    service: SharedState<M>,
) -> Result<(), WebError> {
    let sweeper = Arc::clone(service.limiter()).spawn_sweeper();
    let router = build_router(Arc::clone(&service), config.permissive_cors);
    info!(%config.addr, cors = config.permissive_cors, "Binding HTTP listener");
    let listener = TcpListener::bind(config.addr).await?;
    let served = axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await;
    sweeper.abort();
    service.shutdown().await;
    served?;
    info!("HTTP server exited");
    Ok(())
}

#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let payload = json!({ "error": self.message });
        (self.status, Json(payload)).into_response()
    }
}

fn build_router<M: LanguageModel>(state: SharedState<M>, permissive_cors: bool) -> Router {
    let router = Router::new()
        .route("/api/popup", post(api_popup::<M>))
        .route("/api/popup/cancel", post(api_cancel_popup::<M>))
        .route("/api/sidepanel", post(api_side_panel::<M>))
        .route("/api/sidepanel/cancel", post(api_cancel_side_panel::<M>))
        .route(
            "/api/tabs/:tab/word",
            put(api_put_tab_word::<M>)
                .get(api_get_tab_word::<M>)
                .delete(api_delete_tab_word::<M>),
        )
        .route("/healthz", get(health))
        .with_state(state)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().include_headers(true))
                .on_response(DefaultOnResponse::new().include_headers(true)),
        )
        .layer(CompressionLayer::new());
    if permissive_cors {
        router.layer(CorsLayer::permissive())
    } else {
        router
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = signal::ctrl_c().await;
    };
    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        if let Ok(mut stream) = signal(SignalKind::terminate()) {
            let _ = stream.recv().await;
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok", "service": "etymon-web" }))
}

/// Rate-limit source for a request: the tab id when present, otherwise the
/// shared popup token.
fn source_id(tab: Option<u64>) -> String {
    tab.map(|id| id.to_string())
        .unwrap_or_else(|| POPUP_SOURCE.to_string())
}

#[derive(Debug, Deserialize)]
struct PopupRequest {
    word: String,
    #[serde(default)]
    tab: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct SidePanelRequest {
    word: String,
    #[serde(default)]
    tab: Option<u64>,
    /// Echoed back on loading notifications.
    #[serde(default)]
    source: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct CancelResponse {
    cancelled: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TabWordRequest {
    word: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct TabWordResponse {
    tab: u64,
    word: String,
}

async fn api_popup<M: LanguageModel>(
    State(service): State<SharedState<M>>,
    Json(request): Json<PopupRequest>,
) -> Json<PopupResponse> {
    let source = source_id(request.tab);
    Json(service.lookup_popup(&source, &request.word).await)
}

async fn api_cancel_popup<M: LanguageModel>(
    State(service): State<SharedState<M>>,
) -> Json<CancelResponse> {
    Json(CancelResponse {
        cancelled: service.cancel_popup(),
    })
}

async fn api_side_panel<M: LanguageModel>(
    State(service): State<SharedState<M>>,
    Json(request): Json<SidePanelRequest>,
) -> Json<SidePanelResponse> {
    let source = source_id(request.tab);
    Json(
        service
            .lookup_side_panel(&source, &request.word, request.source.as_deref())
            .await,
    )
}

async fn api_cancel_side_panel<M: LanguageModel>(
    State(service): State<SharedState<M>>,
) -> Json<CancelResponse> {
    Json(CancelResponse {
        cancelled: service.cancel_side_panel(),
    })
}

async fn api_put_tab_word<M: LanguageModel>(
    State(service): State<SharedState<M>>,
    Path(tab): Path<u64>,
    Json(request): Json<TabWordRequest>,
) -> Result<StatusCode, ApiError> {
    service
        .open_side_panel(tab, &request.word)
        .map_err(|err| ApiError::bad_request(err.to_string()))?;
    Ok(StatusCode::NO_CONTENT)
}

async fn api_get_tab_word<M: LanguageModel>(
    State(service): State<SharedState<M>>,
    Path(tab): Path<u64>,
) -> Result<Json<TabWordResponse>, ApiError> {
    let word = service
        .stored_word(tab)
        .ok_or_else(|| ApiError::not_found(format!("No word stored for tab {tab}")))?;
    Ok(Json(TabWordResponse { tab, word }))
}

async fn api_delete_tab_word<M: LanguageModel>(
    State(service): State<SharedState<M>>,
    Path(tab): Path<u64>,
) -> StatusCode {
    service.forget_tab(tab);
    StatusCode::NO_CONTENT
}
