//! HTTP front end: serves the dashboard page and the JSON it draws from.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};

use super::dashboard::Dashboard;
use super::render::{self, LayerKind, LayerToggles, MapView, MetricsView};


static INDEX_HTML: &str = include_str!("../static/index.html");

/// Build the router over the shared, read-only dashboard state.
pub fn build_router(dashboard: Arc<Dashboard>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(index))
        .route("/api/view", get(view))
        .route("/api/controls", get(controls))
        .route("/health", get(health))
        .layer(cors)
        .with_state(dashboard)
}

pub async fn serve(dashboard: Arc<Dashboard>, addr: SocketAddr) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    log::info!("Dashboard listening on http://{}", listener.local_addr()?);
    axum::serve(listener, build_router(dashboard)).await
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn bad_request(error: String) -> Response {
    (StatusCode::BAD_REQUEST, Json(ErrorResponse{error})).into_response()
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

#[derive(Debug, Deserialize)]
pub struct ViewRequest {
    /// Number of new facilities; 0 if absent
    p: Option<String>,
    /// Comma-separated layer tags; the default layers if absent
    layers: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ViewResponse {
    pub map: MapView,
    pub metrics: MetricsView,
}

async fn view(
    State(dashboard): State<Arc<Dashboard>>,
    Query(req): Query<ViewRequest>,
) -> Response {
    let p: i64 = match req.p.as_deref().map(str::trim) {
        None | Some("") => 0,
        Some(ss) => match ss.parse() {
            Ok(pp) => pp,
            Err(_) => return bad_request(format!("p must be an integer, got {:?}", ss)),
        },
    };
    let toggles = match &req.layers {
        Some(tags) => match LayerToggles::parse(tags) {
            Ok(toggles) => toggles,
            Err(msg) => return bad_request(msg),
        },
        None => LayerToggles::default(),
    };
    log::debug!("view p={} layers={:?}", p, req.layers);

    match render::render(p, &toggles, &dashboard) {
        Ok((map, metrics)) => Json(ViewResponse{map, metrics}).into_response(),
        Err(err) => bad_request(err.to_string()),
    }
}

#[derive(Debug, Serialize)]
pub struct LayerOption {
    pub value: &'static str,
    pub label: &'static str,
    pub on: bool,
}

#[derive(Debug, Serialize)]
pub struct ControlsResponse {
    pub min_p: u32,
    pub max_p: u32,
    pub marks: Vec<u32>,
    pub layers: Vec<LayerOption>,
}

async fn controls(State(dashboard): State<Arc<Dashboard>>) -> Json<ControlsResponse> {
    let layers = LayerKind::ALL.iter().map(|kind| LayerOption {
        value: kind.tag(),
        label: kind.label(),
        on: kind.on_by_default(),
    }).collect();

    Json(ControlsResponse {
        min_p: dashboard.min_p(),
        max_p: dashboard.max_p,
        marks: slider_marks(dashboard.min_p(), dashboard.max_p),
        layers,
    })
}

/// Every multiple of ten in range, plus both ends.
fn slider_marks(min_p: u32, max_p: u32) -> Vec<u32> {
    let mut marks: Vec<u32> = (min_p..=max_p).filter(|pp| pp % 10 == 0).collect();
    if marks.first() != Some(&min_p) {
        marks.insert(0, min_p);
    }
    if marks.last() != Some(&max_p) {
        marks.push(max_p);
    }
    marks
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}
