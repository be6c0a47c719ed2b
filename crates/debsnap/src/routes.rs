use std::sync::Arc;

use axum::Router;
use axum::extract::{Path, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use debsnap_fetch::RateGovernor;
use debsnap_resolve::{Error, MirrorResolver, Resolution};
use serde::Serialize;
use tower_http::trace::TraceLayer;

pub struct AppState {
    pub resolver: MirrorResolver,
    pub governor: Arc<RateGovernor>,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/mr/package/:name/:version/srcfiles", get(source_files))
        .route("/mr/binary/:name/:version/binfiles", get(binary_files))
        .route("/debug/transfer-stats", get(transfer_stats))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn source_files(
    State(state): State<Arc<AppState>>,
    Path((name, version)): Path<(String, String)>,
) -> Response {
    respond(state.resolver.resolve_source(&name, &version).await)
}

async fn binary_files(
    State(state): State<Arc<AppState>>,
    Path((name, version)): Path<(String, String)>,
) -> Response {
    respond(state.resolver.resolve_binary(&name, &version).await)
}

async fn transfer_stats(State(state): State<Arc<AppState>>) -> Response {
    json_response(StatusCode::OK, &state.governor.stats())
}

fn respond(result: debsnap_resolve::Result<Arc<Resolution>>) -> Response {
    match result {
        Ok(resolution) => render(&resolution),
        Err(Error::InvalidQuery(reason)) => {
            tracing::debug!(reason = %reason, "rejected query");
            StatusCode::NOT_FOUND.into_response()
        }
        Err(e @ Error::ExhaustedRetries { .. }) => {
            tracing::warn!(error = %e, "resolution failed");
            StatusCode::SERVICE_UNAVAILABLE.into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "resolution failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

fn render(resolution: &Resolution) -> Response {
    match resolution {
        Resolution::Upstream(payload) => {
            let status = StatusCode::from_u16(payload.status).unwrap_or(StatusCode::OK);
            (status, [(header::CONTENT_TYPE, "application/json")], payload.body.clone()).into_response()
        }
        Resolution::Complete(result) | Resolution::PartialComplete(result) => json_response(StatusCode::OK, result),
        Resolution::NotFound => StatusCode::NOT_FOUND.into_response(),
    }
}

/// Pretty JSON with a four-space indent and a trailing newline.
fn json_response<T: Serialize>(status: StatusCode, value: &T) -> Response {
    let mut body = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut body, formatter);
    if let Err(e) = value.serialize(&mut serializer) {
        tracing::error!(error = %e, "failed to encode response");
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }
    body.push(b'\n');
    (status, [(header::CONTENT_TYPE, "application/json")], body).into_response()
}
