//! REST API router for the order cache.
//!
//! Used by the binary and by integration tests. Create with [`create_router`].
//! Uses Extension for state so the router is `Router<()>` and works with
//! `into_make_service()`.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Extension, Path,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use tokio::sync::broadcast;

use crate::audit::{AuditEvent, AuditSink, StdoutAuditSink};
use crate::cache::OrderCache;
use crate::config::CacheConfig;
use crate::error::CacheError;
use crate::types::Order;

/// Payload broadcast to all WebSocket clients when an add changed a
/// security's matched total.
#[derive(Clone, Debug, serde::Serialize)]
pub struct MatchUpdate {
    pub security_id: String,
    pub matching_size: u64,
}

/// Shared app state: one cache per process; broadcast channel for match
/// updates; audit sink for material actions.
#[derive(Clone)]
pub struct AppState {
    pub cache: Arc<OrderCache>,
    pub audit: Arc<dyn AuditSink>,
    pub(crate) broadcast_tx: broadcast::Sender<MatchUpdate>,
}

/// Builds shared app state with a stdout audit sink.
pub fn create_app_state(config: CacheConfig) -> AppState {
    create_app_state_with_sink(config, Arc::new(StdoutAuditSink))
}

/// Builds shared app state with the given audit sink (tests use an
/// in-memory sink to assert on events).
pub fn create_app_state_with_sink(config: CacheConfig, audit: Arc<dyn AuditSink>) -> AppState {
    let (broadcast_tx, _) = broadcast::channel(32);
    AppState {
        cache: Arc::new(OrderCache::with_config(config)),
        audit,
        broadcast_tx,
    }
}

/// Builds the REST/WebSocket router with the given state.
pub fn create_router_with_state(state: AppState) -> Router<()> {
    Router::new()
        .route("/health", get(health))
        .route("/orders", get(all_orders).post(add_order))
        .route("/orders/cancel", post(cancel_order))
        .route("/orders/cancel-by-user", post(cancel_by_user))
        .route("/orders/cancel-by-security", post(cancel_by_security))
        .route("/securities/{security_id}/matching-size", get(matching_size))
        .route("/securities/{security_id}/matches", get(matches_for_security))
        .route("/ws/matches", get(ws_matches))
        .layer(Extension(state))
}

/// Builds the router with a new state (convenience for the binary and
/// tests). Returns `Router<()>` for `axum::serve`.
pub fn create_router(config: CacheConfig) -> Router<()> {
    create_router_with_state(create_app_state(config))
}

async fn health() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

fn error_response(err: CacheError) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(serde_json::json!({ "error": err.to_string() })),
    )
        .into_response()
}

async fn add_order(
    Extension(state): Extension<AppState>,
    Json(order): Json<Order>,
) -> Response {
    let actor = order.user_id.to_string();
    let resource = serde_json::json!({
        "order_id": &order.order_id,
        "security_id": &order.security_id,
    });
    let security_id = order.security_id.clone();
    match state.cache.add_order(order) {
        Ok(matched) => {
            state
                .audit
                .emit(&AuditEvent::now(actor, "order_add", Some(resource), "success"));
            let matching_size = state
                .cache
                .matching_size_for_security(&security_id)
                .unwrap_or(0);
            let _ = state.broadcast_tx.send(MatchUpdate {
                security_id: security_id.to_string(),
                matching_size,
            });
            #[derive(serde::Serialize)]
            struct Out {
                matched: u64,
            }
            (StatusCode::OK, Json(Out { matched })).into_response()
        }
        Err(e) => {
            state
                .audit
                .emit(&AuditEvent::now(actor, "order_add", Some(resource), "rejected"));
            error_response(e)
        }
    }
}

#[derive(serde::Deserialize)]
struct CancelRequest {
    order_id: String,
}

async fn cancel_order(
    Extension(state): Extension<AppState>,
    Json(body): Json<CancelRequest>,
) -> Response {
    let resource = serde_json::json!({ "order_id": &body.order_id });
    match state.cache.cancel_order(&body.order_id.into()) {
        Ok(canceled) => {
            state
                .audit
                .emit(&AuditEvent::now("api", "order_cancel", Some(resource), "success"));
            #[derive(serde::Serialize)]
            struct Out {
                canceled: bool,
            }
            (StatusCode::OK, Json(Out { canceled })).into_response()
        }
        Err(e) => {
            state
                .audit
                .emit(&AuditEvent::now("api", "order_cancel", Some(resource), "rejected"));
            error_response(e)
        }
    }
}

#[derive(serde::Deserialize)]
struct CancelByUserRequest {
    user_id: String,
}

async fn cancel_by_user(
    Extension(state): Extension<AppState>,
    Json(body): Json<CancelByUserRequest>,
) -> Response {
    let resource = serde_json::json!({ "user_id": &body.user_id });
    match state.cache.cancel_orders_for_user(&body.user_id.into()) {
        Ok(canceled) => {
            state.audit.emit(&AuditEvent::now(
                "api",
                "cancel_user_batch",
                Some(resource),
                "success",
            ));
            #[derive(serde::Serialize)]
            struct Out {
                canceled: usize,
            }
            (StatusCode::OK, Json(Out { canceled })).into_response()
        }
        Err(e) => {
            state.audit.emit(&AuditEvent::now(
                "api",
                "cancel_user_batch",
                Some(resource),
                "rejected",
            ));
            error_response(e)
        }
    }
}

#[derive(serde::Deserialize)]
struct CancelBySecurityRequest {
    security_id: String,
    #[serde(default)]
    min_qty: u64,
}

async fn cancel_by_security(
    Extension(state): Extension<AppState>,
    Json(body): Json<CancelBySecurityRequest>,
) -> Response {
    let resource = serde_json::json!({
        "security_id": &body.security_id,
        "min_qty": body.min_qty,
    });
    match state
        .cache
        .cancel_orders_for_security_with_min_qty(&body.security_id.into(), body.min_qty)
    {
        Ok(canceled) => {
            state.audit.emit(&AuditEvent::now(
                "api",
                "cancel_security_batch",
                Some(resource),
                "success",
            ));
            #[derive(serde::Serialize)]
            struct Out {
                canceled: usize,
            }
            (StatusCode::OK, Json(Out { canceled })).into_response()
        }
        Err(e) => {
            state.audit.emit(&AuditEvent::now(
                "api",
                "cancel_security_batch",
                Some(resource),
                "rejected",
            ));
            error_response(e)
        }
    }
}

async fn all_orders(Extension(state): Extension<AppState>) -> Response {
    (StatusCode::OK, Json(state.cache.all_orders())).into_response()
}

async fn matching_size(
    Extension(state): Extension<AppState>,
    Path(security_id): Path<String>,
) -> Response {
    match state.cache.matching_size_for_security(&security_id.clone().into()) {
        Ok(size) => {
            #[derive(serde::Serialize)]
            struct Out {
                security_id: String,
                matching_size: u64,
            }
            (
                StatusCode::OK,
                Json(Out {
                    security_id,
                    matching_size: size,
                }),
            )
                .into_response()
        }
        Err(e) => error_response(e),
    }
}

async fn matches_for_security(
    Extension(state): Extension<AppState>,
    Path(security_id): Path<String>,
) -> Response {
    (
        StatusCode::OK,
        Json(state.cache.matches_for_security(&security_id.into())),
    )
        .into_response()
}

#[derive(serde::Serialize)]
struct MatchesSnapshot {
    #[serde(rename = "type")]
    msg_type: &'static str,
    order_count: usize,
}

/// WebSocket match stream: on connect send one snapshot (live order count),
/// then push a [`MatchUpdate`] whenever an add changes a security's total.
async fn ws_matches(
    Extension(state): Extension<AppState>,
    upgrade: WebSocketUpgrade,
) -> Response {
    upgrade.on_upgrade(move |socket| handle_matches_socket(state, socket))
}

async fn handle_matches_socket(state: AppState, mut socket: WebSocket) {
    let snapshot = MatchesSnapshot {
        msg_type: "snapshot",
        order_count: state.cache.len(),
    };
    let json = match serde_json::to_string(&snapshot) {
        Ok(s) => s,
        Err(_) => return,
    };
    if socket.send(Message::Text(json.into())).await.is_err() {
        return;
    }

    let mut rx = state.broadcast_tx.subscribe();
    loop {
        tokio::select! {
            res = rx.recv() => {
                match res {
                    Ok(update) => {
                        let msg = serde_json::json!({
                            "type": "match_update",
                            "security_id": update.security_id,
                            "matching_size": update.matching_size,
                        });
                        if socket.send(Message::Text(msg.to_string().into())).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(_)) => {}
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
            msg = socket.recv() => match msg {
                Some(Ok(_)) => {}
                _ => break,
            },
        }
    }
}
