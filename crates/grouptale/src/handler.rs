//! HTTP routes and request handlers.
//!
//! Each request runs in its own Tokio task. The flow for a room request:
//!   1. Decode the body (or query) into a protocol type
//!   2. Validate required fields
//!   3. Call the coordinator
//!   4. Return the room snapshot, or map the error to a wire code

use std::any::Any;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::header::{
    ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
    ACCESS_CONTROL_ALLOW_ORIGIN, CONTENT_TYPE,
};
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use grouptale_pets::{
    PetStateQuery, PetStateRequest, PetStateResponse, PetStateSaved,
};
use grouptale_protocol::{Codec, JsonCodec, RoomQuery, RoomRequest};
use grouptale_room::RoomStore;
use serde::Serialize;
use serde_json::Value;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::{ApiError, AppState};

/// Builds the application router over `state`.
///
/// Every response carries permissive CORS headers and a JSON content
/// type. A panicking handler answers 500 `server_error` instead of
/// dropping the connection.
pub fn router<S: RoomStore>(state: Arc<AppState<S>>) -> Router {
    Router::new()
        .route("/healthz", get(|| async { "ok\n" }))
        .route(
            "/api/group-adventure",
            get(get_room::<S>)
                .post(post_room::<S>)
                .options(preflight)
                .fallback(method_not_allowed),
        )
        .route(
            "/api/pet-state",
            get(get_pet_state::<S>)
                .post(post_pet_state::<S>)
                .options(preflight)
                .fallback(method_not_allowed),
        )
        .fallback(not_found)
        .with_state(state)
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(SetResponseHeaderLayer::if_not_present(
            CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("*"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static("GET, POST, OPTIONS"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static("Content-Type"),
        ))
        .layer(TraceLayer::new_for_http())
}

// ---------------------------------------------------------------------------
// /api/group-adventure
// ---------------------------------------------------------------------------

/// `GET ?roomId=` — read a room.
async fn get_room<S: RoomStore>(
    State(state): State<Arc<AppState<S>>>,
    query: Result<Query<RoomQuery>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(query) = query.map_err(|_| ApiError::bad_request())?;
    let room_id = query.require_room_id()?;
    let room = state.coordinator.get_room(&room_id).await?;
    json_response(&state.codec, &room.snapshot())
}

/// `POST {action, ...}` — create, join, or vote.
async fn post_room<S: RoomStore>(
    State(state): State<Arc<AppState<S>>>,
    body: Bytes,
) -> Result<Response, ApiError> {
    let request: RoomRequest = state.codec.decode(&body)?;
    request.validate()?;

    let coordinator = &state.coordinator;
    let room = match request {
        RoomRequest::Create { pack_id } => {
            coordinator.create_room(pack_id).await?
        }
        RoomRequest::Join { room_id, wallet } => {
            coordinator.join_room(&room_id, wallet).await?
        }
        RoomRequest::Vote {
            room_id,
            wallet,
            choice_id,
        } => coordinator.cast_vote(&room_id, wallet, choice_id).await?,
    };
    json_response(&state.codec, &room.snapshot())
}

// ---------------------------------------------------------------------------
// /api/pet-state
// ---------------------------------------------------------------------------

/// `GET ?key=` — read a participant's pet state (`null` when unset).
async fn get_pet_state<S: RoomStore>(
    State(state): State<Arc<AppState<S>>>,
    query: Result<Query<PetStateQuery>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(query) = query.map_err(|_| ApiError::bad_request())?;
    let key = query.key.ok_or_else(ApiError::bad_request)?;
    let value = state.pets.get(&key).await?.unwrap_or(Value::Null);
    json_response(&state.codec, &PetStateResponse { key, value })
}

/// `POST {key, value}` — save a participant's pet state.
async fn post_pet_state<S: RoomStore>(
    State(state): State<Arc<AppState<S>>>,
    body: Bytes,
) -> Result<Response, ApiError> {
    let request: PetStateRequest = state.codec.decode(&body)?;
    state.pets.set(&request.key, request.value).await?;
    json_response(
        &state.codec,
        &PetStateSaved {
            ok: true,
            key: request.key,
        },
    )
}

// ---------------------------------------------------------------------------
// Shared
// ---------------------------------------------------------------------------

/// Encodes a 200 body with the server's codec.
fn json_response<T: Serialize>(
    codec: &JsonCodec,
    value: &T,
) -> Result<Response, ApiError> {
    let bytes = codec.encode(value)?;
    Ok((
        [(CONTENT_TYPE, HeaderValue::from_static("application/json"))],
        bytes,
    )
        .into_response())
}

async fn preflight() -> StatusCode {
    StatusCode::NO_CONTENT
}

async fn method_not_allowed() -> ApiError {
    ApiError::method_not_allowed()
}

async fn not_found() -> ApiError {
    ApiError::not_found()
}

/// Turns a handler panic into a 500 `server_error` body.
fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let message = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        (*s).to_owned()
    } else {
        "internal error".to_owned()
    };
    tracing::error!(%message, "handler panicked");
    ApiError::server_error(message).into_response()
}

#[cfg(test)]
mod tests {
    use grouptale_protocol::{ErrorCode, RoomId};

    use super::*;

    #[test]
    fn test_json_response_encodes_with_codec() {
        let resp = json_response(&JsonCodec, &RoomQuery {
            room_id: Some(RoomId::from("ab12cd")),
        })
        .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()[CONTENT_TYPE], "application/json");
    }

    #[test]
    fn test_json_response_reports_unencodable_value_as_server_error() {
        // JSON object keys must be strings.
        let mut bad = std::collections::HashMap::new();
        bad.insert(vec![1_u8], 1_u8);
        let Err(err) = json_response(&JsonCodec, &bad) else {
            panic!("non-string map keys should not encode");
        };
        assert_eq!(err.code(), ErrorCode::ServerError);
    }

    #[test]
    fn test_handle_panic_reports_message_as_server_error() {
        let resp = handle_panic(Box::new("room table on fire"));
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let resp = handle_panic(Box::new(String::from("owned message")));
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let resp = handle_panic(Box::new(42_u8));
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
