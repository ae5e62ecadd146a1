//! Unified error types for the Grouptale server.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use grouptale_pets::PetError;
use grouptale_protocol::{ErrorBody, ErrorCode, ProtocolError};
use grouptale_room::RoomError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant generates `From` impls, so
/// the `?` operator converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum GrouptaleError {
    /// Binding or serving the listener failed.
    #[error("server i/o failed: {0}")]
    Io(#[from] std::io::Error),

    /// A request body or query could not be understood.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A room operation failed (not found, store failure).
    #[error(transparent)]
    Room(#[from] RoomError),

    /// A pet state operation failed.
    #[error(transparent)]
    Pet(#[from] PetError),
}

/// An error on its way out as an HTTP response.
///
/// Every failure a handler can hit is converted into one of the four
/// wire codes here and nowhere else.
#[derive(Debug)]
pub struct ApiError {
    body: ErrorBody,
}

impl ApiError {
    pub fn not_found() -> Self {
        Self::from_code(ErrorCode::NotFound)
    }

    pub fn bad_request() -> Self {
        Self::from_code(ErrorCode::BadRequest)
    }

    pub fn method_not_allowed() -> Self {
        Self::from_code(ErrorCode::MethodNotAllowed)
    }

    pub fn server_error(message: impl Into<String>) -> Self {
        Self {
            body: ErrorBody::server_error(message),
        }
    }

    pub fn code(&self) -> ErrorCode {
        self.body.error
    }

    fn from_code(code: ErrorCode) -> Self {
        Self {
            body: ErrorBody::new(code),
        }
    }
}

impl From<GrouptaleError> for ApiError {
    fn from(err: GrouptaleError) -> Self {
        match err {
            GrouptaleError::Protocol(e) => e.into(),
            GrouptaleError::Room(e) => e.into(),
            GrouptaleError::Pet(e) => e.into(),
            GrouptaleError::Io(e) => Self::server_error(e.to_string()),
        }
    }
}

impl From<ProtocolError> for ApiError {
    fn from(err: ProtocolError) -> Self {
        if err.is_client_error() {
            tracing::debug!(error = %err, "rejecting request");
            Self::bad_request()
        } else {
            tracing::error!(error = %err, "response encoding failed");
            Self::server_error(err.to_string())
        }
    }
}

impl From<RoomError> for ApiError {
    fn from(err: RoomError) -> Self {
        match err {
            RoomError::NotFound(_) => Self::not_found(),
            other => {
                tracing::error!(error = %other, "room operation failed");
                Self::server_error(other.to_string())
            }
        }
    }
}

impl From<PetError> for ApiError {
    fn from(err: PetError) -> Self {
        if err.is_client_error() {
            tracing::debug!(error = %err, "rejecting pet state request");
            Self::bad_request()
        } else {
            tracing::error!(error = %err, "pet state operation failed");
            Self::server_error(err.to_string())
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.body.error.status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use grouptale_protocol::RoomId;

    use super::*;

    #[test]
    fn test_from_room_not_found_is_not_found() {
        let err: ApiError = RoomError::NotFound(RoomId::from("r1")).into();
        assert_eq!(err.code(), ErrorCode::NotFound);
    }

    #[test]
    fn test_from_room_store_failure_is_server_error_with_message() {
        let err: ApiError = RoomError::Store("disk full".into()).into();
        assert_eq!(err.code(), ErrorCode::ServerError);
        assert_eq!(err.body.message.as_deref(), Some("room store failed: disk full"));
    }

    #[test]
    fn test_from_protocol_error_is_bad_request() {
        let err: ApiError =
            ProtocolError::InvalidMessage("wallet is required".into()).into();
        assert_eq!(err.code(), ErrorCode::BadRequest);
        assert!(err.body.message.is_none());
    }

    #[test]
    fn test_from_protocol_encode_error_is_server_error() {
        let cause = serde_json::from_str::<u8>("nope").unwrap_err();
        let err: ApiError = ProtocolError::Encode(cause).into();
        assert_eq!(err.code(), ErrorCode::ServerError);
        assert!(err.body.message.is_some());
    }

    #[test]
    fn test_from_pet_errors() {
        let bad: ApiError = PetError::InvalidKey("../x".into()).into();
        assert_eq!(bad.code(), ErrorCode::BadRequest);

        let io: ApiError =
            PetError::Io(std::io::Error::other("gone")).into();
        assert_eq!(io.code(), ErrorCode::ServerError);
    }

    #[test]
    fn test_grouptale_error_wraps_sub_crate_errors() {
        let err: GrouptaleError = RoomError::NotFound(RoomId::from("r1")).into();
        assert!(matches!(err, GrouptaleError::Room(_)));
        assert!(err.to_string().contains("r1"));

        let api: ApiError = err.into();
        assert_eq!(api.code(), ErrorCode::NotFound);
    }

    #[test]
    fn test_into_response_uses_code_status() {
        let resp = ApiError::method_not_allowed().into_response();
        assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
    }
}
