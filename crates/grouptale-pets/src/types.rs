//! Request and response bodies for `/api/pet-state`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Query string of `GET /api/pet-state`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PetStateQuery {
    #[serde(default)]
    pub key: Option<String>,
}

/// Body of `POST /api/pet-state`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PetStateRequest {
    pub key: String,
    /// Any JSON; a missing field stores `null`.
    #[serde(default)]
    pub value: Value,
}

/// Response of `GET /api/pet-state`. `value` is `null` when unset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PetStateResponse {
    pub key: String,
    pub value: Value,
}

/// Response of `POST /api/pet-state`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PetStateSaved {
    pub ok: bool,
    pub key: String,
}
