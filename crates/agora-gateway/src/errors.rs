use agora_core::error::AgoraError;
use agora_core::messages;
use agora_store::StoreError;
use agora_users::UserError;
use serde_json::json;

pub fn user_err(e: UserError) -> AgoraError {
    match e {
        UserError::DatabaseError(inner) => AgoraError::Database(inner),
        UserError::NotFound(name) => AgoraError::NotFound(name),
        UserError::AlreadyExists(name) => AgoraError::BadRequest(name),
    }
}

pub fn store_err(e: StoreError) -> AgoraError {
    match e {
        StoreError::DatabaseError(inner) => AgoraError::Database(inner),
        StoreError::NotFound(what) => AgoraError::NotFound(what),
    }
}

/// Map a terminal error to its (status, body) wire representation using the
/// fixed canonical strings clients match on.
pub fn to_response(err: &AgoraError) -> (u16, serde_json::Value) {
    match err {
        AgoraError::Unauthorized => (401, json!({ "error": messages::UNAUTHORIZED })),
        AgoraError::BadRequest(_) => (400, json!({ "error": messages::BAD_REQUEST })),
        AgoraError::NotFound(_) => (404, json!({ "error": messages::NOT_FOUND })),
        AgoraError::MethodNotAllowed => (405, json!({ "error": messages::METHOD_NOT_ALLOWED })),
        AgoraError::Database(_) | AgoraError::Serialization(_) | AgoraError::Io(_) | AgoraError::Config(_) => {
            (400, json!({ "error": messages::BAD_REQUEST }))
        }
    }
}
