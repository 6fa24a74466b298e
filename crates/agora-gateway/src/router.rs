use agora_core::error::AgoraError;
use agora_wire::RequestHead;
use serde_json::{json, Value};

use crate::app::AppState;
use crate::auth;
use crate::errors::to_response;
use crate::handlers;

/// Map (method, path) to an endpoint handler, extracting and validating the
/// JSON body. Returns the final (status, body) pair — never panics,
/// never leaves a response unsent.
pub fn dispatch(state: &AppState, request: &RequestHead, body: &Value) -> (u16, Value) {
    if request.method != "GET" && request.method != "POST" {
        return to_response(&AgoraError::MethodNotAllowed);
    }

    let result = match (request.method.as_str(), request.target.as_str()) {
        ("POST", "/get-token") => handlers::get_token::handle(state, body),
        ("POST", "/connect") => with_auth(state, request, |caller| {
            handlers::connect::handle(state, caller, body)
        }),
        ("POST", "/send") => with_auth(state, request, |caller| {
            handlers::send::handle(state, caller, body)
        }),
        ("POST", "/comment") => with_auth(state, request, |caller| {
            handlers::comment::handle(state, caller, body)
        }),
        ("POST", "/report") => with_auth(state, request, |caller| {
            handlers::report::handle(state, caller, body)
        }),
        ("GET", "/status") => with_auth(state, request, |caller| {
            handlers::status::handle(state, caller, body)
        }),
        ("GET", "/health") => Ok((200, json!({ "status": "ok" }))),
        // Unknown target: the source silently produces no response; we
        // return 404, which the spec explicitly permits.
        _ => Err(AgoraError::NotFound(request.target.clone())),
    };

    match result {
        Ok((status, body)) => (status, body),
        Err(e) => to_response(&e),
    }
}

fn with_auth<T>(
    state: &AppState,
    request: &RequestHead,
    f: impl FnOnce(&agora_users::User) -> agora_core::error::Result<T>,
) -> agora_core::error::Result<T> {
    let caller = auth::resolve_user(state, request)?;
    f(&caller)
}
