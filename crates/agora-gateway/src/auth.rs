use agora_core::error::{AgoraError, Result};
use agora_users::User;
use agora_wire::RequestHead;

use crate::app::AppState;
use crate::errors::user_err;

/// Finds the header whose lowercased name equals `authorization`, splits
/// its value into (scheme, token) on whitespace, and resolves the token
/// to a user. The scheme itself is never validated beyond a second
/// whitespace-separated segment being present.
pub fn extract_bearer(request: &RequestHead) -> Option<&str> {
    let raw = request.header("authorization")?;
    let mut parts = raw.split_whitespace();
    let _scheme = parts.next()?;
    parts.next()
}

/// Resolve the caller from the `Authorization` header, or a canonical 401.
pub fn resolve_user(state: &AppState, request: &RequestHead) -> Result<User> {
    let token = extract_bearer(request).ok_or(AgoraError::Unauthorized)?;
    let found = state.users.find_by_token(token).map_err(user_err)?;
    found.ok_or(AgoraError::Unauthorized)
}
