use agora_core::config::AgoraConfig;
use agora_store::ChatStore;
use agora_users::UserStore;

/// Shared server-wide state, built once at startup and handed to every
/// connection handler as an `Arc`. No ambient state besides this and the
/// listening socket.
pub struct AppState {
    pub config: AgoraConfig,
    pub users: UserStore,
    pub chats: ChatStore,
    pub public_chat_id: i64,
}
