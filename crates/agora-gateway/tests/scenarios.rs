//! End-to-end scenarios driven over real TCP sockets, one raw HTTP/1.1
//! request per connection (`Connection: close`) so each test can read the
//! full response without needing to track keep-alive state itself.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use agora_core::config::{AgoraConfig, PUBLIC_CHAT_NAME};
use agora_gateway::app::AppState;
use agora_gateway::listener;
use agora_store::ChatStore;
use agora_users::UserStore;
use chrono::Utc;
use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

async fn start_test_server() -> (SocketAddr, Arc<AppState>) {
    let suffix = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_nanos();
    let db_path = std::env::temp_dir().join(format!("agora-gateway-test-{suffix}.sqlite"));

    let conn = rusqlite::Connection::open(&db_path).unwrap();
    agora_users::db::init_db(&conn).unwrap();
    agora_store::db::init_db(&conn).unwrap();
    let db = Arc::new(std::sync::Mutex::new(conn));

    let users = UserStore::new(db.clone());
    let chats = ChatStore::new(db.clone());
    let public_chat = chats.ensure_public_chat(PUBLIC_CHAT_NAME).unwrap();

    let state = Arc::new(AppState {
        config: AgoraConfig::default(),
        users,
        chats,
        public_chat_id: public_chat.id,
    });

    let tcp_listener = listener::bind("127.0.0.1", 0).await.unwrap();
    let addr = tcp_listener.local_addr().unwrap();
    let serve_state = state.clone();
    tokio::spawn(async move {
        let _ = listener::serve(serve_state, tcp_listener).await;
    });

    (addr, state)
}

async fn request(
    addr: SocketAddr,
    method: &str,
    path: &str,
    token: Option<&str>,
    body: Option<&Value>,
) -> (u16, Value) {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    let payload = body.map(|b| serde_json::to_vec(b).unwrap()).unwrap_or_default();

    let mut head = format!("{method} {path} HTTP/1.1\r\nHost: test\r\n");
    if let Some(t) = token {
        head.push_str(&format!("Authorization: Bearer {t}\r\n"));
    }
    if !payload.is_empty() {
        head.push_str("Content-Type: application/json\r\n");
        head.push_str(&format!("Content-Length: {}\r\n", payload.len()));
    }
    head.push_str("Connection: close\r\n\r\n");

    stream.write_all(head.as_bytes()).await.unwrap();
    if !payload.is_empty() {
        stream.write_all(&payload).await.unwrap();
    }

    let mut raw = Vec::new();
    stream.read_to_end(&mut raw).await.unwrap();

    let split = raw.windows(4).position(|w| w == b"\r\n\r\n").unwrap();
    let head_text = std::str::from_utf8(&raw[..split]).unwrap();
    let status: u16 = head_text.lines().next().unwrap().split_whitespace().nth(1).unwrap().parse().unwrap();
    let body_bytes = &raw[split + 4..];
    let body_json = if body_bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(body_bytes).unwrap()
    };
    (status, body_json)
}

async fn get_token(addr: SocketAddr, user_name: &str) -> String {
    let (status, body) = request(addr, "POST", "/get-token", None, Some(&json!({ "user_name": user_name }))).await;
    assert_eq!(status, 200);
    body["token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn s1_token_issuance_is_idempotent() {
    let (addr, _state) = start_test_server().await;

    let (status, body) = request(addr, "POST", "/get-token", None, Some(&json!({ "user_name": "alice" }))).await;
    assert_eq!(status, 200);
    let token = body["token"].as_str().unwrap();
    assert_eq!(token.len(), 32);

    let (status, body) = request(addr, "POST", "/get-token", None, Some(&json!({ "user_name": "alice" }))).await;
    assert_eq!(status, 200);
    assert_eq!(body["info"], "You have already got token .");
}

#[tokio::test]
async fn s2_public_send_and_read() {
    let (addr, _state) = start_test_server().await;
    let alice = get_token(addr, "alice").await;
    let bob = get_token(addr, "bob").await;

    let (status, body) = request(
        addr,
        "POST",
        "/send",
        Some(&alice),
        Some(&json!({ "send_to": "public_chat", "message": "hi" })),
    )
    .await;
    assert_eq!(status, 201);
    assert_eq!(body["info"], "Message have sent!");

    let (status, body) = request(
        addr,
        "POST",
        "/connect",
        Some(&bob),
        Some(&json!({ "chat_with": "public_chat" })),
    )
    .await;
    assert_eq!(status, 200);
    let all = body["messages"]
        .as_array()
        .unwrap()
        .iter()
        .chain(body["unread_messages"].as_array().unwrap())
        .collect::<Vec<_>>();
    assert!(all
        .iter()
        .any(|m| m["message_text"] == "hi" && m["author"] == "alice"));
}

#[tokio::test]
async fn s3_rate_limit_refuses_and_creates_no_message() {
    let (addr, state) = start_test_server().await;
    let alice = get_token(addr, "alice").await;

    let user = state.users.find_by_name("alice").unwrap().unwrap();
    state
        .users
        .update_rate_limit(user.id, 20, Utc::now())
        .unwrap();

    let (status, body) = request(
        addr,
        "POST",
        "/send",
        Some(&alice),
        Some(&json!({ "message": "x" })),
    )
    .await;
    assert_eq!(status, 200);
    assert!(body["warning"]
        .as_str()
        .unwrap()
        .starts_with("message limit has been reached"));

    let epoch = chrono::DateTime::<Utc>::from_timestamp(0, 0).unwrap();
    let messages = state.chats.messages_after(state.public_chat_id, epoch).unwrap();
    assert!(!messages.iter().any(|m| m.text == "x"));
}

#[tokio::test]
async fn s4_private_first_send_creates_chat() {
    let (addr, _state) = start_test_server().await;
    let alice = get_token(addr, "alice").await;
    let bob = get_token(addr, "bob").await;

    let (status, body) = request(
        addr,
        "POST",
        "/send",
        Some(&alice),
        Some(&json!({ "send_to": "bob", "message": "hey" })),
    )
    .await;
    assert_eq!(status, 201);
    assert_eq!(body["info"], "Message have sent!");

    let (status, body) = request(
        addr,
        "POST",
        "/connect",
        Some(&bob),
        Some(&json!({ "chat_with": "alice" })),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["unread_messages"][0]["message_text"], "hey");
}

#[tokio::test]
async fn s5_three_reports_ban_the_target() {
    let (addr, state) = start_test_server().await;
    let alice = get_token(addr, "alice").await;
    let bob = get_token(addr, "bob").await;

    let alice_user = state.users.find_by_name("alice").unwrap().unwrap();
    state
        .chats
        .update_moderation(state.public_chat_id, alice_user.id, 2, false, None)
        .unwrap();

    let (status, body) = request(
        addr,
        "POST",
        "/report",
        Some(&bob),
        Some(&json!({ "report_on": "alice", "chat_type": "public" })),
    )
    .await;
    assert_eq!(status, 201);
    assert_eq!(body["info"], "Report sent success.");

    let (status, body) = request(
        addr,
        "POST",
        "/send",
        Some(&alice),
        Some(&json!({ "message": "test" })),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["warning"], "You are banned!");

    let membership = state
        .chats
        .get_membership(state.public_chat_id, alice_user.id)
        .unwrap()
        .unwrap();
    assert!(membership.banned);
    assert!(membership.banned_till.unwrap() > Utc::now());
}

#[tokio::test]
async fn s6_connect_without_auth_header_is_unauthorized() {
    let (addr, _state) = start_test_server().await;
    let (status, body) = request(addr, "POST", "/connect", None, Some(&json!({}))).await;
    assert_eq!(status, 401);
    assert!(body["error"].as_str().unwrap().starts_with("Unauthorized."));
}
