use std::sync::Arc;

use agora_core::config::{AgoraConfig, PUBLIC_CHAT_NAME};
use agora_gateway::app::AppState;
use agora_gateway::listener;
use agora_store::ChatStore;
use agora_users::UserStore;
use clap::Parser;
use tracing::info;

/// Agora chat server.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// Path to a TOML config file. Falls back to AGORA_* env vars and
    /// built-in defaults when omitted.
    #[arg(long)]
    config: Option<String>,

    /// Override the bind address from config.
    #[arg(long)]
    bind: Option<String>,

    /// Override the listen port from config.
    #[arg(long)]
    port: Option<u16>,

    /// Override the SQLite database path from config.
    #[arg(long)]
    db: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "agora_gateway=info".into()),
        )
        .init();

    let cli = Cli::parse();
    let mut config = AgoraConfig::load(cli.config.as_deref()).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "config load failed, using defaults");
        AgoraConfig::default()
    });
    if let Some(bind) = cli.bind {
        config.server.bind = bind;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if let Some(db) = cli.db {
        config.database.path = db;
    }

    let conn = rusqlite::Connection::open(&config.database.path)?;
    agora_users::db::init_db(&conn)?;
    agora_store::db::init_db(&conn)?;
    let db = Arc::new(std::sync::Mutex::new(conn));

    let users = UserStore::new(db.clone());
    let chats = ChatStore::new(db.clone());
    let public_chat = chats.ensure_public_chat(PUBLIC_CHAT_NAME)?;
    info!(chat_id = public_chat.id, "public chat provisioned");

    let bind = config.server.bind.clone();
    let port = config.server.port;
    let state = Arc::new(AppState {
        config,
        users,
        chats,
        public_chat_id: public_chat.id,
    });

    listener::run(state, &bind, port).await?;
    Ok(())
}
