use roomcast::prelude::*;
use serde_json::{Value, json};
use tracing_subscriber::EnvFilter;

// ---------------------------------------------------------------------------
// Content
// ---------------------------------------------------------------------------

/// Channels listed on the index view.
fn seed(store: &MemoryStore) -> Result<(), StoreError> {
    store.put("channels", "general", json!({"name": "general", "topic": "anything goes"}))?;
    store.put("channels", "rust", json!({"name": "rust", "topic": "borrowck support group"}))?;
    Ok(())
}

fn render(template: &str, data: &Value) -> Result<String, RenderError> {
    let channels = data.as_array().map(Vec::as_slice).unwrap_or_default();
    let name = |c: &Value| c["name"].as_str().unwrap_or("?").to_string();
    match template {
        "index" => Ok(format!(
            "<ul>{}</ul>",
            channels
                .iter()
                .map(|c| format!("<li>#{}</li>", name(c)))
                .collect::<String>()
        )),
        "channel" => Ok(channels
            .iter()
            .map(|c| format!("<h1>#{}</h1><p>{}</p>", name(c), c["topic"].as_str().unwrap_or("")))
            .collect()),
        "about" => Ok("<p>roomcast chat demo</p>".to_string()),
        other => Err(RenderError::UnknownTemplate(other.to_string())),
    }
}

// ---------------------------------------------------------------------------
// Event handlers
// ---------------------------------------------------------------------------

fn log_chat(conn: &ConnectionHandle, _frame: &[u8], msg: &Message) {
    tracing::info!(
        conn = %conn.id(),
        room = %msg.room,
        bytes = msg.payload.len(),
        "chat"
    );
}

/// Tells the sender its own connection id and privilege.
fn whoami(conn: &ConnectionHandle, _frame: &[u8], msg: &Message) {
    let reply = Message::new(msg.room.as_str(), "you", conn.id().as_str())
        .to(conn.id().as_str())
        .with_payload(conn.privilege().to_string());
    let conn = conn.clone();
    tokio::spawn(async move {
        let frame = match BinaryCodec.encode(&reply) {
            Ok(frame) => frame,
            Err(e) => return tracing::warn!(error = %e, "whoami reply not encoded"),
        };
        if let Err(e) = conn.send(frame).await {
            tracing::debug!(conn = %conn.id(), error = %e, "whoami reply dropped");
        }
    });
}

// ---------------------------------------------------------------------------
// Server bootstrap
// ---------------------------------------------------------------------------

fn server(config: ServerConfig) -> Result<RoomcastServerBuilder, RoomcastError> {
    let store = MemoryStore::new();
    seed(&store)?;
    Ok(RoomcastServer::builder()
        .config(config)
        .store(store)
        .renderer(render)
        .on("chat", log_chat)
        .on("whoami", whoami))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => ServerConfig::from_file(&path)?,
        None => ServerConfig::default(),
    };
    tracing::info!(bind = %config.bind, routes = config.routes.len(), "starting chat server");

    let server = server(config)?.build().await?;
    server.run().await?;
    Ok(())
}
