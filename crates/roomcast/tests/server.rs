//! End-to-end tests: a real server, real WebSocket clients.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use roomcast::prelude::*;
use roomcast_session::CookieSession;
use serde_json::json;
use tokio_tungstenite::tungstenite;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;

type ClientWs = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

// =========================================================================
// Helpers
// =========================================================================

/// Starts `builder` on a random port. Returns the address and the hub.
async fn start(builder: RoomcastServerBuilder) -> (String, Arc<Hub>) {
    let server = builder
        .bind("127.0.0.1:0")
        .build()
        .await
        .expect("server should build");

    let addr = server
        .local_addr()
        .expect("should have local addr")
        .to_string();
    let hub = Arc::clone(server.hub());

    tokio::spawn(async move {
        let _ = server.run().await;
    });

    (addr, hub)
}

async fn connect(addr: &str) -> ClientWs {
    connect_with_cookie(addr, None).await
}

async fn connect_with_cookie(addr: &str, cookie: Option<&str>) -> ClientWs {
    let mut request = format!("ws://{addr}/ws")
        .into_client_request()
        .expect("valid request");
    if let Some(cookie) = cookie {
        request
            .headers_mut()
            .insert("cookie", cookie.parse().expect("header value"));
    }
    let (ws, _) = tokio_tungstenite::connect_async(request)
        .await
        .expect("should connect");
    ws
}

async fn send(ws: &mut ClientWs, msg: &Message) {
    let frame = BinaryCodec.encode(msg).expect("encode");
    ws.send(tungstenite::Message::Binary(frame.into()))
        .await
        .expect("send");
}

/// Next roomcast message from the server, skipping control frames.
async fn recv(ws: &mut ClientWs) -> Message {
    loop {
        let next = tokio::time::timeout(Duration::from_secs(5), ws.next())
            .await
            .expect("timed out waiting for a message")
            .expect("stream ended")
            .expect("read failed");
        if let tungstenite::Message::Binary(data) = next {
            return BinaryCodec.decode(&data).expect("decode");
        }
    }
}

async fn wait_members(hub: &Hub, room: &str, n: usize) {
    for _ in 0..200 {
        if let Some(handle) = hub.rooms().get(room).await {
            if handle.info().await.map(|i| i.member_count).ok() == Some(n) {
                return;
            }
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("room {room} never reached {n} members");
}

/// Asks the server for `path` and returns the response, which also
/// reveals the caller's connection id.
async fn request(ws: &mut ClientWs, path: &str) -> (String, ViewResponse) {
    send(ws, &Message::new("root", event::REQUEST, "").with_payload(path)).await;
    let msg = recv(ws).await;
    assert_eq!(msg.event, event::RESPONSE);
    assert_eq!(msg.dst, msg.src);
    let view = serde_json::from_slice(&msg.payload).expect("view json");
    (msg.dst, view)
}

fn routed() -> RoomcastServerBuilder {
    let routes: Vec<RouteEntry> =
        serde_json::from_value(json!([{ "path": "/whoami", "template": "whoami" }])).unwrap();
    RoomcastServer::builder().routes(routes)
}

// =========================================================================
// Tests
// =========================================================================

#[tokio::test]
async fn test_chat_between_two_clients() {
    let (addr, hub) = start(RoomcastServer::builder()).await;
    let mut c1 = connect(&addr).await;
    let mut c2 = connect(&addr).await;

    send(&mut c1, &Message::new("lobby", event::JOIN, "c1")).await;
    send(&mut c2, &Message::new("lobby", event::JOIN, "c2")).await;
    wait_members(&hub, "lobby", 2).await;

    let chat = Message::new("lobby", "chat", "c1").with_payload("hello over the wire");
    send(&mut c1, &chat).await;

    assert_eq!(recv(&mut c2).await, chat);
}

#[tokio::test]
async fn test_request_is_answered_with_rendered_view() {
    let (addr, _hub) = start(routed()).await;
    let mut c1 = connect(&addr).await;

    let (id, view) = request(&mut c1, "/whoami").await;

    assert!(!id.is_empty());
    assert_eq!(view.view, "whoami");
    assert_eq!(view.template, "[]");
}

#[tokio::test]
async fn test_direct_message_between_clients() {
    let (addr, hub) = start(routed()).await;
    let mut c1 = connect(&addr).await;
    let mut c2 = connect(&addr).await;
    wait_members(&hub, "root", 2).await;

    let (c2_id, _) = request(&mut c2, "/whoami").await;

    let dm = Message::new("root", "dm", "c1").to(c2_id.as_str()).with_payload("just you");
    send(&mut c1, &dm).await;

    assert_eq!(recv(&mut c2).await, dm);
}

#[tokio::test]
async fn test_closing_client_notifies_rooms() {
    let (addr, hub) = start(routed()).await;
    let mut c1 = connect(&addr).await;
    let mut c2 = connect(&addr).await;
    send(&mut c1, &Message::new("lobby", event::JOIN, "")).await;
    send(&mut c2, &Message::new("lobby", event::JOIN, "")).await;
    wait_members(&hub, "lobby", 2).await;
    wait_members(&hub, "root", 2).await;

    let (c1_id, _) = request(&mut c1, "/whoami").await;
    c1.close(None).await.expect("close");

    let mut rooms = Vec::new();
    for _ in 0..2 {
        let msg = recv(&mut c2).await;
        assert_eq!(msg.event, event::LEFT);
        assert_eq!(msg.src, c1_id);
        assert_eq!(msg.payload, c1_id.as_bytes());
        rooms.push(msg.room);
    }
    rooms.sort();
    assert_eq!(rooms, vec!["lobby", "root"]);

    wait_members(&hub, "lobby", 1).await;
    assert!(!hub.connections().contains(&ConnectionId::new(c1_id)).await);
}

#[tokio::test]
async fn test_session_privilege_reaches_handlers() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let log = Arc::clone(&seen);
    let builder = RoomcastServer::builder()
        .session(CookieSession::new("session", |raw: &str| {
            let (user, privilege) = raw.split_once(':')?;
            Some(Identity::new(user, privilege))
        }))
        .on("hello", move |conn, _frame, _msg| {
            log.lock().unwrap().push(conn.privilege().to_string());
        });
    let (addr, hub) = start(builder).await;

    let mut admin = connect_with_cookie(&addr, Some("session=ana:admin")).await;
    let mut anonymous = connect(&addr).await;
    wait_members(&hub, "root", 2).await;

    send(&mut admin, &Message::new("root", "hello", "")).await;
    for _ in 0..200 {
        if !seen.lock().unwrap().is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    send(&mut anonymous, &Message::new("root", "hello", "")).await;
    for _ in 0..200 {
        if seen.lock().unwrap().len() == 2 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    assert_eq!(*seen.lock().unwrap(), vec!["admin".to_string(), String::new()]);
}

#[tokio::test]
async fn test_hub_tracks_live_connections() {
    let (addr, hub) = start(RoomcastServer::builder()).await;
    let c1 = connect(&addr).await;
    let _c2 = connect(&addr).await;
    wait_members(&hub, "root", 2).await;
    assert_eq!(hub.connections().len().await, 2);

    drop(c1);
    for _ in 0..200 {
        if hub.connections().len().await == 1 {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("dropped client was never unregistered");
}

#[tokio::test]
async fn test_invalid_route_pattern_fails_build() {
    let routes: Vec<RouteEntry> =
        serde_json::from_value(json!([{ "path": "^(", "template": "x" }])).unwrap();
    let result = RoomcastServer::builder()
        .bind("127.0.0.1:0")
        .routes(routes)
        .build()
        .await;
    assert!(matches!(result, Err(RoomcastError::Route(_))));
}
