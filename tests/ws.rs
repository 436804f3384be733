//! Live feed tests over a real WebSocket connection.

mod common;

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use common::{TestApp, base_config, spawn_app};

type Ws = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn connect(app: &TestApp) -> anyhow::Result<Ws> {
    let (ws, _) = connect_async(format!("ws://{}/ws", app.addr)).await?;
    Ok(ws)
}

async fn next_json(ws: &mut Ws) -> anyhow::Result<Value> {
    loop {
        let Some(msg) = tokio::time::timeout(Duration::from_secs(5), ws.next()).await? else {
            anyhow::bail!("websocket closed");
        };
        if let Message::Text(text) = msg? {
            return Ok(serde_json::from_str(&text)?);
        }
    }
}

fn payload_field<'a>(msg: &'a Value, key: &str) -> Option<&'a Value> {
    msg.get("payload").and_then(|p| p.get(key))
}

async fn track(app: &TestApp, user_id: &str) -> anyhow::Result<()> {
    let (status, _) = app
        .post_json("/api/track", &json!({ "tokens": 10, "userId": user_id }))
        .await?;
    anyhow::ensure!(status.is_success(), "tracking failed with {status}");
    Ok(())
}

#[tokio::test]
async fn connect_receives_current_snapshot() -> anyhow::Result<()> {
    let app = spawn_app(base_config()).await?;
    track(&app, "u1").await?;

    let mut ws = connect(&app).await?;
    let first = next_json(&mut ws).await?;
    assert_eq!(first.get("type"), Some(&json!("event")));
    assert_eq!(payload_field(&first, "event_type"), Some(&json!("snapshot")));
    assert_eq!(
        payload_field(&first, "stats").and_then(|s| s.get("totalPrompts")),
        Some(&json!(1))
    );
    Ok(())
}

#[tokio::test]
async fn tracked_prompts_are_pushed() -> anyhow::Result<()> {
    let app = spawn_app(base_config()).await?;
    let mut ws = connect(&app).await?;
    let _snapshot = next_json(&mut ws).await?;

    track(&app, "u1").await?;

    let event = next_json(&mut ws).await?;
    assert_eq!(payload_field(&event, "event_type"), Some(&json!("stats_updated")));
    assert_eq!(payload_field(&event, "user_id"), Some(&json!("u1")));
    assert_eq!(
        payload_field(&event, "stats").and_then(|s| s.get("totalPrompts")),
        Some(&json!(1))
    );
    Ok(())
}

#[tokio::test]
async fn subscription_narrows_the_feed() -> anyhow::Result<()> {
    let app = spawn_app(base_config()).await?;
    let mut ws = connect(&app).await?;
    let _snapshot = next_json(&mut ws).await?;

    ws.send(Message::text(
        json!({ "id": "sub-1", "command": "subscribe", "user_ids": ["u2"] }).to_string(),
    ))
    .await?;
    let ack = next_json(&mut ws).await?;
    assert_eq!(ack.get("type"), Some(&json!("response")));
    assert_eq!(ack.get("id"), Some(&json!("sub-1")));
    assert_eq!(payload_field(&ack, "wildcard"), Some(&json!(false)));

    track(&app, "u1").await?;
    track(&app, "u2").await?;

    let event = next_json(&mut ws).await?;
    assert_eq!(payload_field(&event, "user_id"), Some(&json!("u2")));
    assert_eq!(
        payload_field(&event, "stats").and_then(|s| s.get("totalPrompts")),
        Some(&json!(2))
    );
    Ok(())
}

#[tokio::test]
async fn get_stats_and_bad_commands() -> anyhow::Result<()> {
    let app = spawn_app(base_config()).await?;
    let mut ws = connect(&app).await?;
    let _snapshot = next_json(&mut ws).await?;

    ws.send(Message::text(json!({ "id": "s", "command": "get_stats" }).to_string()))
        .await?;
    let stats = next_json(&mut ws).await?;
    assert_eq!(stats.get("type"), Some(&json!("response")));
    assert_eq!(payload_field(&stats, "event_type"), Some(&json!("snapshot")));

    ws.send(Message::text(json!({ "command": "swap" }).to_string()))
        .await?;
    let unknown = next_json(&mut ws).await?;
    assert_eq!(unknown.get("type"), Some(&json!("error")));
    assert_eq!(payload_field(&unknown, "code"), Some(&json!(404)));

    ws.send(Message::text("{oops")).await?;
    let malformed = next_json(&mut ws).await?;
    assert_eq!(payload_field(&malformed, "code"), Some(&json!(400)));
    Ok(())
}
