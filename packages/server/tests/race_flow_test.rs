//! End-to-end tests: an in-process server on an ephemeral port, driven by
//! WebSocket clients and HTTP requests.

use std::{net::SocketAddr, sync::Arc, time::Duration};

use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};
use typerace_server::{
    bootstrap::{App, build_app},
    config::RaceConfig,
    domain::UserId,
    infrastructure::collaborator::RandomTextPool,
    ui::router,
};
use typerace_shared::time::SystemClock;

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

fn fast_countdown(capacity: usize) -> RaceConfig {
    RaceConfig::default()
        .with_room_capacity(capacity)
        .with_countdown(1, Duration::from_millis(50))
}

async fn spawn_server(config: RaceConfig) -> (SocketAddr, App) {
    let app = build_app(
        config,
        Arc::new(SystemClock),
        Arc::new(RandomTextPool::new(vec!["cat dog".to_string()])),
    );
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app_router = router(app.state.clone());
    tokio::spawn(async move {
        axum::serve(listener, app_router).await.unwrap();
    });
    (addr, app)
}

async fn connect(addr: SocketAddr) -> Client {
    let (client, _) = connect_async(format!("ws://{}/ws", addr)).await.unwrap();
    client
}

async fn send(client: &mut Client, message: Value) {
    client
        .send(Message::Text(message.to_string().into()))
        .await
        .unwrap();
}

/// Read messages until one of type `until` arrives
async fn recv_until(client: &mut Client, until: &str) -> Vec<Value> {
    let mut messages = Vec::new();
    loop {
        let frame = tokio::time::timeout(Duration::from_secs(5), client.next())
            .await
            .unwrap_or_else(|_| panic!("timed out waiting for '{}'", until))
            .expect("stream closed")
            .unwrap();
        if let Message::Text(text) = frame {
            let message: Value = serde_json::from_str(text.as_str()).unwrap();
            let done = message["type"] == until;
            messages.push(message);
            if done {
                return messages;
            }
        }
    }
}

fn join(user_id: &str) -> Value {
    json!({"type": "join_matchmaking", "user_id": user_id, "display_name": user_id.to_uppercase()})
}

fn progress(room_id: &str, user_id: &str, text: &str, char_index: i64) -> Value {
    json!({
        "type": "typing_progress",
        "room_id": room_id,
        "user_id": user_id,
        "submitted_text": text,
        "char_index": char_index,
    })
}

#[tokio::test]
async fn test_full_race_over_websocket() {
    // テスト項目: 2 人が参加してカウントダウン後にレースが始まり、先に完走した方が勝つ
    // given (前提条件):
    let (addr, app) = spawn_server(fast_countdown(2)).await;
    let mut alice = connect(addr).await;
    let mut bob = connect(addr).await;

    // when (操作):
    send(&mut alice, join("alice")).await;
    let joined = recv_until(&mut alice, "room_update").await;
    let room_id = joined[0]["room"]["id"].as_str().unwrap().to_string();
    send(&mut bob, join("bob")).await;

    let alice_start = recv_until(&mut alice, "race_started").await;
    let bob_start = recv_until(&mut bob, "race_started").await;
    let text = alice_start.last().unwrap()["text"].as_str().unwrap().to_string();

    tokio::time::sleep(Duration::from_millis(100)).await;
    send(&mut alice, progress(&room_id, "alice", &text, 7)).await;
    recv_until(&mut bob, "player_finished").await;
    tokio::time::sleep(Duration::from_millis(100)).await;
    send(&mut bob, progress(&room_id, "bob", "cat", 3)).await;
    send(&mut bob, progress(&room_id, "bob", &text, 7)).await;
    let alice_end = recv_until(&mut alice, "race_finished").await;

    // then (期待する結果):
    assert_eq!(text, "cat dog");
    assert!(alice_start.iter().any(|m| m["type"] == "countdown" && m["n"] == 0));
    assert_eq!(bob_start.last().unwrap()["text"], "cat dog");

    let finished = alice_end.last().unwrap();
    assert_eq!(finished["winner_id"], "alice");
    let results = finished["results"].as_array().unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0]["user_id"], "alice");
    assert_eq!(results[0]["rank"], 1);
    assert_eq!(results[1]["user_id"], "bob");

    let rooms: Value = reqwest::get(format!("http://{}/api/rooms", addr))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(rooms[0]["id"], room_id.as_str());
    assert_eq!(rooms[0]["status"], "finished");

    let detail: Value = reqwest::get(format!("http://{}/api/rooms/{}", addr, room_id))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(detail["winner_id"], "alice");
    assert_eq!(detail["players"].as_array().unwrap().len(), 2);

    app.coordinator.dispatcher().flush().await;
    let alice_stats = app
        .user_stats
        .get(&UserId::new("alice".to_string()).unwrap())
        .await
        .unwrap();
    assert_eq!((alice_stats.total_games, alice_stats.total_wins), (1, 1));
}

#[tokio::test]
async fn test_finished_room_released_after_disconnect() {
    // テスト項目: 終了した部屋は最後のプレイヤーが切断すると一覧から消える
    // given (前提条件):
    let (addr, _app) = spawn_server(fast_countdown(1)).await;
    let mut solo = connect(addr).await;
    send(&mut solo, join("solo")).await;
    let started = recv_until(&mut solo, "race_started").await;
    let room_id = started[0]["room"]["id"].as_str().unwrap().to_string();
    tokio::time::sleep(Duration::from_millis(100)).await;
    send(&mut solo, progress(&room_id, "solo", "cat dog", 7)).await;
    recv_until(&mut solo, "race_finished").await;

    // when (操作):
    solo.close(None).await.unwrap();

    // then (期待する結果):
    let deadline = tokio::time::Instant::now() + Duration::from_secs(3);
    loop {
        let rooms: Value = reqwest::get(format!("http://{}/api/rooms", addr))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        if rooms.as_array().unwrap().is_empty() {
            break;
        }
        assert!(tokio::time::Instant::now() < deadline, "room never released");
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    let detail = reqwest::get(format!("http://{}/api/rooms/{}", addr, room_id))
        .await
        .unwrap();
    assert_eq!(detail.status(), reqwest::StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_invalid_message_gets_error_reply() {
    // テスト項目: 解釈できないメッセージには送信者だけに error が返る
    // given (前提条件):
    let (addr, _app) = spawn_server(fast_countdown(2)).await;
    let mut client = connect(addr).await;

    // when (操作):
    client
        .send(Message::Text("not json".to_string().into()))
        .await
        .unwrap();
    let messages = recv_until(&mut client, "error").await;

    // then (期待する結果):
    assert_eq!(messages.last().unwrap()["code"], "invalid_message");
}

#[tokio::test]
async fn test_disconnect_during_countdown_returns_room_to_waiting() {
    // テスト項目: カウントダウン中に切断すると残ったプレイヤーに player_left と room_update が届く
    // given (前提条件):
    let slow = RaceConfig::default()
        .with_room_capacity(2)
        .with_countdown(3, Duration::from_secs(1));
    let (addr, _app) = spawn_server(slow).await;
    let mut alice = connect(addr).await;
    let mut bob = connect(addr).await;
    send(&mut alice, join("alice")).await;
    recv_until(&mut alice, "room_update").await;
    send(&mut bob, join("bob")).await;
    recv_until(&mut bob, "room_update").await;

    // when (操作):
    bob.close(None).await.unwrap();
    let messages = recv_until(&mut alice, "player_left").await;

    // then (期待する結果):
    assert_eq!(messages.last().unwrap()["user_id"], "bob");
    let update = recv_until(&mut alice, "room_update").await;
    assert_eq!(update.last().unwrap()["room"]["status"], "waiting");
}

#[tokio::test]
async fn test_unknown_room_detail_is_not_found() {
    // テスト項目: 存在しない部屋の詳細は 404
    // given (前提条件):
    let (addr, _app) = spawn_server(fast_countdown(2)).await;

    // when (操作):
    let response = reqwest::get(format!("http://{}/api/rooms/missing", addr))
        .await
        .unwrap();

    // then (期待する結果):
    assert_eq!(response.status(), reqwest::StatusCode::NOT_FOUND);
}
