//! End-to-end tests: a real server on a random port, driven by WebSocket
//! clients speaking the JSON protocol.

use std::time::Duration;

use bingo::prelude::*;
use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio_tungstenite::tungstenite::Message;

// =========================================================================
// Helpers
// =========================================================================

type ClientWs = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

const ROOM: &str = "ABC123";

struct TestServer {
    addr: String,
    store: MemoryStore,
    sessions: SessionManager,
}

impl TestServer {
    /// A token for `name` in room `ABC123`.
    async fn token(&self, name: &str, is_host: bool) -> String {
        self.sessions
            .issue(SessionIdentity {
                user_name: name.into(),
                room_code: RoomCode::new(ROOM),
                is_host,
            })
            .await
    }
}

/// Starts a server on a random port with room `ABC123` hosted by alice.
async fn start_server() -> TestServer {
    let store = MemoryStore::new();
    store.insert_room(RoomCode::new(ROOM), "alice").await;
    let sessions = SessionManager::default();

    let server = BingoServer::builder()
        .bind("127.0.0.1:0")
        .build(store.clone(), sessions.clone())
        .await
        .expect("server should build");

    let addr = server
        .local_addr()
        .expect("should have local addr")
        .to_string();

    tokio::spawn(async move {
        let _ = server.run().await;
    });

    // Give the accept loop a moment to start.
    tokio::time::sleep(Duration::from_millis(10)).await;
    TestServer {
        addr,
        store,
        sessions,
    }
}

async fn connect_raw(addr: &str, query: &str) -> ClientWs {
    let (ws, _) = tokio_tungstenite::connect_async(format!(
        "ws://{addr}/ws/room/{ROOM}/{query}"
    ))
    .await
    .expect("should connect");
    ws
}

/// Connects with a session token and consumes `game_init` and our own
/// `player_joined`. Returns the socket and the `game_init` payload.
async fn join(server: &TestServer, name: &str, is_host: bool) -> (ClientWs, Value) {
    let token = server.token(name, is_host).await;
    let mut ws = connect_raw(&server.addr, &format!("?session={token}")).await;
    let init = next_event(&mut ws).await;
    assert_eq!(init["type"], "game_init");
    let joined = next_event(&mut ws).await;
    assert_eq!(joined["type"], "player_joined");
    assert_eq!(joined["player_name"], name);
    (ws, init)
}

async fn send(ws: &mut ClientWs, action: Value) {
    ws.send(Message::Text(action.to_string().into()))
        .await
        .expect("send");
}

/// Reads the next JSON event, failing after a second of silence.
async fn next_event(ws: &mut ClientWs) -> Value {
    loop {
        let msg = tokio::time::timeout(Duration::from_secs(1), ws.next())
            .await
            .expect("timed out waiting for event")
            .expect("stream ended")
            .expect("recv");
        match msg {
            Message::Text(text) => {
                return serde_json::from_str(text.as_str()).expect("decode");
            }
            Message::Close(frame) => panic!("unexpected close: {frame:?}"),
            _ => continue,
        }
    }
}

/// Reads until the server closes, returning the close code.
async fn close_code(ws: &mut ClientWs) -> u16 {
    loop {
        let msg = tokio::time::timeout(Duration::from_secs(1), ws.next())
            .await
            .expect("timed out waiting for close")
            .expect("stream ended")
            .expect("recv");
        if let Message::Close(frame) = msg {
            return frame.map(|f| u16::from(f.code)).unwrap_or(1005);
        }
    }
}

/// Generates a board and readies up, consuming the replies on `ws` and
/// the ready broadcast on every socket in `others`.
async fn ready_up(ws: &mut ClientWs, others: &mut [&mut ClientWs]) {
    send(ws, json!({"action": "generate_random_board"})).await;
    assert_eq!(next_event(ws).await["type"], "board_generated");
    send(ws, json!({"action": "player_ready"})).await;
    assert_eq!(next_event(ws).await["type"], "player_ready_update");
    for other in others.iter_mut() {
        assert_eq!(next_event(other).await["type"], "player_ready_update");
    }
}

async fn wait_for_room_gone(store: &MemoryStore) {
    for _ in 0..100 {
        if store.get_room(&RoomCode::new(ROOM)).await.is_err() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("room was not destroyed");
}

// =========================================================================
// Admission
// =========================================================================

#[tokio::test]
async fn test_missing_session_closes_with_4000() {
    let server = start_server().await;
    let mut ws = connect_raw(&server.addr, "").await;
    assert_eq!(close_code(&mut ws).await, CloseReason::NoSession.code());
}

#[tokio::test]
async fn test_unknown_token_closes_with_4000() {
    let server = start_server().await;
    let mut ws = connect_raw(&server.addr, "?session=feedface").await;
    assert_eq!(close_code(&mut ws).await, 4000);
}

#[tokio::test]
async fn test_token_for_missing_room_closes_with_4001() {
    let server = start_server().await;
    let token = server
        .sessions
        .issue(SessionIdentity {
            user_name: "bob".into(),
            room_code: RoomCode::new("ZZZ999"),
            is_host: false,
        })
        .await;
    let mut ws = connect_raw(&server.addr, &format!("?session={token}")).await;
    assert_eq!(close_code(&mut ws).await, CloseReason::ResolutionFailed.code());
}

#[tokio::test]
async fn test_token_from_cookie_is_accepted() {
    use tokio_tungstenite::tungstenite::client::IntoClientRequest;

    let server = start_server().await;
    let token = server.token("alice", true).await;
    let mut request = format!("ws://{}/ws/room/{ROOM}/", server.addr)
        .into_client_request()
        .unwrap();
    request.headers_mut().insert(
        "Cookie",
        format!("bingo_session={token}").parse().unwrap(),
    );
    let (mut ws, _) = tokio_tungstenite::connect_async(request).await.unwrap();

    let init = next_event(&mut ws).await;
    assert_eq!(init["type"], "game_init");
    assert_eq!(init["player_name"], "alice");
    assert_eq!(init["is_host"], true);
    assert_eq!(init["room_data"]["host_name"], "alice");
}

#[tokio::test]
async fn test_game_init_snapshot_lists_players() {
    let server = start_server().await;
    let (mut alice, _) = join(&server, "alice", true).await;
    let (_bob, init) = join(&server, "bob", false).await;

    assert_eq!(init["board"], json!([]));
    assert_eq!(init["is_host"], false);
    let players = init["room_data"]["players"].as_array().unwrap();
    assert_eq!(players.len(), 2);
    assert_eq!(players[0]["name"], "alice");
    assert_eq!(players[0]["is_host"], true);
    assert_eq!(players[1]["name"], "bob");
    assert_eq!(init["room_data"]["game_started"], false);
    assert_eq!(init["room_data"]["current_number"], Value::Null);

    let joined = next_event(&mut alice).await;
    assert_eq!(joined, json!({"type": "player_joined", "player_name": "bob", "is_host": false}));
}

// =========================================================================
// Game flow
// =========================================================================

#[tokio::test]
async fn test_full_round_and_duplicate_number() {
    let server = start_server().await;
    let (mut alice, _) = join(&server, "alice", true).await;
    let (mut bob, _) = join(&server, "bob", false).await;
    assert_eq!(next_event(&mut alice).await["type"], "player_joined");

    ready_up(&mut alice, &mut [&mut bob]).await;
    ready_up(&mut bob, &mut [&mut alice]).await;

    send(&mut alice, json!({"action": "start_game"})).await;
    for ws in [&mut alice, &mut bob] {
        let started = next_event(ws).await;
        assert_eq!(started["type"], "game_started");
        assert_eq!(started["current_turn_player"], "alice");
    }

    send(&mut alice, json!({"action": "select_number", "number": 7})).await;
    for ws in [&mut alice, &mut bob] {
        let called = next_event(ws).await;
        assert_eq!(
            called,
            json!({
                "type": "number_called",
                "number": 7,
                "drawn_numbers": [7],
                "selected_by": "alice",
                "current_turn_player": "bob",
            })
        );
    }

    send(&mut bob, json!({"action": "select_number", "number": 7})).await;
    assert_eq!(
        next_event(&mut bob).await,
        json!({"type": "error", "message": "This number has already been selected!"})
    );

    let room = server.store.get_room(&RoomCode::new(ROOM)).await.unwrap();
    assert_eq!(room.drawn_numbers, vec![7]);
    assert_eq!(room.current_turn_player, "bob");
}

#[tokio::test]
async fn test_start_game_reports_unready_players() {
    let server = start_server().await;
    let (mut alice, _) = join(&server, "alice", true).await;
    let (_bob, _) = join(&server, "bob", false).await;
    assert_eq!(next_event(&mut alice).await["type"], "player_joined");

    send(&mut alice, json!({"action": "start_game"})).await;
    assert_eq!(
        next_event(&mut alice).await,
        json!({"type": "error", "message": "Waiting for players to be ready: alice, bob"})
    );
}

#[tokio::test]
async fn test_manual_fill_over_the_wire() {
    let server = start_server().await;
    let (mut alice, _) = join(&server, "alice", true).await;

    send(&mut alice, json!({"action": "manual_fill_cell", "cell_index": 12})).await;
    let filled = next_event(&mut alice).await;
    assert_eq!(filled["type"], "cell_filled");
    assert_eq!(filled["cell_index"], 12);
    assert_eq!(filled["number"], 1);
    assert_eq!(filled["board"][12], 1);
    assert_eq!(filled["board"].as_array().unwrap().len(), 25);

    send(&mut alice, json!({"action": "manual_fill_cell", "cell_index": 12})).await;
    assert_eq!(
        next_event(&mut alice).await["message"],
        "This cell is already filled!"
    );

    send(&mut alice, json!({"action": "player_ready"})).await;
    assert_eq!(
        next_event(&mut alice).await["message"],
        "Please fill your board completely before marking ready!"
    );
}

#[tokio::test]
async fn test_bad_message_gets_generic_error_and_connection_survives() {
    let server = start_server().await;
    let (mut alice, _) = join(&server, "alice", true).await;

    alice
        .send(Message::Text("not json".into()))
        .await
        .unwrap();
    assert_eq!(
        next_event(&mut alice).await,
        json!({"type": "error", "message": GENERIC_ERROR})
    );

    send(&mut alice, json!({"action": "dance"})).await;
    assert_eq!(next_event(&mut alice).await["message"], GENERIC_ERROR);

    send(&mut alice, json!({"action": "chat_message", "message": "still here"})).await;
    assert_eq!(
        next_event(&mut alice).await,
        json!({"type": "chat", "message": "still here", "sender": "alice"})
    );
}

#[tokio::test]
async fn test_invalid_bingo_reports_line_count() {
    let server = start_server().await;
    let (mut alice, _) = join(&server, "alice", true).await;
    ready_up(&mut alice, &mut []).await;
    send(&mut alice, json!({"action": "start_game"})).await;
    assert_eq!(next_event(&mut alice).await["type"], "game_started");

    let board_state: Vec<Value> = (1..=25)
        .map(|n| json!({"number": n, "marked": n <= 5}))
        .collect();
    for n in 1..=5 {
        send(&mut alice, json!({"action": "select_number", "number": n})).await;
        assert_eq!(next_event(&mut alice).await["type"], "number_called");
    }
    send(
        &mut alice,
        json!({"action": "claim_bingo", "board_state": board_state}),
    )
    .await;
    assert_eq!(
        next_event(&mut alice).await,
        json!({
            "type": "invalid_bingo",
            "message": "Invalid BINGO! You need 5 complete lines. You have 1 lines.",
            "lines": 1,
        })
    );
}

// =========================================================================
// Disconnection
// =========================================================================

#[tokio::test]
async fn test_last_disconnect_removes_room() {
    let server = start_server().await;
    let (mut alice, _) = join(&server, "alice", true).await;
    let (mut bob, _) = join(&server, "bob", false).await;
    assert_eq!(next_event(&mut alice).await["type"], "player_joined");

    bob.close(None).await.unwrap();
    let left = next_event(&mut alice).await;
    assert_eq!(left["type"], "player_left");
    assert_eq!(left["player_name"], "bob");
    assert!(server.store.get_room(&RoomCode::new(ROOM)).await.is_ok());

    alice.close(None).await.unwrap();
    wait_for_room_gone(&server.store).await;
    assert!(matches!(
        server.store.get_room(&RoomCode::new(ROOM)).await,
        Err(StoreError::RoomNotFound(_))
    ));

    // The old token now points at a room that no longer exists.
    let token = server.token("alice", true).await;
    let mut ws = connect_raw(&server.addr, &format!("?session={token}")).await;
    assert_eq!(close_code(&mut ws).await, 4001);
}
