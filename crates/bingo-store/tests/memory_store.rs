//! Integration tests for the in-memory room store.

use bingo_protocol::{Board, RoomCode};
use bingo_store::{
    FaultyStore, MemoryStore, PlayerFilter, PlayerUpdate, RoomStore,
    RoomUpdate, StoreError,
};

// =========================================================================
// Rooms
// =========================================================================

#[tokio::test]
async fn test_create_room_generates_unique_codes() {
    let store = MemoryStore::new();
    let mut codes = std::collections::HashSet::new();
    for i in 0..50 {
        let room = store.create_room(&format!("host{i}")).await.unwrap();
        assert_eq!(room.code.as_str().len(), 6);
        assert!(!room.game_started);
        assert!(room.drawn_numbers.is_empty());
        assert!(codes.insert(room.code));
    }
    assert_eq!(store.room_count().await, 50);
}

#[tokio::test]
async fn test_get_room_not_found() {
    let store = MemoryStore::new();
    let err = store.get_room(&RoomCode::new("NOPE00")).await.unwrap_err();
    assert!(matches!(err, StoreError::RoomNotFound(_)));
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_update_room_applies_partial_fields() {
    let store = MemoryStore::new();
    let room = store.create_room("alice").await.unwrap();

    let updated = store
        .update_room(
            &room.code,
            RoomUpdate {
                game_started: Some(true),
                current_turn_player: Some("alice".into()),
                ..RoomUpdate::default()
            },
        )
        .await
        .unwrap();

    assert!(updated.game_started);
    assert_eq!(updated.current_turn_player, "alice");
    assert_eq!(updated.host_name, "alice");
    assert_eq!(store.get_room(&room.code).await.unwrap(), updated);
}

#[tokio::test]
async fn test_delete_room_cascades_and_second_delete_is_not_found() {
    let store = MemoryStore::new();
    let room = store.create_room("alice").await.unwrap();
    store
        .get_or_create_player(&room.code, "alice", true)
        .await
        .unwrap();

    store.delete_room(&room.code).await.unwrap();

    assert!(store.get_room(&room.code).await.unwrap_err().is_not_found());
    assert!(store
        .list_players(&room.code, PlayerFilter::All)
        .await
        .unwrap_err()
        .is_not_found());
    assert!(matches!(
        store.delete_room(&room.code).await,
        Err(StoreError::RoomNotFound(_))
    ));
}

// =========================================================================
// Players
// =========================================================================

#[tokio::test]
async fn test_get_or_create_player_requires_room() {
    let store = MemoryStore::new();
    let err = store
        .get_or_create_player(&RoomCode::new("GHOST1"), "bob", false)
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::RoomNotFound(_)));
}

#[tokio::test]
async fn test_rejoin_marks_connected_and_keeps_board() {
    let store = MemoryStore::new();
    let room = store.create_room("alice").await.unwrap();

    let (_, created) = store
        .get_or_create_player(&room.code, "bob", false)
        .await
        .unwrap();
    assert!(created);

    let board = Board::from_cells((1..=25).collect());
    store
        .update_player(
            &room.code,
            "bob",
            PlayerUpdate {
                is_connected: Some(false),
                board: Some(board.clone()),
                ..PlayerUpdate::default()
            },
        )
        .await
        .unwrap();

    let (player, created) = store
        .get_or_create_player(&room.code, "bob", false)
        .await
        .unwrap();
    assert!(!created);
    assert!(player.is_connected);
    assert_eq!(player.board, board);
}

#[tokio::test]
async fn test_list_players_keeps_join_order_and_filters() {
    let store = MemoryStore::new();
    let room = store.create_room("alice").await.unwrap();
    for name in ["alice", "bob", "carol"] {
        store
            .get_or_create_player(&room.code, name, name == "alice")
            .await
            .unwrap();
    }
    store
        .update_player(&room.code, "bob", PlayerUpdate::connected(false))
        .await
        .unwrap();

    let all: Vec<String> = store
        .list_players(&room.code, PlayerFilter::All)
        .await
        .unwrap()
        .into_iter()
        .map(|p| p.name)
        .collect();
    assert_eq!(all, ["alice", "bob", "carol"]);

    let connected: Vec<String> = store
        .list_players(&room.code, PlayerFilter::Connected)
        .await
        .unwrap()
        .into_iter()
        .map(|p| p.name)
        .collect();
    assert_eq!(connected, ["alice", "carol"]);
}

#[tokio::test]
async fn test_update_unknown_player() {
    let store = MemoryStore::new();
    let room = store.create_room("alice").await.unwrap();
    let err = store
        .update_player(&room.code, "nobody", PlayerUpdate::ready(true))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::PlayerNotFound { .. }));
}

#[tokio::test]
async fn test_delete_all_players_on_missing_room_is_zero() {
    let store = MemoryStore::new();
    assert_eq!(
        store
            .delete_all_players(&RoomCode::new("GHOST1"))
            .await
            .unwrap(),
        0
    );
}

// =========================================================================
// FaultyStore
// =========================================================================

#[tokio::test]
async fn test_faulty_store_blocks_writes_but_not_reads() {
    let store = FaultyStore::new(MemoryStore::new());
    let room = store.create_room("alice").await.unwrap();

    store.set_failing(true);
    let err = store
        .update_room(
            &room.code,
            RoomUpdate {
                game_started: Some(true),
                ..RoomUpdate::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Unavailable(_)));
    assert!(!err.is_not_found());

    let reread = store.get_room(&room.code).await.unwrap();
    assert!(!reread.game_started);

    store.set_failing(false);
    assert!(store.delete_room(&room.code).await.is_ok());
}

#[tokio::test]
async fn test_faulty_store_can_fail_reads_separately() {
    let store = FaultyStore::new(MemoryStore::new());
    let room = store.create_room("alice").await.unwrap();

    store.set_failing_reads(true);
    assert!(matches!(
        store.get_room(&room.code).await,
        Err(StoreError::Unavailable(_))
    ));
    assert!(matches!(
        store.list_players(&room.code, PlayerFilter::All).await,
        Err(StoreError::Unavailable(_))
    ));
    // Writes still go through.
    store
        .get_or_create_player(&room.code, "bob", false)
        .await
        .unwrap();

    store.set_failing_reads(false);
    let players = store.list_players(&room.code, PlayerFilter::All).await.unwrap();
    assert_eq!(players.len(), 1);
    assert_eq!(players[0].name, "bob");
}
