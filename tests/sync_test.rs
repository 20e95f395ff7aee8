//! Two-controller games over the in-memory transport pair.

use chrono::Utc;
use peerfour::{
    Board, Cell, GameController, GameError, GameEvent, GameMove, GameState, MemoryLink, MoveError,
    PeerLink, PeerMessage, Player, ROWS,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

struct Side {
    controller: GameController,
    events: mpsc::UnboundedReceiver<GameEvent>,
}

async fn next_event(events: &mut mpsc::UnboundedReceiver<GameEvent>) -> GameEvent {
    tokio::time::timeout(Duration::from_secs(5), events.recv())
        .await
        .expect("timed out waiting for a game event")
        .expect("event channel closed")
}

async fn wait_for_state(events: &mut mpsc::UnboundedReceiver<GameEvent>, state: GameState) {
    loop {
        if next_event(events).await == GameEvent::StateChanged(state) {
            return;
        }
    }
}

async fn wait_for_move(events: &mut mpsc::UnboundedReceiver<GameEvent>) -> GameMove {
    loop {
        if let GameEvent::MoveMade(game_move) = next_event(events).await {
            return game_move;
        }
    }
}

/// Host on one end, scan and join from the other, wait until both report an
/// in-progress game. Returns (host side, guest side, guest's raw link).
async fn joined_pair() -> (Side, Side, MemoryLink) {
    let (host_link, guest_link) = MemoryLink::pair("AlicePhone", "BobPhone");
    let raw_guest = guest_link.clone();
    let (host, host_events) = GameController::new(Arc::new(host_link), "Alice");
    let (guest, guest_events) = GameController::new(Arc::new(guest_link), "Bob");

    host.host_game("Alice").await.unwrap();
    let peers = guest.scan_for_games().await.unwrap();
    assert_eq!(peers.len(), 1);
    assert_eq!(peers[0].display_name(), "Alice");
    guest.join_game(&peers[0]).await.unwrap();

    let mut host_side = Side {
        controller: host,
        events: host_events,
    };
    let mut guest_side = Side {
        controller: guest,
        events: guest_events,
    };
    wait_for_state(&mut host_side.events, GameState::InProgress).await;
    wait_for_state(&mut guest_side.events, GameState::InProgress).await;
    (host_side, guest_side, raw_guest)
}

#[tokio::test]
async fn test_join_starts_the_game_on_both_sides() {
    let (host, guest, _) = joined_pair().await;
    assert!(host.controller.is_host());
    assert!(!guest.controller.is_host());
    assert_eq!(host.controller.local_player(), Player::Red);
    assert_eq!(guest.controller.local_player(), Player::Yellow);
    assert_eq!(host.controller.session().state, GameState::InProgress);
    assert_eq!(guest.controller.session().state, GameState::InProgress);
}

#[tokio::test]
async fn test_strict_turn_ownership() {
    let (host, guest, _) = joined_pair().await;
    // Red moves first, so the guest must wait.
    assert!(matches!(
        guest.controller.drop_piece(0).await,
        Err(GameError::Move(MoveError::NotYourTurn))
    ));
    host.controller.drop_piece(0).await.unwrap();
    assert!(matches!(
        host.controller.drop_piece(1).await,
        Err(GameError::Move(MoveError::NotYourTurn))
    ));
}

#[tokio::test]
async fn test_sides_converge_after_each_relayed_move() {
    let (mut host, mut guest, _) = joined_pair().await;
    for column in [3, 2, 4, 1] {
        let host_turn =
            host.controller.session().current_player == host.controller.local_player();
        if host_turn {
            host.controller.drop_piece(column).await.unwrap();
            // Drain the mover's own notification echo before this channel
            // is next used to wait for the peer's relayed move.
            wait_for_move(&mut host.events).await;
            let relayed = wait_for_move(&mut guest.events).await;
            assert_eq!(relayed.column, column);
        } else {
            guest.controller.drop_piece(column).await.unwrap();
            wait_for_move(&mut guest.events).await;
            let relayed = wait_for_move(&mut host.events).await;
            assert_eq!(relayed.column, column);
        }
        let a = host.controller.session();
        let b = guest.controller.session();
        assert_eq!(a.board, b.board);
        assert_eq!(a.current_player, b.current_player);
        assert_eq!(a.state, b.state);
        assert_eq!(a.winner, b.winner);
    }
}

#[tokio::test]
async fn test_win_propagates_to_the_guest() {
    let (mut host, mut guest, _) = joined_pair().await;
    for column in [3, 0, 3, 0, 3, 0] {
        if host.controller.session().current_player == Player::Red {
            host.controller.drop_piece(column).await.unwrap();
            // Drain the mover's own notification echo before this channel
            // is next used to wait for the peer's relayed move.
            wait_for_move(&mut host.events).await;
            wait_for_move(&mut guest.events).await;
        } else {
            guest.controller.drop_piece(column).await.unwrap();
            wait_for_move(&mut guest.events).await;
            wait_for_move(&mut host.events).await;
        }
    }
    host.controller.drop_piece(3).await.unwrap();

    loop {
        if next_event(&mut guest.events).await == GameEvent::GameEnded(Some(Player::Red)) {
            break;
        }
    }
    let session = guest.controller.session();
    assert_eq!(session.state, GameState::PlayerWon);
    assert_eq!(session.winner, Some(Player::Red));
}

#[tokio::test]
async fn test_guest_leaving_pauses_the_host_game() {
    let (mut host, guest, _) = joined_pair().await;
    guest.controller.leave_game().await.unwrap();
    wait_for_state(&mut host.events, GameState::WaitingForPlayers).await;
    let session = host.controller.session();
    assert_eq!(session.state, GameState::WaitingForPlayers);
    assert_eq!(session.players, vec!["Alice"]);
}

#[tokio::test]
async fn test_join_envelope_names_the_guest_seat() {
    let (host_link, guest_link) = MemoryLink::pair("AlicePhone", "BobPhone");
    let (host, mut host_events) = GameController::new(Arc::new(host_link), "Alice");
    host.host_game("Alice").await.unwrap();

    let peers = guest_link.scan(Duration::from_secs(1)).await.unwrap();
    guest_link.connect(&peers[0]).await.unwrap();
    wait_for_state(&mut host_events, GameState::InProgress).await;
    // The connection seats the peer under its device name.
    assert_eq!(host.session().players, vec!["Alice", "BobPhone"]);

    let join = PeerMessage::JoinGame {
        player_id: "Bob".to_string(),
        timestamp: Utc::now(),
    };
    guest_link.send(&join.encode()).await.unwrap();

    // Renaming the seat produces no notification, so poll for it.
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    loop {
        let players = host.session().players.clone();
        if players == vec!["Alice", "Bob"] {
            break;
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "seat kept its placeholder name: {players:?}"
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(host.session().state, GameState::InProgress);
}

#[tokio::test]
async fn test_undecodable_messages_are_dropped() {
    let (mut host, guest, raw_guest) = joined_pair().await;
    raw_guest.send(b"{{{ not an envelope").await.unwrap();
    raw_guest
        .send(br#"{"type":"SomethingElse"}"#)
        .await
        .unwrap();

    // The session is unharmed and play continues.
    let mut guest = guest;
    host.controller.drop_piece(5).await.unwrap();
    // Drain the mover's own notification echo before this channel is next
    // used to wait for the peer's relayed move.
    wait_for_move(&mut host.events).await;
    wait_for_move(&mut guest.events).await;
    guest.controller.drop_piece(5).await.unwrap();
    wait_for_move(&mut guest.events).await;
    let relayed = wait_for_move(&mut host.events).await;
    assert_eq!(relayed.column, 5);
    assert_eq!(host.controller.session().state, GameState::InProgress);
    assert_eq!(
        host.controller.session().board,
        guest.controller.session().board
    );
}

#[tokio::test]
async fn test_illegal_relayed_move_adopts_the_relayed_snapshot() {
    let (mut host, _guest, raw_guest) = joined_pair().await;
    // Yellow claims a move while the turn belongs to Red. The receiving side
    // cannot replay it, so it falls back to the relayed snapshot.
    let forged = PeerMessage::Move {
        game_move: GameMove {
            column: 2,
            player: Player::Yellow,
            timestamp: Utc::now(),
        },
        state: GameState::InProgress,
        current_player: Player::Red,
        winner: None,
    };
    raw_guest.send(&forged.encode()).await.unwrap();

    let relayed = wait_for_move(&mut host.events).await;
    assert_eq!(relayed.column, 2);
    let session = host.controller.session();
    assert_eq!(session.state, GameState::InProgress);
    assert_eq!(session.current_player, Player::Red);
    assert_eq!(session.winner, None);
}

#[tokio::test]
async fn test_divergent_snapshot_on_a_legal_move_is_adopted() {
    let (mut host, _guest, raw_guest) = joined_pair().await;
    // A legal move for the side owning the turn, but a snapshot claiming the
    // game is already won. The local replay disagrees, so the receiver must
    // fall back to the relayed state.
    let forged = PeerMessage::Move {
        game_move: GameMove {
            column: 2,
            player: Player::Red,
            timestamp: Utc::now(),
        },
        state: GameState::PlayerWon,
        current_player: Player::Red,
        winner: Some(Player::Red),
    };
    raw_guest.send(&forged.encode()).await.unwrap();

    loop {
        if next_event(&mut host.events).await == GameEvent::GameEnded(Some(Player::Red)) {
            break;
        }
    }
    let session = host.controller.session();
    assert_eq!(session.state, GameState::PlayerWon);
    assert_eq!(session.winner, Some(Player::Red));
    assert_eq!(session.current_player, Player::Red);
    // The replayed piece itself is kept.
    assert_eq!(session.board.cell(ROWS - 1, 2), Some(Cell::Occupied(Player::Red)));
}

#[tokio::test]
async fn test_guest_cannot_reset_the_game() {
    let (host, mut guest, _) = joined_pair().await;
    host.controller.drop_piece(6).await.unwrap();
    let relayed = wait_for_move(&mut guest.events).await;
    assert_eq!(relayed.column, 6);

    guest.controller.reset_game();
    let session = guest.controller.session();
    assert_eq!(session.board, host.controller.session().board);
    assert_ne!(session.board, Board::new());
    assert_eq!(session.current_player, Player::Yellow);
}

#[tokio::test]
async fn test_host_reset_is_local_only() {
    let (host, mut guest, _) = joined_pair().await;
    host.controller.drop_piece(0).await.unwrap();
    wait_for_move(&mut guest.events).await;

    host.controller.reset_game();
    let host_session = host.controller.session();
    assert_eq!(host_session.state, GameState::InProgress);
    assert_eq!(host_session.board, Board::new());
    // The guest keeps its position until told otherwise.
    assert_ne!(guest.controller.session().board, host_session.board);
}
