//! The session controller: command surface, role and lifecycle machine, and
//! the serialized apply path for transport events.

use crate::error::{GameError, MoveError};
use crate::game::{COLS, GameMove, GameState, Player};
use crate::link::{DEFAULT_SCAN_TIMEOUT, LinkEvent, PeerInfo, PeerLink};
use crate::notify::{GameEvent, Notifier};
use crate::protocol::{GAME_NAME_PREFIX, PeerMessage};
use crate::session::GameSession;
use chrono::Utc;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

/// Turn-ownership policy for [`GameController::drop_piece`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TurnMode {
    /// Only the side owning the turn may move (two-peer play).
    Strict,
    /// Either side moves for whoever owns the turn (single-device play).
    Relaxed,
}

#[derive(Debug)]
struct SessionState {
    session: GameSession,
    is_host: bool,
    local_player: Player,
    local_name: String,
    turn_mode: TurnMode,
}

/// Orchestrates one game: owns the session, drives the transport, and
/// reports everything observable through the notifier.
///
/// All mutation, whether from a local command or an inbound transport
/// event, happens under one lock with short critical sections that are
/// never held across an await. The command path and the event pump can
/// therefore never interleave mid-move, which is what keeps the gravity
/// and turn invariants intact under concurrent delivery.
pub struct GameController {
    link: Arc<dyn PeerLink>,
    state: Arc<Mutex<SessionState>>,
    notifier: Notifier,
    pump: JoinHandle<()>,
}

impl GameController {
    /// Creates a controller over `link` and returns the observer channel.
    /// `local_name` is this side's display name.
    pub fn new(
        link: Arc<dyn PeerLink>,
        local_name: impl Into<String>,
    ) -> (Self, mpsc::UnboundedReceiver<GameEvent>) {
        let local_name = local_name.into();
        let (notifier, events) = Notifier::channel();
        let state = Arc::new(Mutex::new(SessionState {
            session: GameSession::new(local_name.clone()),
            is_host: false,
            local_player: Player::Red,
            local_name,
            turn_mode: TurnMode::Strict,
        }));
        let pump = Self::spawn_pump(link.clone(), state.clone(), notifier.clone());
        (
            Self {
                link,
                state,
                notifier,
                pump,
            },
            events,
        )
    }

    fn spawn_pump(
        link: Arc<dyn PeerLink>,
        state: Arc<Mutex<SessionState>>,
        notifier: Notifier,
    ) -> JoinHandle<()> {
        let mut events = link.events();
        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                Self::apply_link_event(&state, &notifier, event);
            }
            debug!("transport event stream ended");
        })
    }

    /// Hosts a new game advertised under the game prefix.
    ///
    /// This side becomes the host and plays Red; the session waits for a
    /// second participant.
    #[instrument(skip(self))]
    pub async fn host_game(&self, name: &str) -> Result<(), GameError> {
        let advertised = format!("{GAME_NAME_PREFIX}{name}");
        self.link.start_hosting(&advertised).await?;
        {
            let mut state = self.state.lock().unwrap();
            state.is_host = true;
            state.local_player = Player::Red;
            state.local_name = name.to_string();
            state.turn_mode = TurnMode::Strict;
            state.session = GameSession::new(name);
            state.session.add_player(name);
            self.notifier.state_changed(state.session.state);
        }
        info!(host = name, "hosting game");
        Ok(())
    }

    /// Starts a single-device game with relaxed turn ownership: both seats
    /// are filled locally and play begins immediately.
    #[instrument(skip(self))]
    pub async fn local_game(&self, name: &str) -> Result<(), GameError> {
        self.link
            .start_hosting(&format!("{GAME_NAME_PREFIX}{name}"))
            .await?;
        {
            let mut state = self.state.lock().unwrap();
            state.is_host = true;
            state.local_player = Player::Red;
            state.local_name = name.to_string();
            state.turn_mode = TurnMode::Relaxed;
            state.session = GameSession::new(name);
            state.session.add_player(name);
            state.session.add_player("Player 2");
            state.session.begin();
            self.notifier.state_changed(state.session.state);
        }
        info!(host = name, "starting local game");
        Ok(())
    }

    /// Scans for advertised games using the default window. Dropping the
    /// returned future cancels the scan before the window expires.
    #[instrument(skip(self))]
    pub async fn scan_for_games(&self) -> Result<Vec<PeerInfo>, GameError> {
        let peers = self.link.scan(DEFAULT_SCAN_TIMEOUT).await?;
        info!(found = peers.len(), "scan finished");
        Ok(peers)
    }

    /// Connects to a discovered host and requests to join its game.
    ///
    /// This side becomes the guest and plays Yellow.
    #[instrument(skip(self), fields(peer = %peer.name))]
    pub async fn join_game(&self, peer: &PeerInfo) -> Result<(), GameError> {
        // Seat ourselves before the transport can deliver PeerConnected, so
        // the pump applies it to the right session.
        let local_name = {
            let mut state = self.state.lock().unwrap();
            state.is_host = false;
            state.local_player = Player::Yellow;
            state.turn_mode = TurnMode::Strict;
            state.session = GameSession::new(peer.display_name());
            let name = state.local_name.clone();
            state.session.add_player(name.clone());
            name
        };
        if let Err(err) = self.link.connect(peer).await {
            let mut state = self.state.lock().unwrap();
            state.local_player = Player::Red;
            state.session = GameSession::new(state.local_name.clone());
            return Err(err.into());
        }
        let join = PeerMessage::JoinGame {
            player_id: local_name,
            timestamp: Utc::now(),
        };
        self.link.send(&join.encode()).await?;
        info!("joined game");
        Ok(())
    }

    /// Places a piece in `column` for the side allowed to move.
    ///
    /// Declined moves leave the session untouched. On success the post-move
    /// snapshot is relayed to the peer so both sides converge; a delivery
    /// failure is returned to the caller, but the local move stands.
    #[instrument(skip(self))]
    pub async fn drop_piece(&self, column: usize) -> Result<(), GameError> {
        let message = {
            let mut state = self.state.lock().unwrap();
            if state.session.state != GameState::InProgress {
                return Err(MoveError::GameNotInProgress.into());
            }
            let mover = match state.turn_mode {
                TurnMode::Relaxed => state.session.current_player,
                TurnMode::Strict => state.local_player,
            };
            if state.session.current_player != mover {
                return Err(MoveError::NotYourTurn.into());
            }
            state.session.board.drop_piece(column, mover)?;
            let game_move = GameMove {
                column,
                player: mover,
                timestamp: Utc::now(),
            };
            Self::settle_outcome(&mut state.session, mover);

            let session = &state.session;
            let message = PeerMessage::Move {
                game_move,
                state: session.state,
                current_player: session.current_player,
                winner: session.winner,
            };
            self.notifier.move_made(game_move);
            self.notifier.state_changed(session.state);
            if matches!(session.state, GameState::PlayerWon | GameState::GameOver) {
                self.notifier.game_ended(session.winner);
            }
            message
        };
        if let Err(err) = self.link.send(&message.encode()).await {
            warn!(error = %err, "move applied locally but relay failed");
            return Err(err.into());
        }
        Ok(())
    }

    /// Restarts play on the same session: fresh board, Red to move.
    ///
    /// Only the host restarts; while still waiting for players this is a
    /// no-op rather than a failure.
    #[instrument(skip(self))]
    pub fn reset_game(&self) {
        let mut state = self.state.lock().unwrap();
        if !state.is_host {
            debug!("reset ignored, not the host");
            return;
        }
        if state.session.state == GameState::WaitingForPlayers {
            debug!("reset ignored, no game started");
            return;
        }
        state.session.board.reset();
        state.session.current_player = Player::Red;
        state.session.winner = None;
        state.session.begin();
        info!("game reset");
        self.notifier.state_changed(state.session.state);
    }

    /// Leaves the current game: the host stops advertising, the guest
    /// disconnects, and the session is replaced by a fresh waiting one.
    #[instrument(skip(self))]
    pub async fn leave_game(&self) -> Result<(), GameError> {
        let was_host = self.state.lock().unwrap().is_host;
        if was_host {
            self.link.stop_hosting().await?;
        } else {
            self.link.disconnect().await?;
        }
        {
            let mut state = self.state.lock().unwrap();
            state.is_host = false;
            state.local_player = Player::Red;
            state.turn_mode = TurnMode::Strict;
            state.session = GameSession::new(state.local_name.clone());
            self.notifier.state_changed(state.session.state);
        }
        info!("left game");
        Ok(())
    }

    /// A snapshot of the current session.
    pub fn session(&self) -> GameSession {
        self.state.lock().unwrap().session.clone()
    }

    /// Whether this side is hosting.
    pub fn is_host(&self) -> bool {
        self.state.lock().unwrap().is_host
    }

    /// Which player this side controls.
    pub fn local_player(&self) -> Player {
        self.state.lock().unwrap().local_player
    }

    /// Applies win/draw/turn-flip after a successful placement by `mover`.
    fn settle_outcome(session: &mut GameSession, mover: Player) {
        if session.board.check_win(mover) {
            info!(winner = %mover, "four in a row");
            session.finish_win(mover);
        } else if session.board.is_full() {
            info!("board full, game drawn");
            session.finish_draw();
        } else {
            session.advance_turn();
        }
    }

    // ── Inbound event path (single serialized apply path) ────────────────

    fn apply_link_event(state: &Mutex<SessionState>, notifier: &Notifier, event: LinkEvent) {
        match event {
            LinkEvent::PeerConnected(name) => Self::peer_connected(state, notifier, &name),
            LinkEvent::PeerDisconnected(name) => Self::peer_disconnected(state, notifier, &name),
            LinkEvent::Message(payload) => Self::inbound_message(state, notifier, &payload),
            LinkEvent::HostingChanged(active) => debug!(active, "host availability changed"),
        }
    }

    fn peer_connected(state: &Mutex<SessionState>, notifier: &Notifier, name: &str) {
        let mut state = state.lock().unwrap();
        if !state.session.add_player(name) {
            return;
        }
        if state.session.has_quorum() && state.session.state == GameState::WaitingForPlayers {
            state.session.begin();
            info!(peer = name, "both seats taken, game on");
            notifier.state_changed(state.session.state);
        }
    }

    fn peer_disconnected(state: &Mutex<SessionState>, notifier: &Notifier, name: &str) {
        let mut state = state.lock().unwrap();
        let local = state.local_name.clone();
        let session = &mut state.session;
        if !session.remove_player(name) {
            // The transport reports device names, but the seat may carry the
            // chosen name from the peer's join envelope. There is only ever
            // one remote seat, so vacate it.
            let Some(position) = session.players.iter().position(|p| p.as_str() != local) else {
                return;
            };
            let seat = session.players.remove(position);
            debug!(peer = name, seat = %seat, "vacating the remote seat");
        }
        if session.has_quorum() || session.state != GameState::InProgress {
            return;
        }
        session.state = GameState::WaitingForPlayers;
        warn!(peer = name, "peer left mid-game, waiting for players");
        notifier.state_changed(session.state);
    }

    /// Seats a joining peer under the name its join envelope carries.
    ///
    /// The transport usually reports the connection first, under the peer's
    /// device name; the envelope then supplies the name the player actually
    /// chose, which replaces the placeholder seat.
    fn peer_joined(state: &Mutex<SessionState>, notifier: &Notifier, player_id: &str) {
        {
            let mut state = state.lock().unwrap();
            let local = state.local_name.clone();
            let session = &mut state.session;
            if session.players.iter().any(|p| p == player_id) {
                return;
            }
            if let Some(seat) = session.players.iter_mut().find(|p| p.as_str() != local) {
                info!(seat = %seat, player = player_id, "peer identified itself, renaming seat");
                *seat = player_id.to_string();
                return;
            }
        }
        Self::peer_connected(state, notifier, player_id);
    }

    fn inbound_message(state: &Mutex<SessionState>, notifier: &Notifier, payload: &[u8]) {
        let message = match PeerMessage::decode(payload) {
            Ok(message) => message,
            Err(err) => {
                warn!(error = %err, "discarding undecodable peer message");
                return;
            }
        };
        match message {
            PeerMessage::JoinGame { player_id, .. } => {
                Self::peer_joined(state, notifier, &player_id);
            }
            PeerMessage::Move {
                game_move,
                state: remote_state,
                current_player,
                winner,
            } => {
                Self::apply_remote_move(
                    state,
                    notifier,
                    game_move,
                    remote_state,
                    current_player,
                    winner,
                );
            }
        }
    }

    /// Applies a relayed move.
    ///
    /// The relayed snapshot is authoritative, but it is not trusted blindly:
    /// the move is first validated against local state and replayed, and the
    /// snapshot is adopted wholesale only when the local replay disagrees or
    /// the move was illegal to begin with. Either way both sides end up on
    /// the sender's post-move state.
    fn apply_remote_move(
        state: &Mutex<SessionState>,
        notifier: &Notifier,
        game_move: GameMove,
        remote_state: GameState,
        remote_current: Player,
        remote_winner: Option<Player>,
    ) {
        let mut state = state.lock().unwrap();
        let session = &mut state.session;
        let legal = session.state == GameState::InProgress
            && session.current_player == game_move.player
            && game_move.column < COLS
            && !session.board.is_column_full(game_move.column);
        let replayed = legal
            && session
                .board
                .drop_piece(game_move.column, game_move.player)
                .is_ok();
        if replayed {
            Self::settle_outcome(session, game_move.player);
            if session.state != remote_state
                || session.current_player != remote_current
                || session.winner != remote_winner
            {
                warn!(
                    local_state = %session.state,
                    relayed_state = %remote_state,
                    "local replay diverged from relayed snapshot, adopting relay"
                );
                session.state = remote_state;
                session.current_player = remote_current;
                session.winner = remote_winner;
            }
        } else {
            warn!(
                column = game_move.column,
                player = %game_move.player,
                "relayed move is illegal for local state, adopting relayed snapshot"
            );
            if session
                .board
                .drop_piece(game_move.column, game_move.player)
                .is_err()
            {
                debug!("could not mirror the relayed placement");
            }
            session.state = remote_state;
            session.current_player = remote_current;
            session.winner = remote_winner;
        }
        notifier.move_made(game_move);
        notifier.state_changed(session.state);
        if matches!(session.state, GameState::PlayerWon | GameState::GameOver) {
            notifier.game_ended(session.winner);
        }
    }
}

impl Drop for GameController {
    fn drop(&mut self) {
        self.pump.abort();
    }
}
