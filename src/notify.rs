//! Observer notifications, funneled onto a single delivery lane.

use crate::game::{GameMove, GameState, Player};
use tokio::sync::mpsc;
use tracing::debug;

/// Notifications delivered to whoever is observing the session.
///
/// Payloads are owned, immutable snapshots; an observer never receives a
/// live reference into the grid.
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    /// A placement was made, locally or relayed by the peer.
    MoveMade(GameMove),
    /// The lifecycle state changed.
    StateChanged(GameState),
    /// The game ended. `None` means a draw.
    GameEnded(Option<Player>),
}

/// Sends [`GameEvent`]s to the single observer channel.
///
/// Everything flows through one unbounded channel, so a move and the state
/// change it induces are never observed out of order, and the observer never
/// sees two notifications concurrently.
#[derive(Debug, Clone)]
pub struct Notifier {
    tx: mpsc::UnboundedSender<GameEvent>,
}

impl Notifier {
    /// Creates a notifier and the receiving end for the observer.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<GameEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Emits a single event. An observer that went away is not an error.
    pub fn emit(&self, event: GameEvent) {
        if self.tx.send(event).is_err() {
            debug!("observer channel closed, dropping notification");
        }
    }

    /// Notifies that a placement was made.
    pub fn move_made(&self, game_move: GameMove) {
        self.emit(GameEvent::MoveMade(game_move));
    }

    /// Notifies that the lifecycle state changed.
    pub fn state_changed(&self, state: GameState) {
        self.emit(GameEvent::StateChanged(state));
    }

    /// Notifies that the game ended.
    pub fn game_ended(&self, winner: Option<Player>) {
        self.emit(GameEvent::GameEnded(winner));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::Player;

    #[test]
    fn test_events_arrive_in_emission_order() {
        let (notifier, mut rx) = Notifier::channel();
        notifier.state_changed(GameState::InProgress);
        notifier.game_ended(Some(Player::Red));
        assert_eq!(
            rx.try_recv().unwrap(),
            GameEvent::StateChanged(GameState::InProgress)
        );
        assert_eq!(
            rx.try_recv().unwrap(),
            GameEvent::GameEnded(Some(Player::Red))
        );
    }

    #[test]
    fn test_emit_without_observer_is_silent() {
        let (notifier, rx) = Notifier::channel();
        drop(rx);
        notifier.state_changed(GameState::GameOver);
    }
}
