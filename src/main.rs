//! Binary entry point: a terminal front end over the game controller.

use anyhow::Context;
use clap::Parser;
use peerfour::{
    GameController, GameEvent, GameState, MemoryLink, NullLink, PeerLink,
};
use std::io::Write;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();
    let cli = cli::Cli::parse();
    match cli.command {
        cli::Command::Local { name } => run_local(&name).await,
        cli::Command::Demo => run_demo().await,
    }
}

/// Two seats on one machine, columns read from stdin.
async fn run_local(name: &str) -> anyhow::Result<()> {
    let link: Arc<dyn PeerLink> = Arc::new(NullLink::default());
    let (controller, mut events) = GameController::new(link, name);
    controller.local_game(name).await?;
    drain(&mut events);

    let stdin = std::io::stdin();
    loop {
        let session = controller.session();
        println!("{}", session.board.render());
        match session.state {
            GameState::PlayerWon => {
                let winner = session.winner.context("won game without a winner")?;
                println!("{winner} wins!");
                break;
            }
            GameState::GameOver => {
                println!("Draw.");
                break;
            }
            _ => {}
        }
        print!("{} to move, column (0-6) or q: ", session.current_player);
        std::io::stdout().flush()?;
        let mut line = String::new();
        if stdin.read_line(&mut line)? == 0 {
            break;
        }
        let input = line.trim();
        if input.eq_ignore_ascii_case("q") {
            break;
        }
        let column = match input.parse::<usize>() {
            Ok(column) => column,
            Err(_) => {
                println!("enter a column number between 0 and 6");
                continue;
            }
        };
        if let Err(err) = controller.drop_piece(column).await {
            println!("{err}");
        }
        drain(&mut events);
    }
    Ok(())
}

/// A scripted game between two controllers joined by an in-memory link.
async fn run_demo() -> anyhow::Result<()> {
    let (alice_link, bob_link) = MemoryLink::pair("Alice", "Bob");
    let (alice, mut alice_events) = GameController::new(Arc::new(alice_link), "Alice");
    let (bob, mut bob_events) = GameController::new(Arc::new(bob_link), "Bob");

    alice.host_game("Alice").await?;
    let peers = bob.scan_for_games().await?;
    let host = peers.first().context("no advertised game found")?;
    bob.join_game(host).await?;
    wait_for(&mut alice_events, GameState::InProgress).await?;
    wait_for(&mut bob_events, GameState::InProgress).await?;
    info!("game started, playing a scripted line");

    // Red stacks column 3 while Yellow plays column 0; Red connects four.
    for column in [3usize, 0, 3, 0, 3, 0] {
        let (mover, watcher) = if alice.session().current_player == alice.local_player() {
            (&alice, &mut bob_events)
        } else {
            (&bob, &mut alice_events)
        };
        mover.drop_piece(column).await?;
        wait_for_move(watcher).await?;
    }
    alice.drop_piece(3).await?;
    wait_for(&mut bob_events, GameState::PlayerWon).await?;

    let session = bob.session();
    println!("{}", session.board.render());
    let winner = session.winner.context("won game without a winner")?;
    println!("{winner} wins!");
    Ok(())
}

fn drain(events: &mut mpsc::UnboundedReceiver<GameEvent>) {
    while events.try_recv().is_ok() {}
}

async fn wait_for(
    events: &mut mpsc::UnboundedReceiver<GameEvent>,
    state: GameState,
) -> anyhow::Result<()> {
    loop {
        let event = tokio::time::timeout(std::time::Duration::from_secs(5), events.recv())
            .await
            .context("timed out waiting for game event")?
            .context("event channel closed")?;
        if event == GameEvent::StateChanged(state) {
            return Ok(());
        }
    }
}

async fn wait_for_move(
    events: &mut mpsc::UnboundedReceiver<GameEvent>,
) -> anyhow::Result<()> {
    loop {
        let event = tokio::time::timeout(std::time::Duration::from_secs(5), events.recv())
            .await
            .context("timed out waiting for relayed move")?
            .context("event channel closed")?;
        if matches!(event, GameEvent::MoveMade(_)) {
            return Ok(());
        }
    }
}
