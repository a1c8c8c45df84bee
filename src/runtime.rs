//! Async driver for the engine
//!
//! One tokio task owns the [`Engine`]. Commands arrive over an unbounded
//! channel and are applied in order; in between, the task sleeps until the
//! engine's next timer is due. The engine clock follows tokio's clock, so
//! paused-time tests drive it deterministically.

use crate::engine::{Command, Engine};
use crate::snapshot::GameState;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep_until};

/// Cloneable handle to a running engine task
#[derive(Debug, Clone)]
pub struct EngineHandle {
    commands: mpsc::UnboundedSender<Command>,
    snapshots: watch::Receiver<GameState>,
}

impl EngineHandle {
    /// Queue a command. Returns false once the engine task is gone.
    pub fn send(&self, command: Command) -> bool {
        self.commands.send(command).is_ok()
    }

    pub fn subscribe(&self) -> watch::Receiver<GameState> {
        self.snapshots.clone()
    }

    /// Latest published snapshot
    pub fn snapshot(&self) -> GameState {
        self.snapshots.borrow().clone()
    }
}

/// Move `engine` onto a tokio task. The task ends when every handle is
/// dropped and hands the engine back through the join handle.
pub fn spawn(engine: Engine) -> (EngineHandle, JoinHandle<Engine>) {
    let (commands, rx) = mpsc::unbounded_channel();
    let snapshots = engine.subscribe();
    let task = tokio::spawn(drive(engine, rx));
    (EngineHandle { commands, snapshots }, task)
}

async fn drive(mut engine: Engine, mut commands: mpsc::UnboundedReceiver<Command>) -> Engine {
    let origin = Instant::now();
    let base = engine.now();
    let clock = || base + origin.elapsed();
    tracing::debug!("Engine task started");

    loop {
        let deadline = engine
            .next_deadline()
            .map(|at| origin + at.saturating_sub(base));

        tokio::select! {
            command = commands.recv() => match command {
                Some(command) => {
                    engine.advance_to(clock());
                    engine.apply(command);
                }
                None => break,
            },
            _ = wait_until(deadline) => {
                engine.advance_to(clock());
            }
        }
    }

    tracing::debug!(elapsed = ?engine.now(), "Engine task stopped");
    engine
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(at) => sleep_until(at).await,
        None => std::future::pending::<()>().await,
    }
}
