//! Core game state machine
//!
//! The engine owns the board and every piece of mutable run state. Time only
//! moves when the caller says so: `advance_to` fires the gravity loop and the
//! line-clear flash from a [`Timers`] queue, and every command acts at the
//! engine's current clock. That keeps the whole thing single-threaded and
//! deterministic; [`crate::runtime`] puts it on a tokio task for real play.

use crate::bag::{Bag, PREVIEW_LEN, PieceQueue};
use crate::board::{BOARD_HEIGHT, BOARD_WIDTH, Board, HIDDEN_ROWS};
use crate::highscore::HighScoreStore;
use crate::piece::Piece;
use crate::scheduler::{Task, Timers};
use crate::score::Score;
use crate::snapshot::{GameState, Phase};
use crate::tetromino::{Point, TetrominoType};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// How long a grounded piece may sit before it locks
pub const LOCK_DELAY: Duration = Duration::from_millis(500);
/// How long completed rows flash before they are removed
pub const FLASH_DURATION: Duration = Duration::from_millis(300);

/// Offsets tried in order after a rotation: none, left, right, up, up-left, up-right
const KICKS: [(i32, i32); 6] = [(0, 0), (-1, 0), (1, 0), (0, -1), (-1, -1), (1, -1)];

/// Board geometry and randomizer setup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub width: usize,
    pub height: usize,
    /// Rows above the visible field; a lock in here without a clear ends the run
    pub hidden_rows: usize,
    /// Length of the lookahead queue
    pub preview: usize,
    /// Randomizer seed, random when None
    pub seed: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            width: BOARD_WIDTH,
            height: BOARD_HEIGHT,
            hidden_rows: HIDDEN_ROWS,
            preview: PREVIEW_LEN,
            seed: None,
        }
    }
}

impl EngineConfig {
    /// Clamp to the smallest board every piece can spawn on
    pub fn normalized(mut self) -> Self {
        self.width = self.width.max(4);
        self.height = self.height.max(4);
        self.hidden_rows = self.hidden_rows.min(self.height - 1);
        self.preview = self.preview.max(1);
        self
    }
}

/// Input the engine understands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Restart,
    /// Horizontal shift, normally -1 or 1
    Move(i32),
    Rotate { clockwise: bool },
    HardDrop,
    /// One row of soft drop
    SoftDropStep,
    /// Continuous soft drop on/off
    SetSoftDrop(bool),
    Hold,
    TogglePause,
}

/// Mutable state of the current run
#[derive(Debug, Clone)]
struct Session {
    queue: PieceQueue,
    active: Option<Piece>,
    hold: Option<TetrominoType>,
    can_hold: bool,
    score: Score,
    /// When the active piece first failed to fall
    lock_started: Option<Duration>,
    soft_drop: bool,
    phase: Phase,
    /// Completed rows waiting for the flash to end
    flashing: BTreeSet<usize>,
    /// The finished run beat the stored best
    new_high_score: bool,
}

impl Session {
    fn new(queue: PieceQueue) -> Self {
        Self {
            queue,
            active: None,
            hold: None,
            can_hold: true,
            score: Score::new(),
            lock_started: None,
            soft_drop: false,
            phase: Phase::Ready,
            flashing: BTreeSet::new(),
            new_high_score: false,
        }
    }

    /// Fresh run: same randomizer stream, everything else back to zero
    fn reset(&mut self) {
        self.queue.reset();
        self.active = None;
        self.hold = None;
        self.can_hold = true;
        self.score = Score::new();
        self.lock_started = None;
        self.soft_drop = false;
        self.phase = Phase::Running;
        self.flashing.clear();
        self.new_high_score = false;
    }
}

/// The game engine
pub struct Engine {
    config: EngineConfig,
    board: Board,
    session: Session,
    timers: Timers,
    /// Monotonic clock, offset from engine creation
    now: Duration,
    store: Arc<dyn HighScoreStore>,
    publisher: watch::Sender<GameState>,
}

impl Engine {
    pub fn new(config: EngineConfig, store: Arc<dyn HighScoreStore>) -> Self {
        let config = config.normalized();
        let bag = match config.seed {
            Some(seed) => Bag::with_seed(seed),
            None => Bag::new(),
        };
        let queue = PieceQueue::new(bag, config.preview);
        let (publisher, _) = watch::channel(GameState::default());

        let engine = Self {
            board: Board::new(config.width, config.height),
            session: Session::new(queue),
            timers: Timers::new(),
            now: Duration::ZERO,
            store,
            publisher,
            config,
        };
        engine.publish();
        engine
    }

    pub fn phase(&self) -> Phase {
        self.session.phase
    }

    /// Current engine clock
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Receiver that sees every published snapshot
    pub fn subscribe(&self) -> watch::Receiver<GameState> {
        self.publisher.subscribe()
    }

    /// When the next timed task is due, if any
    pub fn next_deadline(&self) -> Option<Duration> {
        self.timers.next_deadline()
    }

    /// Move the clock forward to `now`, running every task due on the way.
    /// The clock never moves backward.
    pub fn advance_to(&mut self, now: Duration) {
        while let Some((at, task)) = self.timers.pop_due(now) {
            self.now = self.now.max(at);
            self.run(task);
        }
        self.now = self.now.max(now);
    }

    pub fn advance(&mut self, by: Duration) {
        self.advance_to(self.now + by);
    }

    /// Dispatch a command from the input layer. While paused only
    /// pause, start and restart get through.
    pub fn apply(&mut self, command: Command) {
        if self.session.phase == Phase::Paused
            && !matches!(
                command,
                Command::TogglePause | Command::Start | Command::Restart
            )
        {
            return;
        }

        match command {
            Command::Start => self.start(),
            Command::Restart => self.restart(),
            Command::Move(dx) => self.shift(dx),
            Command::Rotate { clockwise } => self.rotate(clockwise),
            Command::HardDrop => self.hard_drop(),
            Command::SoftDropStep => self.single_soft_drop(),
            Command::SetSoftDrop(enabled) => self.set_soft_drop(enabled),
            Command::Hold => self.hold(),
            Command::TogglePause => self.toggle_pause(),
        }
    }

    /// Begin a new run from any state
    pub fn start(&mut self) {
        self.timers.cancel_all();
        self.board.clear();
        self.session.reset();
        tracing::info!(
            width = self.config.width,
            height = self.config.height,
            "Starting run"
        );

        if self.spawn() {
            self.schedule_gravity();
            self.publish();
        }
    }

    pub fn restart(&mut self) {
        self.start();
    }

    /// Shift the active piece horizontally if the target is free
    pub fn shift(&mut self, dx: i32) {
        let Some(piece) = self.controllable() else {
            return;
        };
        let moved = piece.moved(dx, 0);
        if self.board.can_place(&moved) {
            self.session.active = Some(moved);
            self.session.lock_started = None;
            self.publish();
        }
    }

    /// Rotate a quarter turn, trying each kick offset in order
    pub fn rotate(&mut self, clockwise: bool) {
        let Some(piece) = self.controllable() else {
            return;
        };
        let base = piece.rotated(if clockwise { 1 } else { -1 });
        let kicked = KICKS
            .iter()
            .map(|&(dx, dy)| base.moved(dx, dy))
            .find(|candidate| self.board.can_place(candidate));

        if let Some(rotated) = kicked {
            self.session.active = Some(rotated);
            self.session.lock_started = None;
            self.publish();
        }
    }

    /// Drop straight to the landing position and lock immediately
    pub fn hard_drop(&mut self) {
        let Some(piece) = self.controllable() else {
            return;
        };
        let (landed, distance) = self.landing(piece);
        self.session.score.add_hard_drop(distance);
        self.session.active = Some(landed);
        self.session.lock_started = None;
        self.lock_and_resolve(landed);
    }

    /// Move down one row for a point. Never locks.
    pub fn single_soft_drop(&mut self) {
        let Some(piece) = self.controllable() else {
            return;
        };
        let moved = piece.moved(0, 1);
        if self.board.can_place(&moved) {
            self.session.active = Some(moved);
            self.session.lock_started = None;
            self.session.score.add_soft_drop(1);
            self.publish();
        }
    }

    /// Speed up gravity while enabled. Takes effect from the next scheduled tick.
    pub fn set_soft_drop(&mut self, enabled: bool) {
        self.session.soft_drop = enabled;
    }

    /// Put the active piece aside, bringing back the held one (or the next piece)
    pub fn hold(&mut self) {
        if !self.session.can_hold {
            return;
        }
        let Some(current) = self.controllable() else {
            return;
        };

        match self.session.hold.replace(current.kind) {
            None => {
                if !self.spawn() {
                    return;
                }
            }
            Some(held) => {
                let swapped = Piece::spawn(held, self.board.width());
                self.session.active = Some(swapped);
                if !self.board.can_place(&swapped) {
                    self.game_over();
                    return;
                }
            }
        }
        tracing::debug!(held = ?current.kind, "Hold");

        self.session.can_hold = false;
        self.session.lock_started = None;
        self.publish();
    }

    pub fn toggle_pause(&mut self) {
        self.session.phase = match self.session.phase {
            Phase::Running => Phase::Paused,
            Phase::Paused => Phase::Running,
            Phase::Ready | Phase::GameOver => return,
        };
        self.publish();
    }

    /// Build a snapshot of the current state
    pub fn snapshot(&self) -> GameState {
        let phase = self.session.phase;
        GameState {
            board: self.board.snapshot(),
            width: self.board.width(),
            height: self.board.height(),
            hidden_rows: self.config.hidden_rows,
            active: self.session.active,
            ghost: self.ghost(),
            hold: self.session.hold,
            can_hold: self.session.can_hold,
            next_queue: self.session.queue.preview(),
            score: self.session.score.points,
            lines: self.session.score.lines,
            level: self.session.score.level,
            phase,
            game_over: phase == Phase::GameOver,
            paused: phase == Phase::Paused,
            flashing_rows: self.session.flashing.clone(),
            high_score: self.store.get(),
            new_high_score: self.session.new_high_score,
        }
    }

    fn publish(&self) {
        self.publisher.send_replace(self.snapshot());
    }

    /// The active piece, unless the run is over
    fn controllable(&self) -> Option<Piece> {
        if self.session.phase == Phase::GameOver {
            return None;
        }
        self.session.active
    }

    fn run(&mut self, task: Task) {
        match task {
            Task::Gravity => {
                self.tick();
                if self.session.phase != Phase::GameOver {
                    self.schedule_gravity();
                }
            }
            Task::ClearRows => self.finish_clear(),
        }
    }

    fn schedule_gravity(&mut self) {
        let interval = self.session.score.gravity_interval(self.session.soft_drop);
        self.timers.schedule(self.now + interval, Task::Gravity);
    }

    /// One gravity step: fall a row, or count down the lock delay
    fn tick(&mut self) {
        if self.session.phase != Phase::Running {
            return;
        }
        let Some(falling) = self.session.active else {
            return;
        };

        let moved = falling.moved(0, 1);
        if self.board.can_place(&moved) {
            self.session.active = Some(moved);
            self.session.lock_started = None;
            self.publish();
            return;
        }

        match self.session.lock_started {
            None => self.session.lock_started = Some(self.now),
            Some(started) if self.now.saturating_sub(started) >= LOCK_DELAY => {
                self.session.lock_started = None;
                self.lock_and_resolve(falling);
            }
            Some(_) => {}
        }
    }

    /// Lowest reachable position straight down, and the rows fallen
    fn landing(&self, piece: Piece) -> (Piece, u32) {
        let mut current = piece;
        let mut distance = 0;
        loop {
            let next = current.moved(0, 1);
            if !self.board.can_place(&next) {
                return (current, distance);
            }
            current = next;
            distance += 1;
        }
    }

    fn ghost(&self) -> Vec<Point> {
        match self.session.active {
            Some(piece) if self.board.can_place(&piece) => self.landing(piece).0.cells().to_vec(),
            _ => Vec::new(),
        }
    }

    /// Take the next queued piece and make it active. Returns false when the
    /// spawn position is blocked, which ends the run.
    fn spawn(&mut self) -> bool {
        let kind = self.session.queue.pop();
        let piece = Piece::spawn(kind, self.board.width());
        self.session.active = Some(piece);
        self.session.lock_started = None;

        if !self.board.can_place(&piece) {
            tracing::debug!(?kind, "Spawn position blocked");
            self.game_over();
            return false;
        }
        self.session.can_hold = true;
        true
    }

    fn lock_and_resolve(&mut self, piece: Piece) {
        debug_assert!(self.board.can_place(&piece));

        let hidden = self.config.hidden_rows as i32;
        let in_hidden_rows = piece.cells().iter().any(|p| p.y < hidden);

        self.board.lock(&piece);
        self.session.active = None;
        tracing::debug!(kind = ?piece.kind, origin = ?piece.origin, "Locked piece");

        let full = self.board.full_rows();
        if !full.is_empty() {
            tracing::debug!(rows = ?full, "Rows complete");
            self.session.flashing = full.into_iter().collect();
            self.timers.schedule(self.now + FLASH_DURATION, Task::ClearRows);
            self.publish();
            return;
        }

        if in_hidden_rows {
            self.publish();
            self.game_over();
            return;
        }

        if self.spawn() {
            self.publish();
        }
    }

    /// Flash is over: remove the rows, score them and bring in the next piece
    fn finish_clear(&mut self) {
        if self.session.phase == Phase::GameOver || self.session.flashing.is_empty() {
            return;
        }

        let cleared = self.board.clear_lines();
        let awarded = self.session.score.add_clear(cleared);
        self.session.flashing.clear();
        tracing::debug!(
            cleared,
            awarded,
            lines = self.session.score.lines,
            level = self.session.score.level,
            "Cleared rows"
        );

        if self.spawn() {
            self.publish();
        }
    }

    fn game_over(&mut self) {
        let score = self.session.score.points;
        let new_best = self.store.update(score);
        self.timers.cancel_all();
        self.session.phase = Phase::GameOver;
        self.session.lock_started = None;
        self.session.new_high_score = new_best;
        tracing::info!(
            score,
            lines = self.session.score.lines,
            level = self.session.score.level,
            new_best,
            "Game over"
        );
        self.publish();
    }
}
