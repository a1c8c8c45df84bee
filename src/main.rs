//! BLOCKFALL - terminal front end
//!
//! Owns the terminal and the input devices; the game itself runs on a tokio
//! task and is only ever seen through published snapshots.

mod input;
mod ui;

use anyhow::Context;
use blockfall::{
    Command, Engine, EngineHandle, FileHighScores, HighScoreStore, MemoryHighScores, Settings,
};
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use input::{Action, InputHandler};
use ratatui::{Terminal, backend::CrosstermBackend};
use std::{
    io::{self, stdout},
    path::PathBuf,
    sync::Arc,
    time::Duration,
};

/// Target frame rate
const TARGET_FPS: u64 = 60;
const FRAME_DURATION: Duration = Duration::from_micros(1_000_000 / TARGET_FPS);

/// Get the blockfall temp directory, creating it if needed
fn blockfall_temp_dir() -> PathBuf {
    let dir = std::env::temp_dir().join("blockfall");
    let _ = std::fs::create_dir_all(&dir);
    dir
}

fn open_high_scores() -> Arc<dyn HighScoreStore> {
    match FileHighScores::open_default() {
        Some(store) => {
            tracing::info!("High score file: {}", store.path().display());
            Arc::new(store)
        }
        None => {
            tracing::warn!("No data directory available, high score will not be saved");
            Arc::new(MemoryHighScores::default())
        }
    }
}

fn main() -> anyhow::Result<()> {
    let session_id: u32 = rand::random();

    // The terminal belongs to the renderer, so logs go to a file
    let log_dir = blockfall_temp_dir();
    let log_file = format!("{:08x}.log", session_id);
    let file_appender = tracing_appender::rolling::never(&log_dir, &log_file);
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("blockfall=debug".parse()?),
        )
        .with_ansi(false)
        .init();

    tracing::info!(
        "BLOCKFALL starting up, session={:08x}, log={}",
        session_id,
        log_dir.join(&log_file).display()
    );

    let settings = Settings::load();
    let engine = Engine::new(settings.engine_config(), open_high_scores());

    let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;
    let (handle, task) = {
        let _enter = rt.enter();
        blockfall::runtime::spawn(engine)
    };

    // Setup terminal
    enable_raw_mode().context("Failed to enable raw mode")?;
    execute!(stdout(), EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;
    terminal.clear()?;

    let result = run_app(&mut terminal, &handle, &settings);

    // Restore terminal before reporting anything
    disable_raw_mode()?;
    execute!(stdout(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    drop(handle);
    let last = rt
        .block_on(task)
        .map(|engine| engine.snapshot())
        .context("Engine task failed")?;

    if Settings::settings_path().is_some_and(|path| !path.exists()) {
        // First run: write the defaults out so they can be edited
        if let Err(e) = settings.save() {
            tracing::warn!("Could not save settings: {:#}", e);
        }
    }

    result?;

    println!("\nThanks for playing BLOCKFALL!");
    println!("Final Score: {}", last.score);
    println!("Level: {} | Lines: {}", last.level, last.lines);
    println!("Best: {}", last.high_score);
    Ok(())
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    handle: &EngineHandle,
    settings: &Settings,
) -> anyhow::Result<()> {
    let mut input = InputHandler::from_settings(settings);
    let mut snapshots = handle.subscribe();

    loop {
        let state = snapshots.borrow_and_update().clone();
        terminal.draw(|frame| ui::render_game(frame, &state, settings))?;

        let mut actions = Vec::new();
        if event::poll(FRAME_DURATION)? {
            if let Event::Key(key) = event::read()? {
                match key.kind {
                    KeyEventKind::Release => actions.extend(input.key_up(key)),
                    _ => actions.extend(input.key_down(key)),
                }
            }
        }
        actions.extend(input.update());

        for action in actions {
            match action {
                Action::Quit => {
                    tracing::info!("Quit requested");
                    return Ok(());
                }
                Action::Play(command) => {
                    if command == Command::TogglePause {
                        // Let go of held keys before the engine stops listening
                        for released in input.clear() {
                            if let Action::Play(release) = released {
                                send(handle, release)?;
                            }
                        }
                    }
                    send(handle, command)?;
                }
            }
        }
    }
}

fn send(handle: &EngineHandle, command: Command) -> anyhow::Result<()> {
    if !handle.send(command) {
        anyhow::bail!("Engine task stopped unexpectedly");
    }
    Ok(())
}
