//! Terminal UI rendering with ratatui

use blockfall::{Cell, GameState, Phase, Point, Settings, TetrominoType};
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
};

const EMPTY: &str = "  ";

const HOLD_WIDTH: u16 = 12;
const SIDE_WIDTH: u16 = 16;
/// Height of one piece slot in the next queue
const SLOT_HEIGHT: u16 = 3;

fn piece_color(kind: TetrominoType) -> Color {
    let (r, g, b) = kind.rgb();
    Color::Rgb(r, g, b)
}

/// Render one frame of the game
pub fn render_game(frame: &mut Frame, state: &GameState, settings: &Settings) {
    let area = frame.area();
    let (block_char, _) = settings.visual.block_chars();

    let board_width = state.width as u16 * 2 + 2;
    let board_height = state.height as u16 + 2;
    let game_area = center_rect(area, HOLD_WIDTH + board_width + SIDE_WIDTH, board_height);

    // hold | board | next + stats
    let main_layout = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(HOLD_WIDTH),
            Constraint::Length(board_width),
            Constraint::Length(SIDE_WIDTH),
        ])
        .split(game_area);

    let hold_area = Rect {
        height: main_layout[0].height.min(4),
        ..main_layout[0]
    };
    render_hold(frame, hold_area, state, block_char);
    render_board(frame, main_layout[1], state, settings);

    let queue_height = state.next_queue.len() as u16 * SLOT_HEIGHT + 2;
    let right_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(queue_height), Constraint::Min(6)])
        .split(main_layout[2]);

    render_next_queue(frame, right_layout[0], &state.next_queue, block_char);
    render_stats(frame, right_layout[1], state);

    match state.phase {
        Phase::Ready => {
            let best = format!("Best: {}", state.high_score);
            render_overlay(frame, area, "BLOCKFALL", &[best.as_str(), "R start | Q quit"]);
        }
        Phase::Paused => render_overlay(frame, area, "PAUSED", &["Press P to resume"]),
        Phase::GameOver if state.new_high_score => render_overlay(
            frame,
            area,
            "GAME OVER",
            &["NEW HIGH SCORE!", "R restart | Q quit"],
        ),
        Phase::GameOver => render_overlay(frame, area, "GAME OVER", &["R restart | Q quit"]),
        Phase::Running => {}
    }
}

/// Center a rect within another rect
fn center_rect(area: Rect, width: u16, height: u16) -> Rect {
    let x = area.x + area.width.saturating_sub(width) / 2;
    let y = area.y + area.height.saturating_sub(height) / 2;
    Rect {
        x,
        y,
        width: width.min(area.width),
        height: height.min(area.height),
    }
}

/// Render the hold piece box, dimmed while hold is spent
fn render_hold(frame: &mut Frame, area: Rect, state: &GameState, block_char: &str) {
    let block = Block::default()
        .title(" HOLD ")
        .title_alignment(Alignment::Center)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Gray));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    if let Some(kind) = state.hold {
        let color = if state.can_hold {
            piece_color(kind)
        } else {
            Color::DarkGray
        };
        render_mini_piece(frame, inner, kind, color, block_char);
    }
}

/// Render the next piece queue
fn render_next_queue(frame: &mut Frame, area: Rect, queue: &[TetrominoType], block_char: &str) {
    let block = Block::default()
        .title(" NEXT ")
        .title_alignment(Alignment::Center)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Gray));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    if queue.is_empty() {
        return;
    }

    let slots = Layout::default()
        .direction(Direction::Vertical)
        .constraints(vec![Constraint::Length(SLOT_HEIGHT); queue.len()])
        .split(inner);

    for (slot, &kind) in slots.iter().zip(queue) {
        render_mini_piece(frame, *slot, kind, piece_color(kind), block_char);
    }
}

/// Render a small piece preview (for hold and next queue)
fn render_mini_piece(
    frame: &mut Frame,
    area: Rect,
    kind: TetrominoType,
    color: Color,
    block_char: &str,
) {
    if area.height < 1 || area.width < 4 {
        return;
    }

    let shape = kind.shape(0);
    let min_x = shape.iter().map(|p| p.x).min().unwrap_or(0);
    let min_y = shape.iter().map(|p| p.y).min().unwrap_or(0);

    // Spawn orientation always fits in 4x2
    let lines: Vec<Line> = (0..2)
        .map(|dy| {
            let spans: Vec<Span> = (0..4)
                .map(|dx| {
                    if shape.contains(&Point::new(min_x + dx, min_y + dy)) {
                        Span::styled(block_char, Style::default().fg(color))
                    } else {
                        Span::raw(EMPTY)
                    }
                })
                .collect();
            Line::from(spans)
        })
        .collect();

    let paragraph = Paragraph::new(lines).alignment(Alignment::Center);
    frame.render_widget(paragraph, area);
}

/// Render the game board
fn render_board(frame: &mut Frame, area: Rect, state: &GameState, settings: &Settings) {
    let (block_char, ghost_char) = settings.visual.block_chars();
    let show_ghost = settings.visual.show_ghost;

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::White));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let active_cells = state.active.map(|piece| piece.cells());
    let active_color = state.active.map(|piece| piece_color(piece.kind));

    let mut lines: Vec<Line> = Vec::with_capacity(state.height);
    for y in 0..state.height {
        let hidden = y < state.hidden_rows;
        let flashing = state.is_flashing(y);
        let mut spans = Vec::with_capacity(state.width);

        for x in 0..state.width {
            let here = Point::new(x as i32, y as i32);
            let is_active = active_cells.is_some_and(|cells| cells.contains(&here));
            let is_ghost = show_ghost && !hidden && state.ghost.contains(&here);

            let (text, style) = match (state.cell(x, y), active_color) {
                (Some(Cell::Filled(_)), _) if flashing => {
                    (block_char, Style::default().fg(Color::White).bold())
                }
                (_, Some(color)) if is_active => (block_char, Style::default().fg(color)),
                (Some(Cell::Filled(kind)), _) => {
                    (block_char, Style::default().fg(piece_color(kind)))
                }
                (_, Some(color)) if is_ghost => (ghost_char, Style::default().fg(color).dim()),
                _ => (EMPTY, Style::default()),
            };

            let style = if hidden { style.dim() } else { style };
            spans.push(Span::styled(text, style));
        }

        lines.push(Line::from(spans));
    }

    frame.render_widget(Paragraph::new(lines), inner);
}

/// Render stats panel
fn render_stats(frame: &mut Frame, area: Rect, state: &GameState) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Gray));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let label = |text: &'static str| Line::from(Span::styled(text, Style::default().fg(Color::Gray)));
    let lines = vec![
        label("SCORE"),
        Line::from(Span::styled(
            state.score.to_string(),
            Style::default().fg(Color::Yellow).bold(),
        )),
        Line::raw(""),
        label("LEVEL"),
        Line::from(Span::styled(
            state.level.to_string(),
            Style::default().fg(Color::Cyan),
        )),
        Line::raw(""),
        label("LINES"),
        Line::from(Span::styled(
            state.lines.to_string(),
            Style::default().fg(Color::Green),
        )),
        Line::raw(""),
        label("BEST"),
        Line::from(Span::styled(
            state.high_score.max(state.score).to_string(),
            Style::default().fg(Color::Magenta),
        )),
    ];

    frame.render_widget(Paragraph::new(lines), inner);
}

/// Render an overlay (for pause/game over)
fn render_overlay(frame: &mut Frame, area: Rect, title: &str, subtitle: &[&str]) {
    let popup_area = center_rect(area, 26, subtitle.len() as u16 + 4);

    // Clear the background
    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .style(Style::default().bg(Color::Black));

    let inner = block.inner(popup_area);
    frame.render_widget(block, popup_area);

    let mut text = vec![
        Line::styled(title, Style::default().fg(Color::Yellow).bold()),
        Line::raw(""),
    ];
    text.extend(
        subtitle
            .iter()
            .map(|line| Line::styled(*line, Style::default().fg(Color::Gray))),
    );

    let paragraph = Paragraph::new(text).alignment(Alignment::Center);
    frame.render_widget(paragraph, inner);
}
