//! Input handling with DAS (Delayed Auto Shift) and ARR (Auto Repeat Rate)
//!
//! Uses a polling-based approach that doesn't rely on key release events,
//! which are unreliable on Linux terminals. Holding soft drop switches the
//! engine's continuous soft drop on until the key is released or times out.

use blockfall::{Command, Settings};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::time::{Duration, Instant};

/// Time after which we consider a key "released" if no repeat received
const KEY_TIMEOUT: Duration = Duration::from_millis(100);

/// What a key means to the shell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Play(Command),
    Quit,
}

/// Input handler with DAS/ARR support
pub struct InputHandler {
    left_state: Option<KeyPressState>,
    right_state: Option<KeyPressState>,
    /// Soft drop held; only release matters, there is no repeat
    down_seen: Option<Instant>,
    bindings: KeyBindings,
    das: Duration,
    arr: Duration,
}

#[derive(Debug, Clone)]
struct KeyPressState {
    first_press: Instant,
    last_seen: Instant,
    das_triggered: bool,
    last_arr: Option<Instant>,
}

impl KeyPressState {
    fn new(now: Instant) -> Self {
        Self {
            first_press: now,
            last_seen: now,
            das_triggered: false,
            last_arr: None,
        }
    }
}

/// Key bindings configuration - supports multiple keys per action
#[derive(Debug, Clone)]
pub struct KeyBindings {
    pub move_left: Vec<KeyCode>,
    pub move_right: Vec<KeyCode>,
    pub soft_drop: Vec<KeyCode>,
    pub hard_drop: Vec<KeyCode>,
    pub rotate_cw: Vec<KeyCode>,
    pub rotate_ccw: Vec<KeyCode>,
    pub hold: Vec<KeyCode>,
    pub pause: Vec<KeyCode>,
    pub restart: Vec<KeyCode>,
    pub quit: Vec<KeyCode>,
}

impl KeyBindings {
    /// Parse a key string into KeyCode, None for names we don't know
    fn parse_key(s: &str) -> Option<KeyCode> {
        let lower = s.to_lowercase();
        let code = match lower.as_str() {
            "left" => KeyCode::Left,
            "right" => KeyCode::Right,
            "up" => KeyCode::Up,
            "down" => KeyCode::Down,
            "space" => KeyCode::Char(' '),
            "enter" => KeyCode::Enter,
            "tab" => KeyCode::Tab,
            "backspace" => KeyCode::Backspace,
            "esc" | "escape" => KeyCode::Esc,
            _ => {
                let mut chars = lower.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => KeyCode::Char(c),
                    _ => return None,
                }
            }
        };
        Some(code)
    }

    fn parse_keys(keys: &[String]) -> Vec<KeyCode> {
        keys.iter()
            .filter_map(|s| {
                let code = Self::parse_key(s);
                if code.is_none() {
                    tracing::warn!("Ignoring unknown key binding {:?}", s);
                }
                code
            })
            .collect()
    }

    /// Create keybindings from settings
    pub fn from_settings(settings: &Settings) -> Self {
        let keys = &settings.keys;
        Self {
            move_left: Self::parse_keys(&keys.move_left),
            move_right: Self::parse_keys(&keys.move_right),
            soft_drop: Self::parse_keys(&keys.soft_drop),
            hard_drop: Self::parse_keys(&keys.hard_drop),
            rotate_cw: Self::parse_keys(&keys.rotate_cw),
            rotate_ccw: Self::parse_keys(&keys.rotate_ccw),
            hold: Self::parse_keys(&keys.hold),
            pause: Self::parse_keys(&keys.pause),
            restart: Self::parse_keys(&keys.restart),
            quit: Self::parse_keys(&keys.quit),
        }
    }
}

impl InputHandler {
    /// Create input handler from settings
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            left_state: None,
            right_state: None,
            down_seen: None,
            bindings: KeyBindings::from_settings(settings),
            das: Duration::from_millis(settings.gameplay.das_ms),
            arr: Duration::from_millis(settings.gameplay.arr_ms),
        }
    }

    /// Handle a key press event - returns immediate actions
    pub fn key_down(&mut self, key: KeyEvent) -> Vec<Action> {
        self.key_down_at(key, Instant::now())
    }

    fn key_down_at(&mut self, key: KeyEvent, now: Instant) -> Vec<Action> {
        // Ctrl+C always quits
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return vec![Action::Quit];
        }

        let code = normalize_key(key.code);
        let b = &self.bindings;
        let mut actions = Vec::new();

        if b.move_left.contains(&code) {
            match &mut self.left_state {
                Some(state) => state.last_seen = now,
                None => {
                    actions.push(Action::Play(Command::Move(-1)));
                    self.left_state = Some(KeyPressState::new(now));
                }
            }
            self.right_state = None;
        } else if b.move_right.contains(&code) {
            match &mut self.right_state {
                Some(state) => state.last_seen = now,
                None => {
                    actions.push(Action::Play(Command::Move(1)));
                    self.right_state = Some(KeyPressState::new(now));
                }
            }
            self.left_state = None;
        } else if b.soft_drop.contains(&code) {
            if self.down_seen.is_none() {
                actions.push(Action::Play(Command::SoftDropStep));
                actions.push(Action::Play(Command::SetSoftDrop(true)));
            }
            self.down_seen = Some(now);
        } else if b.hard_drop.contains(&code) {
            actions.push(Action::Play(Command::HardDrop));
        } else if b.rotate_cw.contains(&code) {
            actions.push(Action::Play(Command::Rotate { clockwise: true }));
        } else if b.rotate_ccw.contains(&code) {
            actions.push(Action::Play(Command::Rotate { clockwise: false }));
        } else if b.hold.contains(&code) {
            actions.push(Action::Play(Command::Hold));
        } else if b.pause.contains(&code) {
            actions.push(Action::Play(Command::TogglePause));
        } else if b.restart.contains(&code) {
            actions.push(Action::Play(Command::Restart));
        } else if b.quit.contains(&code) {
            actions.push(Action::Quit);
        }

        actions
    }

    /// Handle a key release event (may not be called on Linux)
    pub fn key_up(&mut self, key: KeyEvent) -> Vec<Action> {
        let code = normalize_key(key.code);

        if self.bindings.move_left.contains(&code) {
            self.left_state = None;
        } else if self.bindings.move_right.contains(&code) {
            self.right_state = None;
        } else if self.bindings.soft_drop.contains(&code) && self.down_seen.take().is_some() {
            return vec![Action::Play(Command::SetSoftDrop(false))];
        }
        Vec::new()
    }

    /// Update held keys and return repeat actions (call every frame)
    pub fn update(&mut self) -> Vec<Action> {
        self.update_at(Instant::now())
    }

    fn update_at(&mut self, now: Instant) -> Vec<Action> {
        let mut actions = Vec::new();
        let timed_out = |seen: Instant| now.duration_since(seen) > KEY_TIMEOUT;

        // No recent key event = released
        if self.left_state.as_ref().is_some_and(|s| timed_out(s.last_seen)) {
            self.left_state = None;
        }
        if self.right_state.as_ref().is_some_and(|s| timed_out(s.last_seen)) {
            self.right_state = None;
        }
        if self.down_seen.is_some_and(timed_out) {
            self.down_seen = None;
            actions.push(Action::Play(Command::SetSoftDrop(false)));
        }

        let (das, arr) = (self.das, self.arr);
        if let Some(state) = &mut self.left_state {
            if process_das_arr(state, now, das, arr) {
                actions.push(Action::Play(Command::Move(-1)));
            }
        }
        if let Some(state) = &mut self.right_state {
            if process_das_arr(state, now, das, arr) {
                actions.push(Action::Play(Command::Move(1)));
            }
        }

        actions
    }

    /// Forget held keys, releasing soft drop if it was on
    pub fn clear(&mut self) -> Vec<Action> {
        self.left_state = None;
        self.right_state = None;
        match self.down_seen.take() {
            Some(_) => vec![Action::Play(Command::SetSoftDrop(false))],
            None => Vec::new(),
        }
    }
}

/// Process DAS/ARR logic for a key state, returns true if should trigger action
fn process_das_arr(state: &mut KeyPressState, now: Instant, das: Duration, arr: Duration) -> bool {
    if now.duration_since(state.first_press) < das {
        return false;
    }

    if !state.das_triggered {
        // First trigger after DAS
        state.das_triggered = true;
        state.last_arr = Some(now);
        return true;
    }

    match state.last_arr {
        Some(last) if now.duration_since(last) >= arr => {
            state.last_arr = Some(now);
            true
        }
        _ => false,
    }
}

/// Normalize key codes for consistent handling
fn normalize_key(code: KeyCode) -> KeyCode {
    match code {
        KeyCode::Char(c) => KeyCode::Char(c.to_ascii_lowercase()),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn handler() -> InputHandler {
        InputHandler::from_settings(&Settings::default())
    }

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_default_bindings() {
        let mut input = handler();
        let t = Instant::now();
        assert_eq!(
            input.key_down_at(press(KeyCode::Char(' ')), t),
            vec![Action::Play(Command::HardDrop)]
        );
        assert_eq!(
            input.key_down_at(press(KeyCode::Char('X')), t),
            vec![Action::Play(Command::Rotate { clockwise: true })]
        );
        assert_eq!(
            input.key_down_at(press(KeyCode::Esc), t),
            vec![Action::Play(Command::TogglePause)]
        );
        assert_eq!(
            input.key_down_at(press(KeyCode::Char('r')), t),
            vec![Action::Play(Command::Restart)]
        );
        assert_eq!(input.key_down_at(press(KeyCode::Char('q')), t), vec![Action::Quit]);
        assert_eq!(
            input.key_down_at(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL), t),
            vec![Action::Quit]
        );
    }

    #[test]
    fn test_das_then_arr() {
        let mut input = handler();
        let t = Instant::now();
        assert_eq!(
            input.key_down_at(press(KeyCode::Left), t),
            vec![Action::Play(Command::Move(-1))]
        );

        // Terminal key repeat keeps the key alive
        let mut moves = 0;
        for step in 1..=25 {
            let now = t + ms(step * 10);
            input.key_down_at(press(KeyCode::Left), now);
            moves += input.update_at(now).len();
            if step * 10 < 170 {
                assert_eq!(moves, 0);
            }
        }
        // DAS fires at 170, then every 50: 170, 220
        assert_eq!(moves, 2);
    }

    #[test]
    fn test_opposite_direction_cancels() {
        let mut input = handler();
        let t = Instant::now();
        input.key_down_at(press(KeyCode::Left), t);
        input.key_down_at(press(KeyCode::Right), t + ms(10));
        assert!(input.left_state.is_none());
        assert!(input.right_state.is_some());
    }

    #[test]
    fn test_soft_drop_hold_and_release() {
        let mut input = handler();
        let t = Instant::now();
        assert_eq!(
            input.key_down_at(press(KeyCode::Down), t),
            vec![
                Action::Play(Command::SoftDropStep),
                Action::Play(Command::SetSoftDrop(true))
            ]
        );
        // Repeats while held do nothing new
        assert!(input.key_down_at(press(KeyCode::Down), t + ms(50)).is_empty());
        assert!(input.update_at(t + ms(100)).is_empty());

        assert_eq!(
            input.update_at(t + ms(200)),
            vec![Action::Play(Command::SetSoftDrop(false))]
        );
        assert!(input.update_at(t + ms(300)).is_empty());
    }

    #[test]
    fn test_key_up_releases_soft_drop() {
        let mut input = handler();
        input.key_down(press(KeyCode::Down));
        assert_eq!(
            input.key_up(press(KeyCode::Down)),
            vec![Action::Play(Command::SetSoftDrop(false))]
        );
        assert!(input.key_up(press(KeyCode::Down)).is_empty());
    }

    #[test]
    fn test_unknown_binding_is_skipped() {
        let mut settings = Settings::default();
        settings.keys.hold = vec!["c".to_string(), "Hyper".to_string()];
        let bindings = KeyBindings::from_settings(&settings);
        assert_eq!(bindings.hold, vec![KeyCode::Char('c')]);
    }
}
