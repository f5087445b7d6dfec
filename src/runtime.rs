//! Terminal input for the game loop.
//!
//! Raw terminal events come from an [`EventSource`]; the [`Runner`] turns key
//! presses into [`Action`]s according to the current [`InputMode`], and emits
//! a [`GameEvent::Tick`] whenever the tick interval passes without one.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

/// What the terminal reported
#[derive(Clone, Debug)]
pub enum TerminalEvent {
    Key(KeyEvent),
    Resize,
}

/// Which keymap applies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Game,
    Highscores,
    NameEntry,
}

/// A game-level command produced from a key press
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Tap,
    Reset,
    OpenDialog,
    SwitchTab,
    ShowGame,
    ShowHighscores,
    ResetAllScores,
    ScrollUp(usize),
    ScrollDown(usize),
    ScrollTop,
    InsertChar(char),
    DeleteChar,
    SubmitName,
    CancelDialog,
    Quit,
}

/// What the game loop should react to next
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameEvent {
    Action(Action),
    Redraw,
    Tick,
}

const PAGE: usize = 10;

/// Keymap for `mode`. Releases and unbound keys map to nothing.
pub fn map_key(key: KeyEvent, mode: InputMode) -> Option<Action> {
    if key.kind == KeyEventKind::Release {
        return None;
    }
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return Some(Action::Quit);
    }

    if mode == InputMode::NameEntry {
        return match key.code {
            KeyCode::Esc => Some(Action::CancelDialog),
            KeyCode::Enter => Some(Action::SubmitName),
            KeyCode::Backspace => Some(Action::DeleteChar),
            // Ctrl/Alt chords are shortcuts, not text
            KeyCode::Char(c) if key.modifiers.difference(KeyModifiers::SHIFT).is_empty() => {
                Some(Action::InsertChar(c))
            }
            _ => None,
        };
    }

    let action = match key.code {
        KeyCode::Esc | KeyCode::Char('q') => Action::Quit,
        KeyCode::Tab | KeyCode::BackTab | KeyCode::Left | KeyCode::Right => Action::SwitchTab,
        KeyCode::Char('1') => Action::ShowGame,
        KeyCode::Char('2') => Action::ShowHighscores,
        KeyCode::Char('X') => Action::ResetAllScores,
        code => match (mode, code) {
            (InputMode::Game, KeyCode::Char(' ') | KeyCode::Enter) => Action::Tap,
            (InputMode::Game, KeyCode::Char('r')) => Action::Reset,
            (InputMode::Game, KeyCode::Char('a')) => Action::OpenDialog,
            (InputMode::Highscores, KeyCode::Up) => Action::ScrollUp(1),
            (InputMode::Highscores, KeyCode::Down) => Action::ScrollDown(1),
            (InputMode::Highscores, KeyCode::PageUp) => Action::ScrollUp(PAGE),
            (InputMode::Highscores, KeyCode::PageDown) => Action::ScrollDown(PAGE),
            (InputMode::Highscores, KeyCode::Home) => Action::ScrollTop,
            _ => return None,
        },
    };
    Some(action)
}

pub trait EventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<TerminalEvent, RecvTimeoutError>;
}

/// Reads crossterm events on a background thread
pub struct CrosstermEventSource {
    rx: Receiver<TerminalEvent>,
}

impl CrosstermEventSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();

        std::thread::spawn(move || loop {
            let evt = match event::read() {
                Ok(Event::Key(key)) => TerminalEvent::Key(key),
                Ok(Event::Resize(_, _)) => TerminalEvent::Resize,
                Ok(_) => continue,
                Err(e) => {
                    tracing::error!(error = %e, "terminal event reader stopped");
                    break;
                }
            };
            if tx.send(evt).is_err() {
                break;
            }
        });

        Self { rx }
    }
}

impl Default for CrosstermEventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSource for CrosstermEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<TerminalEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Feeds pre-recorded events, for tests and headless drivers
pub struct ChannelEventSource {
    rx: Receiver<TerminalEvent>,
}

impl ChannelEventSource {
    pub fn new(rx: Receiver<TerminalEvent>) -> Self {
        Self { rx }
    }
}

impl EventSource for ChannelEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<TerminalEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

pub struct Runner<E: EventSource> {
    source: E,
    tick: Duration,
}

impl<E: EventSource> Runner<E> {
    pub fn new(source: E, tick: Duration) -> Self {
        Self { source, tick }
    }

    /// Wait for the next bound key press or resize. Unbound keys are skipped
    /// without restarting the tick interval.
    pub fn step(&self, mode: InputMode) -> GameEvent {
        let deadline = Instant::now() + self.tick;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.source.recv_timeout(remaining) {
                Ok(TerminalEvent::Key(key)) => {
                    if let Some(action) = map_key(key, mode) {
                        return GameEvent::Action(action);
                    }
                }
                Ok(TerminalEvent::Resize) => return GameEvent::Redraw,
                Err(_) => return GameEvent::Tick,
            }
        }
    }
}
