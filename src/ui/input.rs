/// Keyboard input translation.
///
/// Drains pending crossterm events once per frame and turns key presses
/// into `Command`s. The game is step based, so only Press and Repeat count;
/// there is no held-key tracking.
///
///   Arrows / WASD        →  Move
///   Ctrl+Z, U            →  Undo
///   Ctrl+R, Y            →  Redo
///   R                    →  Restart level
///   Enter / Space        →  Confirm
///   Esc / Backspace      →  Cancel
///   Ctrl+C               →  Quit

use std::time::Duration;

use crossterm::event::{self, poll, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::domain::moves::Move;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Command {
    Move(Move),
    Undo,
    Redo,
    Restart,
    Confirm,
    Cancel,
    Quit,
}

/// Map one key event to a command. Release events map to nothing.
pub fn command_for(key: &KeyEvent) -> Option<Command> {
    if key.kind == KeyEventKind::Release {
        return None;
    }
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    let cmd = match key.code {
        KeyCode::Char(c) if ctrl => match c.to_ascii_lowercase() {
            'c' => Command::Quit,
            'z' => Command::Undo,
            'r' => Command::Redo,
            _ => return None,
        },
        KeyCode::Up => Command::Move(Move::Up),
        KeyCode::Down => Command::Move(Move::Down),
        KeyCode::Left => Command::Move(Move::Left),
        KeyCode::Right => Command::Move(Move::Right),
        KeyCode::Char(c) => match c.to_ascii_lowercase() {
            'w' => Command::Move(Move::Up),
            's' => Command::Move(Move::Down),
            'a' => Command::Move(Move::Left),
            'd' => Command::Move(Move::Right),
            'u' => Command::Undo,
            'y' => Command::Redo,
            'r' => Command::Restart,
            ' ' => Command::Confirm,
            _ => return None,
        },
        KeyCode::Enter => Command::Confirm,
        KeyCode::Esc | KeyCode::Backspace => Command::Cancel,
        _ => return None,
    };
    Some(cmd)
}

#[derive(Default)]
pub struct InputState {
    commands: Vec<Command>,
}

impl InputState {
    pub fn new() -> Self {
        InputState::default()
    }

    /// Read every pending terminal event without blocking.
    /// Call once per frame, before the simulation tick.
    pub fn drain_events(&mut self) -> &[Command] {
        self.commands.clear();
        while poll(Duration::ZERO).unwrap_or(false) {
            if let Ok(Event::Key(key)) = event::read() {
                if let Some(cmd) = command_for(&key) {
                    self.commands.push(cmd);
                }
            }
        }
        &self.commands
    }
}
