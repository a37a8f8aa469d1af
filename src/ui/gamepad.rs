/// Gamepad input using gilrs.
///
/// Button mapping comes from the `[gamepad]` section of config.toml.
/// Default mapping:
///   D-pad / Left Stick    →  Move (one step per press)
///   X / L1                →  Undo
///   Y / R1                →  Redo
///   Select                →  Restart
///   A / Start             →  Confirm
///   B                     →  Cancel

#[cfg(feature = "gamepad")]
use gilrs::{Axis, Button, EventType, Gilrs};
#[cfg(feature = "gamepad")]
use tracing::{debug, warn};

use crate::config::GamepadConfig;
use crate::domain::moves::Move;
use crate::ui::input::Command;

#[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
const STICK_DEADZONE: f32 = 0.25;

/// Logical button identifiers (one per physical button).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Btn {
    A,       // South
    B,       // East
    X,       // West
    Y,       // North
    L1,
    R1,
    L2,
    R2,
    Start,
    Select,
}

impl Btn {
    fn from_name(s: &str) -> Option<Btn> {
        match s.to_uppercase().as_str() {
            "A" | "SOUTH"  => Some(Btn::A),
            "B" | "EAST"   => Some(Btn::B),
            "X" | "WEST"   => Some(Btn::X),
            "Y" | "NORTH"  => Some(Btn::Y),
            "L1" | "LB" | "LEFTTRIGGER"  => Some(Btn::L1),
            "R1" | "RB" | "RIGHTTRIGGER" => Some(Btn::R1),
            "L2" | "LT" | "LEFTTRIGGER2"  => Some(Btn::L2),
            "R2" | "RT" | "RIGHTTRIGGER2" => Some(Btn::R2),
            "START" => Some(Btn::Start),
            "SELECT" | "BACK" => Some(Btn::Select),
            _ => None,
        }
    }

    #[cfg(feature = "gamepad")]
    fn from_gilrs(btn: Button) -> Option<Btn> {
        match btn {
            Button::South        => Some(Btn::A),
            Button::East         => Some(Btn::B),
            Button::West         => Some(Btn::X),
            Button::North        => Some(Btn::Y),
            Button::LeftTrigger  => Some(Btn::L1),
            Button::RightTrigger => Some(Btn::R1),
            Button::LeftTrigger2  => Some(Btn::L2),
            Button::RightTrigger2 => Some(Btn::R2),
            Button::Start        => Some(Btn::Start),
            Button::Select       => Some(Btn::Select),
            _ => None,
        }
    }
}

/// Command-to-button mapping.
#[derive(Clone, Debug, PartialEq, Eq)]
struct ActionMap {
    undo: Vec<Btn>,
    redo: Vec<Btn>,
    restart: Vec<Btn>,
    confirm: Vec<Btn>,
    cancel: Vec<Btn>,
}

impl Default for ActionMap {
    fn default() -> Self {
        ActionMap {
            undo:    vec![Btn::X, Btn::L1],
            redo:    vec![Btn::Y, Btn::R1],
            restart: vec![Btn::Select],
            confirm: vec![Btn::A, Btn::Start],
            cancel:  vec![Btn::B],
        }
    }
}

impl ActionMap {
    /// Config lists replace the defaults; unknown or empty lists keep them.
    fn from_config(cfg: &GamepadConfig) -> Self {
        fn parse_list(names: &[String], fallback: Vec<Btn>) -> Vec<Btn> {
            let parsed: Vec<Btn> = names.iter().filter_map(|s| Btn::from_name(s)).collect();
            if parsed.is_empty() { fallback } else { parsed }
        }
        let d = ActionMap::default();
        ActionMap {
            undo: parse_list(&cfg.undo, d.undo),
            redo: parse_list(&cfg.redo, d.redo),
            restart: parse_list(&cfg.restart, d.restart),
            confirm: parse_list(&cfg.confirm, d.confirm),
            cancel: parse_list(&cfg.cancel, d.cancel),
        }
    }

    /// Commands bound to `btn`, in priority order.
    fn commands_for(&self, btn: Btn) -> impl Iterator<Item = Command> + '_ {
        [
            (&self.undo, Command::Undo),
            (&self.redo, Command::Redo),
            (&self.restart, Command::Restart),
            (&self.confirm, Command::Confirm),
            (&self.cancel, Command::Cancel),
        ]
        .into_iter()
        .filter(move |(btns, _)| btns.contains(&btn))
        .map(|(_, cmd)| cmd)
    }
}

/// Edge detector for the analog stick, one per direction.
#[derive(Clone, Copy, Debug, Default)]
struct StickDir {
    held: bool,
}

impl StickDir {
    /// True on the frame the stick crosses the deadzone.
    #[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
    fn update(&mut self, held: bool) -> bool {
        let pressed = held && !self.held;
        self.held = held;
        pressed
    }
}

pub struct GamepadState {
    #[cfg(feature = "gamepad")]
    gilrs: Option<Gilrs>,

    stick: [StickDir; 4],
    stick_x: f32,
    stick_y: f32,

    action_map: ActionMap,
    commands: Vec<Command>,

    pub connected: bool,
}

impl GamepadState {
    pub fn new(cfg: &GamepadConfig) -> Self {
        #[cfg(feature = "gamepad")]
        let (gilrs, connected) = match Gilrs::new() {
            Ok(g) => {
                let has_pad = g.gamepads().next().is_some();
                (Some(g), has_pad)
            }
            Err(e) => {
                warn!(error = %e, "gamepad support unavailable");
                (None, false)
            }
        };
        #[cfg(not(feature = "gamepad"))]
        let connected = false;

        GamepadState {
            #[cfg(feature = "gamepad")]
            gilrs,
            stick: [StickDir::default(); 4],
            stick_x: 0.0,
            stick_y: 0.0,
            action_map: ActionMap::from_config(cfg),
            commands: Vec::with_capacity(4),
            connected,
        }
    }

    /// Poll the pad; returns the commands triggered since the last call.
    pub fn update(&mut self) -> &[Command] {
        self.commands.clear();

        #[cfg(feature = "gamepad")]
        self.poll_gilrs();

        &self.commands
    }

    #[cfg(feature = "gamepad")]
    fn poll_gilrs(&mut self) {
        let Some(gilrs) = &mut self.gilrs else { return };
        let events: Vec<_> = std::iter::from_fn(|| gilrs.next_event()).collect();

        for event in events {
            match event.event {
                EventType::ButtonPressed(btn, _) => {
                    self.connected = true;
                    self.press(btn);
                }
                EventType::AxisChanged(axis, value, _) => {
                    self.connected = true;
                    match axis {
                        Axis::LeftStickX => self.stick_x = value,
                        Axis::LeftStickY => self.stick_y = value,
                        _ => {}
                    }
                }
                EventType::Connected => {
                    debug!(id = %event.id, "gamepad connected");
                    self.connected = true;
                }
                EventType::Disconnected => {
                    debug!(id = %event.id, "gamepad disconnected");
                    self.connected = false;
                    self.stick_x = 0.0;
                    self.stick_y = 0.0;
                }
                _ => {}
            }
        }

        // stick directions, in Move::ALL order
        let held = [
            self.stick_y > STICK_DEADZONE,
            self.stick_x < -STICK_DEADZONE,
            self.stick_y < -STICK_DEADZONE,
            self.stick_x > STICK_DEADZONE,
        ];
        for (i, mv) in Move::ALL.into_iter().enumerate() {
            if self.stick[i].update(held[i]) {
                self.commands.push(Command::Move(mv));
            }
        }
    }

    #[cfg(feature = "gamepad")]
    fn press(&mut self, btn: Button) {
        let mv = match btn {
            Button::DPadUp    => Some(Move::Up),
            Button::DPadDown  => Some(Move::Down),
            Button::DPadLeft  => Some(Move::Left),
            Button::DPadRight => Some(Move::Right),
            _ => None,
        };
        if let Some(mv) = mv {
            self.commands.push(Command::Move(mv));
            return;
        }
        if let Some(b) = Btn::from_gilrs(btn) {
            // first binding wins when a button is mapped twice
            if let Some(cmd) = self.action_map.commands_for(b).next() {
                self.commands.push(cmd);
            }
        }
    }
}
