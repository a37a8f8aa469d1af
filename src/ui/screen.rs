/// Scene controller: which screen is up, menu cursors, and dialogs.
///
/// Commands from keyboard and gamepad are routed here; gameplay commands
/// are forwarded to the `Session`. Truth table for Cancel/Confirm:
///
///   Scene              Confirm                 Cancel
///   ───────────────    ──────────────────────  ─────────────────
///   MainMenu           Play / Quit             Quit
///   CampaignSelect     open (not if blocked)   MainMenu
///   LevelSelect        start (if unlocked)     CampaignSelect
///   GamePlay           skip reveal             ask to leave
///     (asking)         leave → LevelSelect     keep playing
///   LevelCompleted     Next / Main menu        MainMenu
///   CampaignCompleted  MainMenu                MainMenu

use std::time::Duration;

use tracing::{debug, info};

use crate::domain::moves::Move;
use crate::sim::event::HostTask;
use crate::sim::level::LevelId;
use crate::sim::session::{SceneId, SceneNavigator, Session};
use crate::ui::input::Command;

pub const MAIN_MENU_ITEMS: usize = 2;
pub const COMPLETED_ITEMS: usize = 2;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Flow {
    Continue,
    Quit,
}

/// Outcome of the last solved level, shown in the completed dialog.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct LevelResult {
    pub moves: usize,
    pub elapsed: Duration,
}

#[derive(Debug)]
pub struct Screen {
    scene: SceneId,
    cursor: usize,
    confirm_exit: bool,
    result: Option<LevelResult>,
    dialog_in: Option<Duration>,
}

impl SceneNavigator for Screen {
    fn change_scene(&mut self, scene: SceneId) {
        debug!(from = ?self.scene, to = ?scene, "scene change");
        self.scene = scene;
        self.cursor = 0;
        self.confirm_exit = false;
    }
}

impl Screen {
    pub fn new() -> Self {
        Screen {
            scene: SceneId::MainMenu,
            cursor: 0,
            confirm_exit: false,
            result: None,
            dialog_in: None,
        }
    }

    pub fn scene(&self) -> SceneId {
        self.scene
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn confirm_exit(&self) -> bool {
        self.confirm_exit
    }

    pub fn result(&self) -> Option<LevelResult> {
        self.result
    }

    /// A task from the host queue. The completed dialog opens after `delay`.
    pub fn on_task(&mut self, task: HostTask, delay: Duration) {
        match task {
            HostTask::LevelCompleted { moves, elapsed } => {
                info!(moves, elapsed_ms = elapsed.as_millis() as u64, "level completed");
                self.result = Some(LevelResult { moves, elapsed });
                self.dialog_in = Some(delay);
            }
        }
    }

    /// Count down a pending dialog.
    pub fn tick(&mut self, dt: Duration) {
        let Some(left) = self.dialog_in else { return };
        if left <= dt {
            self.dialog_in = None;
            self.change_scene(SceneId::LevelCompleted);
        } else {
            self.dialog_in = Some(left - dt);
        }
    }

    pub fn dialog_pending(&self) -> bool {
        self.dialog_in.is_some()
    }

    pub fn handle(&mut self, session: &mut Session, cmd: Command) -> Flow {
        if cmd == Command::Quit {
            return Flow::Quit;
        }
        match self.scene {
            SceneId::MainMenu => return self.main_menu(cmd),
            SceneId::CampaignSelect => self.campaign_select(session, cmd),
            SceneId::LevelSelect => self.level_select(session, cmd),
            SceneId::GamePlay => self.gameplay(session, cmd),
            SceneId::LevelCompleted => self.level_completed(session, cmd),
            SceneId::CampaignCompleted => {
                if matches!(cmd, Command::Confirm | Command::Cancel) {
                    self.change_scene(SceneId::MainMenu);
                }
            }
        }
        Flow::Continue
    }

    fn move_cursor(&mut self, mv: Move, len: usize) {
        if len == 0 {
            return;
        }
        self.cursor = match mv {
            Move::Up | Move::Left => self.cursor.checked_sub(1).unwrap_or(len - 1),
            Move::Down | Move::Right => (self.cursor + 1) % len,
        };
    }

    fn main_menu(&mut self, cmd: Command) -> Flow {
        match cmd {
            Command::Move(mv) => self.move_cursor(mv, MAIN_MENU_ITEMS),
            Command::Confirm if self.cursor == 0 => self.change_scene(SceneId::CampaignSelect),
            Command::Confirm | Command::Cancel => return Flow::Quit,
            _ => {}
        }
        Flow::Continue
    }

    fn campaign_select(&mut self, session: &mut Session, cmd: Command) {
        match cmd {
            Command::Move(mv) => self.move_cursor(mv, session.campaigns().len()),
            Command::Confirm => {
                if session.select_campaign(self.cursor) {
                    self.open_level_select(session, None);
                }
            }
            Command::Cancel => self.change_scene(SceneId::MainMenu),
            _ => {}
        }
    }

    /// Level list with the cursor on `at`, else on the first open level.
    fn open_level_select(&mut self, session: &Session, at: Option<LevelId>) {
        self.change_scene(SceneId::LevelSelect);
        let first_open = session.campaign().and_then(|c| c.first_open());
        self.cursor = at.or(first_open).map(LevelId::index).unwrap_or(0);
    }

    fn level_select(&mut self, session: &mut Session, cmd: Command) {
        let len = session.campaign().map(|c| c.len()).unwrap_or(0);
        match cmd {
            Command::Move(mv) => self.move_cursor(mv, len),
            Command::Confirm => {
                let Some(campaign) = session.selected_index() else { return };
                if session.start_level(campaign, LevelId(self.cursor)) {
                    self.result = None;
                    self.change_scene(SceneId::GamePlay);
                }
            }
            Command::Cancel => {
                let selected = session.selected_index().unwrap_or(0);
                self.change_scene(SceneId::CampaignSelect);
                self.cursor = selected;
            }
            _ => {}
        }
    }

    fn gameplay(&mut self, session: &mut Session, cmd: Command) {
        if self.dialog_pending() {
            return;
        }
        if self.confirm_exit {
            match cmd {
                Command::Confirm => {
                    let at = session.current_id();
                    session.leave_level();
                    self.open_level_select(session, at);
                }
                Command::Cancel => self.confirm_exit = false,
                _ => {}
            }
            return;
        }
        match cmd {
            Command::Move(mv) => {
                session.request_move(mv);
            }
            Command::Undo => {
                session.undo();
            }
            Command::Redo => {
                session.redo();
            }
            Command::Restart => session.restart(),
            Command::Confirm => {
                session.skip_reveal();
            }
            Command::Cancel => self.confirm_exit = true,
            Command::Quit => {}
        }
    }

    fn level_completed(&mut self, session: &mut Session, cmd: Command) {
        match cmd {
            Command::Move(mv) => self.move_cursor(mv, COMPLETED_ITEMS),
            Command::Confirm if self.cursor == 0 => {
                self.result = None;
                session.advance(self);
            }
            Command::Confirm | Command::Cancel => {
                session.leave_level();
                self.change_scene(SceneId::MainMenu);
            }
            _ => {}
        }
    }
}

impl Default for Screen {
    fn default() -> Self {
        Screen::new()
    }
}
