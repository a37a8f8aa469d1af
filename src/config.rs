/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory (or CWD, or the
/// per-user data directory). Falls back to defaults if the file is missing
/// or incomplete. Problems found while loading are collected in
/// `GameConfig::warnings` and logged once logging is up.

use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use crate::sim::motion::CELL_SIZE;
use crate::ui::surface::Rgb;

// ── Public Config Struct ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub timing: TimingConfig,
    pub pointer_color: Rgb,
    pub gamepad: GamepadConfig,
    pub levels_dir: PathBuf,
    pub campaigns: Vec<String>,
    pub log: LogConfig,
    pub strings: HashMap<String, String>,
    pub warnings: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TimingConfig {
    pub frame_ms: u64,
    pub move_speed: i32,          // px per frame, divides CELL_SIZE
    pub cell_reveal_ms: u64,
    pub spawn_phase_ms: u64,      // each of the three blink phases
    pub completion_delay_ms: u64, // pause before the completed dialog
}

impl TimingConfig {
    pub fn frame(&self) -> Duration {
        Duration::from_millis(self.frame_ms)
    }

    pub fn cell_reveal(&self) -> Duration {
        Duration::from_millis(self.cell_reveal_ms)
    }

    pub fn spawn_phase(&self) -> Duration {
        Duration::from_millis(self.spawn_phase_ms)
    }

    pub fn completion_delay(&self) -> Duration {
        Duration::from_millis(self.completion_delay_ms)
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        TimingConfig {
            frame_ms: default_frame_ms(),
            move_speed: default_move_speed(),
            cell_reveal_ms: default_cell_reveal(),
            spawn_phase_ms: default_spawn_phase(),
            completion_delay_ms: default_completion_delay(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct GamepadConfig {
    pub undo: Vec<String>,
    pub redo: Vec<String>,
    pub restart: Vec<String>,
    pub confirm: Vec<String>,
    pub cancel: Vec<String>,
}

#[derive(Clone, Debug)]
pub struct LogConfig {
    pub file: PathBuf,
    pub level: String,
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    timing: TomlTiming,
    #[serde(default)]
    pointer: TomlPointer,
    #[serde(default)]
    gamepad: TomlGamepad,
    #[serde(default)]
    general: TomlGeneral,
    #[serde(default)]
    log: TomlLog,
    #[serde(default)]
    strings: HashMap<String, String>,
}

#[derive(Deserialize, Debug)]
struct TomlTiming {
    #[serde(default = "default_frame_ms")]
    frame_ms: u64,
    #[serde(default = "default_move_speed")]
    move_speed: i32,
    #[serde(default = "default_cell_reveal")]
    cell_reveal_ms: u64,
    #[serde(default = "default_spawn_phase")]
    spawn_phase_ms: u64,
    #[serde(default = "default_completion_delay")]
    completion_delay_ms: u64,
}

#[derive(Deserialize, Debug)]
struct TomlPointer {
    #[serde(default = "default_pointer_color")]
    color: String,
}

#[derive(Deserialize, Debug)]
struct TomlGamepad {
    #[serde(default = "default_undo")]
    undo: Vec<String>,
    #[serde(default = "default_redo")]
    redo: Vec<String>,
    #[serde(default = "default_restart")]
    restart: Vec<String>,
    #[serde(default = "default_confirm")]
    confirm: Vec<String>,
    #[serde(default = "default_cancel")]
    cancel: Vec<String>,
}

#[derive(Deserialize, Debug)]
struct TomlGeneral {
    #[serde(default = "default_levels_dir")]
    levels_dir: String,
    #[serde(default = "default_campaigns")]
    campaigns: Vec<String>,
}

#[derive(Deserialize, Debug)]
struct TomlLog {
    #[serde(default = "default_log_file")]
    file: String,
    #[serde(default = "default_log_level")]
    level: String,
}

// ── Defaults ──

fn default_frame_ms() -> u64 { 16 }
fn default_move_speed() -> i32 { 3 }
fn default_cell_reveal() -> u64 { 40 }
fn default_spawn_phase() -> u64 { 200 }
fn default_completion_delay() -> u64 { 500 }

fn default_pointer_color() -> String { "#439D1C".into() }

fn default_undo() -> Vec<String> { vec!["X".into(), "L1".into()] }
fn default_redo() -> Vec<String> { vec!["Y".into(), "R1".into()] }
fn default_restart() -> Vec<String> { vec!["Select".into()] }
fn default_confirm() -> Vec<String> { vec!["A".into(), "Start".into()] }
fn default_cancel() -> Vec<String> { vec!["B".into()] }

fn default_levels_dir() -> String { "levels".into() }
fn default_campaigns() -> Vec<String> { vec!["classic".into(), "extended".into()] }

fn default_log_file() -> String { "plates.log".into() }
fn default_log_level() -> String { "info".into() }

impl Default for TomlTiming {
    fn default() -> Self {
        TomlTiming {
            frame_ms: default_frame_ms(),
            move_speed: default_move_speed(),
            cell_reveal_ms: default_cell_reveal(),
            spawn_phase_ms: default_spawn_phase(),
            completion_delay_ms: default_completion_delay(),
        }
    }
}

impl Default for TomlPointer {
    fn default() -> Self {
        TomlPointer { color: default_pointer_color() }
    }
}

impl Default for TomlGamepad {
    fn default() -> Self {
        TomlGamepad {
            undo: default_undo(),
            redo: default_redo(),
            restart: default_restart(),
            confirm: default_confirm(),
            cancel: default_cancel(),
        }
    }
}

impl Default for TomlGeneral {
    fn default() -> Self {
        TomlGeneral {
            levels_dir: default_levels_dir(),
            campaigns: default_campaigns(),
        }
    }
}

impl Default for TomlLog {
    fn default() -> Self {
        TomlLog { file: default_log_file(), level: default_log_level() }
    }
}

// ── Loading ──

impl GameConfig {
    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory,
    /// (3) `~/.local/share/plates`.
    pub fn load() -> Self {
        let search_dirs = candidate_dirs();
        let mut warnings = vec![];
        let toml_cfg = load_toml(&search_dirs, &mut warnings);
        let levels_dir = resolve_dir(&search_dirs, &toml_cfg.general.levels_dir);
        Self::from_toml(toml_cfg, levels_dir, warnings)
    }

    /// Parse a config document directly (no file search).
    pub fn parse(text: &str) -> Result<Self, toml::de::Error> {
        let toml_cfg = toml::from_str::<TomlConfig>(text)?;
        let levels_dir = PathBuf::from(&toml_cfg.general.levels_dir);
        Ok(Self::from_toml(toml_cfg, levels_dir, vec![]))
    }

    fn from_toml(toml_cfg: TomlConfig, levels_dir: PathBuf, mut warnings: Vec<String>) -> Self {
        let mut timing = TimingConfig {
            frame_ms: toml_cfg.timing.frame_ms.max(1),
            move_speed: toml_cfg.timing.move_speed,
            cell_reveal_ms: toml_cfg.timing.cell_reveal_ms,
            spawn_phase_ms: toml_cfg.timing.spawn_phase_ms,
            completion_delay_ms: toml_cfg.timing.completion_delay_ms,
        };
        // A speed that does not divide the cell size would never land on the goal.
        if timing.move_speed <= 0 || CELL_SIZE % timing.move_speed != 0 {
            warnings.push(format!(
                "timing.move_speed = {} does not divide {CELL_SIZE}, using {}",
                timing.move_speed,
                default_move_speed()
            ));
            timing.move_speed = default_move_speed();
        }

        let pointer_color = match Rgb::from_hex(&toml_cfg.pointer.color) {
            Some(c) => c,
            None => {
                warnings.push(format!("pointer.color {:?} is not #RRGGBB", toml_cfg.pointer.color));
                Rgb::POINTER
            }
        };

        GameConfig {
            timing,
            pointer_color,
            gamepad: GamepadConfig {
                undo: toml_cfg.gamepad.undo,
                redo: toml_cfg.gamepad.redo,
                restart: toml_cfg.gamepad.restart,
                confirm: toml_cfg.gamepad.confirm,
                cancel: toml_cfg.gamepad.cancel,
            },
            levels_dir,
            campaigns: toml_cfg.general.campaigns,
            log: LogConfig {
                file: PathBuf::from(toml_cfg.log.file),
                level: toml_cfg.log.level,
            },
            strings: toml_cfg.strings,
            warnings,
        }
    }

    /// Pack file for a campaign name.
    pub fn campaign_path(&self, name: &str) -> PathBuf {
        self.levels_dir.join(format!("{name}.xml"))
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        let toml_cfg = TomlConfig::default();
        let levels_dir = PathBuf::from(&toml_cfg.general.levels_dir);
        Self::from_toml(toml_cfg, levels_dir, vec![])
    }
}

/// Per-user data directory (`~/.local/share/plates`), if HOME is known.
pub fn data_dir() -> Option<PathBuf> {
    std::env::var("HOME").ok().map(|home| PathBuf::from(home).join(".local/share/plates"))
}

/// Candidate directories to search: exe dir + CWD + data dir (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    // 1. Directory of the running executable
    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    // 2. Current working directory
    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    // 3. XDG data home
    if let Some(xdg) = data_dir() {
        if xdg.is_dir() && !dirs.iter().any(|d| d == &xdg) {
            dirs.push(xdg);
        }
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

/// Absolute paths are kept; relative ones are looked up in the candidate
/// dirs and default to CWD-relative when none exists yet.
fn resolve_dir(search_dirs: &[PathBuf], dir: &str) -> PathBuf {
    let path = PathBuf::from(dir);
    if path.is_absolute() {
        return path;
    }
    search_dirs.iter()
        .map(|d| d.join(dir))
        .find(|p| p.is_dir())
        .unwrap_or(path)
}

/// Search for config.toml in candidate directories.
fn load_toml(search_dirs: &[PathBuf], warnings: &mut Vec<String>) -> TomlConfig {
    for dir in search_dirs {
        let path = dir.join("config.toml");
        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(text) => match toml::from_str::<TomlConfig>(&text) {
                    Ok(cfg) => return cfg,
                    Err(e) => {
                        warnings.push(format!("{}: parse error, using defaults: {e}", path.display()));
                        return TomlConfig::default();
                    }
                },
                Err(e) => {
                    warnings.push(format!("could not read {}: {e}", path.display()));
                }
            }
        }
    }
    TomlConfig::default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_gives_defaults() {
        let cfg = GameConfig::parse("").unwrap();
        assert_eq!(cfg.timing, TimingConfig::default());
        assert_eq!(cfg.timing.move_speed, 3);
        assert_eq!(cfg.timing.cell_reveal(), Duration::from_millis(40));
        assert_eq!(cfg.pointer_color, Rgb::new(0x43, 0x9D, 0x1C));
        assert_eq!(cfg.campaigns, vec!["classic", "extended"]);
        assert_eq!(cfg.log.level, "info");
        assert!(cfg.warnings.is_empty());
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let cfg = GameConfig::parse(r#"
            [timing]
            move_speed = 5
            [general]
            campaigns = ["classic"]
            [strings]
            "menu.play" = "Jouer"
        "#).unwrap();
        assert_eq!(cfg.timing.move_speed, 5);
        assert_eq!(cfg.timing.spawn_phase_ms, 200);
        assert_eq!(cfg.campaigns, vec!["classic"]);
        assert_eq!(cfg.strings.get("menu.play").map(String::as_str), Some("Jouer"));
        assert_eq!(cfg.campaign_path("classic"), PathBuf::from("levels").join("classic.xml"));
    }

    #[test]
    fn bad_move_speed_falls_back() {
        let cfg = GameConfig::parse("[timing]\nmove_speed = 4\n").unwrap();
        assert_eq!(cfg.timing.move_speed, 3);
        assert_eq!(cfg.warnings.len(), 1);

        let cfg = GameConfig::parse("[timing]\nmove_speed = -9\n").unwrap();
        assert_eq!(cfg.timing.move_speed, 3);
    }

    #[test]
    fn bad_pointer_color_falls_back() {
        let cfg = GameConfig::parse("[pointer]\ncolor = \"green\"\n").unwrap();
        assert_eq!(cfg.pointer_color, Rgb::POINTER);
        assert_eq!(cfg.warnings.len(), 1);
    }

    #[test]
    fn malformed_document_is_an_error() {
        assert!(GameConfig::parse("[timing\n").is_err());
    }
}
