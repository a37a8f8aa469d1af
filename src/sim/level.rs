//! Levels and campaigns (level packs).
//!
//! A campaign is an ordered list of levels. Levels are addressed by
//! `LevelId` — their position in the campaign — so "the level after this
//! one" is decided by identity, never by comparing level contents.
//!
//! ## Unlocking
//!
//! Scanning from the first level: every completed level is unlocked, the
//! first incomplete level is unlocked too, everything after it is locked.
//! The scan runs on every query, so it can never go stale when a level's
//! completion changes.

use crate::domain::cell::CellKind;
use crate::domain::grid::Grid;
use crate::error::LevelError;

pub const MAX_NUMBER_LEN: usize = 5;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, PartialOrd, Ord)]
pub struct LevelId(pub usize);

impl LevelId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Level {
    number: String,
    completed: bool,
    grid: Grid,
}

impl Level {
    /// Validates the display number (1–5 chars) and the start/finish layout.
    pub fn new(number: impl Into<String>, grid: Grid) -> Result<Self, LevelError> {
        let number = number.into();
        let len = number.chars().count();
        if len == 0 || len > MAX_NUMBER_LEN {
            return Err(LevelError::BadNumber(number));
        }
        grid.validate_endpoints()?;
        let mut level = Level { number, completed: false, grid };
        level.grid.reset_progress();
        Ok(level)
    }

    pub fn with_completed(mut self, completed: bool) -> Self {
        self.completed = completed;
        self
    }

    pub fn number(&self) -> &str {
        &self.number
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    /// Idempotent; completion never reverts.
    pub fn mark_completed(&mut self) {
        self.completed = true;
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn grid_mut(&mut self) -> &mut Grid {
        &mut self.grid
    }

    /// Back to the state right after loading: only start visited.
    pub fn reset_progress(&mut self) {
        self.grid.reset_progress();
    }

    pub fn plate_count(&self) -> usize {
        self.grid.count(CellKind::Empty) + self.grid.count(CellKind::Finish)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Campaign {
    name: String,
    levels: Vec<Level>,
}

impl Campaign {
    pub fn new(name: impl Into<String>, levels: Vec<Level>) -> Self {
        Campaign { name: name.into(), levels }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn levels(&self) -> &[Level] {
        &self.levels
    }

    pub fn ids(&self) -> impl Iterator<Item = LevelId> {
        (0..self.levels.len()).map(LevelId)
    }

    pub fn level(&self, id: LevelId) -> Option<&Level> {
        self.levels.get(id.0)
    }

    pub fn level_mut(&mut self, id: LevelId) -> Option<&mut Level> {
        self.levels.get_mut(id.0)
    }

    /// Next level in sequence; `None` if `id` is the last one or unknown.
    pub fn level_after(&self, id: LevelId) -> Option<LevelId> {
        let next = id.0.checked_add(1)?;
        if id.0 < self.levels.len() && next < self.levels.len() {
            Some(LevelId(next))
        } else {
            None
        }
    }

    pub fn is_unlocked(&self, id: LevelId) -> bool {
        id.0 < self.unlocked_count()
    }

    /// Length of the unlocked prefix: completed levels plus the first incomplete one.
    pub fn unlocked_count(&self) -> usize {
        match self.levels.iter().position(|l| !l.is_completed()) {
            Some(first_open) => first_open + 1,
            None => self.levels.len(),
        }
    }

    pub fn completed_count(&self) -> usize {
        self.levels.iter().filter(|l| l.is_completed()).count()
    }

    pub fn is_completed(&self) -> bool {
        !self.levels.is_empty() && self.levels.iter().all(Level::is_completed)
    }

    /// First level the player has not solved yet, if any.
    pub fn first_open(&self) -> Option<LevelId> {
        self.levels.iter().position(|l| !l.is_completed()).map(LevelId)
    }
}
