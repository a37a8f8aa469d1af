//! Level entry sequence: field reveal followed by the pointer spawn blink.
//!
//! Timeline (delays are accumulated frame time, nothing sleeps):
//!
//!   t = 0                     cell (0,0)
//!   t = k · cell_delay        k-th cell in raster order (x outer, y inner)
//!   last cell + phase         pointer shown, normal colour
//!   … + phase                 pointer inverted
//!   … + phase                 pointer normal again → Done (input enabled)

use std::time::Duration;

use crate::domain::grid::Pos;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum RevealStep {
    Cell(Pos),
    Pointer { inverted: bool },
    Done,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Stage {
    Cells,
    Spawn(u8),
    Done,
}

#[derive(Clone, Debug)]
pub struct FieldReveal {
    width: usize,
    height: usize,
    shown: usize,
    stage: Stage,
    banked: Duration,
    due: Duration,
    cell_delay: Duration,
    spawn_phase: Duration,
    pointer: Option<bool>,
}

impl FieldReveal {
    pub fn new(width: usize, height: usize, cell_delay: Duration, spawn_phase: Duration) -> Self {
        FieldReveal {
            width,
            height,
            shown: 0,
            stage: Stage::Cells,
            banked: Duration::ZERO,
            due: Duration::ZERO,
            cell_delay,
            spawn_phase,
            pointer: None,
        }
    }

    /// Feed one frame's worth of time; returns everything that became due.
    pub fn advance(&mut self, dt: Duration) -> Vec<RevealStep> {
        let mut steps = vec![];
        self.banked += dt;
        while self.stage != Stage::Done && self.banked >= self.due {
            self.banked -= self.due;
            match self.stage {
                Stage::Cells => {
                    let pos = (self.shown / self.height, self.shown % self.height);
                    self.shown += 1;
                    steps.push(RevealStep::Cell(pos));
                    if self.shown >= self.total() {
                        self.stage = Stage::Spawn(0);
                        self.due = self.spawn_phase;
                    } else {
                        self.due = self.cell_delay;
                    }
                }
                Stage::Spawn(phase) => {
                    let inverted = phase == 1;
                    self.pointer = Some(inverted);
                    steps.push(RevealStep::Pointer { inverted });
                    if phase == 2 {
                        self.stage = Stage::Done;
                        steps.push(RevealStep::Done);
                    } else {
                        self.stage = Stage::Spawn(phase + 1);
                        self.due = self.spawn_phase;
                    }
                }
                Stage::Done => {}
            }
        }
        steps
    }

    fn total(&self) -> usize {
        self.width * self.height
    }

    pub fn is_done(&self) -> bool {
        self.stage == Stage::Done
    }

    /// Skip straight to the end state.
    pub fn finish(&mut self) {
        self.shown = self.total();
        self.pointer = Some(false);
        self.stage = Stage::Done;
    }

    pub fn is_revealed(&self, pos: Pos) -> bool {
        pos.0 * self.height + pos.1 < self.shown
    }

    pub fn revealed_count(&self) -> usize {
        self.shown
    }

    /// `None` before the spawn blink starts, else whether it is inverted.
    pub fn pointer_shade(&self) -> Option<bool> {
        self.pointer
    }
}
