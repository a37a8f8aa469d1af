//! Pointer move animation: pixel interpolation between two cells.
//!
//! Positions are the top-left pixel of a cell (`cell * CELL_SIZE`).
//! Each frame moves the pointer `speed` pixels toward the goal on each axis
//! that differs, clamped so it lands exactly on the goal.

use crate::domain::grid::Pos;
use crate::ui::surface::Point;

/// Edge length of one field cell in pixels.
pub const CELL_SIZE: i32 = 45;

pub fn cell_origin(pos: Pos) -> Point {
    (pos.0 as i32 * CELL_SIZE, pos.1 as i32 * CELL_SIZE)
}

/// A trail line between two cell origins.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Segment {
    pub from: Point,
    pub to: Point,
}

#[derive(Clone, Debug)]
pub struct PointerMotion {
    from: Pos,
    to: Pos,
    start: Point,
    current: Point,
    goal: Point,
    speed: i32,
    undoing: bool,
}

impl PointerMotion {
    pub fn new(from: Pos, to: Pos, speed: i32, undoing: bool) -> Self {
        let start = cell_origin(from);
        PointerMotion {
            from,
            to,
            start,
            current: start,
            goal: cell_origin(to),
            speed: speed.max(1),
            undoing,
        }
    }

    /// One frame of movement.
    pub fn advance(&mut self) {
        self.current.0 = approach(self.current.0, self.goal.0, self.speed);
        self.current.1 = approach(self.current.1, self.goal.1, self.speed);
    }

    pub fn arrived(&self) -> bool {
        self.current == self.goal
    }

    pub fn from_cell(&self) -> Pos {
        self.from
    }

    pub fn to_cell(&self) -> Pos {
        self.to
    }

    pub fn current(&self) -> Point {
        self.current
    }

    pub fn goal(&self) -> Point {
        self.goal
    }

    pub fn is_undo(&self) -> bool {
        self.undoing
    }

    /// The part of the step line visible this frame.
    /// Forward: the line grows behind the pointer. Undo: it shrinks ahead of it.
    pub fn in_progress_segment(&self) -> Segment {
        if self.undoing {
            Segment { from: self.current, to: self.goal }
        } else {
            Segment { from: self.start, to: self.current }
        }
    }

    /// Full line of this step, kept in the trail after a forward arrival.
    pub fn completed_segment(&self) -> Segment {
        Segment { from: self.start, to: self.goal }
    }
}

fn approach(current: i32, goal: i32, speed: i32) -> i32 {
    if current < goal {
        (current + speed).min(goal)
    } else if current > goal {
        (current - speed).max(goal)
    } else {
        current
    }
}
