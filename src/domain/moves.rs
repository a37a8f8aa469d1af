//! Moves and the reasons a step is taken.

#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum Move {
    Up,
    Left,
    Down,
    Right,
}

impl Move {
    pub const ALL: [Move; 4] = [Move::Up, Move::Left, Move::Down, Move::Right];

    /// Geometric inverse: the move that walks the same edge back.
    pub fn inverse(self) -> Move {
        match self {
            Move::Up    => Move::Down,
            Move::Down  => Move::Up,
            Move::Left  => Move::Right,
            Move::Right => Move::Left,
        }
    }

    /// Grid delta (dx, dy); y grows downward.
    pub fn delta(self) -> (i32, i32) {
        match self {
            Move::Up    => (0, -1),
            Move::Left  => (-1, 0),
            Move::Down  => (0, 1),
            Move::Right => (1, 0),
        }
    }
}

/// Why a step is being animated. Decides how the undo/redo stacks change
/// once the step is accepted.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum StepCause {
    /// Fresh input from a key or button.
    KeyPressed,
    DoingUndo,
    DoingRedo,
}

impl StepCause {
    pub fn is_undo(self) -> bool {
        self == StepCause::DoingUndo
    }
}
