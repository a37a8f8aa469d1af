//! Step rules and completion rule — truth-table driven.
//!
//! Pure functions over the grid — no side effects.
//! These encode "what is legal" without performing the step.
//!
//! ## Step Truth Table
//!
//! Evaluated top to bottom; the first matching row decides.
//!
//! ┌───────────────────────────────┬─────────┬──────────────────────────┐
//! │ Condition                      │ Allow?  │ Notes                    │
//! ├───────────────────────────────┼─────────┼──────────────────────────┤
//! │ Target off the grid            │ DENY    │ checked before contents  │
//! │ Target is Wall                 │ DENY    │                          │
//! │ Target is Background           │ DENY    │ behaves like a wall      │
//! │ Target visited, forward step   │ DENY    │ each plate only once     │
//! │ Target visited, undo step      │ ALLOW   │ retracing the walked path│
//! │ Otherwise                      │ ALLOW   │                          │
//! └───────────────────────────────┴─────────┴──────────────────────────┘
//!
//! ## Completion
//!
//! ┌───────────────────────────────┬───────────┐
//! │ Condition                      │ Solved?   │
//! ├───────────────────────────────┼───────────┤
//! │ pointer not on Finish          │ NO        │
//! │ any Empty/Finish unvisited     │ NO        │
//! │ otherwise                      │ YES       │
//! └───────────────────────────────┴───────────┘
//!
//! Start is never part of the "must be visited" set: the player begins on it.

use super::cell::CellKind;
use super::grid::{Grid, Pos};
use super::moves::Move;

/// Cell reached by applying `mv` at `from`, or `None` if it would leave the grid.
pub fn target_of(grid: &Grid, from: Pos, mv: Move) -> Option<Pos> {
    let (dx, dy) = mv.delta();
    let x = from.0 as i64 + dx as i64;
    let y = from.1 as i64 + dy as i64;
    if x < 0 || y < 0 || x >= grid.width() as i64 || y >= grid.height() as i64 {
        return None;
    }
    Some((x as usize, y as usize))
}

/// May the pointer step onto `target`?
///
/// `target` comes from `target_of`; `None` means the step would leave the grid
/// and is rejected without looking at any cell.
pub fn can_step(grid: &Grid, target: Option<Pos>, undoing: bool) -> bool {
    let Some((x, y)) = target else { return false };
    let Some(cell) = grid.get(x, y) else { return false };
    if !cell.is_traversable() {
        return false;
    }
    !cell.is_visited() || undoing
}

/// Convenience: resolve and validate a move in one call.
pub fn step_target(grid: &Grid, from: Pos, mv: Move, undoing: bool) -> Option<Pos> {
    let target = target_of(grid, from, mv);
    if can_step(grid, target, undoing) { target } else { None }
}

/// Is the level solved with the pointer standing on a cell of `current`?
pub fn is_level_complete(grid: &Grid, current: CellKind) -> bool {
    if current != CellKind::Finish {
        return false;
    }
    grid.cells()
        .filter(|(_, c)| c.kind().must_visit())
        .all(|(_, c)| c.is_visited())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::grid::diagram;

    // ── Bounds ──

    #[test]
    fn off_grid_targets_are_none() {
        let g = diagram(&[
            "S.",
            ".F",
        ]);
        assert_eq!(target_of(&g, (0, 0), Move::Up), None);
        assert_eq!(target_of(&g, (0, 0), Move::Left), None);
        assert_eq!(target_of(&g, (1, 1), Move::Down), None);
        assert_eq!(target_of(&g, (1, 1), Move::Right), None);
        assert_eq!(target_of(&g, (0, 0), Move::Right), Some((1, 0)));
        assert_eq!(target_of(&g, (0, 0), Move::Down), Some((0, 1)));
    }

    #[test]
    fn off_grid_rejected_even_when_undoing() {
        let g = diagram(&["SF"]);
        assert!(!can_step(&g, None, false));
        assert!(!can_step(&g, None, true));
    }

    // ── Cell kinds ──

    #[test]
    fn walls_and_background_always_rejected() {
        let g = diagram(&["S# F"]);
        assert!(!can_step(&g, Some((1, 0)), false));
        assert!(!can_step(&g, Some((1, 0)), true));
        assert!(!can_step(&g, Some((2, 0)), false));
        assert!(!can_step(&g, Some((2, 0)), true));
    }

    #[test]
    fn fresh_plates_accepted() {
        let g = diagram(&["S.F"]);
        assert!(can_step(&g, Some((1, 0)), false));
        assert!(can_step(&g, Some((2, 0)), false));
    }

    // ── Visited ──

    #[test]
    fn visited_blocks_forward_but_not_undo() {
        let mut g = diagram(&["S.F"]);
        g.cell_at_mut(1, 0).mark_visited();
        assert!(!can_step(&g, Some((1, 0)), false));
        assert!(can_step(&g, Some((1, 0)), true));
        // start is visited from the beginning
        assert!(!can_step(&g, Some((0, 0)), false));
        assert!(can_step(&g, Some((0, 0)), true));
    }

    #[test]
    fn step_target_combines_both() {
        let g = diagram(&["S#F"]);
        assert_eq!(step_target(&g, (0, 0), Move::Right, false), None);
        assert_eq!(step_target(&g, (0, 0), Move::Left, false), None);
    }

    // ── Completion ──

    #[test]
    fn complete_requires_finish_under_pointer() {
        let mut g = diagram(&["S.F"]);
        g.cell_at_mut(1, 0).mark_visited();
        g.cell_at_mut(2, 0).mark_visited();
        assert!(!is_level_complete(&g, CellKind::Empty));
        assert!(is_level_complete(&g, CellKind::Finish));
    }

    #[test]
    fn one_unvisited_plate_blocks_completion() {
        let mut g = diagram(&[
            "S.F",
            "#..",
        ]);
        g.cell_at_mut(1, 0).mark_visited();
        g.cell_at_mut(1, 1).mark_visited();
        g.cell_at_mut(2, 0).mark_visited();
        assert!(!is_level_complete(&g, CellKind::Finish));

        g.cell_at_mut(2, 1).mark_visited();
        assert!(is_level_complete(&g, CellKind::Finish));
    }

    #[test]
    fn start_is_not_required() {
        let mut g = diagram(&["S.F"]);
        g.cell_at_mut(0, 0).reset_visited();
        g.cell_at_mut(1, 0).mark_visited();
        g.cell_at_mut(2, 0).mark_visited();
        assert!(is_level_complete(&g, CellKind::Finish));
    }

    #[test]
    fn walls_never_counted() {
        let mut g = diagram(&["S##  F"]);
        g.cell_at_mut(5, 0).mark_visited();
        assert!(is_level_complete(&g, CellKind::Finish));
    }
}
