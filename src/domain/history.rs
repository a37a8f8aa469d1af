//! Undo / redo bookkeeping.
//!
//! Two LIFO stacks of moves. Every stack call is individually locked;
//! the only compound operation is `pop_if`, which replaces the racy
//! "peek, validate, then pop" sequence with a single locked check.
//!
//! ## Stack transfers per step cause (applied only once a step is accepted)
//!
//! ┌──────────────┬───────────────────┬──────────────────────────────────────┐
//! │ Cause         │ Animated move     │ Stacks after acceptance              │
//! ├──────────────┼───────────────────┼──────────────────────────────────────┤
//! │ KeyPressed    │ the fresh move    │ undo.push(move); redo.clear()        │
//! │ DoingRedo     │ redo top          │ redo.pop() → undo.push(move)         │
//! │ DoingUndo     │ inverse(undo top) │ undo.pop() → redo.push(original)     │
//! └──────────────┴───────────────────┴──────────────────────────────────────┘

use std::sync::{Mutex, MutexGuard};

use super::moves::{Move, StepCause};

#[derive(Debug, Default)]
pub struct MoveStack {
    items: Mutex<Vec<Move>>,
}

impl MoveStack {
    pub fn new() -> Self {
        MoveStack { items: Mutex::new(Vec::new()) }
    }

    // A poisoned lock only means another thread panicked mid-push;
    // the Vec itself is still consistent.
    fn lock(&self) -> MutexGuard<'_, Vec<Move>> {
        self.items.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn push(&self, mv: Move) {
        self.lock().push(mv);
    }

    /// `None` on empty, never panics.
    pub fn pop(&self) -> Option<Move> {
        self.lock().pop()
    }

    /// Non-destructive look at the top.
    pub fn peek(&self) -> Option<Move> {
        self.lock().last().copied()
    }

    /// Pop the top only if it still equals `expected`.
    pub fn pop_if(&self, expected: Move) -> bool {
        let mut items = self.lock();
        if items.last() == Some(&expected) {
            items.pop();
            true
        } else {
            false
        }
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Copy of the contents, bottom first.
    pub fn snapshot(&self) -> Vec<Move> {
        self.lock().clone()
    }
}

/// A step chosen by the history but not yet accepted by the rules.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct PlannedStep {
    pub cause: StepCause,
    /// Move the pointer will actually perform.
    pub animated: Move,
    /// Move as stored on the stacks (differs from `animated` for undo).
    pub recorded: Move,
}

#[derive(Debug, Default)]
pub struct MoveHistory {
    undo: MoveStack,
    redo: MoveStack,
}

impl MoveHistory {
    pub fn new() -> Self {
        MoveHistory::default()
    }

    pub fn undo_stack(&self) -> &MoveStack {
        &self.undo
    }

    pub fn redo_stack(&self) -> &MoveStack {
        &self.redo
    }

    pub fn fresh(&self, mv: Move) -> PlannedStep {
        PlannedStep { cause: StepCause::KeyPressed, animated: mv, recorded: mv }
    }

    /// Next undo step, or `None` when there is nothing to undo.
    pub fn plan_undo(&self) -> Option<PlannedStep> {
        self.undo.peek().map(|mv| PlannedStep {
            cause: StepCause::DoingUndo,
            animated: mv.inverse(),
            recorded: mv,
        })
    }

    /// Next redo step, or `None` when there is nothing to redo.
    pub fn plan_redo(&self) -> Option<PlannedStep> {
        self.redo.peek().map(|mv| PlannedStep {
            cause: StepCause::DoingRedo,
            animated: mv,
            recorded: mv,
        })
    }

    /// Apply the stack transfer for an accepted step.
    ///
    /// Returns false if the stack top changed since the step was planned;
    /// the stacks are then left untouched.
    pub fn commit(&self, step: &PlannedStep) -> bool {
        match step.cause {
            StepCause::KeyPressed => {
                self.undo.push(step.recorded);
                self.redo.clear();
                true
            }
            StepCause::DoingRedo => {
                if self.redo.pop_if(step.recorded) {
                    self.undo.push(step.recorded);
                    true
                } else {
                    false
                }
            }
            StepCause::DoingUndo => {
                if self.undo.pop_if(step.recorded) {
                    self.redo.push(step.recorded);
                    true
                } else {
                    false
                }
            }
        }
    }

    pub fn clear(&self) {
        self.undo.clear();
        self.redo.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_stack_is_quiet() {
        let s = MoveStack::new();
        assert_eq!(s.pop(), None);
        assert_eq!(s.peek(), None);
        assert!(!s.pop_if(Move::Up));
        assert_eq!(s.len(), 0);
    }

    #[test]
    fn lifo_order() {
        let s = MoveStack::new();
        s.push(Move::Up);
        s.push(Move::Left);
        assert_eq!(s.peek(), Some(Move::Left));
        assert_eq!(s.len(), 2);
        assert_eq!(s.pop(), Some(Move::Left));
        assert_eq!(s.pop(), Some(Move::Up));
        assert!(s.is_empty());
    }

    #[test]
    fn pop_if_checks_top() {
        let s = MoveStack::new();
        s.push(Move::Down);
        assert!(!s.pop_if(Move::Up));
        assert_eq!(s.len(), 1);
        assert!(s.pop_if(Move::Down));
        assert!(s.is_empty());
    }

    #[test]
    fn fresh_move_clears_redo() {
        let h = MoveHistory::new();
        h.redo_stack().push(Move::Left);
        assert!(h.commit(&h.fresh(Move::Right)));
        assert_eq!(h.undo_stack().snapshot(), vec![Move::Right]);
        assert!(h.redo_stack().is_empty());
    }

    #[test]
    fn undo_animates_inverse_but_stores_original() {
        let h = MoveHistory::new();
        h.commit(&h.fresh(Move::Up));
        let step = h.plan_undo().unwrap();
        assert_eq!(step.animated, Move::Down);
        assert_eq!(step.recorded, Move::Up);
        assert!(h.commit(&step));
        assert!(h.undo_stack().is_empty());
        assert_eq!(h.redo_stack().snapshot(), vec![Move::Up]);
    }

    #[test]
    fn redo_transfers_back() {
        let h = MoveHistory::new();
        h.commit(&h.fresh(Move::Left));
        h.commit(&h.plan_undo().unwrap());
        let step = h.plan_redo().unwrap();
        assert_eq!(step.animated, Move::Left);
        assert!(h.commit(&step));
        assert_eq!(h.undo_stack().snapshot(), vec![Move::Left]);
        assert!(h.redo_stack().is_empty());
    }

    #[test]
    fn underflow_plans_nothing() {
        let h = MoveHistory::new();
        assert_eq!(h.plan_undo(), None);
        assert_eq!(h.plan_redo(), None);
    }

    #[test]
    fn stale_plan_is_not_committed() {
        let h = MoveHistory::new();
        h.commit(&h.fresh(Move::Up));
        let step = h.plan_undo().unwrap();
        // someone else changed the top in between
        h.undo_stack().push(Move::Left);
        assert!(!h.commit(&step));
        assert_eq!(h.undo_stack().snapshot(), vec![Move::Up, Move::Left]);
        assert!(h.redo_stack().is_empty());
    }

    #[test]
    fn stacks_are_shareable_across_threads() {
        let s = std::sync::Arc::new(MoveStack::new());
        let handles: Vec<_> = (0..4).map(|_| {
            let s = std::sync::Arc::clone(&s);
            std::thread::spawn(move || {
                for _ in 0..100 {
                    s.push(Move::Right);
                }
            })
        }).collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(s.len(), 400);
    }
}
