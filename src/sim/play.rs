//! Gameplay engine: one level being played.
//!
//! ## Phases
//!
//!   Revealing ──(reveal Done)──▶ Idle ──(accepted step)──▶ Moving
//!                                 ▲  ▲                       │
//!                                 │  └──────(arrival)────────┤
//!                                 │                          ▼
//!                                 └──(next tick)──── CompletionPending
//!
//! Input (moves, undo, redo) is only taken in `Idle`. Each accepted step
//! runs on its own `FrameTimer`; on arrival the history is committed, the
//! grid is updated, completion is checked, and the timer is stopped. A
//! solved level arms the `LevelCompleted` task before that stop, so the
//! host receives it only once the step has fully ended. The tick after
//! that returns to `Idle`; the level stays completed and can still be
//! undone. Holding input back while the completed dialog is up is the
//! front end's job.
//!
//! ## Arrival effects
//!
//! ┌──────────────┬──────────────────────────────────────────────────────┐
//! │ Step          │ Effect                                              │
//! ├──────────────┼──────────────────────────────────────────────────────┤
//! │ forward/redo  │ trail += step line; destination visited             │
//! │ undo          │ trail -= last line; vacated cell visited = false    │
//! └──────────────┴──────────────────────────────────────────────────────┘
//!
//! Undo followed by redo restores grid, pointer and trail exactly.

use std::sync::mpsc::Sender;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::config::TimingConfig;
use crate::domain::grid::{Grid, Pos};
use crate::domain::history::{MoveHistory, PlannedStep};
use crate::domain::moves::Move;
use crate::domain::rules;
use crate::error::{PlayError, TimerError};
use crate::sim::event::{GameEvent, HostTask};
use crate::sim::level::Level;
use crate::sim::motion::{cell_origin, PointerMotion, Segment};
use crate::sim::reveal::{FieldReveal, RevealStep};
use crate::sim::timer::FrameTimer;
use crate::ui::surface::Point;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Phase {
    Revealing,
    Idle,
    Moving,
    CompletionPending,
}

#[derive(Debug)]
struct ActiveStep {
    plan: PlannedStep,
    motion: PointerMotion,
    timer: FrameTimer<HostTask>,
}

#[derive(Debug)]
pub struct Gameplay {
    timing: TimingConfig,
    tasks: Sender<HostTask>,
    phase: Phase,
    input_enabled: bool,
    pointer: Pos,
    history: MoveHistory,
    trail: Vec<Segment>,
    step: Option<ActiveStep>,
    reveal: FieldReveal,
    play_time: Duration,
}

impl Gameplay {
    /// Reset the level's progress and begin its reveal.
    pub fn start(level: &mut Level, timing: TimingConfig, tasks: Sender<HostTask>) -> Self {
        level.reset_progress();
        let grid = level.grid();
        // Levels are validated on load, a start cell always exists.
        let pointer = grid.start().unwrap_or_default();
        let reveal = FieldReveal::new(
            grid.width(),
            grid.height(),
            timing.cell_reveal(),
            timing.spawn_phase(),
        );
        info!(level = level.number(), width = grid.width(), height = grid.height(), "level started");
        Gameplay {
            timing,
            tasks,
            phase: Phase::Revealing,
            input_enabled: false,
            pointer,
            history: MoveHistory::new(),
            trail: vec![],
            step: None,
            reveal,
            play_time: Duration::ZERO,
        }
    }

    /// Start over on the same level. Ignored while completion is pending.
    pub fn restart(&mut self, level: &mut Level) {
        if self.phase == Phase::CompletionPending {
            return;
        }
        if let Some(mut step) = self.step.take() {
            step.timer.stop();
        }
        info!(level = level.number(), "level restarted");
        *self = Gameplay::start(level, self.timing.clone(), self.tasks.clone());
    }

    /// Jump to the end of the reveal sequence.
    pub fn skip_reveal(&mut self) -> Option<GameEvent> {
        if self.phase != Phase::Revealing {
            return None;
        }
        self.reveal.finish();
        Some(self.enable_input())
    }

    // ── Input ──

    pub fn accepts_input(&self) -> bool {
        self.input_enabled && self.phase == Phase::Idle && self.step.is_none()
    }

    pub fn request_move(&mut self, level: &Level, mv: Move) -> Option<GameEvent> {
        if !self.accepts_input() {
            return None;
        }
        let plan = self.history.fresh(mv);
        Some(self.begin_step(level.grid(), plan))
    }

    pub fn undo(&mut self, level: &Level) -> Option<GameEvent> {
        if !self.accepts_input() || self.trail.is_empty() {
            return None;
        }
        let plan = self.history.plan_undo()?;
        Some(self.begin_step(level.grid(), plan))
    }

    pub fn redo(&mut self, level: &Level) -> Option<GameEvent> {
        if !self.accepts_input() {
            return None;
        }
        let plan = self.history.plan_redo()?;
        Some(self.begin_step(level.grid(), plan))
    }

    fn begin_step(&mut self, grid: &Grid, plan: PlannedStep) -> GameEvent {
        let undoing = plan.cause.is_undo();
        let target = rules::step_target(grid, self.pointer, plan.animated, undoing);
        match target {
            Some(to) => {
                let mut timer = FrameTimer::new(self.tasks.clone());
                timer.start();
                debug!(cause = ?plan.cause, mv = ?plan.animated, from = ?self.pointer, ?to, "step started");
                let cause = plan.cause;
                self.step = Some(ActiveStep {
                    plan,
                    motion: PointerMotion::new(self.pointer, to, self.timing.move_speed, undoing),
                    timer,
                });
                self.phase = Phase::Moving;
                GameEvent::StepStarted { cause, from: self.pointer, to }
            }
            None => {
                debug!(cause = ?plan.cause, mv = ?plan.animated, at = ?self.pointer, "step rejected");
                GameEvent::StepRejected { cause: plan.cause, mv: plan.animated }
            }
        }
    }

    // ── Frame ──

    pub fn tick(&mut self, level: &mut Level, dt: Duration) -> Result<Vec<GameEvent>, TimerError<PlayError>> {
        let mut events = vec![];
        if self.phase != Phase::CompletionPending {
            self.play_time += dt;
        }
        match self.phase {
            Phase::Revealing => {
                if self.reveal.advance(dt).contains(&RevealStep::Done) {
                    events.push(self.enable_input());
                }
            }
            Phase::Moving => self.advance_step(level, dt, &mut events)?,
            Phase::CompletionPending => events.push(self.enable_input()),
            Phase::Idle => {}
        }
        Ok(events)
    }

    fn enable_input(&mut self) -> GameEvent {
        self.phase = Phase::Idle;
        self.input_enabled = true;
        debug!("input enabled");
        GameEvent::InputEnabled
    }

    fn advance_step(
        &mut self,
        level: &mut Level,
        dt: Duration,
        events: &mut Vec<GameEvent>,
    ) -> Result<(), TimerError<PlayError>> {
        let Some(step) = self.step.as_mut() else {
            self.phase = Phase::Idle;
            return Ok(());
        };
        let (width, height) = (level.grid().width(), level.grid().height());
        let motion = &mut step.motion;
        let result = step.timer.run_frame(dt, |_| {
            motion.advance();
            for (x, y) in [motion.from_cell(), motion.to_cell()] {
                if x >= width || y >= height {
                    return Err(PlayError::OutsideField { x, y, width, height });
                }
            }
            Ok(())
        });
        if let Err(e) = result {
            // history was never committed for this step
            warn!(error = %e, "step aborted");
            self.step = None;
            self.phase = Phase::Idle;
            return Err(e);
        }
        if step.motion.arrived() {
            if let Some(step) = self.step.take() {
                self.arrive(level, step, events);
            }
        }
        Ok(())
    }

    fn arrive(&mut self, level: &mut Level, mut step: ActiveStep, events: &mut Vec<GameEvent>) {
        if !self.history.commit(&step.plan) {
            warn!(cause = ?step.plan.cause, "history changed under a running step");
        }
        let (from, to) = (step.motion.from_cell(), step.motion.to_cell());
        let grid = level.grid_mut();
        if step.motion.is_undo() {
            grid.cell_at_mut(from.0, from.1).reset_visited();
            self.trail.pop();
        } else {
            self.trail.push(step.motion.completed_segment());
        }
        grid.cell_at_mut(to.0, to.1).mark_visited();
        self.pointer = to;
        events.push(GameEvent::Arrived { cause: step.plan.cause, at: to });

        if rules::is_level_complete(level.grid(), level.grid().kind_at(to)) {
            self.phase = Phase::CompletionPending;
            self.input_enabled = false;
            level.mark_completed();
            let moves = self.trail.len();
            info!(level = level.number(), moves, elapsed = ?self.play_time, "level completed");
            step.timer.set_end_action(HostTask::LevelCompleted { moves, elapsed: self.play_time });
            events.push(GameEvent::LevelSolved);
        } else {
            self.phase = Phase::Idle;
        }
        step.timer.stop();
    }

    // ── Queries ──

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Cell the pointer stands on (the start cell of a running step).
    pub fn pointer(&self) -> Pos {
        self.pointer
    }

    /// Pixel position of the pointer, mid-step included.
    pub fn pointer_pixel(&self) -> Point {
        match &self.step {
            Some(step) => step.motion.current(),
            None => cell_origin(self.pointer),
        }
    }

    /// `None` while hidden, else whether it is drawn inverted.
    pub fn pointer_shade(&self) -> Option<bool> {
        match self.phase {
            Phase::Revealing => self.reveal.pointer_shade(),
            _ => Some(false),
        }
    }

    pub fn trail(&self) -> &[Segment] {
        &self.trail
    }

    pub fn in_progress_segment(&self) -> Option<Segment> {
        self.step.as_ref().map(|s| s.motion.in_progress_segment())
    }

    pub fn reveal(&self) -> &FieldReveal {
        &self.reveal
    }

    pub fn history(&self) -> &MoveHistory {
        &self.history
    }

    /// Moves shown in the completed dialog: length of the walked path.
    pub fn moves(&self) -> usize {
        self.trail.len()
    }

    pub fn play_time(&self) -> Duration {
        self.play_time
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::grid::diagram;
    use crate::domain::moves::StepCause;
    use std::sync::mpsc::{self, Receiver};

    const DT: Duration = Duration::from_millis(16);

    fn setup(rows: &[&str]) -> (Level, Gameplay, Receiver<HostTask>) {
        let (tx, rx) = mpsc::channel();
        let mut level = Level::new("1", diagram(rows)).unwrap();
        let mut g = Gameplay::start(&mut level, TimingConfig::default(), tx);
        g.skip_reveal();
        (level, g, rx)
    }

    /// Tick until the running step ends; returns every event seen.
    fn settle(g: &mut Gameplay, level: &mut Level) -> Vec<GameEvent> {
        let mut events = vec![];
        for _ in 0..100 {
            if g.phase() != Phase::Moving {
                return events;
            }
            events.extend(g.tick(level, DT).unwrap());
        }
        panic!("step never settled");
    }

    fn step(g: &mut Gameplay, level: &mut Level, mv: Move) -> Vec<GameEvent> {
        let started = g.request_move(level, mv).expect("input accepted");
        let mut events = vec![started];
        events.extend(settle(g, level));
        events
    }

    fn visited(level: &Level) -> Vec<bool> {
        level.grid().cells().map(|(_, c)| c.is_visited()).collect()
    }

    // ── Reveal ──

    #[test]
    fn input_waits_for_reveal() {
        let (tx, _rx) = mpsc::channel();
        let mut level = Level::new("1", diagram(&["S.F"])).unwrap();
        let mut g = Gameplay::start(&mut level, TimingConfig::default(), tx);
        assert_eq!(g.phase(), Phase::Revealing);
        assert_eq!(g.request_move(&level, Move::Right), None);
        assert_eq!(g.pointer_shade(), None);

        let mut enabled = false;
        for _ in 0..100 {
            if g.tick(&mut level, DT).unwrap().contains(&GameEvent::InputEnabled) {
                enabled = true;
                break;
            }
        }
        assert!(enabled);
        assert!(g.accepts_input());
        assert_eq!(g.pointer_shade(), Some(false));
    }

    // ── End to end ──

    #[test]
    fn three_cell_level_end_to_end() {
        let (mut level, mut g, rx) = setup(&["S.F"]);

        let events = step(&mut g, &mut level, Move::Right);
        assert_eq!(events[0], GameEvent::StepStarted { cause: StepCause::KeyPressed, from: (0, 0), to: (1, 0) });
        assert!(events.contains(&GameEvent::Arrived { cause: StepCause::KeyPressed, at: (1, 0) }));
        assert_eq!(g.pointer(), (1, 0));
        assert!(level.grid().cell_at(1, 0).is_visited());
        assert!(!rules::is_level_complete(level.grid(), level.grid().kind_at(g.pointer())));
        assert_eq!(g.phase(), Phase::Idle);
        assert!(rx.try_recv().is_err());

        let events = step(&mut g, &mut level, Move::Right);
        assert!(events.contains(&GameEvent::LevelSolved));
        assert_eq!(g.pointer(), (2, 0));
        assert!(rules::is_level_complete(level.grid(), level.grid().kind_at(g.pointer())));
        assert_eq!(g.phase(), Phase::CompletionPending);
        assert!(level.is_completed());
        assert!(!g.accepts_input());

        match rx.try_recv() {
            Ok(HostTask::LevelCompleted { moves, elapsed }) => {
                assert_eq!(moves, 2);
                assert_eq!(elapsed, g.play_time());
            }
            other => panic!("expected LevelCompleted, got {other:?}"),
        }

        assert_eq!(g.tick(&mut level, DT).unwrap(), vec![GameEvent::InputEnabled]);
        assert_eq!(g.phase(), Phase::Idle);

        g.undo(&level).expect("undo after completion");
        settle(&mut g, &mut level);
        assert_eq!(g.pointer(), (1, 0));
        assert_eq!(g.history().redo_stack().snapshot(), vec![Move::Right]);
        assert_eq!(g.history().undo_stack().snapshot(), vec![Move::Right]);
        assert!(level.is_completed());
        // one-shot
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn completion_holds_input_until_the_next_tick() {
        let (mut level, mut g, _rx) = setup(&["SF"]);
        step(&mut g, &mut level, Move::Right);
        assert_eq!(g.phase(), Phase::CompletionPending);
        assert_eq!(g.undo(&level), None);
        assert_eq!(g.request_move(&level, Move::Left), None);
        g.restart(&mut level);
        assert_eq!(g.phase(), Phase::CompletionPending);

        let time = g.play_time();
        g.tick(&mut level, DT).unwrap();
        assert_eq!(g.play_time(), time);
        assert!(g.accepts_input());
        for _ in 0..50 {
            g.tick(&mut level, DT).unwrap();
        }
        assert_eq!(g.phase(), Phase::Idle);
    }

    #[test]
    fn redo_onto_finish_completes_again() {
        let (mut level, mut g, rx) = setup(&["SF"]);
        step(&mut g, &mut level, Move::Right);
        assert!(matches!(rx.try_recv(), Ok(HostTask::LevelCompleted { moves: 1, .. })));
        g.tick(&mut level, DT).unwrap();

        g.undo(&level).unwrap();
        settle(&mut g, &mut level);
        assert_eq!(g.pointer(), (0, 0));
        assert!(rx.try_recv().is_err());

        g.redo(&level).unwrap();
        let events = settle(&mut g, &mut level);
        assert!(events.contains(&GameEvent::LevelSolved));
        assert!(matches!(rx.try_recv(), Ok(HostTask::LevelCompleted { moves: 1, .. })));
    }

    // ── Undo / redo ──

    #[test]
    fn undo_returns_and_clears_vacated_cell() {
        let (mut level, mut g, _rx) = setup(&["S..F"]);
        step(&mut g, &mut level, Move::Right);
        step(&mut g, &mut level, Move::Right);
        assert_eq!(g.pointer(), (2, 0));

        let started = g.undo(&level).unwrap();
        assert_eq!(started, GameEvent::StepStarted { cause: StepCause::DoingUndo, from: (2, 0), to: (1, 0) });
        settle(&mut g, &mut level);

        assert_eq!(g.pointer(), (1, 0));
        assert!(!level.grid().cell_at(2, 0).is_visited());
        assert!(level.grid().cell_at(1, 0).is_visited());
        assert_eq!(g.trail().len(), 1);
        assert_eq!(g.history().redo_stack().snapshot(), vec![Move::Right]);
        assert_eq!(g.history().undo_stack().snapshot(), vec![Move::Right]);
    }

    #[test]
    fn undo_then_redo_is_identity() {
        let (mut level, mut g, _rx) = setup(&[
            "S..",
            "#.F",
        ]);
        step(&mut g, &mut level, Move::Right);
        step(&mut g, &mut level, Move::Down);

        let before = (visited(&level), g.pointer(), g.trail().to_vec());
        g.undo(&level).unwrap();
        settle(&mut g, &mut level);
        assert_ne!(g.pointer(), before.1);
        g.redo(&level).unwrap();
        settle(&mut g, &mut level);
        let after = (visited(&level), g.pointer(), g.trail().to_vec());

        assert_eq!(before, after);
        assert!(g.history().redo_stack().is_empty());
    }

    #[test]
    fn undoing_every_move_and_redoing_them_restores_the_walk() {
        let (mut level, mut g, _rx) = setup(&[
            "S...",
            "...F",
        ]);
        let walk = [Move::Down, Move::Right, Move::Up, Move::Right, Move::Down];
        let initial = visited(&level);
        for mv in walk {
            step(&mut g, &mut level, mv);
        }
        assert_eq!(g.pointer(), (2, 1));
        let walked = (visited(&level), g.pointer(), g.trail().to_vec());

        for _ in walk {
            g.undo(&level).expect("undo accepted");
            settle(&mut g, &mut level);
        }
        assert_eq!(g.pointer(), (0, 0));
        assert_eq!(visited(&level), initial);
        assert!(g.trail().is_empty());
        assert!(g.history().undo_stack().is_empty());
        let mut redo = g.history().redo_stack().snapshot();
        redo.reverse();
        assert_eq!(redo, walk);
        assert_eq!(g.undo(&level), None);

        for _ in walk {
            g.redo(&level).expect("redo accepted");
            settle(&mut g, &mut level);
        }
        assert_eq!((visited(&level), g.pointer(), g.trail().to_vec()), walked);
        assert_eq!(g.history().undo_stack().snapshot(), walk);
        assert!(g.history().redo_stack().is_empty());
    }

    #[test]
    fn fresh_move_clears_redo() {
        let (mut level, mut g, _rx) = setup(&[
            "S..",
            "..F",
        ]);
        step(&mut g, &mut level, Move::Right);
        g.undo(&level).unwrap();
        settle(&mut g, &mut level);
        assert_eq!(g.history().redo_stack().len(), 1);
        step(&mut g, &mut level, Move::Down);
        assert!(g.history().redo_stack().is_empty());
    }

    #[test]
    fn underflow_is_quiet() {
        let (level, mut g, _rx) = setup(&["S.F"]);
        assert_eq!(g.undo(&level), None);
        assert_eq!(g.redo(&level), None);
        assert_eq!(g.phase(), Phase::Idle);
    }

    // ── Rejection ──

    #[test]
    fn rejected_steps_leave_everything_untouched() {
        let (mut level, mut g, _rx) = setup(&[
            "S#F",
            ". .",
        ]);
        for mv in [Move::Up, Move::Left, Move::Right] {
            assert_eq!(
                g.request_move(&level, mv),
                Some(GameEvent::StepRejected { cause: StepCause::KeyPressed, mv }),
            );
        }
        assert!(g.history().undo_stack().is_empty());
        assert_eq!(g.phase(), Phase::Idle);

        // back onto the visited start is rejected as a fresh move
        step(&mut g, &mut level, Move::Down);
        assert!(matches!(g.request_move(&level, Move::Up), Some(GameEvent::StepRejected { .. })));
        // background
        assert!(matches!(g.request_move(&level, Move::Right), Some(GameEvent::StepRejected { .. })));
        assert_eq!(g.history().undo_stack().len(), 1);
    }

    #[test]
    fn input_ignored_while_moving() {
        let (mut level, mut g, _rx) = setup(&["S..F"]);
        g.request_move(&level, Move::Right).unwrap();
        g.tick(&mut level, DT).unwrap();
        assert_eq!(g.phase(), Phase::Moving);
        assert_eq!(g.request_move(&level, Move::Right), None);
        assert_eq!(g.undo(&level), None);
        assert_eq!(g.pointer_pixel(), (3, 0));
        assert!(g.in_progress_segment().is_some());
    }

    #[test]
    fn step_takes_cell_size_over_speed_frames() {
        let (mut level, mut g, _rx) = setup(&["S.F"]);
        g.request_move(&level, Move::Right).unwrap();
        let mut frames = 0;
        while g.phase() == Phase::Moving {
            g.tick(&mut level, DT).unwrap();
            frames += 1;
        }
        assert_eq!(frames, 15);
        assert_eq!(g.pointer_pixel(), (45, 0));
        assert_eq!(g.in_progress_segment(), None);
    }

    // ── Restart ──

    #[test]
    fn restart_resets_progress() {
        let (mut level, mut g, _rx) = setup(&["S..F"]);
        step(&mut g, &mut level, Move::Right);
        g.request_move(&level, Move::Right).unwrap();
        g.tick(&mut level, DT).unwrap();

        g.restart(&mut level);
        assert_eq!(g.phase(), Phase::Revealing);
        assert_eq!(g.pointer(), (0, 0));
        assert!(g.trail().is_empty());
        assert!(g.history().undo_stack().is_empty());
        assert_eq!(visited(&level), vec![true, false, false, false]);
        assert_eq!(g.play_time(), Duration::ZERO);
    }

    // ── Failure ──

    #[test]
    fn frame_error_stops_the_step() {
        let (mut level, mut g, rx) = setup(&["S.F"]);
        step(&mut g, &mut level, Move::Right);
        g.request_move(&level, Move::Right).unwrap();

        let mut narrow = Level::new("2", diagram(&["SF"])).unwrap();
        let err = g.tick(&mut narrow, DT).unwrap_err();
        assert_eq!(
            err,
            TimerError::Frame(PlayError::OutsideField { x: 2, y: 0, width: 2, height: 1 }),
        );
        assert_eq!(g.phase(), Phase::Idle);
        assert_eq!(g.pointer(), (1, 0));
        assert_eq!(g.history().undo_stack().snapshot(), vec![Move::Right]);
        assert!(g.history().redo_stack().is_empty());
        assert_eq!(g.trail().len(), 1);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn failed_undo_keeps_the_move_undoable() {
        let (mut level, mut g, _rx) = setup(&[
            "S..",
            "..F",
        ]);
        step(&mut g, &mut level, Move::Right);
        step(&mut g, &mut level, Move::Down);
        g.undo(&level).unwrap();

        let mut short = Level::new("2", diagram(&["S.F"])).unwrap();
        assert!(g.tick(&mut short, DT).is_err());
        assert_eq!(g.pointer(), (1, 1));
        assert_eq!(g.history().undo_stack().snapshot(), vec![Move::Right, Move::Down]);
        assert!(g.history().redo_stack().is_empty());
        assert_eq!(g.trail().len(), 2);
    }
}
