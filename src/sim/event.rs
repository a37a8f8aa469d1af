/// Events emitted during a gameplay tick, and tasks handed to the host.
///
/// `GameEvent`s are returned from `Gameplay::tick` and describe what
/// happened this frame. `HostTask`s travel through the host task queue
/// and are acted upon on the host's next loop iteration.

use std::time::Duration;

use crate::domain::grid::Pos;
use crate::domain::moves::{Move, StepCause};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GameEvent {
    StepStarted { cause: StepCause, from: Pos, to: Pos },
    StepRejected { cause: StepCause, mv: Move },
    Arrived { cause: StepCause, at: Pos },
    InputEnabled,
    LevelSolved,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HostTask {
    /// Shown to the player as the completed dialog.
    LevelCompleted { moves: usize, elapsed: Duration },
}

/// Seconds rounded to 4 significant digits, e.g. `12.35`, `1.000`, `1235`.
pub fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs_f64();
    if secs <= 0.0 {
        return "0.000".into();
    }
    let magnitude = secs.log10().floor() as i32;
    let decimals = 3 - magnitude;
    if decimals >= 0 {
        let scale = 10f64.powi(decimals);
        let rounded = (secs * scale).round() / scale;
        // rounding may carry into the next magnitude (9.9996 → 10.00)
        if rounded >= 10f64.powi(magnitude + 1) && decimals > 0 {
            format!("{:.*}", (decimals - 1) as usize, rounded)
        } else {
            format!("{:.*}", decimals as usize, rounded)
        }
    } else {
        let scale = 10f64.powi(-decimals);
        format!("{:.0}", (secs / scale).round() * scale)
    }
}
