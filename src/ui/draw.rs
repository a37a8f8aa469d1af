//! Field drawing: one dispatch over the cell kind, plus pointer and trail.
//!
//! All coordinates are field pixels; cell (col, row) covers
//! `[col*CELL_SIZE, (col+1)*CELL_SIZE)` on x and the same on y.

use crate::domain::cell::CellKind;
use crate::domain::grid::{Grid, Pos};
use crate::sim::level::Level;
use crate::sim::motion::{Segment, CELL_SIZE};
use crate::sim::play::Gameplay;
use crate::ui::surface::{Point, Rect, RenderSurface, Rgb};

pub const POINTER_SIZE: i32 = 25;
pub const TRAIL_WIDTH: i32 = 4;

const CHECKER: i32 = 4;

pub fn cell_rect(col: usize, row: usize) -> Rect {
    Rect::new(col as i32 * CELL_SIZE, row as i32 * CELL_SIZE, CELL_SIZE, CELL_SIZE)
}

/// Draw one cell. The only place that knows what each kind looks like.
pub fn draw_cell(surface: &mut dyn RenderSurface, kind: CellKind, col: usize, row: usize) {
    let rect = cell_rect(col, row);
    match kind {
        CellKind::Wall => {
            surface.fill_rect(rect, Rgb::WALL);
            surface.stroke_rect(rect, Rgb::BLACK);
        }
        CellKind::Empty => {
            surface.fill_rect(rect, Rgb::WHITE);
            surface.stroke_rect(rect, Rgb::BLACK);
        }
        CellKind::Finish => {
            surface.fill_rect(rect, Rgb::WHITE);
            let side = CELL_SIZE / CHECKER;
            for cx in 0..CHECKER {
                for cy in 0..CHECKER {
                    let square = Rect::new(rect.x + cx * side + 1, rect.y + cy * side + 1, side, side);
                    let color = if (cx + cy) % 2 == 0 { Rgb::BLACK } else { Rgb::WHITE };
                    surface.fill_rect(square, color);
                    surface.stroke_rect(square, Rgb::BLACK);
                }
            }
        }
        CellKind::Start => {
            surface.fill_rect(rect, Rgb::WHITE);
            surface.stroke_rect(rect, Rgb::BLACK);
            let triangle = start_triangle(rect);
            surface.fill_polygon(&triangle, Rgb::START_MARK);
            surface.stroke_polygon(&triangle, Rgb::BLACK);
        }
        CellKind::Background => {
            surface.clear_rect(rect);
            surface.stroke_rect(rect, Rgb::BLACK);
        }
    }
}

/// Start mark, relative to the cell origin.
const START_TRIANGLE: [Point; 3] = [(11, 11), (36, 22), (11, 34)];

fn start_triangle(rect: Rect) -> [Point; 3] {
    START_TRIANGLE.map(|(x, y)| (rect.x + x, rect.y + y))
}

/// Cells for which `revealed` holds, in raster order.
pub fn draw_field(surface: &mut dyn RenderSurface, grid: &Grid, revealed: impl Fn(Pos) -> bool) {
    for ((x, y), cell) in grid.cells() {
        if revealed((x, y)) {
            draw_cell(surface, cell.kind(), x, y);
        }
    }
}

/// Pointer disc for a pointer whose cell origin is `at`.
pub fn draw_pointer(surface: &mut dyn RenderSurface, at: Point, color: Rgb) {
    let offset = CELL_SIZE / 2 - POINTER_SIZE / 2;
    let bounds = Rect::new(at.0 + offset, at.1 + offset, POINTER_SIZE, POINTER_SIZE);
    surface.fill_oval(bounds, color);
    surface.stroke_oval(bounds, Rgb::BLACK);
}

fn center(p: Point) -> Point {
    (p.0 + CELL_SIZE / 2, p.1 + CELL_SIZE / 2)
}

/// Finished step lines first, the running one on top.
pub fn draw_trail(surface: &mut dyn RenderSurface, trail: &[Segment], running: Option<Segment>) {
    for seg in trail.iter().chain(running.iter()) {
        surface.stroke_line(center(seg.from), center(seg.to), TRAIL_WIDTH, Rgb::BLACK);
    }
}

/// A whole gameplay frame.
pub fn draw_gameplay(surface: &mut dyn RenderSurface, level: &Level, play: &Gameplay, pointer: Rgb) {
    let reveal = play.reveal();
    draw_field(surface, level.grid(), |pos| reveal.is_revealed(pos));
    draw_trail(surface, play.trail(), play.in_progress_segment());
    if let Some(inverted) = play.pointer_shade() {
        let color = if inverted { pointer.inverted() } else { pointer };
        draw_pointer(surface, play.pointer_pixel(), color);
    }
}
