/// Subpixel raster behind the terminal field view.
///
/// Field pixels are scaled down to `SUB` subpixels per cell edge; the
/// renderer then packs two subpixel rows into one terminal row with
/// half-block glyphs, so a cell is `SUB` columns by `SUB / 2` rows.
///
/// A subpixel belongs to a shape when its centre (in field pixels) does.
/// One-pixel outlines cannot be drawn at this scale, so they become the
/// top/left subpixel edge of the shape, and are dropped for shapes too
/// small to keep any fill inside the outline.

use std::ops::Range;

use crate::sim::motion::CELL_SIZE;
use crate::ui::surface::{Point, Rect, RenderSurface, Rgb};

pub const SUB: i32 = 6;

/// Shapes narrower than this (in subpixels) are drawn without outline.
const MIN_OUTLINED: i32 = 5;

#[derive(Clone, Debug)]
pub struct PixelCanvas {
    width: i32,
    height: i32,
    px: Vec<Option<Rgb>>,
}

fn to_sub(p: i32) -> f32 {
    p as f32 * SUB as f32 / CELL_SIZE as f32
}

/// Centre of subpixel `i`, in field pixels.
fn centre(i: i32) -> f32 {
    (i as f32 + 0.5) * CELL_SIZE as f32 / SUB as f32
}

/// Subpixels whose centre lies in `[start, start + len)` field pixels.
fn span(start: i32, len: i32) -> Range<i32> {
    let first = (to_sub(start) - 0.5).ceil() as i32;
    let end = (to_sub(start + len) - 0.5).ceil() as i32;
    first..end.max(first)
}

impl PixelCanvas {
    /// Canvas for a field of `cols` x `rows` cells.
    pub fn for_field(cols: usize, rows: usize) -> Self {
        let width = cols as i32 * SUB;
        let height = rows as i32 * SUB;
        PixelCanvas { width, height, px: vec![None; (width * height) as usize] }
    }

    pub fn width(&self) -> usize {
        self.width as usize
    }

    pub fn height(&self) -> usize {
        self.height as usize
    }

    /// `None` is background (never drawn, or cleared).
    pub fn pixel(&self, x: usize, y: usize) -> Option<Rgb> {
        if x < self.width() && y < self.height() {
            self.px[y * self.width() + x]
        } else {
            None
        }
    }

    fn set(&mut self, x: i32, y: i32, color: Option<Rgb>) {
        if x >= 0 && y >= 0 && x < self.width && y < self.height {
            self.px[(y * self.width + x) as usize] = color;
        }
    }

    fn fill_where(&mut self, bounds: Rect, color: Option<Rgb>, inside: impl Fn(f32, f32) -> bool) {
        for y in span(bounds.y, bounds.h) {
            for x in span(bounds.x, bounds.w) {
                if inside(centre(x), centre(y)) {
                    self.set(x, y, color);
                }
            }
        }
    }

    fn outlined(bounds: Rect) -> Option<(Range<i32>, Range<i32>)> {
        let xs = span(bounds.x, bounds.w);
        let ys = span(bounds.y, bounds.h);
        (xs.len() as i32 >= MIN_OUTLINED && ys.len() as i32 >= MIN_OUTLINED).then_some((xs, ys))
    }
}

fn bounding(points: &[Point]) -> Rect {
    let (mut x0, mut y0, mut x1, mut y1) = (i32::MAX, i32::MAX, i32::MIN, i32::MIN);
    for &(x, y) in points {
        x0 = x0.min(x);
        y0 = y0.min(y);
        x1 = x1.max(x);
        y1 = y1.max(y);
    }
    if points.is_empty() {
        return Rect::new(0, 0, 0, 0);
    }
    Rect::new(x0, y0, x1 - x0 + 1, y1 - y0 + 1)
}

/// Even-odd point-in-polygon test.
fn in_polygon(points: &[Point], x: f32, y: f32) -> bool {
    let mut inside = false;
    let mut j = points.len().wrapping_sub(1);
    for i in 0..points.len() {
        let (xi, yi) = (points[i].0 as f32, points[i].1 as f32);
        let (xj, yj) = (points[j].0 as f32, points[j].1 as f32);
        if (yi > y) != (yj > y) && x < (xj - xi) * (y - yi) / (yj - yi) + xi {
            inside = !inside;
        }
        j = i;
    }
    inside
}

fn in_oval(b: Rect, x: f32, y: f32) -> bool {
    let (rx, ry) = (b.w as f32 / 2.0, b.h as f32 / 2.0);
    if rx <= 0.0 || ry <= 0.0 {
        return false;
    }
    let dx = (x - (b.x as f32 + rx)) / rx;
    let dy = (y - (b.y as f32 + ry)) / ry;
    dx * dx + dy * dy <= 1.0
}

impl RenderSurface for PixelCanvas {
    fn fill_rect(&mut self, rect: Rect, color: Rgb) {
        self.fill_where(rect, Some(color), |_, _| true);
    }

    fn stroke_rect(&mut self, rect: Rect, color: Rgb) {
        let Some((xs, ys)) = PixelCanvas::outlined(rect) else { return };
        for x in xs.clone() {
            self.set(x, ys.start, Some(color));
            if ys.end >= self.height {
                self.set(x, ys.end - 1, Some(color));
            }
        }
        for y in ys.clone() {
            self.set(xs.start, y, Some(color));
            if xs.end >= self.width {
                self.set(xs.end - 1, y, Some(color));
            }
        }
    }

    fn fill_polygon(&mut self, points: &[Point], color: Rgb) {
        self.fill_where(bounding(points), Some(color), |x, y| in_polygon(points, x, y));
    }

    fn stroke_polygon(&mut self, points: &[Point], color: Rgb) {
        if PixelCanvas::outlined(bounding(points)).is_none() {
            return;
        }
        for i in 0..points.len() {
            let next = points[(i + 1) % points.len()];
            self.stroke_line(points[i], next, 1, color);
        }
    }

    fn fill_oval(&mut self, bounds: Rect, color: Rgb) {
        self.fill_where(bounds, Some(color), |x, y| in_oval(bounds, x, y));
    }

    fn stroke_oval(&mut self, bounds: Rect, color: Rgb) {
        if PixelCanvas::outlined(bounds).is_none() {
            return;
        }
        let step = CELL_SIZE / SUB + 1;
        let inner = Rect::new(bounds.x + step, bounds.y + step, bounds.w - 2 * step, bounds.h - 2 * step);
        self.fill_where(bounds, Some(color), |x, y| in_oval(bounds, x, y) && !in_oval(inner, x, y));
    }

    fn clear_rect(&mut self, rect: Rect) {
        self.fill_where(rect, None, |_, _| true);
    }

    fn stroke_line(&mut self, from: Point, to: Point, width: i32, color: Rgb) {
        let thick = ((to_sub(width)).round() as i32).max(1);
        let (x0, y0) = (to_sub(from.0), to_sub(from.1));
        let (x1, y1) = (to_sub(to.0), to_sub(to.1));
        let steps = (x1 - x0).abs().max((y1 - y0).abs()).ceil().max(1.0) as i32;
        for s in 0..=steps {
            let t = s as f32 / steps as f32;
            let x = (x0 + (x1 - x0) * t).floor() as i32;
            let y = (y0 + (y1 - y0) * t).floor() as i32;
            for dy in 0..thick {
                for dx in 0..thick {
                    self.set(x + dx, y + dy, Some(color));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cell::CellKind;
    use crate::ui::draw::{draw_cell, draw_pointer};

    fn row(c: &PixelCanvas, y: usize) -> Vec<Option<Rgb>> {
        (0..c.width()).map(|x| c.pixel(x, y)).collect()
    }

    #[test]
    fn cell_maps_to_sub_by_sub_block() {
        assert_eq!(span(0, 45), 0..6);
        assert_eq!(span(45, 45), 6..12);
        assert_eq!(span(1, 11), 0..2);
    }

    #[test]
    fn empty_cell_has_top_left_outline() {
        let mut c = PixelCanvas::for_field(2, 1);
        draw_cell(&mut c, CellKind::Empty, 0, 0);
        assert_eq!(c.pixel(0, 0), Some(Rgb::BLACK));
        assert_eq!(c.pixel(0, 3), Some(Rgb::BLACK));
        assert_eq!(c.pixel(3, 3), Some(Rgb::WHITE));
        // right edge is the neighbour's outline
        assert_eq!(c.pixel(5, 3), Some(Rgb::WHITE));
        assert_eq!(c.pixel(6, 3), None);
    }

    #[test]
    fn field_border_is_closed() {
        let mut c = PixelCanvas::for_field(1, 1);
        draw_cell(&mut c, CellKind::Wall, 0, 0);
        assert_eq!(c.pixel(5, 3), Some(Rgb::BLACK));
        assert_eq!(c.pixel(3, 5), Some(Rgb::BLACK));
        assert_eq!(c.pixel(3, 3), Some(Rgb::WALL));
    }

    #[test]
    fn background_clears() {
        let mut c = PixelCanvas::for_field(1, 1);
        c.fill_rect(Rect::new(0, 0, 45, 45), Rgb::WHITE);
        draw_cell(&mut c, CellKind::Background, 0, 0);
        assert_eq!(c.pixel(3, 3), None);
    }

    #[test]
    fn finish_checker_alternates() {
        let mut c = PixelCanvas::for_field(1, 1);
        draw_cell(&mut c, CellKind::Finish, 0, 0);
        let r = row(&c, 3);
        assert!(r.contains(&Some(Rgb::BLACK)));
        assert!(r.contains(&Some(Rgb::WHITE)));
    }

    #[test]
    fn pointer_disc_is_centred_and_unoutlined() {
        let mut c = PixelCanvas::for_field(1, 1);
        draw_pointer(&mut c, (0, 0), Rgb::POINTER);
        assert_eq!(c.pixel(2, 2), Some(Rgb::POINTER));
        assert_eq!(c.pixel(3, 3), Some(Rgb::POINTER));
        assert_eq!(c.pixel(0, 0), None);
        assert_eq!(c.pixel(5, 5), None);
    }

    #[test]
    fn start_triangle_is_filled() {
        let mut c = PixelCanvas::for_field(1, 1);
        draw_cell(&mut c, CellKind::Start, 0, 0);
        assert_eq!(c.pixel(2, 2), Some(Rgb::START_MARK));
    }

    #[test]
    fn line_covers_both_ends() {
        let mut c = PixelCanvas::for_field(2, 1);
        c.stroke_line((22, 22), (67, 22), 4, Rgb::BLACK);
        assert_eq!(c.pixel(2, 2), Some(Rgb::BLACK));
        assert_eq!(c.pixel(8, 2), Some(Rgb::BLACK));
        assert_eq!(c.pixel(10, 2), None);
    }

    #[test]
    fn out_of_range_is_background() {
        let c = PixelCanvas::for_field(1, 1);
        assert_eq!(c.pixel(99, 0), None);
    }
}
