//! Drawing target abstraction.
//!
//! Everything the game draws goes through `RenderSurface`, in pixel
//! coordinates of an unscaled field (one cell = `CELL_SIZE` px). The terminal
//! front end rasterizes these calls into character cells; tests record them.

#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);
    pub const WALL: Rgb = Rgb::new(40, 40, 40);
    pub const START_MARK: Rgb = Rgb::new(0, 128, 0);
    pub const POINTER: Rgb = Rgb::new(0x43, 0x9D, 0x1C);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Rgb { r, g, b }
    }

    /// Per-channel complement, used for the spawn blink.
    pub fn inverted(self) -> Rgb {
        Rgb::new(255 - self.r, 255 - self.g, 255 - self.b)
    }

    /// `#RRGGBB` (the leading `#` is optional).
    pub fn from_hex(s: &str) -> Option<Rgb> {
        let hex = s.strip_prefix('#').unwrap_or(s);
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        Some(Rgb::new(channel(0)?, channel(2)?, channel(4)?))
    }
}

/// (x, y) in field pixels.
pub type Point = (i32, i32);

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Rect { x, y, w, h }
    }

    pub fn contains(&self, p: Point) -> bool {
        p.0 >= self.x && p.0 < self.x + self.w && p.1 >= self.y && p.1 < self.y + self.h
    }
}

pub trait RenderSurface {
    fn fill_rect(&mut self, rect: Rect, color: Rgb);
    fn stroke_rect(&mut self, rect: Rect, color: Rgb);
    fn fill_polygon(&mut self, points: &[Point], color: Rgb);
    fn stroke_polygon(&mut self, points: &[Point], color: Rgb);
    /// Ellipse inscribed in `bounds`.
    fn fill_oval(&mut self, bounds: Rect, color: Rgb);
    fn stroke_oval(&mut self, bounds: Rect, color: Rgb);
    /// Back to the surface background.
    fn clear_rect(&mut self, rect: Rect);
    fn stroke_line(&mut self, from: Point, to: Point, width: i32, color: Rgb);
}

/// One recorded drawing call.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum DrawCmd {
    FillRect(Rect, Rgb),
    StrokeRect(Rect, Rgb),
    FillPolygon(Vec<Point>, Rgb),
    StrokePolygon(Vec<Point>, Rgb),
    FillOval(Rect, Rgb),
    StrokeOval(Rect, Rgb),
    ClearRect(Rect),
    Line { from: Point, to: Point, width: i32, color: Rgb },
}

/// Surface that only remembers what was asked of it.
#[derive(Default, Debug)]
pub struct RecordingSurface {
    pub commands: Vec<DrawCmd>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        RecordingSurface::default()
    }

    pub fn take(&mut self) -> Vec<DrawCmd> {
        std::mem::take(&mut self.commands)
    }

    pub fn lines(&self) -> Vec<(Point, Point)> {
        self.commands.iter().filter_map(|c| match c {
            DrawCmd::Line { from, to, .. } => Some((*from, *to)),
            _ => None,
        }).collect()
    }

    pub fn ovals(&self) -> Vec<(Rect, Rgb)> {
        self.commands.iter().filter_map(|c| match c {
            DrawCmd::FillOval(r, color) => Some((*r, *color)),
            _ => None,
        }).collect()
    }
}

impl RenderSurface for RecordingSurface {
    fn fill_rect(&mut self, rect: Rect, color: Rgb) {
        self.commands.push(DrawCmd::FillRect(rect, color));
    }

    fn stroke_rect(&mut self, rect: Rect, color: Rgb) {
        self.commands.push(DrawCmd::StrokeRect(rect, color));
    }

    fn fill_polygon(&mut self, points: &[Point], color: Rgb) {
        self.commands.push(DrawCmd::FillPolygon(points.to_vec(), color));
    }

    fn stroke_polygon(&mut self, points: &[Point], color: Rgb) {
        self.commands.push(DrawCmd::StrokePolygon(points.to_vec(), color));
    }

    fn fill_oval(&mut self, bounds: Rect, color: Rgb) {
        self.commands.push(DrawCmd::FillOval(bounds, color));
    }

    fn stroke_oval(&mut self, bounds: Rect, color: Rgb) {
        self.commands.push(DrawCmd::StrokeOval(bounds, color));
    }

    fn clear_rect(&mut self, rect: Rect) {
        self.commands.push(DrawCmd::ClearRect(rect));
    }

    fn stroke_line(&mut self, from: Point, to: Point, width: i32, color: Rgb) {
        self.commands.push(DrawCmd::Line { from, to, width, color });
    }
}
