/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. Build the next frame into `front` buffer (array of Cell)
///   2. Compare each cell with `back` buffer (previous frame)
///   3. Only emit terminal commands for cells that changed
///   4. All commands are batched with `queue!`, flushed once at the end
///   5. Swap front/back
///
/// The field itself is drawn through `RenderSurface` onto a `PixelCanvas`
/// and packed into half-block glyphs, two subpixel rows per terminal row.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::sim::event::format_elapsed;
use crate::sim::level::LevelId;
use crate::sim::session::{SceneId, Session};
use crate::ui::canvas::{PixelCanvas, SUB};
use crate::ui::draw::draw_gameplay;
use crate::ui::locale::Localizer;
use crate::ui::screen::Screen;
use crate::ui::surface::Rgb;

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
struct Cell {
    ch: char,
    fg: Color,
    bg: Color,
}

impl Cell {
    /// Explicit dark background for all "empty" terminal cells.
    ///
    /// Using the same RGB for `Clear(ClearType::All)` and every cell's
    /// background keeps the inter-row gap on VTE terminals the same colour
    /// as the cells.
    const BASE_BG: Color = Color::Rgb { r: 22, g: 22, b: 35 };

    const BLANK: Cell = Cell { ch: ' ', fg: Color::White, bg: Cell::BASE_BG };

    /// Sentinel cell used to invalidate the back buffer.
    const INVALID: Cell = Cell { ch: '?', fg: Color::Magenta, bg: Color::Magenta };

    /// Normalize bg: Color::Reset → BASE_BG.
    #[inline]
    fn norm_bg(bg: Color) -> Color {
        match bg {
            Color::Reset => Self::BASE_BG,
            other => other,
        }
    }

    fn from_char(ch: char, fg: Color, bg: Color) -> Self {
        Cell { ch, fg, bg: Self::norm_bg(bg) }
    }
}

fn color(rgb: Rgb) -> Color {
    Color::Rgb { r: rgb.r, g: rgb.g, b: rgb.b }
}

// ── FrameBuffer: a 2D grid of Cells ──

struct FrameBuffer {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl FrameBuffer {
    fn new(w: usize, h: usize) -> Self {
        FrameBuffer { width: w, height: h, cells: vec![Cell::BLANK; w * h] }
    }

    fn resize(&mut self, w: usize, h: usize) {
        if self.width != w || self.height != h {
            self.width = w;
            self.height = h;
            self.cells = vec![Cell::BLANK; w * h];
        }
    }

    fn clear(&mut self) {
        self.cells.fill(Cell::BLANK);
    }

    fn set(&mut self, x: usize, y: usize, cell: Cell) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = cell;
        }
    }

    fn get(&self, x: usize, y: usize) -> Cell {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x]
        } else {
            Cell::BLANK
        }
    }

    /// Write a string at (x, y). Each char occupies 1 column.
    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) {
        for (i, ch) in s.chars().enumerate() {
            if x + i >= self.width {
                break;
            }
            self.set(x + i, y, Cell::from_char(ch, fg, bg));
        }
    }

    fn put_centered(&mut self, y: usize, s: &str, fg: Color, bg: Color) {
        let x = self.width.saturating_sub(s.chars().count()) / 2;
        self.put_str(x, y, s, fg, bg);
    }

    fn fill(&mut self, x: usize, y: usize, w: usize, h: usize, bg: Color) {
        for row in y..y + h {
            for col in x..x + w {
                self.set(col, row, Cell::from_char(' ', Color::White, bg));
            }
        }
    }

    /// Pack a subpixel canvas into half blocks with its top-left at (x, y).
    fn blit(&mut self, canvas: &PixelCanvas, x: usize, y: usize) {
        let shade = |px: Option<Rgb>| px.map_or(Cell::BASE_BG, color);
        for ty in 0..canvas.height().div_ceil(2) {
            for cx in 0..canvas.width() {
                let top = shade(canvas.pixel(cx, 2 * ty));
                let bottom = shade(canvas.pixel(cx, 2 * ty + 1));
                let cell = if top == bottom {
                    Cell::from_char(' ', Color::White, bottom)
                } else {
                    Cell::from_char('▀', top, bottom)
                };
                self.set(x + cx, y + ty, cell);
            }
        }
    }

    #[cfg(test)]
    fn row_text(&self, y: usize) -> String {
        (0..self.width).map(|x| self.get(x, y).ch).collect()
    }
}

// ── Renderer ──

const HUD_ROW: usize = 0;
const MAP_ROW: usize = 2;

const TITLE: [&str; 4] = [
    r" ___  _      _  _____  ___  ___ ",
    r"| _ \| |    /_\|_   _|| __|/ __|",
    r"|  _/| |__ / _ \ | |  | _| \__ \",
    r"|_|  |____/_/ \_\|_|  |___||___/",
];

const GOLD: Color = Color::Rgb { r: 255, g: 200, b: 50 };
const HI: Color = Color::Rgb { r: 80, g: 255, b: 80 };
const CURSOR_BG: Color = Color::Rgb { r: 30, g: 60, b: 30 };
const HUD_BG: Color = Color::Rgb { r: 20, g: 20, b: 60 };
const DIALOG_BG: Color = Color::Rgb { r: 40, g: 40, b: 40 };
const ERROR_FG: Color = Color::Rgb { r: 220, g: 90, b: 90 };

/// Everything a frame is drawn from.
pub struct View<'a> {
    pub screen: &'a Screen,
    pub session: &'a Session,
    pub strings: &'a Localizer,
    pub pointer: Rgb,
}

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
    last_scene: Option<SceneId>,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
            last_scene: None,
        }
    }

    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            SetBackgroundColor(Cell::BASE_BG),
            Clear(ClearType::All)
        )?;

        let (tw, th) = terminal::size().unwrap_or((80, 24));
        self.term_w = tw as usize;
        self.term_h = th as usize;
        self.front.resize(self.term_w, self.term_h);
        self.back.resize(self.term_w, self.term_h);
        // Force full repaint on first frame: back ≠ front for every cell.
        self.back.cells.fill(Cell::INVALID);

        Ok(())
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        execute!(self.writer, ResetColor, cursor::Show, terminal::LeaveAlternateScreen)?;
        terminal::disable_raw_mode()
    }

    pub fn render(&mut self, view: &View) -> io::Result<()> {
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.term_w = tw as usize;
            self.term_h = th as usize;
            self.front.resize(self.term_w, self.term_h);
            self.back.resize(self.term_w, self.term_h);
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
        }

        // Scene change → clear for clean transition
        let scene = view.screen.scene();
        if self.last_scene != Some(scene) {
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
            self.last_scene = Some(scene);
        }

        self.compose(view);
        self.flush_diff()?;
        std::mem::swap(&mut self.front, &mut self.back);
        Ok(())
    }

    fn compose(&mut self, view: &View) {
        self.front.clear();
        match view.screen.scene() {
            SceneId::MainMenu => self.compose_main_menu(view),
            SceneId::CampaignSelect => self.compose_campaign_select(view),
            SceneId::LevelSelect => self.compose_level_select(view),
            SceneId::GamePlay => {
                self.compose_game(view);
                if view.screen.confirm_exit() {
                    self.compose_exit_overlay(view);
                }
            }
            SceneId::LevelCompleted => {
                self.compose_game(view);
                self.compose_completed_dialog(view);
            }
            SceneId::CampaignCompleted => self.compose_campaign_completed(view),
        }
    }

    // ── Diff flush: only write changed cells ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = Cell::BASE_BG;
        let mut need_move = true;
        let mut last_x: usize = 0;
        let mut last_y: usize = 0;

        // Explicit base colors; ResetColor would fall back to the terminal default.
        queue!(self.writer, SetForegroundColor(Color::White), SetBackgroundColor(Cell::BASE_BG))?;

        for y in 0..self.front.height {
            for x in 0..self.front.width {
                let cell = self.front.get(x, y);
                if cell == self.back.get(x, y) {
                    need_move = true;
                    continue;
                }

                if need_move || x != last_x + 1 || y != last_y {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                    need_move = false;
                }
                if cell.fg != last_fg {
                    queue!(self.writer, SetForegroundColor(cell.fg))?;
                    last_fg = cell.fg;
                }
                if cell.bg != last_bg {
                    queue!(self.writer, SetBackgroundColor(cell.bg))?;
                    last_bg = cell.bg;
                }
                queue!(self.writer, Print(cell.ch))?;
                last_x = x;
                last_y = y;
            }
        }

        self.writer.flush()
    }

    // ── Compose: build front buffer content ──

    fn compose_main_menu(&mut self, view: &View) {
        for (i, line) in TITLE.iter().enumerate() {
            self.front.put_centered(2 + i, line, GOLD, Color::Reset);
        }
        let items = [view.strings.get("menu.play"), view.strings.get("menu.quit")];
        for (i, item) in items.iter().enumerate() {
            let row = 9 + i * 2;
            if i == view.screen.cursor() {
                self.front.put_centered(row, &format!("▸ {item} ◂"), HI, CURSOR_BG);
            } else {
                self.front.put_centered(row, item, Color::White, Color::Reset);
            }
        }
    }

    fn compose_list_header(&mut self, title: &str) {
        self.front.put_str(2, 1, title, GOLD, Color::Reset);
        let rule: String = "─".repeat(title.chars().count().max(24));
        self.front.put_str(2, 2, &rule, GOLD, Color::Reset);
    }

    fn compose_row(&mut self, row: usize, text: &str, selected: bool, fg: Color) {
        if selected {
            self.front.fill(0, row, 56.min(self.front.width), 1, CURSOR_BG);
            self.front.put_str(2, row, "▸", HI, CURSOR_BG);
            self.front.put_str(4, row, text, HI, CURSOR_BG);
        } else {
            self.front.put_str(4, row, text, fg, Color::Reset);
        }
    }

    fn compose_campaign_select(&mut self, view: &View) {
        self.compose_list_header(view.strings.get("campaign.title"));
        for (i, slot) in view.session.campaigns().iter().enumerate() {
            let row = 4 + i;
            let selected = i == view.screen.cursor();
            match slot.campaign() {
                Ok(c) => {
                    let text = format!("{:<16} {}/{}", slot.name(), c.completed_count(), c.len());
                    self.compose_row(row, &text, selected, Color::White);
                }
                Err(e) => {
                    let text = format!("{:<16} {}: {e}", slot.name(), view.strings.get("campaign.blocked"));
                    self.compose_row(row, &text, selected, ERROR_FG);
                }
            }
        }
        let footer = 5 + view.session.campaigns().len();
        self.front.put_str(2, footer, view.strings.get("hint.back"), Color::DarkGrey, Color::Reset);
    }

    fn compose_level_select(&mut self, view: &View) {
        let Some(campaign) = view.session.campaign() else { return };
        self.compose_list_header(&format!("{}: {}", view.strings.get("level.title"), campaign.name()));

        let list_top = 4;
        let visible = self.front.height.saturating_sub(list_top + 2).max(1);
        let cursor = view.screen.cursor();
        let scroll = cursor.saturating_sub(visible - 1);

        for (i, id) in campaign.ids().skip(scroll).take(visible).enumerate() {
            let Some(level) = campaign.level(id) else { continue };
            let status = if level.is_completed() {
                view.strings.get("level.done")
            } else if !campaign.is_unlocked(id) {
                view.strings.get("level.locked")
            } else {
                ""
            };
            let text = format!("{:>3}. {} {:<4} {status}", id.index() + 1, view.strings.get("hud.level"), level.number());
            let fg = if campaign.is_unlocked(id) { Color::White } else { Color::DarkGrey };
            self.compose_row(list_top + i, &text, id == LevelId(cursor), fg);
        }

        let footer = list_top + visible.min(campaign.len()) + 1;
        self.front.put_str(2, footer, view.strings.get("hint.back"), Color::DarkGrey, Color::Reset);
    }

    fn compose_game(&mut self, view: &View) {
        let buf_w = self.front.width;
        let (Some(level), Some(play)) = (view.session.level(), view.session.gameplay()) else { return };

        // ── HUD row ──
        let hud = format!(
            " {} {}   {} {}   {} {:.1}",
            view.strings.get("hud.level"), level.number(),
            view.strings.get("hud.moves"), play.moves(),
            view.strings.get("hud.time"), play.play_time().as_secs_f32(),
        );
        self.front.fill(0, HUD_ROW, buf_w, 1, HUD_BG);
        self.front.put_str(0, HUD_ROW, &hud, Color::White, HUD_BG);

        // ── Field ──
        let grid = level.grid();
        let cols = grid.width() * SUB as usize;
        let rows = grid.height() * SUB as usize / 2;
        if cols > buf_w || MAP_ROW + rows + 2 > self.front.height {
            self.front.put_centered(MAP_ROW + 1, view.strings.get("term.small"), ERROR_FG, Color::Reset);
            return;
        }
        let mut canvas = PixelCanvas::for_field(grid.width(), grid.height());
        draw_gameplay(&mut canvas, level, play, view.pointer);
        self.front.blit(&canvas, (buf_w - cols) / 2, MAP_ROW);

        // ── Help bar ──
        self.front.put_centered(MAP_ROW + rows + 1, view.strings.get("hud.help"), Color::DarkGrey, Color::Reset);
    }

    /// Dark box centred on screen; returns its top-left corner.
    fn compose_box(&mut self, w: usize, h: usize) -> (usize, usize) {
        let w = w.min(self.front.width);
        let h = h.min(self.front.height);
        let x = (self.front.width - w) / 2;
        let y = (self.front.height - h) / 2;
        self.front.fill(x, y, w, h, DIALOG_BG);
        (x, y)
    }

    fn compose_exit_overlay(&mut self, view: &View) {
        let (_, y) = self.compose_box(36, 5);
        self.front.put_centered(y + 1, view.strings.get("exit.title"), GOLD, DIALOG_BG);
        self.front.put_centered(y + 3, view.strings.get("exit.hint"), Color::White, DIALOG_BG);
    }

    fn compose_completed_dialog(&mut self, view: &View) {
        let s = view.strings;
        let (_, y) = self.compose_box(40, 9);
        self.front.put_centered(y + 1, s.get("completed.title"), GOLD, DIALOG_BG);
        if let Some(result) = view.screen.result() {
            let moves = format!("{}: {}", s.get("completed.moves"), result.moves);
            let time = format!("{}: {}", s.get("completed.time"), format_elapsed(result.elapsed));
            self.front.put_centered(y + 3, &moves, Color::White, DIALOG_BG);
            self.front.put_centered(y + 4, &time, Color::White, DIALOG_BG);
        }
        let buttons = [s.get("completed.next"), s.get("completed.menu")];
        let labels: Vec<String> = buttons.iter().map(|b| format!("[ {b} ]")).collect();
        let total = labels.iter().map(|l| l.chars().count()).sum::<usize>() + 2;
        let mut x = self.front.width.saturating_sub(total) / 2;
        for (i, label) in labels.iter().enumerate() {
            let (fg, bg) = if i == view.screen.cursor() { (HI, CURSOR_BG) } else { (Color::White, DIALOG_BG) };
            self.front.put_str(x, y + 6, label, fg, bg);
            x += label.chars().count() + 2;
        }
    }

    fn compose_campaign_completed(&mut self, view: &View) {
        let mid = self.front.height / 2;
        let name = view.session.campaign().map(|c| c.name()).unwrap_or_default();
        self.front.put_centered(mid.saturating_sub(2), name, Color::DarkGrey, Color::Reset);
        self.front.put_centered(mid, view.strings.get("campaign.done"), HI, Color::Reset);
        self.front.put_centered(mid + 2, view.strings.get("campaign.done.hint"), Color::White, Color::Reset);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TimingConfig;
    use crate::sim::pack::{embedded_pack, XmlFileStore};
    use crate::ui::input::Command;
    use std::sync::mpsc;

    fn frame(screen: &Screen, session: &Session) -> Renderer {
        let strings = Localizer::default();
        let mut r = Renderer::new();
        r.front.resize(80, 40);
        r.compose(&View { screen, session, strings: &strings, pointer: Rgb::POINTER });
        r
    }

    fn session() -> Session {
        let (tx, _rx) = mpsc::channel();
        let mut session = Session::new(TimingConfig::default(), tx);
        let store = XmlFileStore::new("/nonexistent/plates/classic.xml").with_fallback(embedded_pack("classic"));
        session.add_campaign("classic", Box::new(store));
        session
    }

    fn contains(r: &Renderer, text: &str) -> bool {
        (0..r.front.height).any(|y| r.front.row_text(y).contains(text))
    }

    #[test]
    fn main_menu_marks_cursor() {
        let screen = Screen::new();
        let r = frame(&screen, &session());
        assert!(contains(&r, "▸ Play ◂"));
        assert!(contains(&r, "Quit"));
    }

    #[test]
    fn level_select_shows_locks() {
        let mut screen = Screen::new();
        let mut s = session();
        screen.handle(&mut s, Command::Confirm);
        screen.handle(&mut s, Command::Confirm);
        let r = frame(&screen, &s);
        assert!(contains(&r, "classic"));
        assert!(contains(&r, "locked"));
    }

    #[test]
    fn gameplay_has_hud_and_field() {
        let mut screen = Screen::new();
        let mut s = session();
        for cmd in [Command::Confirm, Command::Confirm, Command::Confirm, Command::Confirm] {
            screen.handle(&mut s, cmd);
        }
        assert_eq!(screen.scene(), SceneId::GamePlay);
        let r = frame(&screen, &s);
        assert!(r.front.row_text(HUD_ROW).contains("Moves 0"));
        let field_drawn = (0..r.front.width).any(|x| r.front.get(x, MAP_ROW).bg != Cell::BASE_BG);
        assert!(field_drawn);
    }

    #[test]
    fn exit_overlay_on_cancel() {
        let mut screen = Screen::new();
        let mut s = session();
        for cmd in [Command::Confirm, Command::Confirm, Command::Confirm, Command::Cancel] {
            screen.handle(&mut s, cmd);
        }
        let r = frame(&screen, &s);
        assert!(contains(&r, "Leave this level?"));
    }

    #[test]
    fn blit_packs_two_rows() {
        let mut buf = FrameBuffer::new(SUB as usize, SUB as usize / 2);
        let mut canvas = PixelCanvas::for_field(1, 1);
        crate::ui::draw::draw_cell(&mut canvas, crate::domain::cell::CellKind::Wall, 0, 0);
        buf.blit(&canvas, 0, 0);
        // top row: outline above, wall below
        assert_eq!(buf.get(3, 0), Cell::from_char('▀', color(Rgb::BLACK), color(Rgb::WALL)));
        assert_eq!(buf.get(3, 1), Cell::from_char(' ', Color::White, color(Rgb::WALL)));
    }
}
