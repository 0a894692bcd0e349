/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. Compose the next frame into `front` (a grid of terminal cells)
///   2. Compare each cell with `back` (the previous frame)
///   3. Print only the changed cells, in same-colour runs, batched with `queue!`
///   4. Flush once, then swap front/back
///
/// The frame is a pure function of the `WorldState` snapshot: each grid cell
/// is two terminal columns wide so emoji glyphs line up.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::domain::grid::Position;
use crate::domain::treasure::TreasureKind;
use crate::sim::world::{TurnPhase, WorldState};

// ── Cells ──

/// Terminal columns covered by a cell's glyph.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Span {
    Narrow,
    /// Emoji head; the next column holds its `Tail`.
    Wide,
    /// Right half of a wide glyph. Never printed on its own.
    Tail,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
struct Cell {
    glyph: char,
    fg: Color,
    bg: Color,
    span: Span,
}

impl Cell {
    /// Explicit background for every cell, so terminal defaults never show through.
    const BASE_BG: Color = Color::Rgb { r: 24, g: 20, b: 30 };

    const BLANK: Cell = Cell::narrow(' ', Color::White, Cell::BASE_BG);

    /// Never composed; a buffer filled with it repaints completely.
    const STALE: Cell = Cell::narrow('\0', Color::Magenta, Color::Magenta);

    const fn narrow(glyph: char, fg: Color, bg: Color) -> Self {
        Cell { glyph, fg, bg, span: Span::Narrow }
    }

    const fn wide(glyph: char, bg: Color) -> Self {
        Cell { glyph, fg: Color::White, bg, span: Span::Wide }
    }

    const fn tail(bg: Color) -> Self {
        Cell { glyph: ' ', fg: Color::White, bg, span: Span::Tail }
    }

    fn columns(&self) -> usize {
        if self.span == Span::Wide { 2 } else { 1 }
    }
}

// ── Frame ──

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
        if (self.width, self.height) != (w, h) {
            *self = FrameBuffer::new(w, h);
        }
    }

    fn clear(&mut self) {
        self.cells.fill(Cell::BLANK);
    }

    fn invalidate(&mut self) {
        self.cells.fill(Cell::STALE);
    }

    fn row(&self, y: usize) -> &[Cell] {
        &self.cells[y * self.width..(y + 1) * self.width]
    }

    fn set(&mut self, x: usize, y: usize, cell: Cell) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = cell;
        }
    }

    #[cfg(test)]
    fn get(&self, x: usize, y: usize) -> Cell {
        self.row(y)[x]
    }

    /// One column per char; clipped at the right edge.
    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) {
        for (i, ch) in s.chars().enumerate() {
            self.set(x + i, y, Cell::narrow(ch, fg, bg));
        }
    }

    /// Both halves or nothing.
    fn put_wide(&mut self, x: usize, y: usize, c: char, bg: Color) {
        if x + 1 < self.width {
            self.set(x, y, Cell::wide(c, bg));
            self.set(x + 1, y, Cell::tail(bg));
        }
    }

    fn put_pair(&mut self, x: usize, y: usize, c: char, fg: Color, bg: Color) {
        self.set(x, y, Cell::narrow(c, fg, bg));
        self.set(x + 1, y, Cell::narrow(c, fg, bg));
    }

    fn fill_row(&mut self, y: usize, bg: Color) {
        for x in 0..self.width {
            self.set(x, y, Cell::narrow(' ', Color::White, bg));
        }
    }
}

// ── Diff ──

/// Write the cells of `front` that differ from `back`.
///
/// Changed cells are grouped into runs that share a row, adjacency and
/// colours, and each run goes out as a single `Print`. A wide glyph is
/// repainted when either of its halves changed.
fn write_diff<W: Write>(out: &mut W, front: &FrameBuffer, back: &FrameBuffer) -> io::Result<()> {
    let mut fg = Color::White;
    let mut bg = Cell::BASE_BG;
    queue!(out, SetForegroundColor(fg), SetBackgroundColor(bg))?;

    let mut run = String::new();
    for y in 0..front.height {
        let (now, before) = (front.row(y), back.row(y));
        // Column the terminal cursor is known to sit on, within this row.
        let mut at: Option<usize> = None;
        let mut x = 0;
        while x < now.len() {
            let cell = now[x];
            if cell.span == Span::Tail {
                x += 1;
                continue;
            }
            let end = (x + cell.columns()).min(now.len());
            if now[x..end] == before[x..end] {
                print_run(out, &mut run)?;
                at = None;
                x = end;
                continue;
            }

            if at != Some(x) {
                print_run(out, &mut run)?;
                queue!(out, MoveTo(x as u16, y as u16))?;
            }
            if cell.fg != fg || cell.bg != bg {
                print_run(out, &mut run)?;
                if cell.fg != fg {
                    fg = cell.fg;
                    queue!(out, SetForegroundColor(fg))?;
                }
                if cell.bg != bg {
                    bg = cell.bg;
                    queue!(out, SetBackgroundColor(bg))?;
                }
            }
            run.push(cell.glyph);
            x = end;
            at = Some(x);
        }
        print_run(out, &mut run)?;
    }
    out.flush()
}

fn print_run<W: Write>(out: &mut W, run: &mut String) -> io::Result<()> {
    if !run.is_empty() {
        queue!(out, Print(run.as_str()))?;
        run.clear();
    }
    Ok(())
}

// ── Sprites ──

/// What occupies one grid cell on screen.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Sprite {
    Excavator(TurnPhase),
    Dirt,
    Treasure(TreasureKind),
    Hole,
}

fn sprite_at(w: &WorldState, pos: Position) -> Sprite {
    if pos == w.position {
        return Sprite::Excavator(w.phase);
    }
    match w.grid.cell_at(pos) {
        Some(c) if !c.dug => Sprite::Dirt,
        Some(c) => c.revealed().map_or(Sprite::Hole, Sprite::Treasure),
        None => Sprite::Hole,
    }
}

// ── Layout ──

const CELL_W: usize = 2;
const TITLE_ROW: usize = 0;
const SCORE_ROW: usize = 1;
const MAP_ROW: usize = 3;
const MAP_COL: usize = 2;

const HUD_BG: Color = Color::Rgb { r: 161, g: 98, b: 7 };
const SKY_BG: Color = Color::Rgb { r: 56, g: 150, b: 220 };
const DIRT_BG: Color = Color::Rgb { r: 120, g: 72, b: 30 };
const DIRT_FG: Color = Color::Rgb { r: 170, g: 110, b: 50 };
const HOLE_BG: Color = Color::Rgb { r: 60, g: 36, b: 14 };
const MSG_BG: Color = Color::Rgb { r: 34, g: 170, b: 80 };

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
    last_game_over: Option<bool>,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
            last_game_over: None,
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
        self.back.invalidate();
        Ok(())
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        execute!(self.writer, ResetColor, cursor::Show, terminal::LeaveAlternateScreen)?;
        terminal::disable_raw_mode()
    }

    pub fn render(&mut self, world: &WorldState, pad_connected: bool) -> io::Result<()> {
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.term_w = tw as usize;
            self.term_h = th as usize;
            self.front.resize(self.term_w, self.term_h);
            self.back.resize(self.term_w, self.term_h);
            self.back.invalidate();
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
        }

        // Overlay appears/disappears: repaint everything
        if self.last_game_over != Some(world.game_over) {
            self.back.invalidate();
            self.last_game_over = Some(world.game_over);
        }

        self.front.clear();
        let need_w = MAP_COL * 2 + world.grid.width * CELL_W;
        let need_h = MAP_ROW + world.grid.height + 4;
        if self.term_w < need_w || self.term_h < need_h {
            self.compose_too_small(need_w, need_h);
        } else {
            self.compose_game(world, pad_connected);
            if world.game_over {
                self.compose_win_overlay(world);
            }
        }

        write_diff(&mut self.writer, &self.front, &self.back)?;
        std::mem::swap(&mut self.front, &mut self.back);
        Ok(())
    }

    // ── Compose ──

    fn compose_game(&mut self, w: &WorldState, pad_connected: bool) {
        // Title
        self.front.fill_row(TITLE_ROW, HUD_BG);
        self.front.put_str(MAP_COL, TITLE_ROW, "DIGGY DIGGY EXCAVATOR", Color::Rgb { r: 253, g: 224, b: 71 }, HUD_BG);

        // Score: found kinds in discovery order
        self.front.fill_row(SCORE_ROW, HUD_BG);
        if w.found.is_empty() {
            self.front.put_str(MAP_COL, SCORE_ROW, "Dig to find treasures!", Color::Rgb { r: 254, g: 240, b: 138 }, HUD_BG);
        } else {
            let label = "Treasures Found! ";
            self.front.put_str(MAP_COL, SCORE_ROW, label, Color::White, HUD_BG);
            let mut col = MAP_COL + label.len();
            for kind in w.found.iter() {
                self.front.put_wide(col, SCORE_ROW, kind.glyph(), HUD_BG);
                col += CELL_W + 1;
            }
            let tally = format!("{}/{}", w.found.len(), w.treasure_goal);
            self.front.put_str(col + 1, SCORE_ROW, &tally, Color::White, HUD_BG);
        }

        // Sky strip above the dig site
        for x in 0..w.grid.width * CELL_W {
            self.front.set(MAP_COL + x, MAP_ROW - 1, Cell::narrow(' ', Color::White, SKY_BG));
        }

        // Grid
        for gy in 0..w.grid.height {
            for gx in 0..w.grid.width {
                let col = MAP_COL + gx * CELL_W;
                let row = MAP_ROW + gy;
                self.compose_cell(w, Position::new(gx, gy), col, row);
            }
        }

        // Message bar
        let msg_row = MAP_ROW + w.grid.height + 1;
        if !w.message.is_empty() {
            self.front.fill_row(msg_row, MSG_BG);
            let msg = format!(" {} ", w.message);
            self.front.put_str(MAP_COL, msg_row, &msg, Color::White, MSG_BG);
        }

        // Help bar
        let help_row = MAP_ROW + w.grid.height + 3;
        let help = if pad_connected {
            " ←↑→↓/WASD: Move  Space/Enter: Dig  R: New game  Q: Quit  │  Pad: A Dig  Start New"
        } else {
            " ←↑→↓/WASD: Move  Space/Enter: Dig  R: New game  Q: Quit"
        };
        self.front.put_str(0, help_row, help, Color::DarkGrey, Cell::BASE_BG);
    }

    fn compose_cell(&mut self, w: &WorldState, pos: Position, col: usize, row: usize) {
        match sprite_at(w, pos) {
            Sprite::Excavator(phase) => {
                let bg = match phase {
                    TurnPhase::Idle => HOLE_BG,
                    TurnPhase::Moving => Color::Rgb { r: 90, g: 60, b: 25 },
                    // Shake: alternate shades while the bucket works
                    TurnPhase::Digging => {
                        if (w.clock_ms / 60) % 2 == 0 { DIRT_BG } else { HOLE_BG }
                    }
                };
                let bg = match w.current_cell() {
                    Some(c) if !c.dug && phase == TurnPhase::Idle => DIRT_BG,
                    _ => bg,
                };
                self.front.put_wide(col, row, '🚜', bg);
            }
            Sprite::Dirt => {
                self.front.put_pair(col, row, '▓', DIRT_FG, DIRT_BG);
            }
            Sprite::Treasure(kind) => {
                self.front.put_wide(col, row, kind.glyph(), HOLE_BG);
            }
            Sprite::Hole => {
                self.front.put_pair(col, row, ' ', Color::White, HOLE_BG);
            }
        }
    }

    fn compose_win_overlay(&mut self, w: &WorldState) {
        let box_art = [
            "╔════════════════════════════╗",
            "║         YOU WON!           ║",
            "║ You found all the treasures║",
            "║                            ║",
            "║  ENTER / R:  Play Again    ║",
            "╚════════════════════════════╝",
        ];
        let box_w = box_art[0].chars().count();
        let grid_cols = w.grid.width * CELL_W;
        let x = (MAP_COL + grid_cols / 2).saturating_sub(box_w / 2);
        let y = MAP_ROW + w.grid.height.saturating_sub(box_art.len()) / 2;
        let bg = Color::Rgb { r: 250, g: 250, b: 250 };
        for (i, line) in box_art.iter().enumerate() {
            self.front.put_str(x, y + i, line, Color::Rgb { r: 234, g: 179, b: 8 }, bg);
        }
    }

    fn compose_too_small(&mut self, need_w: usize, need_h: usize) {
        let msg = format!("Terminal too small: need {}x{}", need_w, need_h);
        self.front.put_str(0, 0, &msg, Color::Red, Cell::BASE_BG);
    }
}
