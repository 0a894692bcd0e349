/// The dig site: a flat, row-major grid of dirt piles.
///
/// Cells are created once per session. The only runtime mutation is
/// `Cell::dug` flipping false → true, which also reveals the treasure.

use super::sampler::{self, SessionRng};
use super::treasure::TreasureKind;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Cell {
    pub id: usize,
    pub treasure: Option<TreasureKind>,
    pub dug: bool,
}

impl Cell {
    pub fn new(id: usize) -> Self {
        Cell { id, treasure: None, dug: false }
    }

    /// Treasure visible to the player (only once dug).
    pub fn revealed(&self) -> Option<TreasureKind> {
        if self.dug { self.treasure } else { None }
    }
}

/// Movement direction, one cell per action.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct Position {
    pub x: usize,
    pub y: usize,
}

impl Position {
    pub const ORIGIN: Position = Position { x: 0, y: 0 };

    pub fn new(x: usize, y: usize) -> Self {
        Position { x, y }
    }

    /// One step in `dir`, clamped to a `width × height` area.
    /// Stepping into an edge leaves that axis unchanged.
    pub fn step(self, dir: Direction, width: usize, height: usize) -> Position {
        let max_x = width.saturating_sub(1);
        let max_y = height.saturating_sub(1);
        match dir {
            Direction::Left => Position { x: self.x.saturating_sub(1), ..self },
            Direction::Right => Position { x: (self.x + 1).min(max_x), ..self },
            Direction::Up => Position { y: self.y.saturating_sub(1), ..self },
            Direction::Down => Position { y: (self.y + 1).min(max_y), ..self },
        }
    }
}

#[derive(Clone, Debug)]
pub struct Grid {
    pub width: usize,
    pub height: usize,
    pub cells: Vec<Cell>,
}

impl Grid {
    /// All dirt, no treasure.
    pub fn empty(width: usize, height: usize) -> Self {
        Grid {
            width,
            height,
            cells: (0..width * height).map(Cell::new).collect(),
        }
    }

    /// Fresh grid with `treasures` distinct cells holding a treasure.
    /// The count is clamped to the number of cells.
    pub fn generate(width: usize, height: usize, treasures: usize, rng: &mut SessionRng) -> Self {
        let mut grid = Grid::empty(width, height);
        for (idx, kind) in sampler::place_treasures(grid.cells.len(), treasures, rng) {
            grid.cells[idx].treasure = Some(kind);
        }
        grid
    }

    #[inline]
    pub fn index_of(&self, pos: Position) -> Option<usize> {
        if self.contains(pos) {
            Some(pos.y * self.width + pos.x)
        } else {
            None
        }
    }

    #[inline]
    pub fn cell_at(&self, pos: Position) -> Option<&Cell> {
        self.index_of(pos).map(|i| &self.cells[i])
    }

    #[inline]
    pub fn contains(&self, pos: Position) -> bool {
        pos.x < self.width && pos.y < self.height
    }

    /// Flip a cell to dug. Returns false if it was already dug or out of range.
    pub fn mark_dug(&mut self, idx: usize) -> bool {
        match self.cells.get_mut(idx) {
            Some(cell) if !cell.dug => {
                cell.dug = true;
                true
            }
            _ => false,
        }
    }

    pub fn treasure_count(&self) -> usize {
        self.cells.iter().filter(|c| c.treasure.is_some()).count()
    }

    /// Number of distinct kinds buried in this grid: the win goal.
    pub fn distinct_kinds(&self) -> usize {
        TreasureKind::ALL
            .iter()
            .filter(|k| self.cells.iter().any(|c| c.treasure == Some(**k)))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_clamps_at_edges() {
        let p = Position::ORIGIN;
        assert_eq!(p.step(Direction::Left, 8, 16), Position::ORIGIN);
        assert_eq!(p.step(Direction::Up, 8, 16), Position::ORIGIN);
        assert_eq!(p.step(Direction::Right, 8, 16), Position::new(1, 0));
        assert_eq!(p.step(Direction::Down, 8, 16), Position::new(0, 1));

        let corner = Position::new(7, 15);
        assert_eq!(corner.step(Direction::Right, 8, 16), corner);
        assert_eq!(corner.step(Direction::Down, 8, 16), corner);
    }

    #[test]
    fn step_never_leaves_grid() {
        let dirs = [Direction::Up, Direction::Down, Direction::Left, Direction::Right];
        let mut p = Position::ORIGIN;
        for i in 0..200 {
            p = p.step(dirs[(i * 7 + i / 3) % 4], 3, 2);
            assert!(p.x < 3 && p.y < 2);
        }
    }

    #[test]
    fn single_row_ignores_vertical_moves() {
        let p = Position::new(4, 0);
        assert_eq!(p.step(Direction::Down, 8, 1), p);
        assert_eq!(p.step(Direction::Up, 8, 1), p);
    }

    #[test]
    fn generate_places_exact_count() {
        let mut rng = SessionRng::new(7);
        let g = Grid::generate(8, 16, 10, &mut rng);
        assert_eq!(g.cells.len(), 128);
        assert_eq!(g.treasure_count(), 10);
        for (i, c) in g.cells.iter().enumerate() {
            assert_eq!(c.id, i);
            assert!(!c.dug);
        }
    }

    #[test]
    fn generate_clamps_to_cell_count() {
        let mut rng = SessionRng::new(1);
        let g = Grid::generate(2, 2, 9, &mut rng);
        assert_eq!(g.treasure_count(), 4);
    }

    #[test]
    fn mark_dug_once() {
        let mut g = Grid::empty(2, 1);
        assert!(g.mark_dug(1));
        assert!(!g.mark_dug(1));
        assert!(!g.mark_dug(5));
        assert!(g.cells[1].dug);
        assert!(!g.cells[0].dug);
    }

    #[test]
    fn index_is_row_major() {
        let g = Grid::empty(8, 16);
        assert_eq!(g.index_of(Position::new(3, 2)), Some(19));
        assert_eq!(g.index_of(Position::new(8, 0)), None);
    }

    #[test]
    fn revealed_only_after_dig() {
        let mut c = Cell::new(0);
        c.treasure = Some(TreasureKind::Gem);
        assert_eq!(c.revealed(), None);
        c.dug = true;
        assert_eq!(c.revealed(), Some(TreasureKind::Gem));
    }
}
