/// Events emitted by transitions.
/// The presentation layer consumes these for sound and logging.

use crate::domain::grid::Position;
use crate::domain::treasure::TreasureKind;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GameEvent {
    /// Move accepted; `from == to` when pushing against an edge.
    Moved { from: Position, to: Position },
    MoveSettled,
    DigStarted { cell: usize },
    CellDug { cell: usize, treasure: Option<TreasureKind> },
    TreasureFound { kind: TreasureKind },
    AllTreasuresFound,
    MessageCleared,
    SessionStarted { session: u64, treasures: usize },
}
