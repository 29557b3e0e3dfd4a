//! Scripted move oracle.

use std::thread;
use std::time::Duration;

use rustc_hash::FxHashMap;

use crate::board::{MoveOracle, OracleMove, Position};
use crate::core::{OracleError, UnitId};

/// Replays a fixed list of moves per board, cycling by ply.
///
/// Boards without a script are answered with `OracleError::Unavailable`, so
/// the engine falls back for them.
#[derive(Clone, Debug, Default)]
pub struct ScriptedOracle {
    scripts: FxHashMap<UnitId, Vec<OracleMove>>,
    delay: Option<Duration>,
}

impl ScriptedOracle {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Script one board (builder pattern).
    #[must_use]
    pub fn with_script(mut self, board: UnitId, moves: Vec<OracleMove>) -> Self {
        self.scripts.insert(board, moves);
        self
    }

    /// Sleep before every reply (builder pattern).
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

impl MoveOracle for ScriptedOracle {
    fn name(&self) -> &str {
        "scripted"
    }

    fn select_move(&self, position: &Position, _depth: u8) -> Result<OracleMove, OracleError> {
        if let Some(delay) = self.delay {
            thread::sleep(delay);
        }
        let moves = self
            .scripts
            .get(&position.board)
            .filter(|moves| !moves.is_empty())
            .ok_or_else(|| OracleError::Unavailable(format!("no script for {}", position.board)))?;
        Ok(moves[position.ply as usize % moves.len()].clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{PieceKind, Square};

    #[test]
    fn test_cycles_by_ply() {
        let a6 = Square::parse("a6").unwrap();
        let c6 = Square::parse("c6").unwrap();
        let oracle = ScriptedOracle::new().with_script(
            UnitId::new(1),
            vec![OracleMove::quiet(PieceKind::Knight, a6), OracleMove::quiet(PieceKind::Knight, c6)],
        );
        let mut position = Position::start(UnitId::new(1));
        assert_eq!(oracle.select_move(&position, 4).unwrap().to, a6);
        position.ply = 3;
        assert_eq!(oracle.select_move(&position, 4).unwrap().to, c6);
    }

    #[test]
    fn test_unscripted_board() {
        let oracle = ScriptedOracle::new();
        assert!(matches!(
            oracle.select_move(&Position::start(UnitId::new(2)), 4),
            Err(OracleError::Unavailable(_))
        ));
    }
}
