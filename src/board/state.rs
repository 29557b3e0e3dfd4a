//! Per-unit board bookkeeping.

use serde::{Deserialize, Serialize};

use crate::core::UnitId;

use super::oracle::{BoardOutcome, OracleMove, Position};

/// The board a unit plays, as far as the engine tracks it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoardState {
    pub position: Position,
    pub last_move: Option<OracleMove>,
    pub outcome: Option<BoardOutcome>,
    /// Moves that came from the fallback generator.
    pub fallback_moves: u32,
}

impl BoardState {
    #[must_use]
    pub fn new(owner: UnitId) -> Self {
        Self {
            position: Position::start(owner),
            last_move: None,
            outcome: None,
            fallback_moves: 0,
        }
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.outcome.is_some()
    }

    /// Material balance from the owner's side.
    #[must_use]
    pub fn material(&self) -> i32 {
        self.position.material
    }

    /// Record a move. Returns the board outcome if this move ended the game.
    pub fn apply(&mut self, mv: &OracleMove) -> Option<BoardOutcome> {
        self.position.ply += 1;
        self.position.material += mv.material_delta;
        if let Some(fen) = &mv.fen {
            self.position.fen.clone_from(fen);
        }
        self.last_move = Some(mv.clone());
        if self.outcome.is_none() {
            self.outcome = mv.outcome;
        }
        mv.outcome
    }

    /// End the game without a move, e.g. on resignation.
    pub fn finish(&mut self, outcome: BoardOutcome) {
        if self.outcome.is_none() {
            self.outcome = Some(outcome);
        }
    }
}
