//! Seeded replacement moves for when the oracle cannot answer.
//!
//! Fallback moves come from the match's `ProbabilityEngine`, so a match
//! played entirely offline is still reproducible from its seed.

use crate::core::ProbabilityEngine;

use super::oracle::{OracleMove, Position};
use super::square::{PieceKind, Square};

/// Relative chance of moving each piece, in `PieceKind::ALL` order.
const PIECE_WEIGHTS: [f64; 6] = [8.0, 2.0, 2.0, 2.0, 1.0, 1.0];

/// Relative chance of each victim in an exchange, in `PieceKind::ALL` order.
const VICTIM_WEIGHTS: [f64; 6] = [8.0, 2.0, 2.0, 1.0, 0.5, 0.0];

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FallbackMoveGenerator {
    /// Percent chance the move wins material.
    pub capture_percent: f64,
    /// Percent chance the reply loses material.
    pub loss_percent: f64,
}

impl Default for FallbackMoveGenerator {
    fn default() -> Self {
        Self {
            capture_percent: 15.0,
            loss_percent: 10.0,
        }
    }
}

impl FallbackMoveGenerator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Produce a plausible move summary for `position`.
    pub fn generate(&self, position: &Position, dice: &mut ProbabilityEngine) -> OracleMove {
        let piece = dice
            .choose_weighted(&PIECE_WEIGHTS)
            .map_or(PieceKind::Pawn, |i| PieceKind::ALL[i]);
        let to = Square::new(dice.index(64) as u8).unwrap_or_default();

        let mut material = 0;
        if dice.percent_chance(self.capture_percent) {
            material += victim_value(dice);
        }
        if dice.percent_chance(self.loss_percent) {
            material -= victim_value(dice);
        }

        tracing::trace!(board = %position.board, ply = position.ply, %to, material, "fallback move");
        OracleMove::quiet(piece, to).with_material(material)
    }
}

fn victim_value(dice: &mut ProbabilityEngine) -> i32 {
    dice.choose_weighted(&VICTIM_WEIGHTS)
        .map_or(1, |i| PieceKind::ALL[i].material())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::UnitId;

    #[test]
    fn test_generate_is_seeded() {
        let position = Position::start(UnitId::new(3));
        let generator = FallbackMoveGenerator::new();
        let run = |seed| {
            let mut dice = ProbabilityEngine::new(seed);
            (0..20)
                .map(|_| generator.generate(&position, &mut dice))
                .collect::<Vec<_>>()
        };
        assert_eq!(run(11), run(11));
        assert_ne!(run(11), run(12));
    }

    #[test]
    fn test_generated_moves_validate() {
        let position = Position::start(UnitId::new(1));
        let generator = FallbackMoveGenerator::new();
        let mut dice = ProbabilityEngine::new(5);
        for _ in 0..200 {
            let mv = generator.generate(&position, &mut dice);
            assert!(mv.validate().is_ok(), "{mv:?}");
        }
    }

    #[test]
    fn test_quiet_when_disabled() {
        let position = Position::start(UnitId::new(1));
        let generator = FallbackMoveGenerator {
            capture_percent: 0.0,
            loss_percent: 0.0,
        };
        let mut dice = ProbabilityEngine::new(9);
        for _ in 0..50 {
            assert_eq!(generator.generate(&position, &mut dice).material_delta, 0);
        }
    }
}
