//! The chess side of a match.
//!
//! Each active unit plays its own board. The engine does not implement chess
//! rules; moves come from a pluggable `MoveOracle`, or from the seeded
//! `FallbackMoveGenerator` when the oracle times out or fails. Only the
//! summary of a move matters to the round loop: the piece, the destination
//! square and the net material change.

pub mod square;
pub mod oracle;
pub mod fallback;
pub mod state;

pub use square::{PieceKind, Square};
pub use oracle::{
    BoardOutcome, MoveOracle, OracleGateway, OracleMove, Position, MAX_MATERIAL_DELTA, START_FEN,
};
pub use fallback::FallbackMoveGenerator;
pub use state::BoardState;
