//! Move oracle boundary.
//!
//! The engine never plays chess itself. Each board asks a `MoveOracle` for a
//! move; the `OracleGateway` wraps the call with an optional timeout and a
//! failure counter. Any error is returned to the caller, which substitutes a
//! fallback move; the gateway never aborts a match.

use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::{OracleConfig, OracleError, UnitId};

use super::square::{PieceKind, Square};

/// Standard starting position.
pub const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// Largest material swing a single move can report.
pub const MAX_MATERIAL_DELTA: i32 = 39;

/// How a board ended, from the unit's point of view.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BoardOutcome {
    Won,
    Lost,
    Drawn,
}

/// What the oracle sees.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    /// Unit playing this board.
    pub board: UnitId,
    pub fen: String,
    pub ply: u32,
    /// Material balance from the unit's side.
    pub material: i32,
}

impl Position {
    #[must_use]
    pub fn start(board: UnitId) -> Self {
        Self {
            board,
            fen: START_FEN.to_string(),
            ply: 0,
            material: 0,
        }
    }
}

/// The oracle's reply for one round: the unit's move plus the board's
/// response, summarized.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OracleMove {
    pub notation: String,
    pub piece: PieceKind,
    pub to: Square,
    /// Net material change for the unit after the exchange; positive is a
    /// capture, negative a loss.
    pub material_delta: i32,
    pub in_check: bool,
    pub outcome: Option<BoardOutcome>,
    pub fen: Option<String>,
}

impl OracleMove {
    /// A non-capturing move.
    pub fn quiet(piece: PieceKind, to: Square) -> Self {
        Self {
            notation: format!("{}{}", piece.letter(), to),
            piece,
            to,
            material_delta: 0,
            in_check: false,
            outcome: None,
            fen: None,
        }
    }

    /// Set the material change (builder pattern).
    #[must_use]
    pub fn with_material(mut self, delta: i32) -> Self {
        self.material_delta = delta;
        if delta > 0 && !self.notation.contains('x') {
            self.notation = format!("{}x{}", self.piece.letter(), self.to);
        }
        self
    }

    /// Set the board outcome (builder pattern).
    #[must_use]
    pub fn with_outcome(mut self, outcome: BoardOutcome) -> Self {
        self.outcome = Some(outcome);
        self
    }

    /// Set the resulting position (builder pattern).
    #[must_use]
    pub fn with_fen(mut self, fen: impl Into<String>) -> Self {
        self.fen = Some(fen.into());
        self
    }

    /// Reject replies the engine cannot apply.
    pub fn validate(&self) -> Result<(), OracleError> {
        if self.notation.trim().is_empty() {
            return Err(OracleError::InvalidMove("empty notation".into()));
        }
        if self.material_delta.abs() > MAX_MATERIAL_DELTA {
            return Err(OracleError::InvalidMove(format!(
                "material delta {} exceeds {}",
                self.material_delta, MAX_MATERIAL_DELTA
            )));
        }
        if self.fen.as_deref().is_some_and(|fen| fen.trim().is_empty()) {
            return Err(OracleError::InvalidMove("empty FEN".into()));
        }
        Ok(())
    }
}

/// External move source.
///
/// Implementations are shared across the matches of a day, so they must be
/// thread-safe. Calls may block.
pub trait MoveOracle: Send + Sync {
    fn name(&self) -> &str {
        "oracle"
    }

    fn select_move(&self, position: &Position, depth: u8) -> Result<OracleMove, OracleError>;
}

/// Per-match access to the oracle.
pub struct OracleGateway {
    oracle: Option<Arc<dyn MoveOracle>>,
    timeout: Option<Duration>,
    max_failures: u32,
    consecutive_failures: u32,
}

impl OracleGateway {
    #[must_use]
    pub fn new(oracle: Arc<dyn MoveOracle>, config: &OracleConfig) -> Self {
        Self {
            oracle: Some(oracle),
            timeout: config.timeout_ms.map(Duration::from_millis),
            max_failures: config.max_consecutive_failures,
            consecutive_failures: 0,
        }
    }

    /// A gateway with no oracle; every request fails as unavailable.
    #[must_use]
    pub fn offline() -> Self {
        Self {
            oracle: None,
            timeout: None,
            max_failures: 0,
            consecutive_failures: 0,
        }
    }

    /// An oracle was configured, whether or not it is currently bypassed.
    #[must_use]
    pub fn has_oracle(&self) -> bool {
        self.oracle.is_some()
    }

    /// The oracle is configured and has not been bypassed.
    #[must_use]
    pub fn is_online(&self) -> bool {
        self.oracle.is_some()
            && (self.max_failures == 0 || self.consecutive_failures < self.max_failures)
    }

    /// Ask for a move.
    pub fn request(&mut self, position: &Position, depth: u8) -> Result<OracleMove, OracleError> {
        let Some(oracle) = self.oracle.as_ref().filter(|_| self.is_online()) else {
            return Err(OracleError::Unavailable("no oracle connected".into()));
        };

        let reply = match self.timeout {
            Some(timeout) => call_with_timeout(Arc::clone(oracle), position.clone(), depth, timeout),
            None => oracle.select_move(position, depth),
        }
        .and_then(|mv| mv.validate().map(|()| mv));

        match &reply {
            Ok(_) => self.consecutive_failures = 0,
            Err(err) => {
                self.consecutive_failures += 1;
                if !self.is_online() {
                    tracing::warn!(
                        failures = self.consecutive_failures,
                        error = %err,
                        "move oracle bypassed for the rest of the match"
                    );
                }
            }
        }
        reply
    }
}

impl std::fmt::Debug for OracleGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OracleGateway")
            .field("oracle", &self.oracle.as_ref().map(|o| o.name().to_string()))
            .field("timeout", &self.timeout)
            .field("consecutive_failures", &self.consecutive_failures)
            .finish()
    }
}

/// Run the oracle on a worker thread and stop waiting after `timeout`.
///
/// A timed-out worker is detached; its late reply is dropped with the channel.
fn call_with_timeout(
    oracle: Arc<dyn MoveOracle>,
    position: Position,
    depth: u8,
    timeout: Duration,
) -> Result<OracleMove, OracleError> {
    let (tx, rx) = mpsc::channel();
    thread::Builder::new()
        .name("move-oracle".into())
        .spawn(move || {
            let _ = tx.send(oracle.select_move(&position, depth));
        })
        .map_err(|e| OracleError::Unavailable(e.to_string()))?;

    match rx.recv_timeout(timeout) {
        Ok(reply) => reply,
        Err(RecvTimeoutError::Timeout) => Err(OracleError::Timeout(timeout)),
        Err(RecvTimeoutError::Disconnected) => {
            Err(OracleError::Unavailable("oracle worker exited without replying".into()))
        }
    }
}
