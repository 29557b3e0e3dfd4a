//! Match events.
//!
//! Every state transition of a match is recorded as a `MatchEvent` in an
//! append-only log and dispatched to subscribers. The set of event types is
//! closed: `EventType` is derived from the payload, so the two can never
//! disagree.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::board::{BoardOutcome, PieceKind, Square};
use crate::core::{TeamId, UnitId};
use crate::orchestrator::{MatchOutcome, RoundStep, TerminationReason};
use crate::traits::TraitId;
use crate::units::{CrossingDirection, InjurySeverity, StaminaReason};

/// Closed set of event types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EventType {
    // === Match lifecycle ===
    MatchStarted,
    RoundStarted,
    MatchEnded,

    // === Boards ===
    MoveExecuted,
    OracleFallback,
    BoardFinished,
    ForcedResignation,

    // === Stamina and traits ===
    StaminaThresholdCrossed,
    TraitActivated,
    TraitSkipped,
    TraitFormulaFailed,
    StatusExpired,

    // === Combat ===
    ConvergenceResolved,
    ConvergenceSkipped,
    ConvergenceConflict,
    DamageApplied,
    InjuryInflicted,
    KnockedOut,

    // === Progression ===
    LevelUp,

    // === Recovery ===
    StepFailed,
    RoundRetried,
}

impl EventType {
    pub const ALL: [EventType; 21] = [
        EventType::MatchStarted,
        EventType::RoundStarted,
        EventType::MatchEnded,
        EventType::MoveExecuted,
        EventType::OracleFallback,
        EventType::BoardFinished,
        EventType::ForcedResignation,
        EventType::StaminaThresholdCrossed,
        EventType::TraitActivated,
        EventType::TraitSkipped,
        EventType::TraitFormulaFailed,
        EventType::StatusExpired,
        EventType::ConvergenceResolved,
        EventType::ConvergenceSkipped,
        EventType::ConvergenceConflict,
        EventType::DamageApplied,
        EventType::InjuryInflicted,
        EventType::KnockedOut,
        EventType::LevelUp,
        EventType::StepFailed,
        EventType::RoundRetried,
    ];
}

/// What dealt damage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DamageSource {
    Capture,
    MaterialLoss,
    Convergence,
    Trait(TraitId),
}

/// Why a unit was knocked out.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum KnockoutCause {
    Damage(DamageSource),
    Exhaustion,
    /// Forced off the board by severe fatigue.
    Resignation,
}

/// Why a convergence candidate was not contested.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConvergenceSkip {
    Inactive(UnitId),
    CapReached(UnitId),
    FairnessShare(UnitId),
}

/// Type-specific event data.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum EventPayload {
    MatchStarted {
        team_a: TeamId,
        team_b: TeamId,
        seed: u64,
    },
    RoundStarted {
        initiative: Vec<UnitId>,
    },
    MatchEnded {
        outcome: MatchOutcome,
        reason: TerminationReason,
    },
    MoveExecuted {
        notation: String,
        piece: PieceKind,
        to: Square,
        material_delta: i32,
    },
    OracleFallback {
        reason: String,
    },
    BoardFinished {
        outcome: BoardOutcome,
    },
    ForcedResignation {
        stamina: f64,
    },
    StaminaThresholdCrossed {
        boundary: f64,
        direction: CrossingDirection,
        stamina: f64,
        reason: StaminaReason,
    },
    TraitActivated {
        trait_id: TraitId,
        chance: f64,
        cost: f64,
        delta: f64,
    },
    TraitSkipped {
        trait_id: TraitId,
        reason: String,
    },
    TraitFormulaFailed {
        trait_id: TraitId,
        reason: String,
    },
    StatusExpired {
        source: TraitId,
    },
    ConvergenceResolved {
        square: Square,
        winner: Option<UnitId>,
        margin: f64,
        critical: bool,
        damage: f64,
        assists: Vec<UnitId>,
    },
    ConvergenceSkipped {
        square: Square,
        reason: ConvergenceSkip,
    },
    ConvergenceConflict {
        square: Square,
        contested: UnitId,
    },
    DamageApplied {
        source: DamageSource,
        amount: f64,
        hp_after: f64,
    },
    InjuryInflicted {
        severity: InjurySeverity,
    },
    KnockedOut {
        cause: KnockoutCause,
    },
    LevelUp {
        level: u8,
        xp: u32,
    },
    StepFailed {
        step: RoundStep,
        attempt: u8,
        error: String,
    },
    RoundRetried {
        skipped: RoundStep,
    },
}

impl EventPayload {
    #[must_use]
    pub fn event_type(&self) -> EventType {
        match self {
            EventPayload::MatchStarted { .. } => EventType::MatchStarted,
            EventPayload::RoundStarted { .. } => EventType::RoundStarted,
            EventPayload::MatchEnded { .. } => EventType::MatchEnded,
            EventPayload::MoveExecuted { .. } => EventType::MoveExecuted,
            EventPayload::OracleFallback { .. } => EventType::OracleFallback,
            EventPayload::BoardFinished { .. } => EventType::BoardFinished,
            EventPayload::ForcedResignation { .. } => EventType::ForcedResignation,
            EventPayload::StaminaThresholdCrossed { .. } => EventType::StaminaThresholdCrossed,
            EventPayload::TraitActivated { .. } => EventType::TraitActivated,
            EventPayload::TraitSkipped { .. } => EventType::TraitSkipped,
            EventPayload::TraitFormulaFailed { .. } => EventType::TraitFormulaFailed,
            EventPayload::StatusExpired { .. } => EventType::StatusExpired,
            EventPayload::ConvergenceResolved { .. } => EventType::ConvergenceResolved,
            EventPayload::ConvergenceSkipped { .. } => EventType::ConvergenceSkipped,
            EventPayload::ConvergenceConflict { .. } => EventType::ConvergenceConflict,
            EventPayload::DamageApplied { .. } => EventType::DamageApplied,
            EventPayload::InjuryInflicted { .. } => EventType::InjuryInflicted,
            EventPayload::KnockedOut { .. } => EventType::KnockedOut,
            EventPayload::LevelUp { .. } => EventType::LevelUp,
            EventPayload::StepFailed { .. } => EventType::StepFailed,
            EventPayload::RoundRetried { .. } => EventType::RoundRetried,
        }
    }
}

/// A recorded match event.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MatchEvent {
    /// Position in the match log, starting at 0.
    pub seq: u64,
    pub event_type: EventType,
    pub unit_ids: SmallVec<[UnitId; 2]>,
    pub round: u32,
    pub match_id: String,
    pub payload: EventPayload,
}

impl MatchEvent {
    pub fn new(
        seq: u64,
        match_id: impl Into<String>,
        round: u32,
        unit_ids: impl IntoIterator<Item = UnitId>,
        payload: EventPayload,
    ) -> Self {
        Self {
            seq,
            event_type: payload.event_type(),
            unit_ids: unit_ids.into_iter().collect(),
            round,
            match_id: match_id.into(),
            payload,
        }
    }

    /// Does this event concern `unit`?
    #[must_use]
    pub fn involves(&self, unit: UnitId) -> bool {
        self.unit_ids.contains(&unit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_type_from_payload() {
        let event = MatchEvent::new(
            3,
            "m1",
            2,
            [UnitId::new(4)],
            EventPayload::KnockedOut {
                cause: KnockoutCause::Exhaustion,
            },
        );
        assert_eq!(event.event_type, EventType::KnockedOut);
        assert!(event.involves(UnitId::new(4)));
        assert!(!event.involves(UnitId::new(5)));
    }

    #[test]
    fn test_all_is_complete() {
        let mut types = EventType::ALL.to_vec();
        types.sort();
        types.dedup();
        assert_eq!(types.len(), EventType::ALL.len());
    }

    #[test]
    fn test_event_serde() {
        let event = MatchEvent::new(
            0,
            "m1",
            1,
            [UnitId::new(1), UnitId::new(9)],
            EventPayload::DamageApplied {
                source: DamageSource::Trait(TraitId::new(2)),
                amount: 7.5,
                hp_after: 42.5,
            },
        );
        let json = serde_json::to_string(&event).unwrap();
        let back: MatchEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(event, back);

        let bytes = bincode::serialize(&event).unwrap();
        let back: MatchEvent = bincode::deserialize(&bytes).unwrap();
        assert_eq!(event, back);
    }
}
