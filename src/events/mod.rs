//! Match event stream.
//!
//! - `event`: the closed `EventType` set and the `MatchEvent` record
//! - `bus`: subscriber registry with static interests and stable ordering

pub mod event;
pub mod bus;

pub use event::{
    ConvergenceSkip, DamageSource, EventPayload, EventType, KnockoutCause, MatchEvent,
};
pub use bus::{EventBus, EventSubscriber, SubscriberId};
