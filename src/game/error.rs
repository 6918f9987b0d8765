//! Engine Errors
//!
//! [`Rejection`] is the typed reason an operation was refused. A rejected
//! operation leaves the state untouched.

use serde::{Serialize, Deserialize};
use thiserror::Error;

use crate::game::identity::Identity;

/// Precondition failure for a single operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Error)]
pub enum Rejection {
    /// No player entry for the identity.
    #[error("player {0:?} not found")]
    PlayerNotFound(Identity),

    /// Player exists but is not in the ring.
    #[error("player {0:?} is not sailing")]
    NotSailing(Identity),

    /// Spawn by a player who is already sailing.
    #[error("player {0:?} is already sailing")]
    AlreadySailing(Identity),

    /// Aim vector longer than the cannon range.
    #[error("shot is out of range")]
    OutOfRange,

    /// Shooter has no cannonballs left.
    #[error("no cannonballs left")]
    OutOfCannonballs,

    /// Previous shot is still reloading.
    #[error("cannon ready at height {ready_at}")]
    CooldownActive {
        /// First height at which the cannon may fire again.
        ready_at: u64,
    },

    /// Attacker has never fired.
    #[error("no cannonball pending")]
    NoCannonballPending,

    /// Hit claimed at a height other than the landing height.
    #[error("cannonball lands at height {lands_at}, not {height}")]
    WrongTriggerTick {
        /// Height the cannonball lands.
        lands_at: u64,
        /// Height the hit was claimed.
        height: u64,
    },

    /// Shapes do not overlap.
    #[error("no collision")]
    NoCollision,

    /// Loot id was never allocated.
    #[error("loot {0} not found")]
    LootNotFound(u64),

    /// The ring sentinel cannot act as a player.
    #[error("sentinel identity cannot act as a player")]
    ReservedIdentity,
}

/// Errors outside the operation taxonomy.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// Block height may only move forward.
    #[error("block height regression: {current} -> {requested}")]
    HeightRegression {
        /// Current height.
        current: u64,
        /// Rejected target height.
        requested: u64,
    },

    /// Snapshot bytes failed to decode.
    #[error("snapshot decode failed: {0}")]
    Snapshot(String),
}

/// Ring integrity violation found by `GameState::check_ring`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RingError {
    /// Sentinel entry is missing.
    #[error("sentinel missing")]
    MissingSentinel,

    /// A link points at an identity with no entry.
    #[error("{from:?} links to missing {to:?}")]
    DanglingLink {
        /// Player holding the link.
        from: Identity,
        /// Missing target.
        to: Identity,
    },

    /// `players[p.next].prev != p`.
    #[error("broken back-link at {0:?}")]
    BrokenLink(Identity),

    /// The walk did not return to the sentinel.
    #[error("ring walk did not close after {0} steps")]
    NotClosed(usize),

    /// A ring member is flagged as not sailing, or the reverse.
    #[error("sailing flag mismatch for {0:?}")]
    SailingMismatch(Identity),
}
