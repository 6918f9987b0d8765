//! Game Logic Module
//!
//! The authoritative engine. 100% deterministic.
//!
//! ## Module Structure
//!
//! - `identity`: Player identities and the ring sentinel
//! - `state`: Players, ships, loot, the player ring
//! - `motion`: Quantized circular motion
//! - `rules`: The six operations
//! - `error`: Rejection reasons and engine errors
//! - `events`: Effects emitted by accepted operations

pub mod identity;
pub mod state;
pub mod motion;
pub mod rules;
pub mod error;
pub mod events;

// Re-export key types
pub use identity::Identity;
pub use state::{GameState, Player, Ship, CannonBall, Loot, Snapshot};
pub use rules::{Operation, OperationKind, TxContext, MODULE_NAME};
pub use error::{Rejection, EngineError, RingError};
pub use events::{GameEvent, GameEventData};
