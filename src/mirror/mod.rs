//! Mirror Layer
//!
//! Client-side reconstruction of engine state from a transaction log or
//! from direct reads. Transition logic is shared with `game/`; this layer
//! only decodes, orders and schedules.

pub mod transaction;
pub mod source;
pub mod replay;
pub mod view;
pub mod service;

pub use transaction::{Block, BlockBuilder, MethodRegistry, SyncError, TransactionRecord};
pub use source::{StateSource, walk_ring, walk_loots};
pub use replay::{Mirror, BlockReport, ResyncReport};
pub use view::{MirrorView, PlayerView, LootView};
pub use service::{spawn_mirror, MirrorHandle, SyncCommand, SharedSource};
