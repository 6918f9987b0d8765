//! # Pirates Engine
//!
//! Deterministic naval-combat engine with a replaying client mirror.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     PIRATES ENGINE                           │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/           - Deterministic primitives                  │
//! │  ├── fixed.rs    - Decimal fixed-point and game constants    │
//! │  ├── trig.rs     - Quantized sine/cosine table               │
//! │  ├── circle.rs   - Circles and collision                     │
//! │  ├── rng.rs      - Seed derivation + Xorshift128+ PRNG       │
//! │  └── hash.rs     - State hashing and method ids              │
//! │                                                              │
//! │  game/           - Authoritative engine (deterministic)      │
//! │  ├── state.rs    - Players, ships, loot, player ring         │
//! │  ├── motion.rs   - Quantized circular motion                 │
//! │  ├── rules.rs    - spawn/leave/turn/shoot/hit/pickup         │
//! │  └── events.rs   - Effects of accepted operations            │
//! │                                                              │
//! │  mirror/         - Client reconstruction                     │
//! │  ├── transaction.rs - Log records and argument codec         │
//! │  ├── replay.rs   - Replay and bulk resync                    │
//! │  ├── view.rs     - Floating-point render view                │
//! │  └── service.rs  - Async driver                              │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Determinism Guarantee
//!
//! The `core/` and `game/` modules are **100% deterministic**:
//! - No floating-point arithmetic in game logic
//! - No HashMap (uses BTreeMap for sorted iteration)
//! - No system time dependencies
//! - All randomness from seeds derived from the timeline
//!
//! Replaying the same log from the same genesis yields the same
//! [`GameState::compute_hash`] on any platform.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod core;
pub mod game;
pub mod mirror;
pub mod config;

// Re-export commonly used types
pub use core::fixed::{DECIMALS, DECIMAL_SCALE, QUANTIZATION_LEVEL};
pub use core::circle::Circle;
pub use core::rng::DeterministicRng;
pub use game::{GameState, Identity, Operation, Rejection, TxContext};
pub use mirror::{Block, Mirror, StateSource};
pub use config::{PiratesConfig, EngineConfig, SyncConfig};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
