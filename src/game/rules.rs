//! Operation Rules
//!
//! The six state transitions. Every handler validates all preconditions
//! before its first write, so a rejected operation leaves the state as it
//! was.
//!
//! ## Randomness
//!
//! Each operation that draws numbers derives its seed from the
//! [`TxContext`] plus a fixed salt:
//!
//! | Draw              | Salt                    |
//! |-------------------|-------------------------|
//! | Player placement  | `u64::MAX`              |
//! | Spawn loot batch  | batch index `0..5`      |
//! | Pickup reward     | none                    |
//! | Loot relocation   | `2`                     |

use std::fmt;
use serde::{Serialize, Deserialize};
use tracing::debug;

use crate::core::circle::Circle;
use crate::core::fixed::{
    CANNON_DAMAGE, CANNON_RANGE, CANNONBALL_RADIUS, MAX_LOOT, MIN_LOOT,
    SPAWN_LOOT_BATCHES, WORLD_SIZE,
};
use crate::core::rng::{derive_seed, random_in_range, randoms_in_range, Seed};
use crate::game::error::Rejection;
use crate::game::events::{GameEvent, GameEventData};
use crate::game::identity::Identity;
use crate::game::motion::advance_phase;
use crate::game::state::{CannonBall, GameState, Player};

/// Module name used when deriving method ids.
pub const MODULE_NAME: &str = "PiratesLogic";

const PLACEMENT_SALT: u64 = u64::MAX;
const RELOCATION_SALT: u64 = 2;

/// Seed material for one transaction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxContext {
    /// Hash of the current timeline step
    pub network_hash: [u8; 32],
    /// Hash of the transaction being applied
    pub tx_hash: [u8; 32],
}

impl TxContext {
    /// Create a context.
    pub fn new(network_hash: [u8; 32], tx_hash: [u8; 32]) -> Self {
        Self { network_hash, tx_hash }
    }

    /// Seed for this transaction with the given salts.
    pub fn seed(&self, salts: &[u64]) -> Seed {
        derive_seed(&self.network_hash, &self.tx_hash, salts)
    }
}

/// The six operations without their arguments.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum OperationKind {
    /// Enter the game
    Spawn,
    /// Leave the game
    Leave,
    /// Set a new turn rate
    ChangeTurnRate,
    /// Fire a cannonball
    Shoot,
    /// Resolve a cannonball landing
    Hit,
    /// Collect loot
    PickupLoot,
}

impl OperationKind {
    /// Every kind, in declaration order.
    pub const ALL: [OperationKind; 6] = [
        OperationKind::Spawn,
        OperationKind::Leave,
        OperationKind::ChangeTurnRate,
        OperationKind::Shoot,
        OperationKind::Hit,
        OperationKind::PickupLoot,
    ];

    /// Method name used for method ids.
    pub fn method_name(self) -> &'static str {
        match self {
            OperationKind::Spawn => "spawn",
            OperationKind::Leave => "leave",
            OperationKind::ChangeTurnRate => "changeTurnRate",
            OperationKind::Shoot => "shoot",
            OperationKind::Hit => "hit",
            OperationKind::PickupLoot => "pickupLoot",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.method_name())
    }
}

/// A typed operation with its arguments.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operation {
    /// Enter the game at a random position
    Spawn,
    /// Leave the ring
    Leave,
    /// Set a new turn rate
    ChangeTurnRate {
        /// Quanta per tick
        new_turn_rate: u64,
    },
    /// Fire at an aim point
    Shoot {
        /// Aim x
        offset_x: u64,
        /// Aim y
        offset_y: u64,
    },
    /// Resolve `attacker`'s pending cannonball against `target`
    Hit {
        /// Player who fired
        attacker: Identity,
        /// Player being hit
        target: Identity,
    },
    /// Collect a loot
    PickupLoot {
        /// Loot id
        loot_id: u64,
    },
}

impl Operation {
    /// Kind of this operation.
    pub fn kind(&self) -> OperationKind {
        match self {
            Operation::Spawn => OperationKind::Spawn,
            Operation::Leave => OperationKind::Leave,
            Operation::ChangeTurnRate { .. } => OperationKind::ChangeTurnRate,
            Operation::Shoot { .. } => OperationKind::Shoot,
            Operation::Hit { .. } => OperationKind::Hit,
            Operation::PickupLoot { .. } => OperationKind::PickupLoot,
        }
    }
}

/// Apply `op` sent by `sender` at the state's current height.
///
/// On `Err` the state is unchanged.
pub fn apply(
    state: &mut GameState,
    sender: &Identity,
    op: &Operation,
    ctx: &TxContext,
) -> Result<Vec<GameEvent>, Rejection> {
    let result = match *op {
        Operation::Spawn => spawn(state, sender, ctx),
        Operation::Leave => leave(state, sender),
        Operation::ChangeTurnRate { new_turn_rate } => change_turn_rate(state, sender, new_turn_rate),
        Operation::Shoot { offset_x, offset_y } => shoot(state, sender, offset_x, offset_y),
        Operation::Hit { attacker, target } => hit(state, &attacker, &target),
        Operation::PickupLoot { loot_id } => pickup_loot(state, sender, loot_id, ctx),
    };

    match &result {
        Ok(events) => {
            debug!(
                "{} by {} accepted at {} ({} events)",
                op.kind(), sender.short(), state.block_height(), events.len()
            );
            #[cfg(feature = "debug-tracing")]
            tracing::trace!("state hash {}", hex::encode(state.compute_hash()));
        }
        Err(reason) => {
            debug!("{} by {} rejected: {}", op.kind(), sender.short(), reason);
        }
    }
    result
}

impl GameState {
    /// Apply one operation. See [`apply`].
    pub fn apply(
        &mut self,
        sender: &Identity,
        op: &Operation,
        ctx: &TxContext,
    ) -> Result<Vec<GameEvent>, Rejection> {
        apply(self, sender, op, ctx)
    }
}

// =============================================================================
// PRECONDITIONS
// =============================================================================

/// The sailing player behind `id`.
fn sailing_player<'a>(state: &'a GameState, id: &Identity) -> Result<&'a Player, Rejection> {
    if id.is_empty() {
        return Err(Rejection::ReservedIdentity);
    }
    let player = state.player(id).ok_or(Rejection::PlayerNotFound(*id))?;
    if !player.sailing {
        return Err(Rejection::NotSailing(*id));
    }
    Ok(player)
}

/// Re-fetch after validation. Only called once the entry is known to exist.
fn player_entry<'a>(state: &'a mut GameState, id: &Identity) -> Result<&'a mut Player, Rejection> {
    state.player_mut(id).ok_or(Rejection::PlayerNotFound(*id))
}

// =============================================================================
// OPERATIONS
// =============================================================================

fn spawn(state: &mut GameState, sender: &Identity, ctx: &TxContext) -> Result<Vec<GameEvent>, Rejection> {
    if sender.is_empty() {
        return Err(Rejection::ReservedIdentity);
    }
    if state.is_sailing(sender) {
        return Err(Rejection::AlreadySailing(*sender));
    }

    let height = state.block_height();
    let coords = randoms_in_range(&ctx.seed(&[PLACEMENT_SALT]), 0, WORLD_SIZE, 4);
    let player = Player::start_sailing(coords[0], coords[1], height);
    state.link_after_head(*sender, player);

    let mut events = vec![GameEvent::new(
        height,
        GameEventData::PlayerSpawned { player: *sender, circle: player.ship.circle },
    )];
    for batch in 0..SPAWN_LOOT_BATCHES {
        events.extend(state.spawn_loot_batch(&ctx.seed(&[batch])));
    }
    Ok(events)
}

fn leave(state: &mut GameState, sender: &Identity) -> Result<Vec<GameEvent>, Rejection> {
    sailing_player(state, sender)?;

    state.unlink(sender);
    Ok(vec![GameEvent::new(
        state.block_height(),
        GameEventData::PlayerLeft { player: *sender },
    )])
}

fn change_turn_rate(
    state: &mut GameState,
    sender: &Identity,
    new_turn_rate: u64,
) -> Result<Vec<GameEvent>, Rejection> {
    sailing_player(state, sender)?;

    let height = state.block_height();
    let ship = &mut player_entry(state, sender)?.ship;
    let elapsed = height.saturating_sub(ship.last_updated_at);

    ship.circle = ship.position_at(height);
    ship.phase = advance_phase(ship.phase, ship.turn_rate, elapsed);
    ship.turn_rate = new_turn_rate;
    ship.last_updated_at = height;

    let data = GameEventData::TurnRateChanged {
        player: *sender,
        turn_rate: new_turn_rate,
        circle: ship.circle,
        phase: ship.phase,
    };
    Ok(vec![GameEvent::new(height, data)])
}

fn shoot(
    state: &mut GameState,
    sender: &Identity,
    offset_x: u64,
    offset_y: u64,
) -> Result<Vec<GameEvent>, Rejection> {
    let height = state.block_height();
    let player = sailing_player(state, sender)?;

    if player.cannon_balls == 0 {
        return Err(Rejection::OutOfCannonballs);
    }
    if let Some(prev) = &player.prev_cannon_ball {
        if height < prev.lands_at() {
            return Err(Rejection::CooldownActive { ready_at: prev.lands_at() });
        }
    }

    let aim = Circle::new(offset_x, offset_y, CANNONBALL_RADIUS);
    let range = CANNON_RANGE as u128;
    if aim.distance_squared(&Circle::ZERO) > range * range {
        return Err(Rejection::OutOfRange);
    }

    let player = player_entry(state, sender)?;
    player.prev_cannon_ball = Some(CannonBall { circle: aim, spawn_block_height: height });
    player.cannon_balls -= 1;

    let data = GameEventData::CannonFired {
        player: *sender,
        aim,
        cannon_balls_left: player.cannon_balls,
    };
    Ok(vec![GameEvent::new(height, data)])
}

fn hit(state: &mut GameState, attacker: &Identity, target: &Identity) -> Result<Vec<GameEvent>, Rejection> {
    let height = state.block_height();
    let pending = sailing_player(state, attacker)?.prev_cannon_ball;
    let victim = sailing_player(state, target)?;
    let ball = pending.ok_or(Rejection::NoCannonballPending)?;

    if ball.lands_at() != height {
        return Err(Rejection::WrongTriggerTick { lands_at: ball.lands_at(), height });
    }
    if !victim.ship.position_at(height).collides_with(&ball.circle) {
        return Err(Rejection::NoCollision);
    }

    let ship = &mut player_entry(state, target)?.ship;
    ship.health = ship.health.saturating_sub(CANNON_DAMAGE);

    let data = GameEventData::ShipHit {
        attacker: *attacker,
        target: *target,
        health: ship.health,
    };
    Ok(vec![GameEvent::new(height, data)])
}

fn pickup_loot(
    state: &mut GameState,
    sender: &Identity,
    loot_id: u64,
    ctx: &TxContext,
) -> Result<Vec<GameEvent>, Rejection> {
    let height = state.block_height();
    let player = sailing_player(state, sender)?;
    let loot = *state.loot(loot_id).ok_or(Rejection::LootNotFound(loot_id))?;

    if !player.ship.position_at(height).collides_with(&loot.circle) {
        return Err(Rejection::NoCollision);
    }

    let reward = random_in_range(&ctx.seed(&[]), MIN_LOOT, MAX_LOOT);
    let coords = randoms_in_range(&ctx.seed(&[RELOCATION_SALT]), 0, WORLD_SIZE, 4);

    let player = player_entry(state, sender)?;
    player.gold = player.gold.saturating_add(reward);
    let gold = player.gold;

    let relocated_to = Circle { x: coords[0], y: coords[1], ..loot.circle };
    if let Some(loot) = state.loot_mut(loot_id) {
        loot.circle = relocated_to;
    }

    let data = GameEventData::LootPickedUp {
        player: *sender,
        loot_id,
        reward,
        gold,
        relocated_to,
    };
    Ok(vec![GameEvent::new(height, data)])
}

// =============================================================================
// TESTS
// =============================================================================
