//! Game State Definitions
//!
//! All state that affects simulation outcomes.
//! Must be deterministic and hashable.
//!
//! ## Player ring
//!
//! Sailing players form a circular doubly-linked list threaded through the
//! `players` map itself. The [`Identity::EMPTY`] entry is the header node:
//!
//! ```text
//!   EMPTY -> P3 -> P2 -> P1 -> EMPTY      (next)
//!   EMPTY <- P3 <- P2 <- P1 <- EMPTY      (prev)
//! ```
//!
//! ## Lazy positions
//!
//! `Ship::circle` and `Ship::phase` are snapshots as of
//! `Ship::last_updated_at`. Anything that needs the position "now" must go
//! through [`Ship::position_at`] or [`GameState::current_position`].

use std::collections::BTreeMap;
use serde::{Serialize, Deserialize};
use tracing::debug;

use crate::core::circle::Circle;
use crate::core::fixed::{
    CANNON_WAIT_TIME, INITIAL_CANNONBALLS, INITIAL_GOLD, INITIAL_SHIP_HEALTH,
    LOOT_SIZE, MAX_TURN_RATE, SHIP_SIZE, WORLD_SIZE,
};
use crate::core::hash::{StateHash, StateHasher};
use crate::core::rng::{derive_seed, randoms_in_range, Seed};
use crate::game::error::{EngineError, RingError};
use crate::game::events::GameEvent;
use crate::game::identity::Identity;
use crate::game::motion::compute_current_position;

/// Salt offset for bootstrap loot batches, clear of the spawn salts.
pub const GENESIS_SALT_BASE: u64 = 1 << 32;

/// Transaction hash used for bootstrap seeds.
pub const GENESIS_TX_HASH: [u8; 32] = [0; 32];

// =============================================================================
// SHIP
// =============================================================================

/// A ship and its motion snapshot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ship {
    /// Remaining health
    pub health: u64,
    /// Position as of `last_updated_at`
    pub circle: Circle,
    /// Quanta per tick
    pub turn_rate: u64,
    /// Heading in quanta, `[0, QUANTIZATION_LEVEL)`
    pub phase: u64,
    /// Height the snapshot was taken
    pub last_updated_at: u64,
}

impl Ship {
    /// Freshly spawned ship.
    pub fn spawn_at(x: u64, y: u64, height: u64) -> Self {
        Self {
            health: INITIAL_SHIP_HEALTH,
            circle: Circle::new(x, y, SHIP_SIZE),
            turn_rate: MAX_TURN_RATE,
            phase: 0,
            last_updated_at: height,
        }
    }

    /// Extrapolated circle at `height`.
    ///
    /// Heights before the snapshot return the snapshot itself.
    pub fn position_at(&self, height: u64) -> Circle {
        let elapsed = height.saturating_sub(self.last_updated_at);
        compute_current_position(&self.circle, self.phase, self.turn_rate, elapsed)
    }

    fn hash_into(&self, hasher: &mut StateHasher) {
        hasher.update_u64(self.health);
        hasher.update_circle(&self.circle);
        hasher.update_u64(self.turn_rate);
        hasher.update_u64(self.phase);
        hasher.update_u64(self.last_updated_at);
    }
}

// =============================================================================
// CANNONBALL
// =============================================================================

/// A player's most recent shot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CannonBall {
    /// Impact circle
    pub circle: Circle,
    /// Height the shot was fired
    pub spawn_block_height: u64,
}

impl CannonBall {
    /// Height the ball lands, which is also when the cannon is reloaded.
    #[inline]
    pub fn lands_at(&self) -> u64 {
        self.spawn_block_height.saturating_add(CANNON_WAIT_TIME)
    }
}

// =============================================================================
// PLAYER
// =============================================================================

/// Registry entry for an identity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    /// Next ring member
    pub next: Identity,
    /// Previous ring member
    pub prev: Identity,
    /// Ship state
    pub ship: Ship,
    /// Collected gold
    pub gold: u64,
    /// Cannonballs left
    pub cannon_balls: u64,
    /// Pending or last shot
    pub prev_cannon_ball: Option<CannonBall>,
    /// In the ring
    pub sailing: bool,
}

impl Player {
    /// Header node of an empty ring.
    pub fn sentinel() -> Self {
        Self {
            next: Identity::EMPTY,
            prev: Identity::EMPTY,
            ship: Ship::spawn_at(0, 0, 0),
            gold: 0,
            cannon_balls: 0,
            prev_cannon_ball: None,
            sailing: false,
        }
    }

    /// New player entering the game. Links are set on insertion.
    pub fn start_sailing(x: u64, y: u64, height: u64) -> Self {
        Self {
            next: Identity::EMPTY,
            prev: Identity::EMPTY,
            ship: Ship::spawn_at(x, y, height),
            gold: INITIAL_GOLD,
            cannon_balls: INITIAL_CANNONBALLS,
            prev_cannon_ball: None,
            sailing: true,
        }
    }

    fn hash_into(&self, id: &Identity, hasher: &mut StateHasher) {
        hasher.update_bytes(id.as_bytes());
        hasher.update_bytes(self.next.as_bytes());
        hasher.update_bytes(self.prev.as_bytes());
        self.ship.hash_into(hasher);
        hasher.update_u64(self.gold);
        hasher.update_u64(self.cannon_balls);
        match &self.prev_cannon_ball {
            Some(ball) => {
                hasher.update_u8(1);
                hasher.update_circle(&ball.circle);
                hasher.update_u64(ball.spawn_block_height);
            }
            None => hasher.update_u8(0),
        }
        hasher.update_bool(self.sailing);
    }
}

// =============================================================================
// LOOT
// =============================================================================

/// Loot on the map. Never removed, only relocated.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Loot {
    /// Position and pickup radius
    pub circle: Circle,
}

impl Loot {
    /// Loot at `(x, y)`.
    pub fn at(x: u64, y: u64) -> Self {
        Self { circle: Circle::new(x, y, LOOT_SIZE) }
    }
}

// =============================================================================
// GAME STATE
// =============================================================================

/// Complete engine state.
///
/// Uses BTreeMap for deterministic iteration order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameState {
    players: BTreeMap<Identity, Player>,
    loots: BTreeMap<u64, Loot>,
    loot_top: u64,
    block_height: u64,
}

impl Default for GameState {
    fn default() -> Self {
        Self::new()
    }
}

impl GameState {
    /// Empty state: sentinel only, no loot, height 0.
    pub fn new() -> Self {
        let mut players = BTreeMap::new();
        players.insert(Identity::EMPTY, Player::sentinel());
        Self {
            players,
            loots: BTreeMap::new(),
            loot_top: 0,
            block_height: 0,
        }
    }

    /// Empty state with `batches` bootstrap loot batches (two loots each).
    pub fn genesis(network_hash: &[u8; 32], batches: u64) -> Self {
        let mut state = Self::new();
        for i in 0..batches {
            let seed = derive_seed(network_hash, &GENESIS_TX_HASH, &[GENESIS_SALT_BASE + i]);
            state.spawn_loot_batch(&seed);
        }
        debug!("Genesis placed {} loots", state.loot_top);
        state
    }

    /// Rebuild from raw tables, as fetched by a resync.
    ///
    /// `loot_top` is taken as one past the highest loot id.
    pub fn from_parts(
        players: BTreeMap<Identity, Player>,
        loots: BTreeMap<u64, Loot>,
        block_height: u64,
    ) -> Result<Self, RingError> {
        let loot_top = loots.keys().next_back().map_or(0, |id| id + 1);
        let state = Self { players, loots, loot_top, block_height };
        state.check_ring()?;
        Ok(state)
    }

    // -------------------------------------------------------------------------
    // Timeline
    // -------------------------------------------------------------------------

    /// Current block height.
    pub fn block_height(&self) -> u64 {
        self.block_height
    }

    /// Move the tick counter forward.
    pub fn advance_to(&mut self, height: u64) -> Result<(), EngineError> {
        if height < self.block_height {
            return Err(EngineError::HeightRegression {
                current: self.block_height,
                requested: height,
            });
        }
        self.block_height = height;
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Reads
    // -------------------------------------------------------------------------

    /// Player entry, if any. The sentinel is never returned.
    pub fn player(&self, id: &Identity) -> Option<&Player> {
        if id.is_empty() {
            return None;
        }
        self.players.get(id)
    }

    /// Registry entry, including the sentinel.
    pub fn entry(&self, id: &Identity) -> Option<&Player> {
        self.players.get(id)
    }

    /// Loot by id.
    pub fn loot(&self, id: u64) -> Option<&Loot> {
        self.loots.get(&id)
    }

    /// Next loot id to allocate.
    pub fn loot_top(&self) -> u64 {
        self.loot_top
    }

    /// All loots in id order.
    pub fn loots(&self) -> impl Iterator<Item = (u64, &Loot)> {
        self.loots.iter().map(|(id, loot)| (*id, loot))
    }

    /// All entries including the sentinel, in identity order.
    pub fn players(&self) -> impl Iterator<Item = (&Identity, &Player)> {
        self.players.iter()
    }

    /// True if `id` is in the ring.
    pub fn is_sailing(&self, id: &Identity) -> bool {
        self.player(id).is_some_and(|p| p.sailing)
    }

    /// Number of sailing players.
    pub fn sailing_count(&self) -> usize {
        self.players.values().filter(|p| p.sailing).count()
    }

    /// A sailing player's ship extrapolated to the current height.
    pub fn current_position(&self, id: &Identity) -> Option<Circle> {
        self.player(id)
            .filter(|p| p.sailing)
            .map(|p| p.ship.position_at(self.block_height))
    }

    /// Ring members in `next` order starting after the sentinel.
    ///
    /// Stops after `players.len()` steps even if the ring is broken.
    pub fn ring_members(&self) -> Vec<Identity> {
        let mut members = Vec::new();
        let mut cursor = match self.players.get(&Identity::EMPTY) {
            Some(head) => head.next,
            None => return members,
        };
        while !cursor.is_empty() && members.len() < self.players.len() {
            members.push(cursor);
            cursor = match self.players.get(&cursor) {
                Some(p) => p.next,
                None => break,
            };
        }
        members
    }

    /// Verify the ring invariant.
    pub fn check_ring(&self) -> Result<(), RingError> {
        let head = self.players.get(&Identity::EMPTY).ok_or(RingError::MissingSentinel)?;
        if head.sailing {
            return Err(RingError::SailingMismatch(Identity::EMPTY));
        }

        let linked = || self.players.iter().filter(|(id, p)| id.is_empty() || p.sailing);

        // Every link must resolve before back-links can be compared
        for (id, player) in linked() {
            for to in [player.next, player.prev] {
                if !self.players.contains_key(&to) {
                    return Err(RingError::DanglingLink { from: *id, to });
                }
            }
        }
        for (id, player) in linked() {
            if self.players[&player.next].prev != *id || self.players[&player.prev].next != *id {
                return Err(RingError::BrokenLink(*id));
            }
        }

        // Walk must visit exactly the sailing set and come back to the head
        let sailing = self.sailing_count();
        let mut steps = 0;
        let mut cursor = head.next;
        while !cursor.is_empty() {
            if steps >= sailing {
                return Err(RingError::NotClosed(steps));
            }
            if !self.players[&cursor].sailing {
                return Err(RingError::SailingMismatch(cursor));
            }
            cursor = self.players[&cursor].next;
            steps += 1;
        }
        if steps != sailing {
            return Err(RingError::NotClosed(steps));
        }
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Writes (used by the rules; no precondition checks here)
    // -------------------------------------------------------------------------

    pub(crate) fn player_mut(&mut self, id: &Identity) -> Option<&mut Player> {
        if id.is_empty() {
            return None;
        }
        self.players.get_mut(id)
    }

    pub(crate) fn loot_mut(&mut self, id: u64) -> Option<&mut Loot> {
        self.loots.get_mut(&id)
    }

    /// Insert `player` right after the sentinel.
    ///
    /// Touches three entries: head, new player, head's old `next`.
    pub(crate) fn link_after_head(&mut self, id: Identity, mut player: Player) {
        let old_next = self.players.get(&Identity::EMPTY).map_or(Identity::EMPTY, |h| h.next);
        player.prev = Identity::EMPTY;
        player.next = old_next;
        self.players.insert(id, player);

        if let Some(head) = self.players.get_mut(&Identity::EMPTY) {
            head.next = id;
        }
        if let Some(after) = self.players.get_mut(&old_next) {
            after.prev = id;
        }
    }

    /// Remove `id` from the ring and the registry.
    pub(crate) fn unlink(&mut self, id: &Identity) -> Option<Player> {
        let removed = self.players.remove(id)?;
        if let Some(before) = self.players.get_mut(&removed.prev) {
            before.next = removed.next;
        }
        if let Some(after) = self.players.get_mut(&removed.next) {
            after.prev = removed.prev;
        }
        Some(removed)
    }

    /// Append a loot and return its id.
    pub(crate) fn push_loot(&mut self, loot: Loot) -> u64 {
        let id = self.loot_top;
        self.loots.insert(id, loot);
        self.loot_top += 1;
        id
    }

    /// Place two loots from four draws of `seed`.
    pub(crate) fn spawn_loot_batch(&mut self, seed: &Seed) -> Vec<GameEvent> {
        let coords = randoms_in_range(seed, 0, WORLD_SIZE, 4);
        coords
            .chunks_exact(2)
            .map(|xy| {
                let loot = Loot::at(xy[0], xy[1]);
                let id = self.push_loot(loot);
                GameEvent::loot_spawned(self.block_height, id, loot.circle)
            })
            .collect()
    }

    // -------------------------------------------------------------------------
    // Verification
    // -------------------------------------------------------------------------

    /// Compute hash of current state for verification.
    pub fn compute_hash(&self) -> StateHash {
        let mut hasher = StateHasher::for_game_state();
        hasher.update_u64(self.block_height);
        hasher.update_u64(self.loot_top);

        // Sorted order (BTreeMap guarantees this)
        hasher.update_u64(self.players.len() as u64);
        for (id, player) in &self.players {
            player.hash_into(id, &mut hasher);
        }

        hasher.update_u64(self.loots.len() as u64);
        for (id, loot) in &self.loots {
            hasher.update_u64(*id);
            hasher.update_circle(&loot.circle);
        }

        hasher.finalize()
    }

    /// Owned copy of all observable state.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            block_height: self.block_height,
            loot_top: self.loot_top,
            players: self.players.iter()
                .filter(|(id, _)| !id.is_empty())
                .map(|(id, p)| (*id, *p))
                .collect(),
            loots: self.loots.iter().map(|(id, l)| (*id, *l)).collect(),
        }
    }
}

// =============================================================================
// SNAPSHOT
// =============================================================================

/// Serializable view of everything a reader can observe.
///
/// The sentinel is omitted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Height of the state
    pub block_height: u64,
    /// Next loot id
    pub loot_top: u64,
    /// Players in identity order
    pub players: Vec<(Identity, Player)>,
    /// Loots in id order
    pub loots: Vec<(u64, Loot)>,
}

impl Snapshot {
    /// Encode with bincode.
    pub fn to_bytes(&self) -> Result<Vec<u8>, EngineError> {
        bincode::serialize(self).map_err(|e| EngineError::Snapshot(e.to_string()))
    }

    /// Decode bytes produced by [`Snapshot::to_bytes`].
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, EngineError> {
        bincode::deserialize(bytes).map_err(|e| EngineError::Snapshot(e.to_string()))
    }
}

// =============================================================================
// TESTS
// =============================================================================
