//! Game Events
//!
//! Effects emitted by accepted operations, for logging and renderers.
//! Events carry no authority; state is the source of truth.

use serde::{Serialize, Deserialize};

use crate::core::circle::Circle;
use crate::game::identity::Identity;

/// Game event data.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEventData {
    /// Player joined the ring
    PlayerSpawned {
        /// Who joined
        player: Identity,
        /// Spawn position
        circle: Circle,
    },

    /// Player left the ring
    PlayerLeft {
        /// Who left
        player: Identity,
    },

    /// Ship changed course
    TurnRateChanged {
        /// Ship owner
        player: Identity,
        /// New turn rate
        turn_rate: u64,
        /// Position materialized at the change
        circle: Circle,
        /// Heading at the change, in quanta
        phase: u64,
    },

    /// Cannonball in flight
    CannonFired {
        /// Shooter
        player: Identity,
        /// Landing circle
        aim: Circle,
        /// Ammunition remaining
        cannon_balls_left: u64,
    },

    /// Cannonball landed on a ship
    ShipHit {
        /// Shooter
        attacker: Identity,
        /// Ship that was hit
        target: Identity,
        /// Target health after damage
        health: u64,
    },

    /// New loot placed
    LootSpawned {
        /// Registry id
        loot_id: u64,
        /// Placement
        circle: Circle,
    },

    /// Loot collected and relocated
    LootPickedUp {
        /// Collector
        player: Identity,
        /// Registry id
        loot_id: u64,
        /// Gold awarded
        reward: u64,
        /// Collector's gold after the reward
        gold: u64,
        /// Where the loot moved to
        relocated_to: Circle,
    },
}

/// A game event with the height it happened at.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameEvent {
    /// Block height when event occurred
    pub tick: u64,

    /// Event data
    pub data: GameEventData,
}

impl GameEvent {
    /// Create a new event.
    pub fn new(tick: u64, data: GameEventData) -> Self {
        Self { tick, data }
    }

    /// Player the event is about, if any.
    pub fn player(&self) -> Option<Identity> {
        match &self.data {
            GameEventData::PlayerSpawned { player, .. }
            | GameEventData::PlayerLeft { player }
            | GameEventData::TurnRateChanged { player, .. }
            | GameEventData::CannonFired { player, .. }
            | GameEventData::LootPickedUp { player, .. } => Some(*player),
            GameEventData::ShipHit { target, .. } => Some(*target),
            GameEventData::LootSpawned { .. } => None,
        }
    }

    /// Create loot spawned event.
    pub fn loot_spawned(tick: u64, loot_id: u64, circle: Circle) -> Self {
        Self::new(tick, GameEventData::LootSpawned { loot_id, circle })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_player() {
        let a = Identity::new([1; 32]);
        let b = Identity::new([2; 32]);

        let hit = GameEvent::new(3, GameEventData::ShipHit { attacker: a, target: b, health: 7 });
        assert_eq!(hit.player(), Some(b));

        let loot = GameEvent::loot_spawned(3, 0, Circle::ZERO);
        assert_eq!(loot.player(), None);
    }

    #[test]
    fn test_event_json() {
        let event = GameEvent::new(9, GameEventData::PlayerLeft { player: Identity::new([5; 32]) });
        let json = serde_json::to_string(&event).unwrap();
        let back: GameEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }
}
