//! Render View
//!
//! Floating-point projection of mirrored state for renderers. Positions
//! are extrapolated with `f64` trig, so they track the integer engine
//! closely but not bit for bit.
//!
//! # Warning
//! Only use for visual output. NEVER feed these values back into the engine.

use std::f64::consts::TAU;
use serde::{Serialize, Deserialize};

use crate::core::fixed::{to_float, QUANTIZATION_LEVEL, SHIP_SPEED};
use crate::game::identity::Identity;
use crate::game::state::{GameState, Ship};

/// A ship in world units.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlayerView {
    /// Player identity
    pub id: Identity,
    /// Extrapolated x
    pub x: f64,
    /// Extrapolated y
    pub y: f64,
    /// Ship radius
    pub radius: f64,
    /// Heading in degrees
    pub heading_deg: f64,
    /// Remaining health
    pub health: u64,
    /// Collected gold
    pub gold: u64,
    /// Cannonballs left
    pub cannon_balls: u64,
    /// Height the current shot lands, if one is in flight
    pub cannonball_lands_at: Option<u64>,
}

/// A loot in world units.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LootView {
    /// Loot id
    pub id: u64,
    /// Center x
    pub x: f64,
    /// Center y
    pub y: f64,
    /// Pickup radius
    pub radius: f64,
}

/// Everything a renderer needs for one frame.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MirrorView {
    /// Height the view was taken at
    pub block_height: u64,
    /// Sailing players in ring order
    pub players: Vec<PlayerView>,
    /// All loots in id order
    pub loots: Vec<LootView>,
}

impl MirrorView {
    /// Project `state` at its current height.
    pub fn from_state(state: &GameState) -> Self {
        let height = state.block_height();
        let players = state
            .ring_members()
            .into_iter()
            .filter_map(|id| {
                let p = state.player(&id)?;
                let (x, y) = float_position(&p.ship, height);
                let elapsed = height.saturating_sub(p.ship.last_updated_at) as f64;
                let phase = p.ship.phase as f64 + p.ship.turn_rate as f64 * elapsed;
                Some(PlayerView {
                    id,
                    x,
                    y,
                    radius: to_float(p.ship.circle.r),
                    heading_deg: (phase * 360.0 / QUANTIZATION_LEVEL as f64) % 360.0,
                    health: p.ship.health,
                    gold: p.gold,
                    cannon_balls: p.cannon_balls,
                    cannonball_lands_at: p.prev_cannon_ball
                        .map(|b| b.lands_at())
                        .filter(|t| *t >= height),
                })
            })
            .collect();

        let loots = state
            .loots()
            .map(|(id, loot)| {
                let (x, y, radius) = loot.circle.to_floats();
                LootView { id, x, y, radius }
            })
            .collect();

        Self { block_height: height, players, loots }
    }
}

/// Quanta to radians.
fn radians(quanta: f64) -> f64 {
    quanta * TAU / QUANTIZATION_LEVEL as f64
}

/// Ship position at `height` in world units, using `f64` trig.
pub fn float_position(ship: &Ship, height: u64) -> (f64, f64) {
    let (x0, y0, _) = ship.circle.to_floats();
    let t = height.saturating_sub(ship.last_updated_at) as f64;
    let travel = to_float(SHIP_SPEED) * t;
    let p = ship.phase as f64;

    let (dx, dy) = if ship.turn_rate == 0 {
        (radians(p).sin() * travel, radians(p).cos() * travel)
    } else {
        let w = ship.turn_rate as f64;
        let swept = w * t + QUANTIZATION_LEVEL as f64 - p;
        let quarter = QUANTIZATION_LEVEL as f64 / 4.0;
        (
            (radians(swept).cos() - radians(p).cos()) * travel / w,
            (radians(swept + quarter).sin() - radians(p).sin()) * travel / w,
        )
    };

    // Same folding as the integer model
    ((x0 + dx).abs(), (y0 + dy).abs())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fixed::{from_units, SHIP_SIZE};
    use crate::game::rules::{Operation, TxContext};

    fn ship(phase: u64, turn_rate: u64) -> Ship {
        Ship {
            health: 10,
            circle: crate::core::circle::Circle::new(from_units(500), from_units(500), SHIP_SIZE),
            turn_rate,
            phase,
            last_updated_at: 0,
        }
    }

    #[test]
    fn test_float_tracks_integer_motion() {
        for phase in [0, 5, 18, 40, 71] {
            for rate in [0, 1, 6, 13] {
                let s = ship(phase, rate);
                for t in [1, 4, 9] {
                    let exact = s.position_at(t);
                    let (x, y) = float_position(&s, t);
                    assert!((x - to_float(exact.x)).abs() < 0.05, "x phase={phase} rate={rate} t={t}");
                    assert!((y - to_float(exact.y)).abs() < 0.05, "y phase={phase} rate={rate} t={t}");
                }
            }
        }
    }

    #[test]
    fn test_view_from_state() {
        let mut state = GameState::genesis(&[2; 32], 1);
        let ctx = TxContext::new([2; 32], [1; 32]);
        let a = Identity::new([1; 32]);
        state.apply(&a, &Operation::Spawn, &ctx).unwrap();
        state.advance_to(2).unwrap();

        let view = MirrorView::from_state(&state);
        assert_eq!(view.block_height, 2);
        assert_eq!(view.players.len(), 1);
        assert_eq!(view.loots.len() as u64, state.loot_top());

        let p = &view.players[0];
        assert_eq!(p.id, a);
        assert_eq!(p.radius, 10.0);
        assert_eq!(p.heading_deg, 60.0);
        assert!(p.cannonball_lands_at.is_none());
    }
}
