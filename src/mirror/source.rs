//! Authoritative State Reads
//!
//! [`StateSource`] is the read seam a bulk resync pulls from. The walk
//! helpers rebuild the player and loot tables from point lookups only,
//! since a remote store cannot be iterated.

use std::collections::BTreeMap;

use crate::game::error::RingError;
use crate::game::identity::Identity;
use crate::game::state::{GameState, Loot, Player};
use crate::mirror::transaction::SyncError;

/// Point reads against authoritative state.
pub trait StateSource {
    /// Registry entry for `id`. The sentinel must be readable.
    fn fetch_player(&self, id: &Identity) -> Option<Player>;

    /// Loot by id.
    fn fetch_loot(&self, id: u64) -> Option<Loot>;

    /// Height the reads reflect.
    fn block_height(&self) -> u64;
}

impl StateSource for GameState {
    fn fetch_player(&self, id: &Identity) -> Option<Player> {
        self.entry(id).copied()
    }

    fn fetch_loot(&self, id: u64) -> Option<Loot> {
        self.loot(id).copied()
    }

    fn block_height(&self) -> u64 {
        GameState::block_height(self)
    }
}

/// Collect the ring starting at `start`.
///
/// Walks `next` until the sentinel or an already visited entry, then
/// `prev` from `start` the same way. An unknown, empty or non-sailing
/// `start` begins at the sentinel's successor. The sentinel entry is always included.
pub fn walk_ring(
    source: &dyn StateSource,
    start: &Identity,
    limit: usize,
) -> Result<BTreeMap<Identity, Player>, SyncError> {
    let head = source.fetch_player(&Identity::EMPTY).ok_or(RingError::MissingSentinel)?;

    let mut found = BTreeMap::new();
    found.insert(Identity::EMPTY, head);

    let start = match source.fetch_player(start) {
        Some(p) if !start.is_empty() && p.sailing => *start,
        _ => head.next,
    };

    follow(source, &mut found, start, |p| p.next, limit)?;
    let back = found.get(&start).map_or(Identity::EMPTY, |p| p.prev);
    follow(source, &mut found, back, |p| p.prev, limit)?;

    Ok(found)
}

fn follow(
    source: &dyn StateSource,
    found: &mut BTreeMap<Identity, Player>,
    mut cursor: Identity,
    step: impl Fn(&Player) -> Identity,
    limit: usize,
) -> Result<(), SyncError> {
    // The sentinel terminates the walk; a revisit means the other
    // direction already covered the rest.
    while !cursor.is_empty() && !found.contains_key(&cursor) {
        if found.len() > limit {
            return Err(SyncError::RingWalkLimit(limit));
        }
        let Some(player) = source.fetch_player(&cursor) else {
            break;
        };
        found.insert(cursor, player);
        cursor = step(&player);
    }
    Ok(())
}

/// Collect loots with ids `0, 1, 2, ...` up to the first miss.
pub fn walk_loots(source: &dyn StateSource) -> BTreeMap<u64, Loot> {
    let mut loots = BTreeMap::new();
    let mut id = 0;
    while let Some(loot) = source.fetch_loot(id) {
        loots.insert(id, loot);
        id += 1;
    }
    loots
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::rules::{Operation, TxContext};

    fn id(n: u8) -> Identity {
        Identity::new([n; 32])
    }

    fn engine(players: u8) -> GameState {
        let mut state = GameState::genesis(&[1; 32], 2);
        for n in 1..=players {
            state.apply(&id(n), &Operation::Spawn, &TxContext::new([1; 32], [n; 32])).unwrap();
        }
        state
    }

    #[test]
    fn test_walk_from_any_member_finds_everyone() {
        let state = engine(5);
        for start in [Identity::EMPTY, id(1), id(3), id(5), id(42)] {
            let found = walk_ring(&state, &start, 100).unwrap();
            assert_eq!(found.len(), 6, "five players plus sentinel from {:?}", start);
            for (pid, player) in state.players() {
                assert_eq!(found.get(pid), Some(player));
            }
        }
    }

    #[test]
    fn test_walk_empty_ring() {
        let state = GameState::new();
        let found = walk_ring(&state, &id(1), 100).unwrap();
        assert_eq!(found.len(), 1);
        assert!(found.contains_key(&Identity::EMPTY));
    }

    #[test]
    fn test_walk_limit() {
        let state = engine(5);
        assert_eq!(walk_ring(&state, &id(3), 2), Err(SyncError::RingWalkLimit(2)));
        assert!(walk_ring(&state, &id(3), 5).is_ok());
    }

    struct Headless;

    impl StateSource for Headless {
        fn fetch_player(&self, _: &Identity) -> Option<Player> {
            None
        }
        fn fetch_loot(&self, _: u64) -> Option<Loot> {
            None
        }
        fn block_height(&self) -> u64 {
            0
        }
    }

    #[test]
    fn test_walk_requires_sentinel() {
        assert_eq!(
            walk_ring(&Headless, &id(1), 10),
            Err(SyncError::Ring(RingError::MissingSentinel))
        );
        assert!(walk_loots(&Headless).is_empty());
    }

    /// Store that keeps entries of players who left, unlinked.
    struct KeepsCleared {
        live: GameState,
        cleared: Identity,
    }

    impl StateSource for KeepsCleared {
        fn fetch_player(&self, id: &Identity) -> Option<Player> {
            if *id == self.cleared {
                return Some(Player::sentinel());
            }
            self.live.fetch_player(id)
        }
        fn fetch_loot(&self, id: u64) -> Option<Loot> {
            self.live.fetch_loot(id)
        }
        fn block_height(&self) -> u64 {
            self.live.block_height()
        }
    }

    #[test]
    fn test_walk_from_cleared_entry() {
        let source = KeepsCleared { live: engine(3), cleared: id(7) };
        assert!(source.fetch_player(&id(7)).is_some_and(|p| !p.sailing));

        let found = walk_ring(&source, &id(7), 100).unwrap();
        assert_eq!(found.len(), 4);
        assert!(!found.contains_key(&id(7)));
        assert!(GameState::from_parts(found, walk_loots(&source), 0).is_ok());
    }

    #[test]
    fn test_walk_loots() {
        let state = engine(1);
        let loots = walk_loots(&state);
        assert_eq!(loots.len() as u64, state.loot_top());
        assert_eq!(loots.get(&0), state.loot(0));
    }
}
