//! Mirror Engine
//!
//! A client-side copy of the engine state, kept current in one of two
//! ways:
//!
//! - **Replay**: feed it blocks; each successful record is decoded and run
//!   through the same [`rules::apply`](crate::game::rules::apply) the
//!   engine uses.
//! - **Resync**: rebuild wholesale from point reads of authoritative state.
//!
//! Both land on the same [`GameState`], so a mirror can always be compared
//! with the engine by [`GameState::compute_hash`].

use tracing::{debug, info, warn};

use crate::config::SyncConfig;
use crate::core::hash::StateHash;
use crate::game::events::GameEvent;
use crate::game::identity::Identity;
use crate::game::rules::TxContext;
use crate::game::state::{GameState, Snapshot};
use crate::mirror::source::{walk_loots, walk_ring, StateSource};
use crate::mirror::transaction::{Block, MethodRegistry, SyncError};
use crate::mirror::view::MirrorView;

/// Outcome of a replayed block.
#[derive(Clone, Debug, Default)]
pub struct BlockReport {
    /// Block height
    pub height: u64,
    /// Records replayed
    pub applied: usize,
    /// Failed records skipped
    pub skipped: usize,
    /// Events from replayed records
    pub events: Vec<GameEvent>,
    /// Block was already reflected in the mirror and was not replayed
    pub stale: bool,
}

/// Outcome of a resync.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResyncReport {
    /// Height of the fetched state
    pub block_height: u64,
    /// Players fetched, excluding the sentinel
    pub players: usize,
    /// Loots fetched
    pub loots: usize,
}

/// Replay/resync state container.
#[derive(Clone, Debug)]
pub struct Mirror {
    state: GameState,
    registry: MethodRegistry,
    config: SyncConfig,
    last_block: Option<u64>,
}

impl Mirror {
    /// Mirror starting from `state`, usually the same genesis the engine used.
    pub fn new(state: GameState, config: SyncConfig) -> Self {
        let registry = MethodRegistry::new(&config.module_name);
        Self { state, registry, config, last_block: None }
    }

    /// Mirrored state.
    pub fn state(&self) -> &GameState {
        &self.state
    }

    /// Height of the mirrored state.
    pub fn block_height(&self) -> u64 {
        self.state.block_height()
    }

    /// Height of the last block replayed or resynced to, if any.
    pub fn last_block(&self) -> Option<u64> {
        self.last_block
    }

    /// Method registry in use.
    pub fn registry(&self) -> &MethodRegistry {
        &self.registry
    }

    /// State hash.
    pub fn compute_hash(&self) -> StateHash {
        self.state.compute_hash()
    }

    /// Observable snapshot.
    pub fn snapshot(&self) -> Snapshot {
        self.state.snapshot()
    }

    /// Floating-point view for renderers.
    pub fn view(&self) -> MirrorView {
        MirrorView::from_state(&self.state)
    }

    /// Replay one block.
    ///
    /// All or nothing: on error the mirror is left as it was. A block at
    /// or below the last applied height is a no-op reported as stale, so
    /// redelivery never replays an operation twice.
    pub fn apply_block(&mut self, block: &Block) -> Result<BlockReport, SyncError> {
        if self.last_block.is_some_and(|last| block.height <= last) {
            debug!("Ignoring stale block {}", block.height);
            return Ok(BlockReport {
                height: block.height,
                skipped: block.txs.len(),
                stale: true,
                ..Default::default()
            });
        }

        let current = self.state.block_height();
        if block.height < current {
            return Err(SyncError::HeightRegression { current, block: block.height });
        }

        let mut next = self.state.clone();
        next.advance_to(block.height)
            .map_err(|_| SyncError::HeightRegression { current, block: block.height })?;

        let mut report = BlockReport { height: block.height, ..Default::default() };
        for record in &block.txs {
            if !record.status {
                debug!("Skipping failed tx {}", hex::encode(&record.hash[..4]));
                report.skipped += 1;
                continue;
            }

            let op = self.registry.decode(record)?;
            let ctx = TxContext::new(block.network_hash, record.hash);
            let events = next.apply(&record.sender, &op, &ctx).map_err(|reason| {
                SyncError::Diverged {
                    height: block.height,
                    tx: hex::encode(record.hash),
                    reason,
                }
            })?;
            report.events.extend(events);
            report.applied += 1;
        }

        self.state = next;
        self.last_block = Some(block.height);
        debug!(
            "Replayed block {}: {} applied, {} skipped",
            block.height, report.applied, report.skipped
        );
        Ok(report)
    }

    /// Replace the mirrored state with a fresh read of `source`.
    ///
    /// Nothing from the previous state survives. On error the previous
    /// state is kept.
    pub fn resync(
        &mut self,
        source: &dyn StateSource,
        start: &Identity,
    ) -> Result<ResyncReport, SyncError> {
        let players = walk_ring(source, start, self.config.max_ring_walk)?;
        let loots = walk_loots(source);
        let block_height = source.block_height();

        let report = ResyncReport {
            block_height,
            players: players.len().saturating_sub(1),
            loots: loots.len(),
        };

        let state = GameState::from_parts(players, loots, block_height).map_err(|e| {
            warn!("Resync rejected inconsistent ring: {}", e);
            SyncError::from(e)
        })?;
        self.state = state;
        self.last_block = Some(block_height);

        info!(
            "Resynced at height {}: {} players, {} loots",
            report.block_height, report.players, report.loots
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fixed::CANNON_WAIT_TIME;
    use crate::game::error::Rejection;
    use crate::game::rules::Operation;
    use crate::mirror::transaction::{BlockBuilder, TransactionRecord};

    fn id(n: u8) -> Identity {
        Identity::new([n; 32])
    }

    /// Run a fixed session on an engine and return it with its log.
    fn session() -> (GameState, Vec<Block>) {
        let registry = MethodRegistry::default();
        let mut engine = GameState::genesis(&[9; 32], 3);
        let mut blocks = Vec::new();

        let mut b = BlockBuilder::open(&registry, &mut engine, 1).unwrap();
        for n in 1..=4 {
            b.submit(&mut engine, id(n), Operation::Spawn).unwrap();
        }
        // Rejected, logged as failed
        let _ = b.submit(&mut engine, id(1), Operation::Spawn);
        blocks.push(b.seal());

        let mut b = BlockBuilder::open(&registry, &mut engine, 3).unwrap();
        b.submit(&mut engine, id(2), Operation::ChangeTurnRate { new_turn_rate: 0 }).unwrap();
        let lands = engine.player(&id(3)).unwrap().ship.position_at(3 + CANNON_WAIT_TIME);
        b.submit(&mut engine, id(1), Operation::Shoot { offset_x: lands.x, offset_y: lands.y }).unwrap();
        b.submit(&mut engine, id(4), Operation::Leave).unwrap();
        blocks.push(b.seal());

        let mut b = BlockBuilder::open(&registry, &mut engine, 3 + CANNON_WAIT_TIME).unwrap();
        b.submit(&mut engine, id(9), Operation::Hit { attacker: id(1), target: id(3) }).unwrap();
        let _ = b.submit(&mut engine, id(2), Operation::PickupLoot { loot_id: 0 });
        blocks.push(b.seal());

        (engine, blocks)
    }

    #[test]
    fn test_replay_matches_engine() {
        let (engine, blocks) = session();
        let mut mirror = Mirror::new(GameState::genesis(&[9; 32], 3), SyncConfig::default());

        let mut skipped = 0;
        for block in &blocks {
            skipped += mirror.apply_block(block).unwrap().skipped;
        }
        assert!(skipped >= 1);
        assert_eq!(mirror.state(), &engine);
        assert_eq!(mirror.compute_hash(), engine.compute_hash());
    }

    #[test]
    fn test_replay_and_resync_agree() {
        let (engine, blocks) = session();

        let mut replayed = Mirror::new(GameState::genesis(&[9; 32], 3), SyncConfig::default());
        for block in &blocks {
            replayed.apply_block(block).unwrap();
        }

        let mut resynced = Mirror::new(GameState::new(), SyncConfig::default());
        let report = resynced.resync(&engine, &id(2)).unwrap();
        assert_eq!(report.players, 3);
        assert_eq!(report.loots as u64, engine.loot_top());

        assert_eq!(replayed.snapshot(), resynced.snapshot());
        assert_eq!(replayed.compute_hash(), resynced.compute_hash());
    }

    #[test]
    fn test_resync_supersedes_prior_state() {
        let (engine, blocks) = session();
        let mut mirror = Mirror::new(GameState::genesis(&[9; 32], 3), SyncConfig::default());
        mirror.apply_block(&blocks[0]).unwrap();

        // Unrelated local history
        let mut stray = GameState::new();
        stray.apply(&id(77), &Operation::Spawn, &TxContext::default()).unwrap();
        mirror.resync(&stray, &id(77)).unwrap();
        assert!(mirror.state().is_sailing(&id(77)));

        mirror.resync(&engine, &Identity::EMPTY).unwrap();
        assert!(!mirror.state().is_sailing(&id(77)));
        assert_eq!(mirror.state(), &engine);
    }

    #[test]
    fn test_unknown_method_aborts_block() {
        let (_, blocks) = session();
        let mut mirror = Mirror::new(GameState::genesis(&[9; 32], 3), SyncConfig::default());
        let before = mirror.compute_hash();

        let mut bad = blocks[0].clone();
        let foreign = MethodRegistry::new("NotPirates");
        bad.txs.push(TransactionRecord::for_operation(&foreign, id(5), &Operation::Spawn, [3; 32]));

        let err = mirror.apply_block(&bad).unwrap_err();
        assert!(err.is_fatal());
        assert_eq!(mirror.compute_hash(), before, "block applied atomically");
    }

    #[test]
    fn test_failed_unknown_record_is_skipped() {
        let (_, blocks) = session();
        let mut mirror = Mirror::new(GameState::genesis(&[9; 32], 3), SyncConfig::default());

        let mut block = blocks[0].clone();
        let foreign = MethodRegistry::new("NotPirates");
        block.txs.push(
            TransactionRecord::for_operation(&foreign, id(5), &Operation::Spawn, [3; 32])
                .with_status(false),
        );
        assert!(mirror.apply_block(&block).is_ok());
    }

    #[test]
    fn test_divergence_detected() {
        let registry = MethodRegistry::default();
        let mut mirror = Mirror::new(GameState::new(), SyncConfig::default());

        // Claims success for a leave nobody could have made
        let mut block = Block::new(1, [0; 32]);
        block.txs.push(TransactionRecord::for_operation(&registry, id(1), &Operation::Leave, [1; 32]));

        assert_eq!(
            mirror.apply_block(&block).unwrap_err(),
            SyncError::Diverged {
                height: 1,
                tx: hex::encode([1u8; 32]),
                reason: Rejection::PlayerNotFound(id(1)),
            }
        );
        assert_eq!(mirror.block_height(), 0);
    }

    #[test]
    fn test_redelivered_block_is_not_replayed() {
        let (engine, blocks) = session();
        let mut mirror = Mirror::new(GameState::genesis(&[9; 32], 3), SyncConfig::default());

        // Every block twice, the hit block included
        for block in &blocks {
            assert!(!mirror.apply_block(block).unwrap().stale);
            let again = mirror.apply_block(block).unwrap();
            assert!(again.stale);
            assert_eq!(again.applied, 0);
            assert_eq!(again.skipped, block.txs.len());
        }
        assert_eq!(mirror.last_block(), Some(3 + CANNON_WAIT_TIME));
        assert_eq!(mirror.compute_hash(), engine.compute_hash());

        // Older blocks arriving late are no-ops too
        assert!(mirror.apply_block(&blocks[0]).unwrap().stale);
        assert_eq!(mirror.state(), &engine);
    }

    #[test]
    fn test_blocks_behind_resync_are_stale() {
        let (engine, blocks) = session();
        let mut mirror = Mirror::new(GameState::genesis(&[9; 32], 3), SyncConfig::default());
        mirror.resync(&engine, &Identity::EMPTY).unwrap();
        assert_eq!(mirror.last_block(), Some(engine.block_height()));

        for block in &blocks {
            assert!(mirror.apply_block(block).unwrap().stale);
        }
        assert_eq!(mirror.state(), &engine);
    }

    #[test]
    fn test_height_regression() {
        let (_, blocks) = session();
        let mut mirror = Mirror::new(GameState::genesis(&[9; 32], 3), SyncConfig::default());
        mirror.apply_block(&blocks[1]).unwrap_err(); // diverges, spawns missing
        assert_eq!(mirror.last_block(), None);
        mirror.apply_block(&blocks[0]).unwrap();
        mirror.apply_block(&blocks[1]).unwrap();

        // Started ahead of the log with nothing replayed yet
        let mut ahead = GameState::genesis(&[9; 32], 3);
        ahead.advance_to(10).unwrap();
        let mut mirror = Mirror::new(ahead, SyncConfig::default());
        assert!(matches!(
            mirror.apply_block(&blocks[0]),
            Err(SyncError::HeightRegression { current: 10, block: 1 })
        ));
    }
}
