//! Pirates Engine Demo
//!
//! Plays a short scripted session on the authoritative engine, replays its
//! log into a mirror on the async driver, resyncs a second mirror from the
//! engine directly, and checks that all three agree.
//!
//! Usage: `pirates-engine [config.json]`. Set `RUST_LOG` to adjust logging.

use std::sync::Arc;
use anyhow::{bail, Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

use pirates_engine::{
    VERSION,
    config::PiratesConfig,
    core::fixed::CANNON_WAIT_TIME,
    game::{GameState, Identity, Operation},
    mirror::{spawn_mirror, Block, BlockBuilder, MethodRegistry, Mirror, SharedSource},
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Pirates Engine v{}", VERSION);

    let config = match std::env::args().nth(1) {
        Some(path) => PiratesConfig::from_json_file(&path)
            .with_context(|| format!("loading config from {}", path))?,
        None => PiratesConfig::default(),
    };

    let genesis = config.engine.genesis_state()?;
    let registry = MethodRegistry::new(&config.sync.module_name);

    let (engine, blocks) = demo_session(genesis.clone(), &registry)?;
    info!(
        "Session done at height {}: {} sailing, {} loots",
        engine.block_height(), engine.sailing_count(), engine.loot_top()
    );

    // Replay through the async driver
    let handle = spawn_mirror(Mirror::new(genesis, config.sync.clone()), config.sync.channel_capacity);
    for block in blocks {
        handle.submit_block(block).await?;
    }
    let replayed = handle.mirror();
    handle.shutdown().await?;
    let replayed = replayed.read().await;

    // Resync from direct reads
    let source: SharedSource = Arc::new(engine.clone());
    let mut resynced = Mirror::new(GameState::new(), config.sync.clone());
    let start = engine.ring_members().first().copied().unwrap_or(Identity::EMPTY);
    resynced.resync(source.as_ref(), &start)?;

    let hashes = [
        ("engine", engine.compute_hash()),
        ("replay", replayed.compute_hash()),
        ("resync", resynced.compute_hash()),
    ];
    for (name, hash) in &hashes {
        info!("{:>6} state hash: {}", name, hex::encode(hash));
    }
    if hashes.iter().any(|(_, h)| *h != hashes[0].1) {
        bail!("mirror state diverged from engine");
    }

    for player in replayed.view().players {
        info!(
            "Ship {} at ({:.2}, {:.2}) heading {:.0}°, health {}, gold {}",
            player.id.short(), player.x, player.y, player.heading_deg, player.health, player.gold
        );
    }
    info!("All states agree");
    Ok(())
}

/// Scripted session: three ships join, one turns, one shoots and hits,
/// one tries for loot, one leaves.
fn demo_session(mut engine: GameState, registry: &MethodRegistry) -> Result<(GameState, Vec<Block>)> {
    let players: Vec<Identity> = (1..=3u8).map(|n| Identity::new([n; 32])).collect();
    let mut blocks = Vec::new();

    let mut block = BlockBuilder::open(registry, &mut engine, 1)?;
    for p in &players {
        let events = block.submit(&mut engine, *p, Operation::Spawn)?;
        info!("{} spawned ({} events)", p.short(), events.len());
    }
    blocks.push(block.seal());

    let fire_at = 3;
    let lands_at = fire_at + CANNON_WAIT_TIME;
    let mut block = BlockBuilder::open(registry, &mut engine, fire_at)?;
    block.submit(&mut engine, players[1], Operation::ChangeTurnRate { new_turn_rate: 0 })?;
    let target = engine
        .player(&players[2])
        .context("target missing")?
        .ship
        .position_at(lands_at);
    block.submit(
        &mut engine,
        players[0],
        Operation::Shoot { offset_x: target.x, offset_y: target.y },
    )?;
    blocks.push(block.seal());

    let mut block = BlockBuilder::open(registry, &mut engine, lands_at)?;
    let hit = Operation::Hit { attacker: players[0], target: players[2] };
    block.submit(&mut engine, players[0], hit)?;

    // Usually out of reach; logged as failed either way
    if let Err(reason) = block.submit(&mut engine, players[1], Operation::PickupLoot { loot_id: 0 }) {
        info!("Pickup rejected: {}", reason);
    }
    block.submit(&mut engine, players[1], Operation::Leave)?;
    blocks.push(block.seal());

    if let Err(e) = engine.check_ring() {
        bail!("ring corrupted: {}", e);
    }
    Ok((engine, blocks))
}
