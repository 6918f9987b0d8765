//! Async Mirror Driver
//!
//! Runs a [`Mirror`] on a tokio task. Blocks and resync requests arrive on
//! an mpsc channel and are handled strictly in order; readers share the
//! mirror through an `Arc<RwLock<_>>`.
//!
//! Redelivered blocks are ignored. After a recoverable replay error the
//! driver stalls: further blocks are dropped until a resync succeeds. An
//! unknown method id ends the task.

use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use crate::game::identity::Identity;
use crate::mirror::replay::Mirror;
use crate::mirror::source::StateSource;
use crate::mirror::transaction::{Block, SyncError};

/// Shareable authoritative reader.
pub type SharedSource = Arc<dyn StateSource + Send + Sync>;

/// Commands for the driver.
pub enum SyncCommand {
    /// Replay a block
    Block(Block),
    /// Rebuild from authoritative reads
    Resync {
        /// Where to read from
        source: SharedSource,
        /// Ring entry point
        start: Identity,
    },
    /// Stop the task
    Shutdown,
}

/// Handle to a running driver.
pub struct MirrorHandle {
    commands: mpsc::Sender<SyncCommand>,
    mirror: Arc<RwLock<Mirror>>,
    task: JoinHandle<Result<(), SyncError>>,
}

impl MirrorHandle {
    /// Shared mirror for readers.
    pub fn mirror(&self) -> Arc<RwLock<Mirror>> {
        self.mirror.clone()
    }

    /// Queue a block.
    pub async fn submit_block(&self, block: Block) -> Result<(), SyncError> {
        self.send(SyncCommand::Block(block)).await
    }

    /// Queue a resync.
    pub async fn resync(&self, source: SharedSource, start: Identity) -> Result<(), SyncError> {
        self.send(SyncCommand::Resync { source, start }).await
    }

    /// Stop the driver and wait for it.
    ///
    /// Returns the error that ended the task, if any.
    pub async fn shutdown(self) -> Result<(), SyncError> {
        // Already gone is fine; the join below reports why
        let _ = self.commands.send(SyncCommand::Shutdown).await;
        self.task.await.map_err(|e| SyncError::TaskFailed(e.to_string()))?
    }

    async fn send(&self, command: SyncCommand) -> Result<(), SyncError> {
        self.commands.send(command).await.map_err(|_| SyncError::ChannelClosed)
    }
}

/// Start a driver task for `mirror`.
pub fn spawn_mirror(mirror: Mirror, channel_capacity: usize) -> MirrorHandle {
    let (commands, rx) = mpsc::channel(channel_capacity.max(1));
    let mirror = Arc::new(RwLock::new(mirror));
    let task = tokio::spawn(run_sync_loop(mirror.clone(), rx));
    MirrorHandle { commands, mirror, task }
}

#[instrument(skip_all)]
async fn run_sync_loop(
    mirror: Arc<RwLock<Mirror>>,
    mut rx: mpsc::Receiver<SyncCommand>,
) -> Result<(), SyncError> {
    let mut stalled = false;

    while let Some(command) = rx.recv().await {
        match command {
            SyncCommand::Block(block) => {
                if stalled {
                    debug!("Dropping block {} until resync", block.height);
                    continue;
                }
                let result = mirror.write().await.apply_block(&block);
                match result {
                    Ok(report) if report.stale => debug!("Block {} already applied", report.height),
                    Ok(report) => debug!("Block {}: {} events", report.height, report.events.len()),
                    Err(e) if e.is_fatal() => {
                        warn!("Stopping mirror: {}", e);
                        return Err(e);
                    }
                    Err(e) => {
                        warn!("Replay stalled at block {}: {}", block.height, e);
                        stalled = true;
                    }
                }
            }
            SyncCommand::Resync { source, start } => {
                let result = mirror.write().await.resync(source.as_ref(), &start);
                match result {
                    Ok(_) => stalled = false,
                    Err(e) => warn!("Resync failed: {}", e),
                }
            }
            SyncCommand::Shutdown => break,
        }
    }

    info!("Mirror driver stopped");
    Ok(())
}
