//! Transaction Log Records
//!
//! What a mirror observes: blocks of transaction records, each naming an
//! operation by method id and carrying its arguments as a flat list of
//! `u64` fields.
//!
//! ## Argument layout
//!
//! | Operation        | Fields                                  |
//! |------------------|-----------------------------------------|
//! | `spawn`          | none                                    |
//! | `leave`          | none                                    |
//! | `changeTurnRate` | `new_turn_rate`                         |
//! | `shoot`          | `offset_x`, `offset_y`                  |
//! | `hit`            | attacker (4 limbs), target (4 limbs)    |
//! | `pickupLoot`     | `loot_id`                               |

use std::collections::BTreeMap;
use serde::{Serialize, Deserialize};
use thiserror::Error;

use crate::core::hash::{hash_with_domain, method_id, MethodId};
use crate::game::error::{RingError, Rejection};
use crate::game::events::GameEvent;
use crate::game::identity::{Identity, IDENTITY_FIELDS};
use crate::game::rules::{Operation, OperationKind, TxContext, MODULE_NAME};
use crate::game::state::GameState;

/// 32-byte hash rendered as hex in JSON.
pub type Hash32 = [u8; 32];

/// Mirror synchronization errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    /// Method id not in the registry. The log and this build disagree.
    #[error("unknown method {method_id} in tx {tx}")]
    UnknownOperation {
        /// Offending transaction hash (hex).
        tx: String,
        /// Unrecognized id.
        method_id: MethodId,
    },

    /// Argument list does not fit the operation.
    #[error("{kind} expects {expected} argument fields, got {got}")]
    MalformedArguments {
        /// Operation being decoded.
        kind: OperationKind,
        /// Required field count.
        expected: usize,
        /// Supplied field count.
        got: usize,
    },

    /// A record marked successful was rejected locally.
    #[error("tx {tx} at height {height} diverged: {reason}")]
    Diverged {
        /// Block height.
        height: u64,
        /// Transaction hash (hex).
        tx: String,
        /// Local rejection.
        reason: Rejection,
    },

    /// Block is older than the mirror.
    #[error("block {block} is behind mirror height {current}")]
    HeightRegression {
        /// Mirror height.
        current: u64,
        /// Block height.
        block: u64,
    },

    /// Fetched ring is inconsistent.
    #[error("ring check failed: {0}")]
    Ring(#[from] RingError),

    /// Ring walk exceeded the configured bound.
    #[error("ring walk exceeded {0} players")]
    RingWalkLimit(usize),

    /// Sync task is gone.
    #[error("sync channel closed")]
    ChannelClosed,

    /// Sync task panicked or was cancelled.
    #[error("sync task failed: {0}")]
    TaskFailed(String),
}

impl SyncError {
    /// Errors a resync cannot repair.
    pub fn is_fatal(&self) -> bool {
        matches!(self, SyncError::UnknownOperation { .. })
    }
}

mod hex32 {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8; 32], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<[u8; 32], D::Error> {
        let s = String::deserialize(deserializer)?;
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(&s, &mut bytes).map_err(serde::de::Error::custom)?;
        Ok(bytes)
    }
}

// =============================================================================
// METHOD REGISTRY
// =============================================================================

/// Maps method ids to operations for one module name.
#[derive(Clone, Debug)]
pub struct MethodRegistry {
    module: String,
    by_id: BTreeMap<MethodId, OperationKind>,
}

impl Default for MethodRegistry {
    fn default() -> Self {
        Self::new(MODULE_NAME)
    }
}

impl MethodRegistry {
    /// Registry for `module`.
    pub fn new(module: &str) -> Self {
        let by_id = OperationKind::ALL
            .iter()
            .map(|kind| (method_id(module, kind.method_name()), *kind))
            .collect();
        Self { module: module.to_string(), by_id }
    }

    /// Module name the ids are derived from.
    pub fn module(&self) -> &str {
        &self.module
    }

    /// Id of `kind`.
    pub fn id_of(&self, kind: OperationKind) -> MethodId {
        method_id(&self.module, kind.method_name())
    }

    /// Kind named by `id`.
    pub fn kind_of(&self, id: &MethodId) -> Option<OperationKind> {
        self.by_id.get(id).copied()
    }

    /// Decode a record into a typed operation.
    pub fn decode(&self, record: &TransactionRecord) -> Result<Operation, SyncError> {
        let kind = self.kind_of(&record.method_id).ok_or_else(|| SyncError::UnknownOperation {
            tx: hex::encode(record.hash),
            method_id: record.method_id,
        })?;
        Operation::decode(kind, &record.args_fields)
    }
}

// =============================================================================
// ARGUMENT CODEC
// =============================================================================

impl OperationKind {
    /// Number of `u64` argument fields.
    pub fn arg_count(self) -> usize {
        match self {
            OperationKind::Spawn | OperationKind::Leave => 0,
            OperationKind::ChangeTurnRate | OperationKind::PickupLoot => 1,
            OperationKind::Shoot => 2,
            OperationKind::Hit => 2 * IDENTITY_FIELDS,
        }
    }
}

impl Operation {
    /// Flatten arguments into fields.
    pub fn encode_args(&self) -> Vec<u64> {
        match *self {
            Operation::Spawn | Operation::Leave => Vec::new(),
            Operation::ChangeTurnRate { new_turn_rate } => vec![new_turn_rate],
            Operation::Shoot { offset_x, offset_y } => vec![offset_x, offset_y],
            Operation::Hit { attacker, target } => {
                let mut fields = attacker.to_fields().to_vec();
                fields.extend_from_slice(&target.to_fields());
                fields
            }
            Operation::PickupLoot { loot_id } => vec![loot_id],
        }
    }

    /// Rebuild an operation of `kind` from its fields.
    pub fn decode(kind: OperationKind, fields: &[u64]) -> Result<Self, SyncError> {
        let expected = kind.arg_count();
        if fields.len() != expected {
            return Err(SyncError::MalformedArguments { kind, expected, got: fields.len() });
        }

        let op = match kind {
            OperationKind::Spawn => Operation::Spawn,
            OperationKind::Leave => Operation::Leave,
            OperationKind::ChangeTurnRate => Operation::ChangeTurnRate { new_turn_rate: fields[0] },
            OperationKind::Shoot => Operation::Shoot { offset_x: fields[0], offset_y: fields[1] },
            OperationKind::Hit => {
                let (a, b) = fields.split_at(IDENTITY_FIELDS);
                let malformed = |_| SyncError::MalformedArguments { kind, expected, got: fields.len() };
                Operation::Hit {
                    attacker: Identity::from_fields(a).map_err(malformed)?,
                    target: Identity::from_fields(b).map_err(malformed)?,
                }
            }
            OperationKind::PickupLoot => Operation::PickupLoot { loot_id: fields[0] },
        };
        Ok(op)
    }
}

// =============================================================================
// RECORDS
// =============================================================================

/// One transaction as seen in the log.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    /// Transaction hash, seeds this transaction's randomness
    #[serde(with = "hex32")]
    pub hash: Hash32,
    /// Target operation
    #[serde(alias = "methodId")]
    pub method_id: MethodId,
    /// Signer
    #[serde(alias = "senderIdentityBase58")]
    pub sender: Identity,
    /// Flattened arguments
    #[serde(alias = "argsFields")]
    pub args_fields: Vec<u64>,
    /// False if the transaction failed upstream
    pub status: bool,
}

impl TransactionRecord {
    /// Successful record for `op`.
    pub fn for_operation(
        registry: &MethodRegistry,
        sender: Identity,
        op: &Operation,
        hash: Hash32,
    ) -> Self {
        Self {
            hash,
            method_id: registry.id_of(op.kind()),
            sender,
            args_fields: op.encode_args(),
            status: true,
        }
    }

    /// Same record with a different status.
    pub fn with_status(mut self, status: bool) -> Self {
        self.status = status;
        self
    }
}

/// All records of one timeline step, in execution order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    /// Timeline position
    pub height: u64,
    /// Timeline hash, seeds randomness
    #[serde(with = "hex32")]
    pub network_hash: Hash32,
    /// Records in order
    pub txs: Vec<TransactionRecord>,
}

impl Block {
    /// Empty block.
    pub fn new(height: u64, network_hash: Hash32) -> Self {
        Self { height, network_hash, txs: Vec::new() }
    }

    /// Network hash for `height` on a local timeline.
    pub fn local_network_hash(height: u64) -> Hash32 {
        hash_with_domain(b"PIRATES_BLOCK_V1", &height.to_le_bytes())
    }

    /// Serialize as JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Parse JSON produced by [`Block::to_json`].
    pub fn from_json(s: &str) -> serde_json::Result<Self> {
        serde_json::from_str(s)
    }
}

// =============================================================================
// BLOCK BUILDER
// =============================================================================

/// Executes operations against an authoritative state and logs them.
///
/// Rejected operations are still logged, with `status = false`.
pub struct BlockBuilder<'a> {
    registry: &'a MethodRegistry,
    block: Block,
}

impl<'a> BlockBuilder<'a> {
    /// Start a block at `height`, moving `state` there.
    pub fn open(
        registry: &'a MethodRegistry,
        state: &mut GameState,
        height: u64,
    ) -> Result<Self, SyncError> {
        state.advance_to(height).map_err(|_| SyncError::HeightRegression {
            current: state.block_height(),
            block: height,
        })?;
        Ok(Self {
            registry,
            block: Block::new(height, Block::local_network_hash(height)),
        })
    }

    /// Apply `op` and record it.
    pub fn submit(
        &mut self,
        state: &mut GameState,
        sender: Identity,
        op: Operation,
    ) -> Result<Vec<GameEvent>, Rejection> {
        let hash = self.tx_hash(&sender, &op);
        let ctx = TxContext::new(self.block.network_hash, hash);
        let result = state.apply(&sender, &op, &ctx);

        let record = TransactionRecord::for_operation(self.registry, sender, &op, hash)
            .with_status(result.is_ok());
        self.block.txs.push(record);
        result
    }

    /// Finish the block.
    pub fn seal(self) -> Block {
        self.block
    }

    fn tx_hash(&self, sender: &Identity, op: &Operation) -> Hash32 {
        let mut data = Vec::with_capacity(48 + 8 * op.kind().arg_count());
        data.extend_from_slice(&self.block.height.to_le_bytes());
        data.extend_from_slice(&(self.block.txs.len() as u64).to_le_bytes());
        data.extend_from_slice(sender.as_bytes());
        data.extend_from_slice(self.registry.id_of(op.kind()).0.as_slice());
        for field in op.encode_args() {
            data.extend_from_slice(&field.to_le_bytes());
        }
        hash_with_domain(b"PIRATES_TX_V1", &data)
    }
}

// =============================================================================
// TESTS
// =============================================================================
