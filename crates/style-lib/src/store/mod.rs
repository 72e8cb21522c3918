//! Prediction persistence and lookup
//!
//! Every served prediction can be written to a [`PredictionStore`] under two
//! identifiers: a store-native [`StoreId`] and a UUID `prediction_id`. Either
//! one resolves the record again through [`LookupKey::parse`].

mod file;
mod memory;
mod recorder;


pub use file::FileStore;
pub use memory::{MemoryStore, DEFAULT_MEMORY_CAPACITY};
pub use recorder::PredictionRecorder;

use crate::models::{LearningStyle, StudentRecord};
use crate::predictor::{StylePrediction, StyleScore};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, OnceLock};

pub use async_trait::async_trait;

/// Default number of records returned by [`PredictionStore::recent`]
pub const DEFAULT_RECENT_LIMIT: usize = 10;

/// 12-byte store identifier: 4-byte timestamp, 5 process-random bytes,
/// 3-byte counter. Rendered as 24 lowercase hex characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StoreId([u8; 12]);

static PROCESS_UNIQUE: OnceLock<[u8; 5]> = OnceLock::new();
static COUNTER: OnceLock<AtomicU32> = OnceLock::new();

impl StoreId {
    pub fn generate() -> Self {
        let seconds = Utc::now().timestamp() as u32;
        let unique = PROCESS_UNIQUE.get_or_init(rand::random);
        let count = COUNTER
            .get_or_init(|| AtomicU32::new(rand::random::<u32>() & 0x00ff_ffff))
            .fetch_add(1, Ordering::Relaxed);

        let mut bytes = [0u8; 12];
        bytes[..4].copy_from_slice(&seconds.to_be_bytes());
        bytes[4..9].copy_from_slice(unique);
        bytes[9..].copy_from_slice(&count.to_be_bytes()[1..]);
        Self(bytes)
    }

    /// Parse 24 hex characters; anything else is `None`
    pub fn parse(raw: &str) -> Option<Self> {
        if raw.len() != 24 {
            return None;
        }
        let mut bytes = [0u8; 12];
        hex::decode_to_slice(raw, &mut bytes).ok()?;
        Some(Self(bytes))
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Creation time embedded in the identifier
    pub fn timestamp(&self) -> i64 {
        let mut seconds = [0u8; 4];
        seconds.copy_from_slice(&self.0[..4]);
        u32::from_be_bytes(seconds) as i64
    }
}

impl fmt::Display for StoreId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for StoreId {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| StoreError::InvalidId(s.to_string()))
    }
}

impl Serialize for StoreId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for StoreId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid store id '{raw}'")))
    }
}

/// How a lookup string is resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupKey {
    StoreId(StoreId),
    PredictionId(String),
}

impl LookupKey {
    /// A well-formed store id is looked up as one; any other string is
    /// treated as a prediction id.
    pub fn parse(raw: &str) -> Self {
        match StoreId::parse(raw) {
            Some(id) => LookupKey::StoreId(id),
            None => LookupKey::PredictionId(raw.to_string()),
        }
    }
}

/// A persisted prediction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRecord {
    #[serde(rename = "_id")]
    pub id: StoreId,
    pub prediction_id: String,
    /// Integer class code of the predicted style
    pub learning_style: usize,
    pub predicted_style: LearningStyle,
    pub probabilities: Vec<StyleScore>,
    pub predicted_at: DateTime<Utc>,
    pub user_data: StudentRecord,
}

impl PredictionRecord {
    /// Build a record with fresh identifiers, stamped now
    pub fn new(prediction: &StylePrediction, input: StudentRecord) -> Self {
        Self {
            id: StoreId::generate(),
            prediction_id: uuid::Uuid::new_v4().to_string(),
            learning_style: prediction.style.code(),
            predicted_style: prediction.style,
            probabilities: prediction.scores.clone(),
            predicted_at: Utc::now(),
            user_data: input,
        }
    }

    pub fn matches(&self, key: &LookupKey) -> bool {
        match key {
            LookupKey::StoreId(id) => self.id == *id,
            LookupKey::PredictionId(pid) => self.prediction_id == *pid,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("prediction id '{0}' already exists")]
    Duplicate(String),

    #[error("invalid store id '{0}'")]
    InvalidId(String),

    #[error("persistence is disabled")]
    Disabled,

    #[error("store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("store encoding error: {0}")]
    Encoding(#[from] serde_json::Error),
}

/// Storage backend for predictions
#[async_trait]
pub trait PredictionStore: Send + Sync {
    /// Backend name for logs and health messages
    fn name(&self) -> &'static str;

    /// Prepare the unique `prediction_id` index; idempotent
    async fn ensure_indexes(&self) -> Result<(), StoreError>;

    /// Insert a record, rejecting a `prediction_id` already present
    async fn insert(&self, record: PredictionRecord) -> Result<StoreId, StoreError>;

    /// Fetch one record; `Ok(None)` when absent
    async fn find(&self, key: &LookupKey) -> Result<Option<PredictionRecord>, StoreError>;

    /// Newest records first, at most `limit`
    async fn recent(&self, limit: usize) -> Result<Vec<PredictionRecord>, StoreError>;
}

/// Which store backs the service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PersistenceMode {
    Memory,
    File,
    Disabled,
}

impl fmt::Display for PersistenceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PersistenceMode::Memory => f.write_str("memory"),
            PersistenceMode::File => f.write_str("file"),
            PersistenceMode::Disabled => f.write_str("disabled"),
        }
    }
}

/// Open the configured store; `None` when persistence is disabled.
///
/// `memory_capacity` bounds the memory store; the file store keeps its
/// whole log indexed.
pub async fn open_store(
    mode: PersistenceMode,
    path: &Path,
    memory_capacity: usize,
) -> Result<Option<Arc<dyn PredictionStore>>, StoreError> {
    let store: Arc<dyn PredictionStore> = match mode {
        PersistenceMode::Memory => Arc::new(MemoryStore::with_capacity(memory_capacity)),
        PersistenceMode::File => Arc::new(FileStore::open(path).await?),
        PersistenceMode::Disabled => {
            tracing::info!("Prediction persistence disabled");
            return Ok(None);
        }
    };

    store.ensure_indexes().await?;
    tracing::info!(store = store.name(), "Prediction store ready");
    Ok(Some(store))
}
