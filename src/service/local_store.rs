use async_trait::async_trait;
use chrono::Utc;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::{Mutex, broadcast};
use tracing::{debug, info};

use crate::error::ScannerError;
use crate::service::feed::{ReceiptEvent, ReceiptFeed};
use crate::service::persistence::ReceiptStore;
use crate::types::receipt::{ReceiptRecord, StoreKind, StoredReceipt};

/// Well-known key holding the receipt list.
pub const RECEIPTS_KEY: &str = "receipts";

/// Device-local fallback: one JSON array under [`RECEIPTS_KEY`], newest first.
pub struct LocalStore {
    path: PathBuf,
    write_lock: Mutex<()>,
    feed: ReceiptFeed,
}

impl LocalStore {
    /// Open the key-value directory, creating it when missing.
    pub async fn open(dir: impl AsRef<Path>) -> Result<Self, ScannerError> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir).await?;
        let path = dir.join(format!("{RECEIPTS_KEY}.json"));
        info!(path = %path.display(), "local receipt store ready");
        Ok(Self {
            path,
            write_lock: Mutex::new(()),
            feed: ReceiptFeed::new(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<Vec<StoredReceipt>, ScannerError> {
        match fs::read(&self.path).await {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Ok(Vec::new()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn store(&self, receipts: &[StoredReceipt]) -> Result<(), ScannerError> {
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec(receipts)?).await?;
        fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

/// Millisecond timestamp id, bumped past the newest entry so ids never repeat.
fn next_id(now_ms: i64, newest: Option<&StoredReceipt>) -> String {
    let floor = newest
        .and_then(|r| r.id.parse::<i64>().ok())
        .map(|last| last.saturating_add(1))
        .unwrap_or(i64::MIN);
    now_ms.max(floor).to_string()
}

#[async_trait]
impl ReceiptStore for LocalStore {
    fn kind(&self) -> StoreKind {
        StoreKind::Local
    }

    /// Local entries carry no owner; `_owner` is ignored.
    async fn insert(
        &self,
        record: ReceiptRecord,
        _owner: Option<String>,
    ) -> Result<StoredReceipt, ScannerError> {
        let stored = {
            let _guard = self.write_lock.lock().await;
            let mut receipts = self.load().await?;
            let now = Utc::now();
            let stored = StoredReceipt {
                id: next_id(now.timestamp_millis(), receipts.first()),
                record,
                uid: None,
                created_at: now,
            };
            receipts.insert(0, stored.clone());
            self.store(&receipts).await?;
            debug!(id = %stored.id, total = receipts.len(), "receipt saved locally");
            stored
        };

        self.feed.publish(ReceiptEvent::Added {
            id: stored.id.clone(),
            source: StoreKind::Local,
        });
        Ok(stored)
    }

    async fn list(&self) -> Result<Vec<StoredReceipt>, ScannerError> {
        self.load().await
    }

    async fn get(&self, id: &str) -> Result<Option<StoredReceipt>, ScannerError> {
        Ok(self.load().await?.into_iter().find(|r| r.id == id))
    }

    fn subscribe(&self) -> broadcast::Receiver<ReceiptEvent> {
        self.feed.subscribe()
    }
}
