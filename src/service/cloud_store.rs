use async_trait::async_trait;
use chrono::{SubsecRound, Utc};
use tokio::sync::broadcast;
use tracing::debug;
use uuid::Uuid;

use crate::db::{DbReceipt, ReceiptsStorage};
use crate::error::ScannerError;
use crate::service::feed::{ReceiptEvent, ReceiptFeed};
use crate::service::persistence::ReceiptStore;
use crate::types::receipt::{ReceiptRecord, StoreKind, StoredReceipt};

/// Shared cloud collection backed by the `receipts` table.
pub struct CloudStore {
    storage: ReceiptsStorage,
    feed: ReceiptFeed,
}

impl CloudStore {
    pub fn new(storage: ReceiptsStorage) -> Self {
        Self {
            storage,
            feed: ReceiptFeed::new(),
        }
    }

    pub async fn connect(database_url: &str) -> Result<Self, ScannerError> {
        Ok(Self::new(ReceiptsStorage::connect(database_url).await?))
    }
}

#[async_trait]
impl ReceiptStore for CloudStore {
    fn kind(&self) -> StoreKind {
        StoreKind::Cloud
    }

    /// Id and timestamp are assigned here, on the server side of the write.
    async fn insert(
        &self,
        record: ReceiptRecord,
        owner: Option<String>,
    ) -> Result<StoredReceipt, ScannerError> {
        // stored with microsecond precision
        let now = Utc::now().trunc_subsecs(6);
        let row = DbReceipt::new(Uuid::new_v4().to_string(), owner, record, now);
        self.storage.insert(&row).await?;
        debug!(id = %row.id, uid = ?row.uid, "receipt written to cloud collection");

        self.feed.publish(ReceiptEvent::Added {
            id: row.id.clone(),
            source: StoreKind::Cloud,
        });
        Ok(row.into())
    }

    async fn list(&self) -> Result<Vec<StoredReceipt>, ScannerError> {
        Ok(self
            .storage
            .list_recent()
            .await?
            .into_iter()
            .map(Into::into)
            .collect())
    }

    async fn get(&self, id: &str) -> Result<Option<StoredReceipt>, ScannerError> {
        Ok(self.storage.get_by_id(id).await?.map(Into::into))
    }

    fn subscribe(&self) -> broadcast::Receiver<ReceiptEvent> {
        self.feed.subscribe()
    }
}
