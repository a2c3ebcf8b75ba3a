use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{info, warn};

use crate::config::Config;
use crate::error::ScannerError;
use crate::service::cloud_store::CloudStore;
use crate::service::feed::ReceiptEvent;
use crate::service::local_store::LocalStore;
use crate::types::receipt::{ReceiptRecord, StoreKind, StoredReceipt};

pub const CLOUD_FALLBACK_NOTICE: &str =
    "Could not save to the cloud. The receipt was saved on this device instead.";

/// Storage backend for receipt records.
#[async_trait]
pub trait ReceiptStore: Send + Sync {
    fn kind(&self) -> StoreKind;

    /// Persist one record; `owner` is the uid of the writing session, if any.
    async fn insert(
        &self,
        record: ReceiptRecord,
        owner: Option<String>,
    ) -> Result<StoredReceipt, ScannerError>;

    /// Newest first.
    async fn list(&self) -> Result<Vec<StoredReceipt>, ScannerError>;

    async fn get(&self, id: &str) -> Result<Option<StoredReceipt>, ScannerError>;

    fn subscribe(&self) -> broadcast::Receiver<ReceiptEvent>;
}

/// An authenticated user session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub uid: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SaveOutcome {
    pub receipt: StoredReceipt,
    pub destination: StoreKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
}

/// Chooses where each save goes and which store the views read.
#[derive(Clone)]
pub struct Persistence {
    cloud: Option<Arc<dyn ReceiptStore>>,
    local: Arc<dyn ReceiptStore>,
}

impl Persistence {
    pub fn new(cloud: Option<Arc<dyn ReceiptStore>>, local: Arc<dyn ReceiptStore>) -> Self {
        Self { cloud, local }
    }

    /// Cloud when `DATABASE_URL` is set, always backed by the local store.
    pub async fn from_config(cfg: &Config) -> Result<Self, ScannerError> {
        let local: Arc<dyn ReceiptStore> = Arc::new(LocalStore::open(&cfg.local_store_dir).await?);
        let cloud: Option<Arc<dyn ReceiptStore>> = match cfg.database_url() {
            Some(url) => {
                let store = CloudStore::connect(url).await?;
                info!("cloud receipt collection connected");
                Some(Arc::new(store) as Arc<dyn ReceiptStore>)
            }
            None => {
                info!("no cloud backend configured; running in local-only mode");
                None
            }
        };
        Ok(Self::new(cloud, local))
    }

    pub fn cloud_configured(&self) -> bool {
        self.cloud.is_some()
    }

    /// The single source every view reads, fixed at construction.
    pub fn active(&self) -> &Arc<dyn ReceiptStore> {
        self.cloud.as_ref().unwrap_or(&self.local)
    }

    /// Write to the cloud for authenticated sessions, locally otherwise.
    /// A failed cloud write falls back to the local store.
    pub async fn save(
        &self,
        record: ReceiptRecord,
        session: Option<&Session>,
    ) -> Result<SaveOutcome, ScannerError> {
        let mut notice = None;

        if let (Some(cloud), Some(session)) = (self.cloud.as_ref(), session) {
            match cloud.insert(record.clone(), Some(session.uid.clone())).await {
                Ok(receipt) => {
                    info!(id = %receipt.id, uid = %session.uid, "receipt saved to cloud");
                    return Ok(SaveOutcome {
                        receipt,
                        destination: StoreKind::Cloud,
                        notice: None,
                    });
                }
                Err(e) => {
                    warn!(error = %e, uid = %session.uid, "cloud save failed; falling back to local store");
                    notice = Some(CLOUD_FALLBACK_NOTICE.to_string());
                }
            }
        }

        let receipt = self.local.insert(record, None).await?;
        info!(id = %receipt.id, "receipt saved locally");
        Ok(SaveOutcome {
            receipt,
            destination: StoreKind::Local,
            notice,
        })
    }
}
