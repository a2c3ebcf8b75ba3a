use crate::types::receipt::{LineItem, ReceiptRecord, StoredReceipt};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One row of the `receipts` table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DbReceipt {
    pub id: String,
    pub uid: Option<String>,
    pub store_name: Option<String>,
    pub date: Option<String>,
    pub total_amount: Option<f64>,
    pub currency: Option<String>,
    pub category: Option<String>,
    pub items: Vec<LineItem>,
    pub created_at: DateTime<Utc>,
}

impl DbReceipt {
    pub fn new(
        id: String,
        uid: Option<String>,
        record: ReceiptRecord,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            uid,
            store_name: record.store_name,
            date: record.date,
            total_amount: record.total_amount,
            currency: record.currency,
            category: record.category,
            items: record.items,
            created_at,
        }
    }
}

impl From<DbReceipt> for StoredReceipt {
    fn from(d: DbReceipt) -> Self {
        StoredReceipt {
            id: d.id,
            record: ReceiptRecord {
                store_name: d.store_name,
                date: d.date,
                total_amount: d.total_amount,
                currency: d.currency,
                category: d.category,
                items: d.items,
            },
            uid: d.uid,
            created_at: d.created_at,
        }
    }
}
