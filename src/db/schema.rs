//! SQL DDL for initializing the shared receipts collection.
//! SQLite-first design; can be adapted for other RDBMS.

/// SQLite schema with:
/// - `id` TEXT PRIMARY KEY (UUID v4 assigned by the service)
/// - `uid` of the session that wrote the row
/// - receipt fields mirrored from `ReceiptRecord`, `items` as a JSON array
/// - `created_at` RFC3339 with fixed precision, so text order is time order
pub const SQLITE_INIT: &str = r#"
CREATE TABLE IF NOT EXISTS receipts (
    id TEXT PRIMARY KEY NOT NULL,
    uid TEXT NULL,
    store_name TEXT NULL,
    date TEXT NULL,
    total_amount REAL NULL,
    currency TEXT NULL,
    category TEXT NULL,
    items TEXT NOT NULL DEFAULT '[]', -- JSON array, serialized as text
    created_at TEXT NOT NULL -- RFC3339
);

CREATE INDEX IF NOT EXISTS idx_receipts_created_at ON receipts(created_at);
"#;
