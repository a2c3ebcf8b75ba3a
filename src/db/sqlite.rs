use crate::db::models::DbReceipt;
use crate::db::schema::SQLITE_INIT;
use crate::error::ScannerError;
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Pool, Row, Sqlite};
use std::str::FromStr;

pub type SqlitePool = Pool<Sqlite>;

const SELECT_COLUMNS: &str = r#"SELECT id, uid, store_name, date, total_amount, currency,
    category, items, created_at FROM receipts"#;

#[derive(Clone)]
pub struct ReceiptsStorage {
    pool: SqlitePool,
}

impl ReceiptsStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open (creating if needed) the database behind `database_url` and apply the schema.
    pub async fn connect(database_url: &str) -> Result<Self, ScannerError> {
        let connect_opts = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new().connect_with(connect_opts).await?;
        let storage = Self::new(pool);
        storage.init_schema().await?;
        Ok(storage)
    }

    /// Initialize the schema by executing the bundled DDL.
    pub async fn init_schema(&self) -> Result<(), ScannerError> {
        // sqlx::query runs one statement at a time
        for stmt in SQLITE_INIT.split(';') {
            let s = stmt.trim();
            if s.is_empty() {
                continue;
            }
            sqlx::query(s).execute(&self.pool).await?;
        }
        Ok(())
    }

    pub async fn insert(&self, row: &DbReceipt) -> Result<(), ScannerError> {
        let items_json = serde_json::to_string(&row.items)?;
        sqlx::query(
            r#"
            INSERT INTO receipts (
                id, uid, store_name, date, total_amount, currency,
                category, items, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&row.id)
        .bind(&row.uid)
        .bind(&row.store_name)
        .bind(&row.date)
        .bind(row.total_amount)
        .bind(&row.currency)
        .bind(&row.category)
        .bind(items_json)
        .bind(format_timestamp(&row.created_at))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// All receipts, newest first.
    pub async fn list_recent(&self) -> Result<Vec<DbReceipt>, ScannerError> {
        let sql = format!("{SELECT_COLUMNS} ORDER BY created_at DESC, rowid DESC");
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        rows.into_iter().map(Self::row_to_model).collect()
    }

    pub async fn get_by_id(&self, id: &str) -> Result<Option<DbReceipt>, ScannerError> {
        let sql = format!("{SELECT_COLUMNS} WHERE id = ?");
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(Self::row_to_model).transpose()
    }

    fn row_to_model(row: SqliteRow) -> Result<DbReceipt, ScannerError> {
        let id: String = row.try_get("id")?;
        let uid: Option<String> = row.try_get("uid")?;
        let store_name: Option<String> = row.try_get("store_name")?;
        let date: Option<String> = row.try_get("date")?;
        let total_amount: Option<f64> = row.try_get("total_amount")?;
        let currency: Option<String> = row.try_get("currency")?;
        let category: Option<String> = row.try_get("category")?;
        let items_json: String = row.try_get("items")?;
        let created_str: String = row.try_get("created_at")?;

        let items = serde_json::from_str(&items_json)
            .map_err(|e| sqlx::Error::Decode(Box::new(e)))?;
        let created_at: DateTime<Utc> = DateTime::parse_from_rfc3339(&created_str)
            .map_err(|e| sqlx::Error::Decode(Box::new(e)))?
            .with_timezone(&Utc);

        Ok(DbReceipt {
            id,
            uid,
            store_name,
            date,
            total_amount,
            currency,
            category,
            items,
            created_at,
        })
    }
}

fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::receipt::{LineItem, ReceiptRecord};
    use chrono::Duration;

    async fn temp_storage(tag: &str) -> (ReceiptsStorage, std::path::PathBuf) {
        let mut path = std::env::temp_dir();
        path.push(format!(
            "receipt-scanner-db-{tag}-{}-{}.sqlite",
            std::process::id(),
            uuid::Uuid::new_v4()
        ));
        let storage = ReceiptsStorage::connect(&format!("sqlite:{}", path.display()))
            .await
            .expect("open sqlite");
        (storage, path)
    }

    #[tokio::test]
    async fn rows_round_trip_with_items() {
        let (storage, path) = temp_storage("roundtrip").await;
        let record = ReceiptRecord {
            store_name: Some("Bakery".into()),
            total_amount: Some(4.2),
            items: vec![LineItem {
                item_name: Some("Bread".into()),
                price: Some(4.2),
            }],
            ..Default::default()
        };
        let row = DbReceipt::new("a".into(), Some("user-1".into()), record, Utc::now());
        storage.insert(&row).await.unwrap();

        let loaded = storage.get_by_id("a").await.unwrap().expect("row exists");
        assert_eq!(loaded.uid.as_deref(), Some("user-1"));
        assert_eq!(loaded.items, row.items);
        assert_eq!(loaded.date, None);
        assert!(storage.get_by_id("missing").await.unwrap().is_none());

        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn list_is_newest_first() {
        let (storage, path) = temp_storage("order").await;
        let base = Utc::now();
        for (i, id) in ["old", "new", "mid"].iter().enumerate() {
            let offset = match i {
                0 => 0,
                1 => 20,
                _ => 10,
            };
            let row = DbReceipt::new(
                id.to_string(),
                None,
                ReceiptRecord::default(),
                base + Duration::seconds(offset),
            );
            storage.insert(&row).await.unwrap();
        }
        let ids: Vec<String> = storage
            .list_recent()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec!["new", "mid", "old"]);

        let _ = std::fs::remove_file(&path);
    }
}
