//! Read models served to the dashboard, table and detail views.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::receipt::{LineItem, StoredReceipt};

pub const UNKNOWN_STORE: &str = "Unknown Store";
pub const UNCATEGORIZED: &str = "Uncategorized";
pub const NO_DATE: &str = "No Date";
const DEFAULT_ICON: &str = "receipt_long";

/// Material symbol name shown next to a receipt of the given category.
pub fn category_icon(category: Option<&str>) -> &'static str {
    let Some(category) = category else {
        return DEFAULT_ICON;
    };
    match category.trim().to_lowercase().as_str() {
        "food" | "dining" => "restaurant",
        "groceries" => "storefront",
        "retail" => "shopping_bag",
        "gas" => "local_gas_station",
        "transport" => "directions_car",
        "utilities" => "bolt",
        "entertainment" => "movie",
        "health" => "medical_services",
        "travel" => "flight",
        _ => DEFAULT_ICON,
    }
}

/// `"$ 42.5"`, or just the number when the currency is unknown.
pub fn display_amount(currency: Option<&str>, amount: Option<f64>) -> Option<String> {
    let amount = amount?;
    Some(match currency {
        Some(c) => format!("{c} {amount}"),
        None => amount.to_string(),
    })
}

/// One line in the dashboard list / receipts table.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ReceiptRow {
    pub id: String,
    pub store_name: String,
    pub date: String,
    pub category: String,
    pub total: Option<String>,
    pub icon: &'static str,
    pub created_at: DateTime<Utc>,
}

impl From<&StoredReceipt> for ReceiptRow {
    fn from(r: &StoredReceipt) -> Self {
        let rec = &r.record;
        Self {
            id: r.id.clone(),
            store_name: rec
                .store_name
                .clone()
                .unwrap_or_else(|| UNKNOWN_STORE.to_string()),
            date: rec.date.clone().unwrap_or_else(|| NO_DATE.to_string()),
            category: rec
                .category
                .clone()
                .unwrap_or_else(|| UNCATEGORIZED.to_string()),
            total: display_amount(rec.currency.as_deref(), rec.total_amount),
            icon: category_icon(rec.category.as_deref()),
            created_at: r.created_at,
        }
    }
}

/// Detail modal: the stored receipt plus its display fields.
#[derive(Debug, Clone, Serialize)]
pub struct ReceiptDetail {
    #[serde(flatten)]
    pub receipt: StoredReceipt,
    pub display: ReceiptRow,
    pub items_display: Vec<ItemLine>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ItemLine {
    pub item_name: String,
    pub price: Option<String>,
}

impl From<StoredReceipt> for ReceiptDetail {
    fn from(receipt: StoredReceipt) -> Self {
        let display = ReceiptRow::from(&receipt);
        let currency = receipt.record.currency.as_deref();
        let items_display = receipt
            .record
            .items
            .iter()
            .map(|item: &LineItem| ItemLine {
                item_name: item.item_name.clone().unwrap_or_default(),
                price: display_amount(currency, item.price),
            })
            .collect();
        Self {
            receipt,
            display,
            items_display,
        }
    }
}

/// Flattened spreadsheet row: one per line item, repeating the receipt header.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ExportRow {
    #[serde(rename = "Store")]
    pub store: Option<String>,
    #[serde(rename = "Date")]
    pub date: Option<String>,
    #[serde(rename = "Category")]
    pub category: Option<String>,
    #[serde(rename = "Item")]
    pub item: Option<String>,
    #[serde(rename = "Price")]
    pub price: Option<f64>,
    #[serde(rename = "Currency")]
    pub currency: Option<String>,
    #[serde(rename = "Total")]
    pub total: Option<f64>,
}

pub fn export_rows(receipt: &StoredReceipt) -> Vec<ExportRow> {
    let rec = &receipt.record;
    rec.items
        .iter()
        .map(|item| ExportRow {
            store: rec.store_name.clone(),
            date: rec.date.clone(),
            category: rec.category.clone(),
            item: item.item_name.clone(),
            price: item.price,
            currency: rec.currency.clone(),
            total: rec.total_amount,
        })
        .collect()
}

/// Render export rows as CSV with a header line.
pub fn export_csv(rows: &[ExportRow]) -> Result<String, csv::Error> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    if rows.is_empty() {
        writer.write_record([
            "Store", "Date", "Category", "Item", "Price", "Currency", "Total",
        ])?;
    }
    for row in rows {
        writer.serialize(row)?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| csv::Error::from(e.into_error()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// File name offered for a receipt's export download.
pub fn export_file_name(receipt: &StoredReceipt) -> String {
    let stem = receipt
        .record
        .date
        .as_deref()
        .filter(|d| d.chars().all(|c| c.is_ascii_alphanumeric() || c == '-'))
        .unwrap_or("scan");
    format!("receipt_{stem}.csv")
}
