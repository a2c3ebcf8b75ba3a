use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

pub const DEMO_STORE_NAME: &str = "Demo Store (No API Key)";

/// Structured fields extracted from one scanned receipt.
///
/// Every field is optional: the model is told to answer `null` for anything blurry or
/// missing, and nothing downstream validates content. Serialization always emits all
/// six keys so consumers can rely on the shape.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReceiptRecord {
    #[serde(default, deserialize_with = "lenient_text")]
    pub store_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub date: Option<String>,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub total_amount: Option<f64>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub currency: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub category: Option<String>,
    #[serde(default, deserialize_with = "nullable_items")]
    pub items: Vec<LineItem>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    #[serde(default, deserialize_with = "lenient_text")]
    pub item_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub price: Option<f64>,
}

impl ReceiptRecord {
    /// Canned record served when no model credential is configured.
    pub fn demo(today: NaiveDate) -> Self {
        Self {
            store_name: Some(DEMO_STORE_NAME.to_string()),
            date: Some(today.format("%d-%m-%Y").to_string()),
            total_amount: Some(42.5),
            currency: Some("$".to_string()),
            category: Some("Groceries".to_string()),
            items: vec![
                LineItem {
                    item_name: Some("Mock Item 1".to_string()),
                    price: Some(10.0),
                },
                LineItem {
                    item_name: Some("Mock Item 2".to_string()),
                    price: Some(32.5),
                },
            ],
        }
    }
}

/// Which backend holds a stored receipt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    Cloud,
    Local,
}

/// A receipt as read back from either store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredReceipt {
    pub id: String,
    #[serde(flatten)]
    pub record: ReceiptRecord,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
    #[serde(alias = "createdAt")]
    pub created_at: DateTime<Utc>,
}

/// Result of the schema step applied to a model reply.
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractionOutcome {
    Parsed(ReceiptRecord),
    Malformed { reason: String },
}

/// Remove every markdown code-fence marker the model may wrap its JSON in.
pub fn strip_code_fences(text: &str) -> String {
    text.replace("```json", "").replace("```", "").trim().to_string()
}

/// Clean a textual model reply and deserialize it as a [`ReceiptRecord`].
pub fn parse_model_reply(text: &str) -> ExtractionOutcome {
    let cleaned = strip_code_fences(text);
    if cleaned.is_empty() {
        return ExtractionOutcome::Malformed {
            reason: "empty reply".to_string(),
        };
    }

    let value: Value = match serde_json::from_str(&cleaned) {
        Ok(v) => v,
        Err(e) => {
            return ExtractionOutcome::Malformed {
                reason: format!("not JSON: {e}"),
            };
        }
    };

    // serde would happily read a positional array into the struct
    if !value.is_object() {
        return ExtractionOutcome::Malformed {
            reason: "top-level value is not an object".to_string(),
        };
    }

    match serde_json::from_value::<ReceiptRecord>(value) {
        Ok(record) => ExtractionOutcome::Parsed(record),
        Err(e) => ExtractionOutcome::Malformed {
            reason: e.to_string(),
        },
    }
}

fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => {
            let s = s.trim();
            (!s.is_empty() && s != "null").then(|| s.to_string())
        }
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

fn lenient_amount<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
        _ => None,
    })
}

fn nullable_items<'de, D>(deserializer: D) -> Result<Vec<LineItem>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<LineItem>>::deserialize(deserializer)?.unwrap_or_default())
}
