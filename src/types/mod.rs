pub mod gemini;
pub mod receipt;
pub mod view;

pub use receipt::{ExtractionOutcome, LineItem, ReceiptRecord, StoreKind, StoredReceipt};
