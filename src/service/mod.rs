pub mod cloud_store;
pub mod extraction;
pub mod feed;
pub mod local_store;
pub mod persistence;

pub use extraction::{ExtractionGateway, ImageUpload};
pub use persistence::{Persistence, ReceiptStore, SaveOutcome, Session};
