pub mod session;
pub mod upload;

pub use session::MaybeSession;
pub use upload::ReceiptUpload;
