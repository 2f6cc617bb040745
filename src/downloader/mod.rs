pub mod error;
pub mod manager;
pub mod task;
pub mod transfer;

pub use error::DownloadError;
pub use manager::DownloadManager;
pub use task::{CancelFlag, TaskSnapshot, TaskStatus};
pub use transfer::{HttpStreamTransfer, ProgressFn, TransferStrategy};
