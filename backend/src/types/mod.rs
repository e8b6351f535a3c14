pub mod environment;
pub mod error;
pub mod extractors;

pub use environment::Environment;
pub use error::{AppError, Operation};
pub use extractors::{BucketContext, BucketName, FileKey, FilePrefix, UploadBody};
