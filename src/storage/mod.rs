pub mod uploads;

pub use uploads::{FailedUpload, UploadReport, UploadStore};
