pub mod bulk;
pub mod client;
pub mod credentials;
pub mod mapping;

pub use bulk::{BulkLoader, BulkSink, DocumentBatch};
pub use client::{BulkReport, IndexClient, IndexError};
pub use credentials::IndexCredentials;
