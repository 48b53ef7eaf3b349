//! Storage backends for the Shrinkray store contract.

pub mod memory;
pub mod mysql;

pub use memory::InMemoryRepository;
pub use mysql::MySqlRepository;
pub use shrinkray_core::repository::{
    NewUrlRecord, PendingRecord, RecordId, RecordState, Repository, UrlRecord,
};
pub use shrinkray_core::StorageError;
