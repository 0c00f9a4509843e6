pub mod memory;

#[cfg(feature = "firestore")]
pub mod firestore;

pub use memory::MemoryStorage;

#[cfg(feature = "firestore")]
pub use firestore::{FirestoreConfig, FirestoreStorage};
