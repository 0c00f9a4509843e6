pub mod memory;
#[cfg(feature = "firebase")]
pub mod firebase;

pub use memory::MemoryIdentity;
#[cfg(feature = "firebase")]
pub use firebase::{FirebaseConfig, FirebaseIdentity};
