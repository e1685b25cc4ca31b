//! `manualhub-store`: remote blob + table store boundary.
//!
//! `RemoteStore` is the only way the rest of the system reaches durable state.

pub mod azure;
pub mod config;
pub mod error;
pub mod in_memory;
pub mod remote;

pub use azure::AzureRemoteStore;
pub use config::{Endpoint, StoreConfig, container_for};
pub use error::StoreError;
pub use in_memory::{InMemoryRemoteStore, StoreCall, StoreOperation};
pub use remote::{RemoteStore, UploadedBlob};
