pub mod backup;
pub mod store;

use std::path::Path;

use anyhow::Context;

pub use store::{AvailabilityStore, StoreError, StoreTransaction};

pub async fn init_store(path: &Path) -> anyhow::Result<AvailabilityStore> {
    AvailabilityStore::open(path)
        .await
        .with_context(|| format!("failed to open bookings store at {}", path.display()))
}
