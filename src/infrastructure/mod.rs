//! Adapters behind the domain ports: storage, gateways, notifiers, clock and minter.

pub mod clock;
pub mod gateway;
pub mod in_memory;
pub mod minter;
pub mod notifier;
#[cfg(feature = "storage-rocksdb")]
pub mod rocksdb;
