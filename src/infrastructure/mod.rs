pub mod in_memory;
pub(crate) mod records;
#[cfg(feature = "storage-rocksdb")]
pub mod rocksdb;
