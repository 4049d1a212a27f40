pub mod client;
#[cfg(test)]
pub mod memory;
pub mod valkey;

pub use client::{CacheClient, CacheError, WindowHit};
pub use valkey::ValkeyClient;
