//! # SyncBoard Shared Library
//!
//! Types and logic common to the SyncBoard API server and background
//! worker: database row types and queries (`models`), password and token
//! handling (`auth`), notification fan-out with email and live broadcast
//! (`notify`), and the connection pool plus migrations (`db`).

pub mod auth;
pub mod db;
pub mod models;
pub mod notify;

/// Version of the shared library, from the crate manifest
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
