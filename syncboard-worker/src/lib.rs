//! # SyncBoard Worker Library
//!
//! Core functionality for SyncBoard's background worker.
//!
//! ## Modules
//!
//! - `sweeper`: Periodic deadline sweep that reminds assignees about
//!   tasks coming due
//!
//! ## Example
//!
//! ```no_run
//! use syncboard_worker::sweeper::SweeperConfig;
//!
//! let config = SweeperConfig::default();
//! println!("Sweeping every {} seconds", config.interval_secs);
//! ```

pub mod sweeper;
