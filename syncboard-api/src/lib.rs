//! # SyncBoard API Server Library
//!
//! Everything the `syncboard-api` binary needs: configuration loading
//! (`config`), shared state and router assembly (`app`), the error to
//! HTTP response mapping (`error`), and the handlers themselves
//! (`routes`). Integration tests build a router through [`app`] without
//! starting a listener.

pub mod app;
pub mod config;
pub mod error;
pub mod routes;
