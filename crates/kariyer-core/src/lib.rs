//! Core types and operations for Kariyer, a ledger of job-application
//! outcomes with per-company reply statistics.
//!
//! This crate is free of database and UI dependencies. Persistence goes
//! through the [`store::RecordStore`] trait; backends live in other crates.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

mod decode;

pub mod error;
pub mod experience;
pub mod repository;
pub mod session;
pub mod stats;
pub mod store;
pub mod user;

pub use error::{Error, Result};
