//! Core types and trait definitions for the Vitalis back office.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! All other crates depend on it; it depends on nothing proprietary.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod appointment;
pub mod credential;
pub mod error;
pub mod page;
pub mod role;
pub mod store;
pub mod unit;
pub mod user;
pub mod validate;

pub use error::{Error, Result};
