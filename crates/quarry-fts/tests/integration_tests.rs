//! Integration test suite for Quarry search backends.
//!
//! Drives backends only through the `SearchBackend` contract and the
//! loader, against an in-memory record store.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

mod common;
mod integration;
