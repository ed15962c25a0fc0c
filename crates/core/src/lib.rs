//! Tripnest Core - Shared domain library.
//!
//! This crate provides the domain model used across all Tripnest components:
//! - `api` - JSON HTTP service for trips, stories, profiles and recommendations
//! - `cli` - Command-line tools for migrations, seeding and token minting
//!
//! # Architecture
//!
//! The core crate contains only types, traits and pure functions - no I/O, no
//! database access, no HTTP clients. This keeps it lightweight and allows it to
//! be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Type-safe IDs, timestamps, coordinates and the trip/story/profile entities
//! - [`access`] - Ownership guard applied before every owner-only mutation
//! - [`recommend`] - Deterministic destination scoring and proximity ranking

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod access;
pub mod recommend;
pub mod types;

pub use access::{AccessDenied, Owned, assert_owner};
pub use types::*;
