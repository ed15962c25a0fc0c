//! Tripnest API library.
//!
//! This crate provides the JSON API as a library, allowing it to be tested
//! in-process and reused by the CLI.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod state;
pub mod store;
