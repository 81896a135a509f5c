//! Evotherm Library
//!
//! This module exposes the cache, API, device and CLI modules for use in
//! integration tests.

pub mod api;
pub mod cache;
pub mod cli;
pub mod data;
pub mod device;
