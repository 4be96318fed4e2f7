//! Common test utilities for bandmap.
//!
//! Shared fixtures, HTTP helpers and assertions for the integration tests.

// Not every test binary uses every helper
#![allow(dead_code)]

pub mod assertions;
pub mod http_client;
pub mod image_utils;
pub mod test_data;
